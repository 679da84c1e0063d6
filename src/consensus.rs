//! Consensus assembly of redundant reads
//!
//! Every accepted read lands in the bucket of its `(file_id, position)`.
//! A bucket resolves to one payload by per-digit plurality vote; ties go
//! to the digit seen first. Empty buckets resolve to all-zero payloads,
//! which is also how never-transmitted zero chunks come back.

use std::collections::BTreeMap;

/// Per-digit plurality vote over equal-width candidates
///
/// Candidates shorter than `width` abstain at the missing positions.
/// With no votes at a position the result digit is 0.
pub fn plurality_vote(candidates: &[Vec<u8>], width: usize) -> Vec<u8> {
    (0..width)
        .map(|i| {
            let mut counts = [0usize; 4];
            let mut first_seen = [usize::MAX; 4];
            for (order, candidate) in candidates.iter().enumerate() {
                if let Some(&d) = candidate.get(i) {
                    let d = usize::from(d & 0b11);
                    counts[d] += 1;
                    if first_seen[d] == usize::MAX {
                        first_seen[d] = order;
                    }
                }
            }

            let mut best = 0usize;
            for d in 1..4 {
                let better = counts[d] > counts[best]
                    || (counts[d] == counts[best] && first_seen[d] < first_seen[best]);
                if better {
                    best = d;
                }
            }
            best as u8
        })
        .collect()
}

/// All payload candidates decoded for one `(file_id, position)`
#[derive(Debug, Clone, Default)]
pub struct VoteBucket {
    candidates: Vec<Vec<u8>>,
}

impl VoteBucket {
    /// Create an empty bucket
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a candidate in arrival order
    pub fn push(&mut self, payload: Vec<u8>) {
        self.candidates.push(payload);
    }

    /// Number of candidates
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Whether no read reached this bucket
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Consensus payload of `width` digits
    pub fn vote(&self, width: usize) -> Vec<u8> {
        plurality_vote(&self.candidates, width)
    }
}

/// Buckets for a whole pool, keyed by `(file_id, position)`
#[derive(Debug, Clone)]
pub struct ConsensusAssembler {
    width: usize,
    buckets: BTreeMap<(usize, u64), VoteBucket>,
}

impl ConsensusAssembler {
    /// Assembler for payloads of `width` digits
    pub fn new(width: usize) -> Self {
        ConsensusAssembler {
            width,
            buckets: BTreeMap::new(),
        }
    }

    /// Payload width in digits
    pub fn width(&self) -> usize {
        self.width
    }

    /// File a candidate under its key
    pub fn insert(&mut self, file_id: usize, position: u64, payload: Vec<u8>) {
        self.buckets
            .entry((file_id, position))
            .or_default()
            .push(payload);
    }

    /// Bucket for a key, if any read reached it
    pub fn bucket(&self, file_id: usize, position: u64) -> Option<&VoteBucket> {
        self.buckets.get(&(file_id, position))
    }

    /// Number of non-empty buckets
    pub fn occupied(&self) -> usize {
        self.buckets.len()
    }

    /// Consensus payload for a key (all zeros when nothing arrived)
    pub fn chunk(&self, file_id: usize, position: u64) -> Vec<u8> {
        match self.bucket(file_id, position) {
            Some(bucket) => bucket.vote(self.width),
            None => vec![0; self.width],
        }
    }

    /// Concatenate `chunk_count` consensus chunks of one file in position
    /// order and cut the result to `len` digits
    ///
    /// Returns the stream and the number of positions that had no reads.
    pub fn assemble(&self, file_id: usize, chunk_count: u64, len: usize) -> (Vec<u8>, usize) {
        let mut stream = Vec::with_capacity(chunk_count as usize * self.width);
        let mut empty = 0;
        for position in 0..chunk_count {
            if self.bucket(file_id, position).is_none() {
                empty += 1;
            }
            stream.extend(self.chunk(file_id, position));
        }
        stream.truncate(len);
        (stream, empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_majority_wins() {
        let candidates = vec![vec![0], vec![1], vec![1]];
        assert_eq!(plurality_vote(&candidates, 1), vec![1]);
    }

    #[test]
    fn test_tie_goes_to_first_seen() {
        assert_eq!(plurality_vote(&[vec![0], vec![1]], 1), vec![0]);
        assert_eq!(plurality_vote(&[vec![1], vec![0]], 1), vec![1]);
        assert_eq!(plurality_vote(&[vec![3], vec![2], vec![2], vec![3]], 1), vec![3]);
    }

    #[test]
    fn test_vote_is_per_digit() {
        let candidates = vec![
            vec![0, 1, 2, 3],
            vec![0, 1, 3, 3],
            vec![1, 2, 3, 3],
        ];
        assert_eq!(plurality_vote(&candidates, 4), vec![0, 1, 3, 3]);
    }

    #[test]
    fn test_short_candidates_abstain() {
        let candidates = vec![vec![2], vec![1, 3]];
        assert_eq!(plurality_vote(&candidates, 3), vec![2, 3, 0]);
    }

    #[test]
    fn test_empty_bucket_is_zero() {
        let assembler = ConsensusAssembler::new(5);
        assert!(assembler.bucket(0, 0).is_none());
        assert_eq!(assembler.chunk(0, 0), vec![0; 5]);
        assert!(VoteBucket::new().is_empty());
    }

    #[test]
    fn test_assemble_orders_by_position() {
        let mut assembler = ConsensusAssembler::new(2);
        assembler.insert(0, 2, vec![3, 3]);
        assembler.insert(0, 0, vec![1, 1]);
        assembler.insert(1, 1, vec![2, 2]);
        assembler.insert(0, 0, vec![1, 2]);
        assembler.insert(0, 0, vec![1, 2]);

        assert_eq!(assembler.bucket(0, 0).unwrap().len(), 3);
        assert_eq!(assembler.occupied(), 3);

        let (stream, empty) = assembler.assemble(0, 3, 6);
        assert_eq!(stream, vec![1, 2, 0, 0, 3, 3]);
        assert_eq!(empty, 1);

        let (stream, empty) = assembler.assemble(0, 3, 5);
        assert_eq!(stream, vec![1, 2, 0, 0, 3]);
        assert_eq!(empty, 1);
    }
}
