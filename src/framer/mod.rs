//! Framer: tags payload chunks with file id and position, then scrambles
//!
//! On encode every file's RS stream is tiled into `length_ary`-digit
//! chunks. All-zero chunks are never transmitted; every other chunk is
//! interleaved with its position and file-id digits and whitened with the
//! keystream. On decode the steps run backwards and surviving payloads are
//! handed to the consensus assembler, keyed by `(file_id, position)`.

mod keystream;
mod layout;

pub use keystream::{Keystream, REFERENCE_KEY, REFERENCE_PAYLOAD_WIDTH};
pub use layout::{ParsedWord, WordLayout};

use tracing::{debug, trace};

use crate::consensus::ConsensusAssembler;
use crate::error::{Error, Result};
use crate::registry::FileRegistry;

/// One framed and scrambled word ready for the inner code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramedWord {
    pub file_id: usize,
    pub position: u64,
    pub digits: Vec<u8>,
}

/// Framer output for one file
#[derive(Debug, Clone, Default)]
pub struct FramedFile {
    pub words: Vec<FramedWord>,
    /// All-zero chunks left out of the pool
    pub skipped_zero_chunks: usize,
}

/// A payload recovered from one read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub file_id: usize,
    pub position: u64,
    pub payload: Vec<u8>,
}

/// Outcome of unframing one inner-decoded word
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unframed {
    /// Id and position are valid for the registry
    Accepted(Candidate),
    /// The id tag names no registered file
    IdOutOfRange(u64),
    /// The id is valid but the word length belongs to another file
    LengthMismatch { file_id: usize, len: usize },
    /// The position tag is past the file's last chunk
    PositionOutOfRange { file_id: usize, position: u64 },
    /// The word is too short to hold the id tag and a payload
    UnknownLength(usize),
}

/// A file's stream rebuilt from consensus chunks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReassembledFile {
    /// Quaternary digits, cut to the RS-encoded length
    pub digits: Vec<u8>,
    /// Positions that received no candidate (zero chunks or dropout)
    pub empty_chunks: usize,
}

/// Frames and unframes words against a shared registry and keystream
#[derive(Debug, Clone)]
pub struct Framer<'a> {
    registry: &'a FileRegistry,
    keystream: Keystream,
    length_ary: usize,
}

impl<'a> Framer<'a> {
    /// Create a framer for payloads of `length_ary` digits
    ///
    /// The keystream covers the longest word in the registry.
    pub fn new(registry: &'a FileRegistry, length_ary: usize, seed: u64) -> Result<Self> {
        if length_ary == 0 {
            return Err(Error::InvalidConfig(
                "payload width must be greater than 0".to_string(),
            ));
        }

        let id_len = registry.id_len();
        let longest = registry
            .iter()
            .map(|(_, entry)| WordLayout::new(id_len, entry.b_len(), length_ary).word_len())
            .max()
            .unwrap_or(length_ary);

        Ok(Framer {
            registry,
            keystream: Keystream::for_payload_width(length_ary, seed, longest),
            length_ary,
        })
    }

    /// Payload width in digits
    pub fn length_ary(&self) -> usize {
        self.length_ary
    }

    /// The registry this framer works against
    pub fn registry(&self) -> &'a FileRegistry {
        self.registry
    }

    /// The scrambling keystream
    pub fn keystream(&self) -> &Keystream {
        &self.keystream
    }

    /// Word layout used by file `id`
    pub fn layout_for(&self, id: usize) -> Option<WordLayout> {
        self.registry
            .get(id)
            .map(|entry| WordLayout::new(self.registry.id_len(), entry.b_len(), self.length_ary))
    }

    /// Frame and scramble the RS stream of file `id`
    ///
    /// # Errors
    /// Fails if `id` is not registered or `stream` does not have the
    /// recorded length.
    pub fn frame_file(&self, id: usize, stream: &[u8]) -> Result<FramedFile> {
        let entry = self.registry.get(id).ok_or_else(|| {
            Error::InvalidRegistry(format!("file id {} is not registered", id))
        })?;
        if stream.len() != entry.rs_encoded_digits() {
            return Err(Error::InvalidLength {
                expected: entry.rs_encoded_digits(),
                actual: stream.len(),
            });
        }
        let layout = WordLayout::new(self.registry.id_len(), entry.b_len(), self.length_ary);

        let mut framed = FramedFile::default();
        let mut padded = vec![0u8; self.length_ary];
        for (position, chunk) in stream.chunks(self.length_ary).enumerate() {
            if chunk.iter().all(|&d| d == 0) {
                framed.skipped_zero_chunks += 1;
                continue;
            }

            let payload = if chunk.len() == self.length_ary {
                chunk
            } else {
                padded[..chunk.len()].copy_from_slice(chunk);
                padded[chunk.len()..].fill(0);
                &padded[..]
            };

            let mut digits = layout.interleave(payload, position as u64, id as u64);
            self.keystream.scramble(&mut digits);
            framed.words.push(FramedWord {
                file_id: id,
                position: position as u64,
                digits,
            });
        }

        debug!(
            "Framed file {}: {} words of {} digits, {} zero chunks skipped",
            id,
            framed.words.len(),
            layout.word_len(),
            framed.skipped_zero_chunks
        );
        Ok(framed)
    }

    /// Unscramble and parse one inner-decoded word
    pub fn unframe(&self, word: &[u8]) -> Unframed {
        let id_digits = self.registry.id_len() / 2;
        let Some(pos_digits) = word.len().checked_sub(id_digits + self.length_ary) else {
            return Unframed::UnknownLength(word.len());
        };

        let mut plain = word.to_vec();
        self.keystream.unscramble(&mut plain);

        let layout = WordLayout::new(self.registry.id_len(), 2 * pos_digits, self.length_ary);
        let Some(parsed) = layout.parse(&plain) else {
            return Unframed::UnknownLength(word.len());
        };

        let registered = usize::try_from(parsed.file_id)
            .ok()
            .and_then(|id| self.registry.get(id).map(|entry| (id, entry)));
        let Some((file_id, entry)) = registered else {
            return Unframed::IdOutOfRange(parsed.file_id);
        };
        if entry.b_len() != 2 * pos_digits {
            return Unframed::LengthMismatch {
                file_id,
                len: word.len(),
            };
        }
        if parsed.position >= entry.chunk_count {
            return Unframed::PositionOutOfRange {
                file_id,
                position: parsed.position,
            };
        }

        Unframed::Accepted(Candidate {
            file_id,
            position: parsed.position,
            payload: parsed.payload,
        })
    }

    /// Empty assembler sized for this framer's payloads
    pub fn assembler(&self) -> ConsensusAssembler {
        ConsensusAssembler::new(self.length_ary)
    }

    /// Vote every bucket and rebuild each registered file's stream
    pub fn reassemble(&self, assembler: &ConsensusAssembler) -> Vec<ReassembledFile> {
        self.registry
            .iter()
            .map(|(id, entry)| {
                let (digits, empty_chunks) =
                    assembler.assemble(id, entry.chunk_count, entry.rs_encoded_digits());
                trace!("File {}: {} empty chunk positions", id, empty_chunks);
                ReassembledFile {
                    digits,
                    empty_chunks,
                }
            })
            .collect()
    }

    /// Unframe a batch of inner-decoded words and reassemble every file
    ///
    /// Returns the files and the number of words discarded as out of range.
    pub fn decode<I, W>(&self, words: I) -> (Vec<ReassembledFile>, usize)
    where
        I: IntoIterator<Item = W>,
        W: AsRef<[u8]>,
    {
        let mut assembler = self.assembler();
        let mut discarded = 0;
        for word in words {
            match self.unframe(word.as_ref()) {
                Unframed::Accepted(candidate) => {
                    assembler.insert(candidate.file_id, candidate.position, candidate.payload)
                }
                _ => discarded += 1,
            }
        }
        (self.reassemble(&assembler), discarded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::FileEntry;
    use crate::symbol::div_ceil;

    fn registry_for(streams: &[Vec<u8>], length_ary: usize) -> FileRegistry {
        FileRegistry::new(
            streams
                .iter()
                .map(|s| FileEntry {
                    raw_length: 0,
                    rs_encoded_length: 2 * s.len() as u64,
                    chunk_count: div_ceil(s.len(), length_ary) as u64,
                    content_hash: String::new(),
                })
                .collect(),
        )
        .unwrap()
    }

    fn stream(len: usize, salt: usize) -> Vec<u8> {
        (0..len).map(|i| ((i * 7 + salt) % 4) as u8).collect()
    }

    #[test]
    fn test_frame_then_decode() {
        let streams = vec![stream(100, 1), stream(37, 2), stream(16, 3)];
        let registry = registry_for(&streams, 16);
        let framer = Framer::new(&registry, 16, 5).unwrap();

        let mut words = Vec::new();
        for (id, s) in streams.iter().enumerate() {
            let framed = framer.frame_file(id, s).unwrap();
            words.extend(framed.words.into_iter().map(|w| w.digits));
        }
        // arrival order carries no information
        words.reverse();

        let (files, discarded) = framer.decode(&words);
        assert_eq!(discarded, 0);
        for (file, s) in files.iter().zip(&streams) {
            assert_eq!(&file.digits, s);
            assert_eq!(file.empty_chunks, 0);
        }
    }

    #[test]
    fn test_zero_chunks_are_skipped() {
        let mut s = stream(64, 0);
        s[16..48].fill(0);
        let registry = registry_for(&[s.clone()], 16);
        let framer = Framer::new(&registry, 16, 1).unwrap();

        let framed = framer.frame_file(0, &s).unwrap();
        assert_eq!(framed.skipped_zero_chunks, 2);
        assert_eq!(framed.words.len(), 2);
        assert_eq!(framed.words[1].position, 3);

        let (files, _) = framer.decode(framed.words.iter().map(|w| &w.digits));
        assert_eq!(files[0].digits, s);
        assert_eq!(files[0].empty_chunks, 2);
    }

    #[test]
    fn test_words_are_scrambled() {
        let s = vec![1u8; 32];
        let registry = registry_for(&[s.clone()], 32);
        let framer = Framer::new(&registry, 32, 9).unwrap();
        let framed = framer.frame_file(0, &s).unwrap();

        let layout = framer.layout_for(0).unwrap();
        let plain = layout.interleave(&s, 0, 0);
        assert_eq!(framed.words[0].digits.len(), plain.len());
        assert_ne!(framed.words[0].digits, plain);
    }

    #[test]
    fn test_reference_width_uses_literal_key() {
        let registry = registry_for(&[stream(136, 0)], 136);
        let framer = Framer::new(&registry, 136, 42).unwrap();
        assert_eq!(framer.keystream(), &Keystream::reference());
    }

    #[test]
    fn test_out_of_range_id_is_discarded() {
        // 3 files: ids 0..=2 are valid, id 3 fits in the tag but is unknown
        let streams = vec![stream(16, 0), stream(16, 1), stream(16, 2)];
        let registry = registry_for(&streams, 16);
        let framer = Framer::new(&registry, 16, 1).unwrap();
        let layout = framer.layout_for(0).unwrap();

        let mut word = layout.interleave(&streams[0], 0, 3);
        framer.keystream().scramble(&mut word);
        assert_eq!(framer.unframe(&word), Unframed::IdOutOfRange(3));
    }

    #[test]
    fn test_out_of_range_position_is_discarded() {
        // 3 chunks need a 2-bit tag, so position 3 is representable
        let s = stream(48, 1);
        let registry = registry_for(&[s.clone()], 16);
        let framer = Framer::new(&registry, 16, 1).unwrap();
        let layout = framer.layout_for(0).unwrap();

        let mut word = layout.interleave(&s[..16], 3, 0);
        framer.keystream().scramble(&mut word);
        assert_eq!(
            framer.unframe(&word),
            Unframed::PositionOutOfRange {
                file_id: 0,
                position: 3
            }
        );
    }

    #[test]
    fn test_length_must_match_file() {
        // file 0 has one chunk (no position digits), file 1 has four
        let streams = vec![stream(16, 0), stream(64, 1)];
        let registry = registry_for(&streams, 16);
        let framer = Framer::new(&registry, 16, 1).unwrap();

        let mut word = framer.layout_for(1).unwrap().interleave(&streams[0], 0, 0);
        framer.keystream().scramble(&mut word);
        assert!(matches!(
            framer.unframe(&word),
            Unframed::LengthMismatch { file_id: 0, .. }
        ));
        assert!(matches!(framer.unframe(&[0; 3]), Unframed::UnknownLength(3)));
    }

    #[test]
    fn test_frame_rejects_bad_input() {
        let registry = registry_for(&[stream(20, 0)], 16);
        let framer = Framer::new(&registry, 16, 1).unwrap();
        assert!(framer.frame_file(0, &stream(19, 0)).is_err());
        assert!(framer.frame_file(1, &stream(20, 0)).is_err());
        assert!(Framer::new(&registry, 0, 1).is_err());
    }
}
