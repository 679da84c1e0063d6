//! Word layout: where id and position digits sit inside a framed word
//!
//! Position digits are spread through the payload, one after every
//! `payload_digits / pos_digits` payload digits; leftover payload digits
//! follow the last position digit. The id digits are then spread the same
//! way through the result, each id digit leading its segment.

use crate::symbol::{digits_to_int, int_to_digits};

/// Digit widths of one framed word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WordLayout {
    id_digits: usize,
    pos_digits: usize,
    payload_digits: usize,
}

/// A word split back into its fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedWord {
    pub file_id: u64,
    pub position: u64,
    pub payload: Vec<u8>,
}

impl WordLayout {
    /// Layout for even bit widths `id_len`, `b_len` and a payload of
    /// `length_ary` digits
    pub fn new(id_len: usize, b_len: usize, length_ary: usize) -> Self {
        WordLayout {
            id_digits: id_len / 2,
            pos_digits: b_len / 2,
            payload_digits: length_ary,
        }
    }

    /// Id tag width in digits
    pub fn id_digits(&self) -> usize {
        self.id_digits
    }

    /// Position tag width in digits
    pub fn pos_digits(&self) -> usize {
        self.pos_digits
    }

    /// Payload width in digits
    pub fn payload_digits(&self) -> usize {
        self.payload_digits
    }

    /// Total word width in digits
    pub fn word_len(&self) -> usize {
        self.id_digits + self.pos_digits + self.payload_digits
    }

    fn payload_stride(&self) -> usize {
        if self.pos_digits == 0 {
            self.payload_digits
        } else {
            self.payload_digits / self.pos_digits
        }
    }

    fn id_stride(&self) -> usize {
        let tagged = self.pos_digits + self.payload_digits;
        if self.id_digits == 0 {
            tagged
        } else {
            tagged / self.id_digits
        }
    }

    /// Build the unscrambled word for one payload chunk
    ///
    /// `payload` must already be `payload_digits` long.
    pub fn interleave(&self, payload: &[u8], position: u64, file_id: u64) -> Vec<u8> {
        debug_assert_eq!(payload.len(), self.payload_digits);

        let pos = int_to_digits(position, self.pos_digits);
        let stride = self.payload_stride();
        let mut tagged = Vec::with_capacity(self.pos_digits + self.payload_digits);
        for (t, &digit) in pos.iter().enumerate() {
            tagged.extend_from_slice(&payload[stride * t..stride * (t + 1)]);
            tagged.push(digit);
        }
        tagged.extend_from_slice(&payload[stride * self.pos_digits..]);

        let id = int_to_digits(file_id, self.id_digits);
        let segment = self.id_stride();
        let mut word = Vec::with_capacity(self.word_len());
        for (t, &digit) in id.iter().enumerate() {
            word.push(digit);
            word.extend_from_slice(&tagged[segment * t..segment * (t + 1)]);
        }
        word.extend_from_slice(&tagged[segment * self.id_digits..]);

        word
    }

    /// Read the id tag only
    pub fn file_id(&self, word: &[u8]) -> Option<u64> {
        if word.len() != self.word_len() {
            return None;
        }
        let segment = self.id_stride();
        let id: Vec<u8> = (0..self.id_digits)
            .map(|t| word[t * (segment + 1)])
            .collect();
        Some(digits_to_int(&id))
    }

    /// Split an unscrambled word into id, position and payload
    pub fn parse(&self, word: &[u8]) -> Option<ParsedWord> {
        if word.len() != self.word_len() {
            return None;
        }

        let segment = self.id_stride();
        let mut id = Vec::with_capacity(self.id_digits);
        let mut tagged = Vec::with_capacity(self.pos_digits + self.payload_digits);
        let mut cursor = 0;
        for _ in 0..self.id_digits {
            id.push(word[cursor]);
            tagged.extend_from_slice(&word[cursor + 1..cursor + 1 + segment]);
            cursor += 1 + segment;
        }
        tagged.extend_from_slice(&word[cursor..]);

        let stride = self.payload_stride();
        let mut pos = Vec::with_capacity(self.pos_digits);
        let mut payload = Vec::with_capacity(self.payload_digits);
        let mut cursor = 0;
        for _ in 0..self.pos_digits {
            payload.extend_from_slice(&tagged[cursor..cursor + stride]);
            pos.push(tagged[cursor + stride]);
            cursor += stride + 1;
        }
        payload.extend_from_slice(&tagged[cursor..]);

        Some(ParsedWord {
            file_id: digits_to_int(&id),
            position: digits_to_int(&pos),
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(len: usize) -> Vec<u8> {
        (0..len).map(|i| ((i * 5 + 1) % 4) as u8).collect()
    }

    #[test]
    fn test_widths() {
        let layout = WordLayout::new(6, 14, 136);
        assert_eq!(layout.id_digits(), 3);
        assert_eq!(layout.pos_digits(), 7);
        assert_eq!(layout.word_len(), 146);
    }

    #[test]
    fn test_tag_placement() {
        // 8 payload digits, 2 position digits, 1 id digit
        let layout = WordLayout::new(2, 4, 8);
        let word = layout.interleave(&[0, 0, 0, 0, 0, 0, 0, 0], 0b1011, 2);

        // id first, then payload[0..4], pos[0], payload[4..8], pos[1]
        assert_eq!(word, vec![2, 0, 0, 0, 0, 2, 0, 0, 0, 0, 3]);
    }

    #[test]
    fn test_id_digits_are_spread() {
        // 2 id digits over a 10-digit tagged body: segments of 5
        let layout = WordLayout::new(4, 2, 9);
        let word = layout.interleave(&payload(9), 1, 0b1101);
        assert_eq!(word.len(), 12);
        assert_eq!(word[0], 3);
        assert_eq!(word[6], 1);
        assert_eq!(layout.file_id(&word), Some(13));
    }

    #[test]
    fn test_parse_inverts_interleave() {
        let cases = [
            (0, 0, 16),
            (0, 6, 64),
            (2, 2, 64),
            (6, 14, 136),
            (4, 6, 10),
            (2, 8, 3),
        ];
        for (id_len, b_len, width) in cases {
            let layout = WordLayout::new(id_len, b_len, width);
            let max_pos = (1u64 << b_len) - 1;
            let max_id = (1u64 << id_len) - 1;
            let body = payload(width);

            for (position, id) in [(0, 0), (max_pos, max_id), (max_pos / 3, max_id / 2)] {
                let word = layout.interleave(&body, position, id);
                assert_eq!(word.len(), layout.word_len());
                let parsed = layout.parse(&word).unwrap();
                assert_eq!(parsed.file_id, id);
                assert_eq!(parsed.position, position);
                assert_eq!(parsed.payload, body);
            }
        }
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        let layout = WordLayout::new(2, 4, 8);
        assert!(layout.parse(&[0; 10]).is_none());
        assert!(layout.file_id(&[0; 12]).is_none());
    }
}
