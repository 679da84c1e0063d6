//! Quaternary VT code via bit-plane split
//!
//! Each digit `d` is split into a low plane (`d % 2`) and a high plane
//! (`d / 2`). Both planes are coded with the same binary VT code, so an
//! indel on the strand shows up as one indel in each plane.

use crate::error::{Error, Result};

use super::binary::VtCode;

/// VT code over the alphabet {0, 1, 2, 3}
#[derive(Debug, Clone)]
pub struct QuaternaryVt {
    code: VtCode,
    message_len: usize,
}

impl QuaternaryVt {
    /// Create the shortest code carrying `message_len` digits
    pub fn new(message_len: usize, a: usize, correct_substitutions: bool) -> Result<Self> {
        if message_len == 0 {
            return Err(Error::InvalidConfig(
                "VT message length must be greater than 0".to_string(),
            ));
        }
        let code = VtCode::for_message_len(message_len, a, correct_substitutions)?;
        Ok(QuaternaryVt { code, message_len })
    }

    /// Strand length in digits
    pub fn codeword_len(&self) -> usize {
        self.code.n()
    }

    /// Message length in digits
    pub fn message_len(&self) -> usize {
        self.message_len
    }

    /// The per-plane binary code
    pub fn binary(&self) -> &VtCode {
        &self.code
    }

    /// Encode a word of `message_len` digits
    pub fn encode(&self, digits: &[u8]) -> Result<Vec<u8>> {
        if digits.len() != self.message_len {
            return Err(Error::InvalidLength {
                expected: self.message_len,
                actual: digits.len(),
            });
        }
        let (low, high) = split_planes(digits).ok_or_else(|| {
            let position = digits.iter().position(|&d| d > 3).unwrap_or(0);
            Error::InvalidSymbol {
                symbol: char::from_digit(u32::from(digits[position]), 10).unwrap_or('?'),
                position,
            }
        })?;

        let low = self.code.encode(&low)?;
        let high = self.code.encode(&high)?;
        Ok(merge_planes(&low, &high))
    }

    /// Decode a received strand; `None` if either plane fails
    pub fn decode(&self, received: &[u8]) -> Option<Vec<u8>> {
        let (low, high) = split_planes(received)?;
        let low = self.code.decode(&low)?;
        let high = self.code.decode(&high)?;

        let mut digits = merge_planes(&low, &high);
        digits.truncate(self.message_len);
        Some(digits)
    }
}

/// Split digits into (value mod 2, value div 2) planes
fn split_planes(digits: &[u8]) -> Option<(Vec<u8>, Vec<u8>)> {
    if digits.iter().any(|&d| d > 3) {
        return None;
    }
    Some(digits.iter().map(|&d| (d & 1, d >> 1)).unzip())
}

fn merge_planes(low: &[u8], high: &[u8]) -> Vec<u8> {
    low.iter().zip(high).map(|(&l, &h)| l + 2 * h).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_word(len: usize, salt: usize) -> Vec<u8> {
        (0..len).map(|i| ((i * 7 + salt * 13 + i / 3) % 4) as u8).collect()
    }

    #[test]
    fn test_plane_split() {
        let (low, high) = split_planes(&[0, 1, 2, 3]).unwrap();
        assert_eq!(low, vec![0, 1, 0, 1]);
        assert_eq!(high, vec![0, 0, 1, 1]);
        assert_eq!(merge_planes(&low, &high), vec![0, 1, 2, 3]);
        assert!(split_planes(&[0, 4]).is_none());
    }

    #[test]
    fn test_reference_length() {
        let code = QuaternaryVt::new(146, 0, true).unwrap();
        assert_eq!(code.codeword_len(), 155);
    }

    #[test]
    fn test_clean_strand() {
        let code = QuaternaryVt::new(40, 0, true).unwrap();
        let word = sample_word(40, 1);
        let strand = code.encode(&word).unwrap();
        assert_eq!(strand.len(), code.codeword_len());
        assert_eq!(code.decode(&strand).unwrap(), word);
    }

    #[test]
    fn test_single_indel_or_substitution_on_strand() {
        let code = QuaternaryVt::new(30, 0, true).unwrap();
        for salt in 0..4 {
            let word = sample_word(30, salt);
            let strand = code.encode(&word).unwrap();
            for pos in 0..strand.len() {
                let mut deleted = strand.clone();
                deleted.remove(pos);
                assert_eq!(code.decode(&deleted).as_deref(), Some(word.as_slice()));

                for symbol in 0..4u8 {
                    let mut inserted = strand.clone();
                    inserted.insert(pos, symbol);
                    assert_eq!(code.decode(&inserted).as_deref(), Some(word.as_slice()));

                    let mut substituted = strand.clone();
                    substituted[pos] = symbol;
                    assert_eq!(code.decode(&substituted).as_deref(), Some(word.as_slice()));
                }
            }
        }
    }

    #[test]
    fn test_two_deletions_do_not_decode_to_wrong_length() {
        let code = QuaternaryVt::new(30, 0, true).unwrap();
        let strand = code.encode(&sample_word(30, 2)).unwrap();
        let damaged = &strand[2..];
        assert!(code.decode(damaged).is_none());
    }

    #[test]
    fn test_encode_validates_input() {
        let code = QuaternaryVt::new(10, 0, true).unwrap();
        assert!(code.encode(&[0; 9]).is_err());
        assert!(code.encode(&[0, 1, 2, 3, 4, 0, 0, 0, 0, 0]).is_err());
        assert!(QuaternaryVt::new(0, 0, true).is_err());
    }
}
