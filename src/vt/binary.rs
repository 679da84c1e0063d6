//! Binary Varshamov-Tenengolts code
//!
//! A length-`n` word `y` is a codeword when `sum((i + 1) * y[i]) mod m == a`,
//! with `m = n + 1` (single insertion/deletion) or `m = 2n + 1` (also a
//! single substitution). Parity bits sit at the power-of-two positions,
//! plus one extra slot at the tail in substitution mode.

use crate::error::{Error, Result};
use crate::symbol::ceil_log2;

/// Message capacity of a length-`n` code
pub fn find_k(n: usize, correct_substitutions: bool) -> usize {
    if correct_substitutions {
        n.saturating_sub(ceil_log2(2 * n + 1))
    } else {
        n.saturating_sub(ceil_log2(n + 1))
    }
}

/// Smallest codeword length whose capacity holds `k` message bits
pub fn find_smallest_n(k: usize, correct_substitutions: bool) -> usize {
    let mut n = if correct_substitutions {
        k + ceil_log2(2 * k + 1)
    } else {
        k + ceil_log2(k + 1)
    };
    while find_k(n, correct_substitutions) < k {
        n += 1;
    }
    n
}

/// A binary VT code of fixed length
#[derive(Debug, Clone)]
pub struct VtCode {
    n: usize,
    k: usize,
    m: usize,
    a: usize,
    correct_substitutions: bool,
    /// 1-indexed parity positions, ascending
    parity_positions: Vec<usize>,
    /// 1-indexed message positions, ascending
    systematic_positions: Vec<usize>,
}

impl VtCode {
    /// Create a code of length `n` with target syndrome `a`
    ///
    /// # Errors
    /// Returns `InvalidConfig` if `n < 2`, the code has no message
    /// capacity, or `a` is not below the modulus.
    pub fn new(n: usize, a: usize, correct_substitutions: bool) -> Result<Self> {
        if n < 2 {
            return Err(Error::InvalidConfig(format!(
                "VT codeword length must be >= 2, got {}",
                n
            )));
        }

        let k = find_k(n, correct_substitutions);
        if k == 0 {
            return Err(Error::InvalidConfig(format!(
                "VT code of length {} carries no message bits",
                n
            )));
        }

        let m = if correct_substitutions { 2 * n + 1 } else { n + 1 };
        if a >= m {
            return Err(Error::InvalidConfig(format!(
                "VT syndrome {} must be below modulus {}",
                a, m
            )));
        }

        let parity_positions = parity_positions(n, correct_substitutions);
        if parity_positions.len() != n - k {
            return Err(Error::Internal(format!(
                "VT parity layout has {} slots, expected {}",
                parity_positions.len(),
                n - k
            )));
        }

        let systematic_positions = (1..=n)
            .filter(|pos| !parity_positions.contains(pos))
            .collect();

        Ok(VtCode {
            n,
            k,
            m,
            a,
            correct_substitutions,
            parity_positions,
            systematic_positions,
        })
    }

    /// Create the shortest code carrying `k` message bits
    pub fn for_message_len(k: usize, a: usize, correct_substitutions: bool) -> Result<Self> {
        Self::new(find_smallest_n(k, correct_substitutions), a, correct_substitutions)
    }

    /// Codeword length
    pub fn n(&self) -> usize {
        self.n
    }

    /// Message capacity in bits
    pub fn k(&self) -> usize {
        self.k
    }

    /// Syndrome modulus
    pub fn modulus(&self) -> usize {
        self.m
    }

    /// Whether single substitutions are corrected
    pub fn corrects_substitutions(&self) -> bool {
        self.correct_substitutions
    }

    /// 1-indexed parity positions
    pub fn parity_positions(&self) -> &[usize] {
        &self.parity_positions
    }

    /// Encode up to `k` message bits into a length-`n` codeword
    ///
    /// Shorter messages are zero-filled on the trailing systematic slots.
    pub fn encode(&self, message: &[u8]) -> Result<Vec<u8>> {
        if message.len() > self.k {
            return Err(Error::InvalidLength {
                expected: self.k,
                actual: message.len(),
            });
        }
        if let Some(position) = message.iter().position(|&bit| bit > 1) {
            return Err(Error::InvalidSymbol {
                symbol: char::from_digit(u32::from(message[position]), 10).unwrap_or('?'),
                position,
            });
        }

        let mut word = vec![0u8; self.n];
        for (&pos, &bit) in self.systematic_positions.iter().zip(message) {
            word[pos - 1] = bit;
        }

        // Largest parity weights first; each one taken reduces the residual.
        let mut residual = self.syndrome(&word);
        for &pos in self.parity_positions.iter().rev() {
            if residual == 0 {
                break;
            }
            if residual >= pos {
                word[pos - 1] = 1;
                residual -= pos;
            }
        }

        if !self.is_codeword(&word) {
            return Err(Error::Internal(format!(
                "VT encoding left residual syndrome {}",
                self.syndrome(&word)
            )));
        }

        Ok(word)
    }

    /// Decode a received word of length `n - 1`, `n` or `n + 1`
    ///
    /// Returns the `k` message bits, or `None` when the word cannot be
    /// brought back to a valid codeword with a single correction.
    pub fn decode(&self, received: &[u8]) -> Option<Vec<u8>> {
        let len = received.len();
        if len + 1 < self.n || len > self.n + 1 {
            return None;
        }
        if received.iter().any(|&bit| bit > 1) {
            return None;
        }

        let word = if len != self.n {
            self.correct_indel(received)?
        } else if self.correct_substitutions && !self.is_codeword(received) {
            self.correct_substitution(received)?
        } else {
            received.to_vec()
        };

        if !self.is_codeword(&word) {
            return None;
        }

        Some(
            self.systematic_positions
                .iter()
                .map(|&pos| word[pos - 1])
                .collect(),
        )
    }

    /// Whether `word` is a valid codeword of this code
    pub fn is_codeword(&self, word: &[u8]) -> bool {
        word.len() == self.n && self.syndrome(word) == 0
    }

    /// `(a - sum((i + 1) * y[i])) mod m`
    fn syndrome(&self, word: &[u8]) -> usize {
        let weighted = word
            .iter()
            .enumerate()
            .filter(|(_, &bit)| bit == 1)
            .fold(0usize, |acc, (i, _)| (acc + i + 1) % self.m);
        (self.a + self.m - weighted) % self.m
    }

    fn correct_indel(&self, received: &[u8]) -> Option<Vec<u8>> {
        let s = self.syndrome(received);
        let w = received.iter().filter(|&&bit| bit == 1).count();
        if received.len() + 1 == self.n {
            self.restore_deletion(received, s, w)
        } else {
            self.remove_insertion(received, s, w)
        }
    }

    fn restore_deletion(&self, y: &[u8], s: usize, w: usize) -> Option<Vec<u8>> {
        let mut out = Vec::with_capacity(self.n);

        if s == 0 {
            // trailing 0 lost
            out.extend_from_slice(y);
            out.push(0);
        } else if s <= w {
            // a 0 was lost with s ones to its right
            let idx = y
                .iter()
                .enumerate()
                .rev()
                .filter(|(_, &bit)| bit == 1)
                .nth(s - 1)
                .map(|(i, _)| i)?;
            out.extend_from_slice(&y[..idx]);
            out.push(0);
            out.extend_from_slice(&y[idx..]);
        } else {
            // a 1 was lost with s - w - 1 zeros to its left
            let zeros_left = s - w - 1;
            if zeros_left == 0 {
                out.push(1);
                out.extend_from_slice(y);
            } else {
                let idx = y
                    .iter()
                    .enumerate()
                    .filter(|(_, &bit)| bit == 0)
                    .nth(zeros_left - 1)
                    .map(|(i, _)| i)?;
                out.extend_from_slice(&y[..=idx]);
                out.push(1);
                out.extend_from_slice(&y[idx + 1..]);
            }
        }

        Some(out)
    }

    fn remove_insertion(&self, y: &[u8], s: usize, w: usize) -> Option<Vec<u8>> {
        let n = self.n;
        let m = self.m;

        let drop_at = if s == m - n - 1 || s == 0 {
            n
        } else if s == m - w {
            0
        } else if s > m - w {
            // a 0 was inserted with m - s ones to its right
            let ones_right = m - s;
            let mut seen = 0;
            let mut found = None;
            for i in (2..=n).rev() {
                if y[i] == 1 {
                    seen += 1;
                    if seen == ones_right {
                        found = (y[i - 1] == 0).then_some(i - 1);
                        break;
                    }
                }
            }
            found?
        } else {
            // a 1 was inserted with m - w - s zeros to its left
            let zeros_left = m - w - s;
            let mut seen = 0;
            let mut found = None;
            for i in 0..n - 1 {
                if y[i] == 0 {
                    seen += 1;
                    if seen == zeros_left {
                        found = (y[i + 1] == 1).then_some(i + 1);
                        break;
                    }
                }
            }
            found?
        };

        let mut out = Vec::with_capacity(n);
        out.extend_from_slice(&y[..drop_at]);
        out.extend_from_slice(&y[drop_at + 1..]);
        Some(out)
    }

    fn correct_substitution(&self, y: &[u8]) -> Option<Vec<u8>> {
        let n = self.n;
        let s = self.syndrome(y);
        let mut out = y.to_vec();

        if s == 0 {
            return Some(out);
        }
        if s <= n {
            // 1 read as 0 at position s
            out[s - 1] = 1;
        } else {
            // 0 read as 1 at position 2n + 1 - s
            let pos = 2 * n + 1 - s;
            if pos == 0 {
                return None;
            }
            out[pos - 1] = 0;
        }

        Some(out)
    }
}

/// Power-of-two parity slots, with the substitution-mode tail rule:
/// if the last power of two already lands on `n`, it moves to `n - 1`
/// and `n` takes the extra bit; otherwise the extra bit goes to `n`.
fn parity_positions(n: usize, correct_substitutions: bool) -> Vec<usize> {
    let t = ceil_log2(n + 1);
    let mut positions: Vec<usize> = (0..t).map(|i| 1usize << i).collect();

    if correct_substitutions {
        if positions[t - 1] == n {
            positions[t - 1] = n - 1;
        }
        positions.push(n);
    }

    positions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message_bits(value: usize, k: usize) -> Vec<u8> {
        (0..k).map(|i| ((value >> i) & 1) as u8).collect()
    }

    fn all_messages(k: usize) -> impl Iterator<Item = Vec<u8>> {
        (0..(1usize << k)).map(move |v| message_bits(v, k))
    }

    #[test]
    fn test_find_k() {
        assert_eq!(find_k(7, false), 4);
        assert_eq!(find_k(8, true), 3);
        assert_eq!(find_k(155, true), 146);
        assert_eq!(find_k(1, true), 0);
    }

    #[test]
    fn test_capacity_bound_and_minimality() {
        for substitutions in [false, true] {
            for k in 1..400 {
                let n = find_smallest_n(k, substitutions);
                assert!(find_k(n, substitutions) >= k, "k={} n={}", k, n);
                assert!(find_k(n - 1, substitutions) < k, "k={} n={} not minimal", k, n);
            }
        }
    }

    #[test]
    fn test_reference_deployment_length() {
        // 146-digit words travel as 155-symbol oligo payloads
        assert_eq!(find_smallest_n(146, true), 155);
    }

    #[test]
    fn test_parity_layout() {
        assert_eq!(parity_positions(7, false), vec![1, 2, 4]);
        assert_eq!(parity_positions(9, true), vec![1, 2, 4, 8, 9]);
        // last power of two coincides with n: shifted to n - 1
        assert_eq!(parity_positions(8, true), vec![1, 2, 4, 7, 8]);
        assert_eq!(parity_positions(16, true), vec![1, 2, 4, 8, 15, 16]);
    }

    #[test]
    fn test_invalid_codes() {
        assert!(VtCode::new(1, 0, false).is_err());
        assert!(VtCode::new(4, 0, true).is_err());
        assert!(VtCode::new(10, 11, false).is_err());
        assert!(VtCode::new(10, 20, true).is_ok());
        assert!(VtCode::new(10, 21, true).is_err());
    }

    #[test]
    fn test_encode_rejects_bad_input() {
        let code = VtCode::new(12, 0, true).unwrap();
        assert!(code.encode(&vec![0; code.k() + 1]).is_err());
        assert!(code.encode(&[0, 2, 1]).is_err());
    }

    #[test]
    fn test_every_encoding_is_a_codeword() {
        for n in [7, 8, 9, 12, 16] {
            for substitutions in [false, true] {
                let code = VtCode::new(n, 0, substitutions).unwrap();
                for msg in all_messages(code.k()) {
                    let word = code.encode(&msg).unwrap();
                    assert!(code.is_codeword(&word));
                    assert_eq!(code.decode(&word).unwrap(), msg);
                }
            }
        }
    }

    #[test]
    fn test_nonzero_syndrome_target() {
        let code = VtCode::new(12, 5, true).unwrap();
        for msg in all_messages(code.k()) {
            let word = code.encode(&msg).unwrap();
            assert_eq!(code.decode(&word).unwrap(), msg);
        }
    }

    #[test]
    fn test_single_deletion_every_position() {
        for n in [8, 11, 16] {
            for substitutions in [false, true] {
                let code = VtCode::new(n, 0, substitutions).unwrap();
                for msg in all_messages(code.k()) {
                    let word = code.encode(&msg).unwrap();
                    for pos in 0..n {
                        let mut damaged = word.clone();
                        damaged.remove(pos);
                        assert_eq!(
                            code.decode(&damaged).as_deref(),
                            Some(msg.as_slice()),
                            "n={} pos={} word={:?}",
                            n,
                            pos,
                            word
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_single_insertion_every_position() {
        for n in [8, 11, 16] {
            for substitutions in [false, true] {
                let code = VtCode::new(n, 0, substitutions).unwrap();
                for msg in all_messages(code.k()) {
                    let word = code.encode(&msg).unwrap();
                    for pos in 0..=n {
                        for bit in [0u8, 1] {
                            let mut damaged = word.clone();
                            damaged.insert(pos, bit);
                            assert_eq!(
                                code.decode(&damaged).as_deref(),
                                Some(msg.as_slice()),
                                "n={} pos={} bit={} word={:?}",
                                n,
                                pos,
                                bit,
                                word
                            );
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_single_substitution_every_position() {
        for n in [8, 11, 16, 21] {
            let code = VtCode::new(n, 0, true).unwrap();
            for msg in all_messages(code.k()) {
                let word = code.encode(&msg).unwrap();
                for pos in 0..n {
                    let mut damaged = word.clone();
                    damaged[pos] ^= 1;
                    assert_eq!(
                        code.decode(&damaged).as_deref(),
                        Some(msg.as_slice()),
                        "n={} pos={}",
                        n,
                        pos
                    );
                }
            }
        }
    }

    #[test]
    fn test_substitution_without_correction_fails() {
        let code = VtCode::new(11, 0, false).unwrap();
        let word = code.encode(&[1, 0, 1, 1, 0, 1, 0]).unwrap();
        let mut damaged = word.clone();
        damaged[3] ^= 1;
        assert!(code.decode(&damaged).is_none());
    }

    #[test]
    fn test_wrong_lengths_rejected() {
        let code = VtCode::new(12, 0, true).unwrap();
        assert!(code.decode(&[0; 10]).is_none());
        assert!(code.decode(&[0; 14]).is_none());
        assert!(code.decode(&[0, 1, 2, 0, 0, 0, 0, 0, 0, 0, 0, 0]).is_none());
    }

    #[test]
    fn test_short_message_is_zero_filled() {
        let code = VtCode::new(16, 0, true).unwrap();
        let word = code.encode(&[1, 1]).unwrap();
        let decoded = code.decode(&word).unwrap();
        assert_eq!(&decoded[..2], &[1, 1]);
        assert!(decoded[2..].iter().all(|&b| b == 0));
    }
}
