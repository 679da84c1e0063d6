//! RS(255, 223) block code over GF(2^8)
//!
//! Field arithmetic comes from `reed_solomon_erasure::galois_8`
//! (polynomial 0x11D, generator 2). Generator roots are `α^0 .. α^31`.
//! Polynomials passed around as codewords are stored highest degree
//! first; locator/evaluator polynomials are stored lowest degree first.
//!
//! Blocks shorter than 255 symbols are shortened codes: the missing
//! leading message symbols are implicit zeros.

use reed_solomon_erasure::galois_8::{div, exp, mul};

use crate::error::{Error, Result};

/// Symbols per full block
pub const BLOCK_LEN: usize = 255;

/// Parity symbols per block
pub const PARITY_LEN: usize = 32;

/// Message symbols per full block
pub const MESSAGE_LEN: usize = BLOCK_LEN - PARITY_LEN;

/// Systematic Reed-Solomon block encoder/decoder
#[derive(Debug, Clone)]
pub struct BlockCodec {
    parity_len: usize,
    /// Generator polynomial, highest degree first
    generator: Vec<u8>,
}

impl BlockCodec {
    /// Create a codec with `parity_len` check symbols per block
    pub fn new(parity_len: usize) -> Result<Self> {
        if parity_len == 0 || parity_len >= BLOCK_LEN {
            return Err(Error::InvalidConfig(format!(
                "parity length must be in 1..{}, got {}",
                BLOCK_LEN, parity_len
            )));
        }

        let generator = (0..parity_len).fold(vec![1u8], |acc, i| {
            poly_mul(&acc, &[1, alpha_pow(i)])
        });

        Ok(BlockCodec {
            parity_len,
            generator,
        })
    }

    /// Check symbols per block
    pub fn parity_len(&self) -> usize {
        self.parity_len
    }

    /// Largest message a single block carries
    pub fn max_message_len(&self) -> usize {
        BLOCK_LEN - self.parity_len
    }

    /// Append parity to `message`
    pub fn encode(&self, message: &[u8]) -> Result<Vec<u8>> {
        if message.is_empty() || message.len() > self.max_message_len() {
            return Err(Error::InvalidLength {
                expected: self.max_message_len(),
                actual: message.len(),
            });
        }

        let mut block = message.to_vec();
        block.resize(message.len() + self.parity_len, 0);

        // Synthetic division by the generator; the remainder is the parity.
        for i in 0..message.len() {
            let coef = block[i];
            if coef != 0 {
                for (j, &g) in self.generator.iter().enumerate().skip(1) {
                    block[i + j] ^= mul(g, coef);
                }
            }
        }
        block[..message.len()].copy_from_slice(message);

        Ok(block)
    }

    /// Correct a received block and return its message symbols
    ///
    /// Returns the message together with the number of corrected symbols,
    /// or `None` if the block holds more errors than the parity can fix.
    pub fn decode(&self, block: &[u8]) -> Option<(Vec<u8>, usize)> {
        if block.len() <= self.parity_len || block.len() > BLOCK_LEN {
            return None;
        }
        let message_len = block.len() - self.parity_len;

        let syndromes = self.syndromes(block);
        if syndromes.iter().all(|&s| s == 0) {
            return Some((block[..message_len].to_vec(), 0));
        }

        let (locator, errors) = berlekamp_massey(&syndromes);
        if errors == 0 || errors > self.parity_len / 2 {
            return None;
        }

        let positions = chien_search(&locator, block.len());
        if positions.len() != errors {
            return None;
        }

        let evaluator = {
            let mut omega = poly_mul(&syndromes, &locator);
            omega.truncate(self.parity_len);
            omega
        };
        let derivative = formal_derivative(&locator);

        let mut corrected = block.to_vec();
        for &i in &positions {
            let power = block.len() - 1 - i;
            let x = alpha_pow(power);
            let x_inv = div(1, x);
            let denominator = eval_low(&derivative, x_inv);
            if denominator == 0 {
                return None;
            }
            let magnitude = mul(x, div(eval_low(&evaluator, x_inv), denominator));
            corrected[i] ^= magnitude;
        }

        if self.syndromes(&corrected).iter().any(|&s| s != 0) {
            return None;
        }

        corrected.truncate(message_len);
        Some((corrected, positions.len()))
    }

    /// `S_j = r(α^j)` for `j` in `0..parity_len`
    fn syndromes(&self, block: &[u8]) -> Vec<u8> {
        (0..self.parity_len)
            .map(|j| eval_high(block, alpha_pow(j)))
            .collect()
    }
}

fn alpha_pow(power: usize) -> u8 {
    exp(2, power % 255)
}

/// Polynomial product; the convolution is the same for either coefficient order
fn poly_mul(p: &[u8], q: &[u8]) -> Vec<u8> {
    let mut out = vec![0u8; p.len() + q.len() - 1];
    for (i, &a) in p.iter().enumerate() {
        if a == 0 {
            continue;
        }
        for (j, &b) in q.iter().enumerate() {
            out[i + j] ^= mul(a, b);
        }
    }
    out
}

fn eval_high(poly: &[u8], x: u8) -> u8 {
    poly.iter().fold(0u8, |acc, &c| mul(acc, x) ^ c)
}

fn eval_low(poly: &[u8], x: u8) -> u8 {
    poly.iter().rev().fold(0u8, |acc, &c| mul(acc, x) ^ c)
}

/// Error locator `Λ(x)` (lowest degree first) and its degree
fn berlekamp_massey(syndromes: &[u8]) -> (Vec<u8>, usize) {
    let mut locator = vec![1u8];
    let mut previous = vec![1u8];
    let mut degree = 0usize;
    let mut shift = 1usize;
    let mut previous_discrepancy = 1u8;

    for n in 0..syndromes.len() {
        let mut discrepancy = syndromes[n];
        for i in 1..=degree {
            if let Some(&c) = locator.get(i) {
                discrepancy ^= mul(c, syndromes[n - i]);
            }
        }

        if discrepancy == 0 {
            shift += 1;
            continue;
        }

        let coef = div(discrepancy, previous_discrepancy);
        let mut next = locator.clone();
        if next.len() < previous.len() + shift {
            next.resize(previous.len() + shift, 0);
        }
        for (i, &b) in previous.iter().enumerate() {
            next[i + shift] ^= mul(coef, b);
        }

        if 2 * degree <= n {
            degree = n + 1 - degree;
            previous = std::mem::replace(&mut locator, next);
            previous_discrepancy = discrepancy;
            shift = 1;
        } else {
            locator = next;
            shift += 1;
        }
    }

    locator.truncate(degree + 1);
    (locator, degree)
}

/// Block indices `i` with `Λ(α^-(len-1-i)) == 0`
fn chien_search(locator: &[u8], block_len: usize) -> Vec<usize> {
    (0..block_len)
        .filter(|&i| {
            let power = block_len - 1 - i;
            let x_inv = div(1, alpha_pow(power));
            eval_low(locator, x_inv) == 0
        })
        .collect()
}

/// Formal derivative; in characteristic 2 only odd terms survive
fn formal_derivative(poly: &[u8]) -> Vec<u8> {
    poly.iter()
        .enumerate()
        .skip(1)
        .map(|(i, &c)| if i % 2 == 1 { c } else { 0 })
        .collect()
}
