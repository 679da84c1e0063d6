//! Scrambling keystream
//!
//! Framed words are whitened digit-wise with `(d + key) mod 4` so that
//! runs in the payload (RS padding, sparse files) do not turn into
//! homopolymer runs on the strand. This is composition control, not
//! encryption.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{Error, Result};

/// Payload width (digits) that selects the fixed reference key
pub const REFERENCE_PAYLOAD_WIDTH: usize = 136;

/// Fixed key of the reference deployment (146 digits)
pub const REFERENCE_KEY: &str = "02131213030120302130320121210321303132020231031021312031212021310123203010213120203012230303120121311032110320123020203131023031230121320301202132";

/// Quaternary keystream shared by encoder and decoder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keystream {
    digits: Vec<u8>,
}

impl Keystream {
    /// `len` pseudo-random digits drawn from `seed`
    ///
    /// Streams from one seed share their prefix, so a longer stream can
    /// scramble shorter words.
    pub fn seeded(seed: u64, len: usize) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Keystream {
            digits: (0..len).map(|_| rng.gen_range(0..4u8)).collect(),
        }
    }

    /// Keystream from a literal digit string
    pub fn from_literal(literal: &str) -> Result<Self> {
        let digits = literal
            .chars()
            .enumerate()
            .map(|(position, c)| match c.to_digit(4) {
                Some(d) => Ok(d as u8),
                None => Err(Error::InvalidSymbol {
                    symbol: c,
                    position,
                }),
            })
            .collect::<Result<Vec<u8>>>()?;

        if digits.is_empty() {
            return Err(Error::InvalidConfig("keystream literal is empty".to_string()));
        }
        Ok(Keystream { digits })
    }

    /// The fixed reference key
    pub fn reference() -> Self {
        Keystream {
            digits: REFERENCE_KEY.bytes().map(|b| b - b'0').collect(),
        }
    }

    /// Key selection: the reference width uses the literal key, every
    /// other width a seeded stream of `len` digits
    pub fn for_payload_width(length_ary: usize, seed: u64, len: usize) -> Self {
        if length_ary == REFERENCE_PAYLOAD_WIDTH {
            Self::reference()
        } else {
            Self::seeded(seed, len)
        }
    }

    /// Number of key digits before the stream repeats
    pub fn len(&self) -> usize {
        self.digits.len()
    }

    /// Whether the stream has no digits
    pub fn is_empty(&self) -> bool {
        self.digits.is_empty()
    }

    /// Key digit for word position `i` (cyclic)
    pub fn digit(&self, i: usize) -> u8 {
        if self.digits.is_empty() {
            0
        } else {
            self.digits[i % self.digits.len()]
        }
    }

    /// `word[i] = (word[i] + key[i]) mod 4`
    pub fn scramble(&self, word: &mut [u8]) {
        for (i, d) in word.iter_mut().enumerate() {
            *d = (*d + self.digit(i)) % 4;
        }
    }

    /// `word[i] = (word[i] - key[i]) mod 4`
    pub fn unscramble(&self, word: &mut [u8]) {
        for (i, d) in word.iter_mut().enumerate() {
            *d = (*d + 4 - self.digit(i)) % 4;
        }
    }
}
