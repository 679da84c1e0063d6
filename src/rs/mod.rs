//! Outer code: interleaved Reed-Solomon over byte blocks
//!
//! The padded input is split into `radix` rows. Each row is cut into
//! 223-symbol messages (the last one possibly shorter) and each message
//! gets 32 parity symbols. Rows are then re-interleaved so that every
//! group of `radix` consecutive output bytes holds one symbol per row.
//!
//! Decoding never aborts on a bad block: the received message symbols are
//! passed through as-is and the failure is counted.

mod block;
mod interleave;

pub use block::{BlockCodec, BLOCK_LEN, MESSAGE_LEN, PARITY_LEN};
pub use interleave::{merge_rows, split_rows};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::symbol::div_ceil;

/// Outcome counters for one RS decode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RsDecodeReport {
    /// Blocks examined
    pub blocks: usize,
    /// Blocks beyond the correction budget (passed through raw)
    pub failed_blocks: usize,
    /// Symbols repaired in successfully decoded blocks
    pub corrected_symbols: usize,
}

impl RsDecodeReport {
    /// Fold another report into this one
    pub fn merge(&mut self, other: &RsDecodeReport) {
        self.blocks += other.blocks;
        self.failed_blocks += other.failed_blocks;
        self.corrected_symbols += other.corrected_symbols;
    }
}

/// Interleaved RS(255, 223) coder
#[derive(Debug, Clone)]
pub struct RsLayer {
    radix: usize,
    codec: BlockCodec,
}

impl RsLayer {
    /// Create a layer interleaving across `radix` rows
    pub fn new(radix: usize) -> Result<Self> {
        if radix == 0 {
            return Err(Error::InvalidConfig(
                "radix must be greater than 0".to_string(),
            ));
        }

        Ok(RsLayer {
            radix,
            codec: BlockCodec::new(PARITY_LEN)?,
        })
    }

    /// Number of interleaved rows
    pub fn radix(&self) -> usize {
        self.radix
    }

    /// Encoded size in bytes of a `raw_len`-byte input
    pub fn encoded_len(&self, raw_len: usize) -> usize {
        let row_len = div_ceil(raw_len, self.radix);
        self.encoded_row_len(row_len) * self.radix
    }

    fn encoded_row_len(&self, row_len: usize) -> usize {
        row_len + div_ceil(row_len, self.codec.max_message_len()) * self.codec.parity_len()
    }

    /// Message symbols carried by an encoded row of `encoded_row_len` symbols
    fn message_row_len(&self, encoded_row_len: usize) -> Result<usize> {
        let full = encoded_row_len / BLOCK_LEN;
        let tail = encoded_row_len % BLOCK_LEN;
        if tail != 0 && tail <= self.codec.parity_len() {
            return Err(Error::InvalidLength {
                expected: self.codec.parity_len() + 1,
                actual: tail,
            });
        }
        let tail_message = tail.saturating_sub(self.codec.parity_len());
        Ok(full * self.codec.max_message_len() + tail_message)
    }

    /// Pad, interleave and RS-encode `data`
    pub fn encode(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut padded = data.to_vec();
        padded.resize(div_ceil(data.len(), self.radix) * self.radix, 0);

        let rows = split_rows(&padded, self.radix)
            .iter()
            .map(|row| self.encode_row(row))
            .collect::<Result<Vec<_>>>()?;

        let encoded = merge_rows(&rows);
        debug!(
            "RS encoded {} bytes into {} bytes across {} rows",
            data.len(),
            encoded.len(),
            self.radix
        );
        Ok(encoded)
    }

    fn encode_row(&self, row: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.encoded_row_len(row.len()));
        for message in row.chunks(self.codec.max_message_len()) {
            out.extend_from_slice(&self.codec.encode(message)?);
        }
        Ok(out)
    }

    /// Decode an interleaved stream and truncate to `raw_len` bytes
    ///
    /// # Errors
    /// Only structural problems are errors: a stream whose length does not
    /// match the layer geometry or is too short for `raw_len`.
    pub fn decode(&self, encoded: &[u8], raw_len: usize) -> Result<(Vec<u8>, RsDecodeReport)> {
        if encoded.len() % self.radix != 0 {
            return Err(Error::InvalidLength {
                expected: div_ceil(encoded.len(), self.radix) * self.radix,
                actual: encoded.len(),
            });
        }

        let encoded_row_len = encoded.len() / self.radix;
        let message_row_len = self.message_row_len(encoded_row_len)?;
        if message_row_len * self.radix < raw_len {
            return Err(Error::InvalidLength {
                expected: self.encoded_len(raw_len),
                actual: encoded.len(),
            });
        }

        let mut report = RsDecodeReport::default();
        let rows: Vec<Vec<u8>> = split_rows(encoded, self.radix)
            .iter()
            .map(|row| self.decode_row(row, &mut report))
            .collect();

        if report.failed_blocks > 0 {
            warn!(
                "{} of {} RS blocks uncorrectable; passed through raw",
                report.failed_blocks, report.blocks
            );
        }

        let mut data = merge_rows(&rows);
        data.truncate(raw_len);
        Ok((data, report))
    }

    fn decode_row(&self, row: &[u8], report: &mut RsDecodeReport) -> Vec<u8> {
        let mut out = Vec::with_capacity(row.len());
        for block in row.chunks(BLOCK_LEN) {
            report.blocks += 1;
            match self.codec.decode(block) {
                Some((message, corrected)) => {
                    report.corrected_symbols += corrected;
                    out.extend_from_slice(&message);
                }
                None => {
                    report.failed_blocks += 1;
                    out.extend_from_slice(&block[..block.len() - self.codec.parity_len()]);
                }
            }
        }
        out
    }
}
