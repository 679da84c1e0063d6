//! End-to-end encode and decode
//!
//! Encode: bytes -> RS layer -> quaternary stream -> framer -> VT -> strands.
//! Decode: strands -> VT (parallel, failures dropped) -> framer -> consensus
//! -> RS layer -> bytes cut to the registered length.
//!
//! Files with different chunk counts can carry position tags of different
//! widths, so one pool may hold several strand lengths. Each distinct word
//! length gets its own inner code and a read is tried against every code
//! whose length is within one symbol of it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use crate::config::CodecConfig;
use crate::error::{Error, Result};
use crate::framer::{Candidate, Framer, Unframed};
use crate::registry::{FileEntry, FileRegistry};
use crate::rs::{RsDecodeReport, RsLayer};
use crate::symbol::{bytes_to_digits, digits_to_bytes, div_ceil};
use crate::vt::QuaternaryVt;

/// Summary of one encode run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EncodeStats {
    /// Files encoded
    pub files: usize,
    /// Input size in bytes
    pub raw_bytes: u64,
    /// Strands in the pool
    pub transmitted_oligos: usize,
    /// All-zero chunks left out of the pool
    pub skipped_zero_chunks: usize,
    /// Longest strand in digits (primers excluded)
    pub codeword_len: usize,
    /// Total digits across all strands
    pub nucleotides: u64,
    /// Input bits per nucleotide
    pub information_density: f64,
}

/// Strands plus the manifest needed to decode them
#[derive(Debug, Clone)]
pub struct EncodedPool {
    pub codewords: Vec<Vec<u8>>,
    pub registry: FileRegistry,
    pub stats: EncodeStats,
}

/// Per-file decode outcome
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReport {
    pub file_id: usize,
    /// RS counters for this file alone
    pub rs: RsDecodeReport,
    /// Chunk positions with no surviving read
    pub empty_chunks: usize,
    /// Content hash check; `None` when the registry carries no hash
    pub intact: Option<bool>,
}

/// Counters for one decode run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeReport {
    /// Reads offered to the decoder
    pub reads: usize,
    /// Reads no inner code could decode
    pub vt_failures: usize,
    /// Reads whose id or position tag was out of range
    pub out_of_range_discards: usize,
    /// RS counters over all files
    pub rs: RsDecodeReport,
    /// Chunk positions with no surviving read, over all files
    pub empty_chunks: usize,
    pub files: Vec<FileReport>,
}

impl DecodeReport {
    /// Files whose content hash matched
    pub fn intact_files(&self) -> usize {
        self.files.iter().filter(|f| f.intact == Some(true)).count()
    }
}

/// Decoded files in id order plus counters
#[derive(Debug, Clone)]
pub struct DecodedPool {
    pub files: Vec<Vec<u8>>,
    pub report: DecodeReport,
}

/// Number of differing bytes, counting a length difference as errors
pub fn compare_bytes(original: &[u8], decoded: &[u8]) -> usize {
    let mismatched = original
        .iter()
        .zip(decoded)
        .filter(|(a, b)| a != b)
        .count();
    mismatched + original.len().abs_diff(decoded.len())
}

/// One inner code per distinct word length in the registry
#[derive(Debug, Clone)]
struct InnerCodes {
    /// Keyed by framed-word length
    codes: BTreeMap<usize, QuaternaryVt>,
}

impl InnerCodes {
    fn new(framer: &Framer<'_>, config: &CodecConfig) -> Result<Self> {
        let mut codes = BTreeMap::new();
        for (id, _) in framer.registry().iter() {
            let Some(layout) = framer.layout_for(id) else {
                continue;
            };
            let word_len = layout.word_len();
            if !codes.contains_key(&word_len) {
                let code =
                    QuaternaryVt::new(word_len, config.vt_syndrome, config.correct_substitutions)?;
                debug!(
                    "Inner code for {}-digit words: {} digit strands",
                    word_len,
                    code.codeword_len()
                );
                codes.insert(word_len, code);
            }
        }
        Ok(InnerCodes { codes })
    }

    fn for_word(&self, word_len: usize) -> Result<&QuaternaryVt> {
        self.codes.get(&word_len).ok_or_else(|| {
            Error::Internal(format!("no inner code for {}-digit words", word_len))
        })
    }

    /// Codes whose strand length is within one symbol of `len`, exact
    /// length first
    fn candidates(&self, len: usize) -> Vec<&QuaternaryVt> {
        let mut codes: Vec<&QuaternaryVt> = self
            .codes
            .values()
            .filter(|code| code.codeword_len().abs_diff(len) <= 1)
            .collect();
        codes.sort_by_key(|code| code.codeword_len().abs_diff(len));
        codes
    }
}

/// What became of one read in the inner stage
enum ReadOutcome {
    Accepted(Candidate),
    VtFailure,
    Discarded,
}

/// Bytes to strands
#[derive(Debug, Clone)]
pub struct LadderEncoder {
    config: CodecConfig,
    rs: RsLayer,
}

impl LadderEncoder {
    /// Create an encoder from a validated configuration
    pub fn new(config: CodecConfig) -> Result<Self> {
        config.validate()?;
        let rs = RsLayer::new(config.radix)?;
        Ok(LadderEncoder { config, rs })
    }

    /// The active configuration
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Encode an ordered set of files; file `i` gets id `i`
    pub fn encode<B: AsRef<[u8]>>(&self, files: &[B]) -> Result<EncodedPool> {
        let length_ary = self.config.length_ary();

        let mut streams = Vec::with_capacity(files.len());
        let mut entries = Vec::with_capacity(files.len());
        for file in files {
            let raw = file.as_ref();
            let digits = bytes_to_digits(&self.rs.encode(raw)?);
            let chunk_count = div_ceil(digits.len(), length_ary) as u64;
            entries.push(FileEntry::new(raw, 2 * digits.len() as u64, chunk_count));
            streams.push(digits);
        }

        let registry = FileRegistry::new(entries)?;
        let framer = Framer::new(&registry, length_ary, self.config.seed)?;
        let inner = InnerCodes::new(&framer, &self.config)?;

        let mut stats = EncodeStats {
            files: registry.len(),
            ..EncodeStats::default()
        };
        let mut codewords = Vec::new();
        for (id, stream) in streams.iter().enumerate() {
            let framed = framer.frame_file(id, stream)?;
            stats.skipped_zero_chunks += framed.skipped_zero_chunks;

            for word in framed.words {
                let codeword = inner.for_word(word.digits.len())?.encode(&word.digits)?;
                stats.codeword_len = stats.codeword_len.max(codeword.len());
                stats.nucleotides += codeword.len() as u64;
                codewords.push(codeword);
            }
        }

        stats.raw_bytes = registry.iter().map(|(_, e)| e.raw_length).sum();
        stats.transmitted_oligos = codewords.len();
        if stats.nucleotides > 0 {
            stats.information_density = (stats.raw_bytes * 8) as f64 / stats.nucleotides as f64;
        }

        info!(
            "Encoded {} files ({} bytes) into {} oligos of up to {} nt, {} zero chunks skipped",
            stats.files,
            stats.raw_bytes,
            stats.transmitted_oligos,
            stats.codeword_len,
            stats.skipped_zero_chunks
        );

        Ok(EncodedPool {
            codewords,
            registry,
            stats,
        })
    }
}

/// Noisy, unordered reads back to bytes
#[derive(Debug, Clone)]
pub struct LadderDecoder {
    config: CodecConfig,
    rs: RsLayer,
}

impl LadderDecoder {
    /// Create a decoder from a validated configuration
    pub fn new(config: CodecConfig) -> Result<Self> {
        config.validate()?;
        let rs = RsLayer::new(config.radix)?;
        Ok(LadderDecoder { config, rs })
    }

    /// The active configuration
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Check that `registry` can have come from this configuration
    pub fn check_registry(&self, registry: &FileRegistry) -> Result<()> {
        registry.validate(self.config.length_ary())?;
        for (id, entry) in registry.iter() {
            let expected = usize::try_from(entry.raw_length)
                .ok()
                .and_then(|raw| (self.rs.encoded_len(raw) as u64).checked_mul(8));
            if expected != Some(entry.rs_encoded_length) {
                return Err(Error::InvalidRegistry(format!(
                    "file {}: RS stream length {} bits does not match {} bytes at radix {}",
                    id,
                    entry.rs_encoded_length,
                    entry.raw_length,
                    self.rs.radix()
                )));
            }
        }
        Ok(())
    }

    /// Decode a pool of reads against its registry
    ///
    /// # Errors
    /// Only a registry that does not fit the configuration is an error.
    /// Damaged reads and blocks are counted in the report.
    pub fn decode(&self, reads: &[Vec<u8>], registry: &FileRegistry) -> Result<DecodedPool> {
        self.check_registry(registry)?;

        let framer = Framer::new(registry, self.config.length_ary(), self.config.seed)?;
        let inner = InnerCodes::new(&framer, &self.config)?;

        let mut report = DecodeReport {
            reads: reads.len(),
            ..DecodeReport::default()
        };

        let mut assembler = framer.assembler();
        for outcome in self.inner_stage(reads, &inner, &framer)? {
            match outcome {
                ReadOutcome::Accepted(c) => assembler.insert(c.file_id, c.position, c.payload),
                ReadOutcome::VtFailure => report.vt_failures += 1,
                ReadOutcome::Discarded => report.out_of_range_discards += 1,
            }
        }
        debug!(
            "Inner stage: {} reads, {} VT failures, {} discarded, {} buckets filled",
            report.reads,
            report.vt_failures,
            report.out_of_range_discards,
            assembler.occupied()
        );
        if report.vt_failures > 0 || report.out_of_range_discards > 0 {
            warn!(
                "{} of {} reads dropped: {} failed the inner code, {} had tags out of range",
                report.vt_failures + report.out_of_range_discards,
                report.reads,
                report.vt_failures,
                report.out_of_range_discards
            );
        }

        let mut files = Vec::with_capacity(registry.len());
        for ((id, entry), rebuilt) in registry.iter().zip(framer.reassemble(&assembler)) {
            let encoded = digits_to_bytes(&rebuilt.digits);
            let (data, rs) = self.rs.decode(&encoded, entry.raw_length as usize)?;

            let intact = if entry.content_hash.is_empty() {
                None
            } else {
                Some(entry.matches(&data))
            };
            if intact == Some(false) {
                warn!("File {} does not match its content hash", id);
            }

            report.rs.merge(&rs);
            report.empty_chunks += rebuilt.empty_chunks;
            report.files.push(FileReport {
                file_id: id,
                rs,
                empty_chunks: rebuilt.empty_chunks,
                intact,
            });
            files.push(data);
        }

        info!(
            "Decoded {} files: {} VT failures, {} out-of-range discards, {} of {} RS blocks failed",
            files.len(),
            report.vt_failures,
            report.out_of_range_discards,
            report.rs.failed_blocks,
            report.rs.blocks
        );

        Ok(DecodedPool { files, report })
    }

    /// Run the inner code over every read, split across worker threads
    ///
    /// Outcomes come back in read order so that vote ties resolve the
    /// same way regardless of the worker count.
    fn inner_stage(
        &self,
        reads: &[Vec<u8>],
        inner: &InnerCodes,
        framer: &Framer<'_>,
    ) -> Result<Vec<ReadOutcome>> {
        if reads.is_empty() {
            return Ok(Vec::new());
        }
        let workers = self.config.resolved_workers().min(reads.len());
        let batch = div_ceil(reads.len(), workers);

        std::thread::scope(|scope| {
            let handles: Vec<_> = reads
                .chunks(batch)
                .map(|reads| {
                    scope.spawn(move || {
                        reads
                            .iter()
                            .map(|read| decode_read(read, inner, framer))
                            .collect::<Vec<_>>()
                    })
                })
                .collect();

            let mut outcomes = Vec::with_capacity(reads.len());
            for handle in handles {
                let part = handle
                    .join()
                    .map_err(|_| Error::Internal("decode worker panicked".to_string()))?;
                outcomes.extend(part);
            }
            Ok(outcomes)
        })
    }
}

/// Inner-decode and unframe one read
///
/// The first code whose output unframes cleanly wins. A read that some
/// code decoded but that never unframed is a misdecode, not a VT failure.
fn decode_read(read: &[u8], inner: &InnerCodes, framer: &Framer<'_>) -> ReadOutcome {
    let mut misdecoded = false;
    for code in inner.candidates(read.len()) {
        let Some(word) = code.decode(read) else {
            continue;
        };
        match framer.unframe(&word) {
            Unframed::Accepted(candidate) => return ReadOutcome::Accepted(candidate),
            rejected => {
                trace!("Read of {} symbols rejected: {:?}", read.len(), rejected);
                misdecoded = true;
            }
        }
    }

    if misdecoded {
        ReadOutcome::Discarded
    } else {
        ReadOutcome::VtFailure
    }
}
