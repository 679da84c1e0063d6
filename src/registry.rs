//! File registry: the out-of-band manifest shared by encoder and decoder
//!
//! The registry is never inferred from the oligo pool. Encode produces it
//! and decode cannot start without it: it fixes the id width, every file's
//! position width, and the truncation lengths of both decode stages.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::symbol::{ceil_log2, div_ceil, round_up_even};

/// Per-file manifest entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileEntry {
    /// Original file size in bytes
    pub raw_length: u64,
    /// Length of the RS-encoded stream in bits
    pub rs_encoded_length: u64,
    /// Number of payload chunks the stream was tiled into
    pub chunk_count: u64,
    /// BLAKE3 hash of the original bytes
    pub content_hash: String,
}

impl FileEntry {
    /// Describe a file about to be framed
    pub fn new(raw: &[u8], rs_encoded_length: u64, chunk_count: u64) -> Self {
        FileEntry {
            raw_length: raw.len() as u64,
            rs_encoded_length,
            chunk_count,
            content_hash: blake3::hash(raw).to_hex().to_string(),
        }
    }

    /// Width of the position tag in bits (even)
    pub fn b_len(&self) -> usize {
        round_up_even(ceil_log2(self.chunk_count as usize))
    }

    /// RS-encoded stream length in quaternary digits
    pub fn rs_encoded_digits(&self) -> usize {
        (self.rs_encoded_length / 2) as usize
    }

    /// Whether `data` matches the recorded content hash
    pub fn matches(&self, data: &[u8]) -> bool {
        data.len() as u64 == self.raw_length
            && blake3::hash(data).to_hex().as_str() == self.content_hash
    }
}

/// Immutable mapping file-id -> entry (the id is the index)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileRegistry {
    files: Vec<FileEntry>,
}

impl FileRegistry {
    /// Build a registry from entries in file-id order
    pub fn new(files: Vec<FileEntry>) -> Result<Self> {
        if files.is_empty() {
            return Err(Error::InvalidRegistry(
                "registry must describe at least one file".to_string(),
            ));
        }
        Ok(FileRegistry { files })
    }

    /// Number of files
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Always false for a constructed registry
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Entry for `id`
    pub fn get(&self, id: usize) -> Option<&FileEntry> {
        self.files.get(id)
    }

    /// `(id, entry)` pairs in id order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &FileEntry)> {
        self.files.iter().enumerate()
    }

    /// Width of the file-id tag in bits (even)
    pub fn id_len(&self) -> usize {
        round_up_even(ceil_log2(self.files.len()))
    }

    /// Check every entry against the payload width in digits
    ///
    /// # Errors
    /// Returns `InvalidRegistry` when an entry's chunk count or stream
    /// length cannot have come from a payload of `length_ary` digits.
    pub fn validate(&self, length_ary: usize) -> Result<()> {
        if self.files.is_empty() {
            return Err(Error::InvalidRegistry("registry is empty".to_string()));
        }
        if length_ary == 0 {
            return Err(Error::InvalidRegistry(
                "payload width must be greater than 0".to_string(),
            ));
        }

        for (id, entry) in self.iter() {
            if entry.rs_encoded_length % 2 != 0 {
                return Err(Error::InvalidRegistry(format!(
                    "file {}: RS stream length {} bits is not a whole number of digits",
                    id, entry.rs_encoded_length
                )));
            }
            let expected = div_ceil(entry.rs_encoded_digits(), length_ary) as u64;
            if entry.chunk_count != expected {
                return Err(Error::InvalidRegistry(format!(
                    "file {}: chunk count {} does not match {} digits at width {}",
                    id,
                    entry.chunk_count,
                    entry.rs_encoded_digits(),
                    length_ary
                )));
            }
            let overflows = entry
                .raw_length
                .checked_mul(8)
                .map_or(true, |bits| bits > entry.rs_encoded_length);
            if overflows {
                return Err(Error::InvalidRegistry(format!(
                    "file {}: raw length {} exceeds encoded stream",
                    id, entry.raw_length
                )));
            }
        }

        Ok(())
    }

    /// Load a registry from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::InvalidRegistry(format!("Failed to read registry file: {}", e))
        })?;

        let registry: FileRegistry = serde_json::from_str(&content).map_err(|e| {
            Error::InvalidRegistry(format!("Failed to parse registry file: {}", e))
        })?;

        if registry.files.is_empty() {
            return Err(Error::InvalidRegistry("registry file lists no files".to_string()));
        }
        Ok(registry)
    }

    /// Save the registry as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Serialization(format!("Failed to serialize registry: {}", e)))?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }
}
