//! Error types for the DNA ladder codec
//!
//! Only configuration and manifest problems surface as errors. Channel
//! damage (failed VT reads, uncorrectable RS blocks, misattributed ids)
//! is counted in the decode report instead.

use thiserror::Error;

/// Result type alias using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the codec
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be read or written
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration values are out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Manifest is missing entries or structurally inconsistent
    #[error("Invalid file registry: {0}")]
    InvalidRegistry(String),

    /// Serialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A symbol outside the expected alphabet
    #[error("Invalid symbol {symbol:?} at position {position}")]
    InvalidSymbol { symbol: char, position: usize },

    /// A buffer had the wrong length for the requested operation
    #[error("Invalid length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// Internal invariant violated
    #[error("Internal error: {0}")]
    Internal(String),
}
