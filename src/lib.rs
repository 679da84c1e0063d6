//! DNA Ladder - layered error-correcting codec for DNA data storage
//!
//! Files are protected by an interleaved Reed-Solomon outer code, cut into
//! fixed-width payloads tagged with file id and position, whitened with a
//! keystream, and wrapped in a Varshamov-Tenengolts inner code that repairs
//! a single insertion, deletion or substitution per strand. Decoding takes
//! an unordered, redundant pool of reads and rebuilds every file by
//! per-position consensus.

pub mod config;
pub mod consensus;
pub mod error;
pub mod framer;
pub mod oligo;
pub mod pipeline;
pub mod registry;
pub mod rs;
pub mod symbol;
pub mod vt;

pub use config::CodecConfig;
pub use error::{Error, Result};
pub use pipeline::{DecodeReport, DecodedPool, EncodedPool, LadderDecoder, LadderEncoder};
pub use registry::{FileEntry, FileRegistry};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{CodecConfig, OligoConfig};
    pub use crate::error::{Error, Result};
    pub use crate::pipeline::{
        compare_bytes, DecodeReport, DecodedPool, EncodeStats, EncodedPool, LadderDecoder,
        LadderEncoder,
    };
    pub use crate::registry::{FileEntry, FileRegistry};
}
