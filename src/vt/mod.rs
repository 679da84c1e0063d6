//! Inner code: Varshamov-Tenengolts single-indel/substitution correction
//!
//! Runs first on decode. Until a strand is back at its nominal length
//! nothing downstream can trust symbol positions.

mod binary;
mod quaternary;

pub use binary::{find_k, find_smallest_n, VtCode};
pub use quaternary::QuaternaryVt;
