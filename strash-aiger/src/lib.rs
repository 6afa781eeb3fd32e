//! Binary AIGER parser and writer building [`strash::Network`]s.
//!
//! The binary AIGER format stores an and-inverter graph as a header line
//! `aig M I L O A`, the driver literals of all latches and outputs, and a
//! delta-compressed gate section whose implicit numbering (constant,
//! inputs, latches, gates) makes per-gate literals redundant. Two header
//! variants exist: `aig` stores the driver literals as one ASCII decimal
//! per line, `aig2` as a single delta-coded binary block.
//!
//! Unlike a flat representation, the parser feeds every decoded gate
//! through the structural-hashing chokepoint of [`strash::Network`], so
//! the result is deduplicated and constant-folded while it is read.

pub mod binary;
mod error;
mod token;
pub mod varint;

#[cfg(test)]
mod tests;

pub use error::{InnerReadError, ReadError, SyntaxError, WriteError};
