//! Structurally hashed and-inverter graphs.
//!
//! A [`Network`] owns all nodes of an AIG: the constant, primary inputs,
//! latch output placeholders and two-input and gates. Gates are created
//! exclusively through [`Network::and2`], which folds constant and
//! single-variable cases and deduplicates structurally equal gates through
//! a hash table keyed on the canonically ordered fanin pair, so the network
//! never contains two distinct gates computing the same conjunction of the
//! same edges.
//!
//! Complemented edges are free: a [`NodeRef`] packs a node index and a
//! complement bit into one word, following the AIGER literal convention
//! `code = 2 * index + complement`.
//!
//! The `strash-aiger` crate builds on this to read and write networks in
//! the binary AIGER format.

#![warn(missing_docs)]

mod error;
mod network;
mod node;

pub use error::NetworkError;
pub use network::Network;
pub use node::{AigNode, NodeRef};
