use thiserror::Error;

/// Structural errors reported by [`Network`][crate::Network] operations and
/// the [`check`][crate::Network::check] integrity scan.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum NetworkError {
    /// A latch position past the end of the latch list was used.
    #[error("latch {0} does not exist")]
    NoSuchLatch(usize),
    /// The next-state driver of a latch was bound twice.
    #[error("next state of latch {0} is already bound")]
    NextAlreadyBound(usize),
    /// The next-state driver of a latch was never bound.
    #[error("latch {0} has no next state driver")]
    UnboundLatch(usize),
    /// Node index 0 is not the constant node.
    #[error("node index 0 is not the constant node")]
    MissingConstant,
    /// A constant node exists at a nonzero index.
    #[error("node {node} duplicates the constant node")]
    MisplacedConstant {
        /// Index of the offending node.
        node: u32,
    },
    /// An and gate has a fanin with an index not strictly smaller than its
    /// own.
    #[error("node {node} has fanin {fanin} with a higher or equal index")]
    FaninOrder {
        /// Index of the and gate.
        node: u32,
        /// Index of the offending fanin.
        fanin: u32,
    },
    /// An and gate stores its fanins in non-canonical order.
    #[error("node {node} stores its fanins in non-canonical order")]
    NonCanonicalAnd {
        /// Index of the and gate.
        node: u32,
    },
    /// Two distinct and gates share the same canonical fanin pair, or a
    /// gate is missing from the structural-hash table.
    #[error("node {node} is not the unique gate for its fanin pair")]
    DuplicateAnd {
        /// Index of the and gate.
        node: u32,
    },
}
