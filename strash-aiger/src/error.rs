use std::io;

pub use flussab::text::{LineColumn, SyntaxError};
use thiserror::Error;

/// Everything that can go wrong while reading a binary AIGER file.
///
/// This is used via [`ReadError`], which wraps this in a [`Box`].
#[derive(Error, Debug)]
pub enum InnerReadError {
    /// A generic syntax error containing a message and a source location.
    #[error(transparent)]
    Syntax(SyntaxError),
    /// An IO error.
    #[error("IO error during parsing: {}", .0)]
    Io(#[source] io::Error),
    /// A binary encoded value ended before its terminating byte, or does
    /// not fit the supported value range.
    #[error("{location}: malformed binary encoded value")]
    MalformedVarint {
        /// Start of the offending value.
        location: LineColumn,
    },
    /// The header line is self-contradictory: non-numeric fields, a missing
    /// newline, or counts that do not add up to the declared maximum
    /// variable index.
    #[error("{location}: {msg}")]
    HeaderInconsistent {
        /// Location of the offending header field.
        location: LineColumn,
        /// Description of the inconsistency.
        msg: String,
    },
    /// The header declares a feature this reader rejects rather than
    /// silently misreading, e.g. justice or fairness properties.
    #[error("{location}: {msg}")]
    UnsupportedFeature {
        /// Location of the offending header field.
        location: LineColumn,
        /// Description of the rejected feature.
        msg: String,
    },
    /// The input ended although the declared gate or literal counts require
    /// more data.
    #[error("{location}: unexpected end of input while reading {expected}")]
    TruncatedStream {
        /// Position where more data was required.
        location: LineColumn,
        /// What the reader was decoding when the input ran out.
        expected: &'static str,
    },
    /// A decoded literal references a variable that does not exist at this
    /// point of the strictly ordered file.
    #[error("{location}: {msg}")]
    DanglingReference {
        /// Location of the offending literal or delta.
        location: LineColumn,
        /// Description of the dangling reference.
        msg: String,
    },
    /// A structural violation while assembling the network.
    #[error(transparent)]
    Structure(#[from] strash::NetworkError),
}

/// Boxed version of [`InnerReadError`].
pub type ReadError = Box<InnerReadError>;

impl From<io::Error> for ReadError {
    fn from(err: io::Error) -> Self {
        Box::new(InnerReadError::Io(err))
    }
}

impl From<SyntaxError> for ReadError {
    fn from(err: SyntaxError) -> Self {
        Box::new(InnerReadError::Syntax(err))
    }
}

impl From<strash::NetworkError> for ReadError {
    fn from(err: strash::NetworkError) -> Self {
        Box::new(InnerReadError::Structure(err))
    }
}

/// Error produced when finalizing a write.
///
/// The writer defers IO errors; they surface when calling
/// [`Writer::finish`][crate::binary::Writer::finish].
pub type WriteError = io::Error;
