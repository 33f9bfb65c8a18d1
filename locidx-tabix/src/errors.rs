use std::io;
use thiserror::Error;

/// Error type for Tabix index loading and querying.
#[derive(Error, Debug)]
pub enum TabixError {
    /// IO error on the index or the data stream.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The index does not start with `TBI\1`.
    #[error("File doesn't appear to be a tabix index: bad magic {0:?}")]
    InvalidMagic([u8; 4]),

    /// The index ended in the middle of a table.
    #[error("Tabix index is truncated while reading {0}")]
    Truncated(&'static str),

    /// A header field holds a value no tabix index can have.
    #[error("Invalid tabix header: {0}")]
    InvalidHeader(String),

    /// A sequence name in the dictionary is not valid UTF-8.
    #[error("Invalid sequence name in tabix dictionary: {0}")]
    InvalidSequenceName(String),

    /// The name dictionary disagrees with the declared sequence count.
    #[error("Tabix header declares {expected} sequences but the dictionary holds {found}")]
    SequenceCountMismatch { expected: usize, found: usize },

    /// A data line whose coordinate columns cannot be decoded.
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// A region string such as `chr1:100-200` that cannot be parsed.
    #[error("Invalid region '{0}'")]
    InvalidRegion(String),

    /// A sequence name absent from the index dictionary.
    #[error("Unknown sequence '{0}'")]
    UnknownSequence(String),
}

/// Result type alias for locidx-tabix operations.
pub type Result<T> = std::result::Result<T, TabixError>;
