//! Crate error taxonomy.

use std::io;

/// Every fallible operation in this crate returns this error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The backing file could not be read, written, or was truncated mid-stream.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    /// A header field was implausible, or inconsistent with the rest of the file.
    #[error("malformed PFB file: {0}")]
    Format(String),

    /// An operation was invoked on a `Grid` that does not meet its prerequisites.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A coordinate, cell index, or clip rectangle fell outside the grid's extents.
    #[error("out of bounds: {0}")]
    OutOfBounds(String),

    /// The requested operation is not supported for the given arguments.
    #[error("unsupported: {0}")]
    Unsupported(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
