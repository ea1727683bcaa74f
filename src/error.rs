//! Error types for stripe encoding

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while assembling and encoding stripes
#[derive(Error, Debug)]
pub enum Error {
    /// An allocation (cell copy, encode matrix or encode tables) failed
    #[error("Out of memory allocating {size} bytes for {what}")]
    OutOfMemory { size: usize, what: &'static str },

    /// Caller-supplied geometry, cursor or buffers are unusable
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for an `InvalidArgument` error.
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    /// Returns true for allocation failures, which a caller may retry.
    pub fn is_out_of_memory(&self) -> bool {
        matches!(self, Error::OutOfMemory { .. })
    }
}
