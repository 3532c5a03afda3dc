//! # Centralized Error Handling
//!
//! Unified error types for the entire crate using `thiserror`.

use thiserror::Error;

/// Main error type for Haploom operations
#[derive(Error, Debug)]
pub enum HaploomError {
    /// Precondition violations: shape mismatches, out-of-range indices,
    /// parameters outside their numeric domain
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// An arena chunk or scratch-buffer reservation failed
    #[error("Out of memory")]
    OutOfMemory,
}

/// Type alias for Results using HaploomError
pub type Result<T> = std::result::Result<T, HaploomError>;

impl HaploomError {
    /// Create an invalid argument error with a message
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}

impl From<std::collections::TryReserveError> for HaploomError {
    fn from(_: std::collections::TryReserveError) -> Self {
        Self::OutOfMemory
    }
}
