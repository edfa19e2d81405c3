//! Error types for frame construction and parsing.

use thiserror::Error;

/// Result alias for frame operations.
pub type Result<T> = std::result::Result<T, FrameError>;

/// Errors raised when a byte sequence does not form a valid frame.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// Variable-length payload exceeds the frame limit
    #[error("payload too large: {size} bytes (max {max})")]
    PayloadTooLarge {
        /// Actual payload size
        size: usize,
        /// Maximum allowed size
        max: usize,
    },

    /// Variable-length payload is empty
    #[error("empty payload")]
    EmptyPayload,

    /// Fixed-size frame has the wrong length
    #[error("length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch {
        /// Required frame size
        expected: usize,
        /// Size that was supplied
        actual: usize,
    },
}
