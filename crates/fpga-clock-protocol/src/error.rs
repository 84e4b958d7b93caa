//! Protocol error types.

use thiserror::Error;

/// Errors that can occur when decoding a reply.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Reply is shorter than [`REPLY_LEN`](crate::REPLY_LEN).
    #[error("reply too short: expected {expected} bytes, got {actual}")]
    ReplyTooShort {
        /// Expected length.
        expected: usize,
        /// Actual length received.
        actual: usize,
    },

    /// A reply byte is outside the range allowed for its field.
    #[error("{field} out of range: {value}")]
    FieldOutOfRange {
        /// Field name.
        field: &'static str,
        /// Offending value.
        value: u8,
    },
}
