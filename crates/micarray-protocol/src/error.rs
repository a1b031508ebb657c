//! Protocol error types.

use thiserror::Error;

/// Errors that can occur when working with the microphone-array protocol.
///
/// Frame-level corruption (bad sync, bad checksum) is not represented
/// here: the reassembler recovers from it locally and it never surfaces
/// as an error. These variants cover faults in an otherwise well-framed
/// payload.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Payload is not valid UTF-8.
    #[error("payload is not valid UTF-8")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// Payload is not valid JSON.
    #[error("payload is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Payload exceeds the maximum supported length.
    #[error("payload too long: maximum {max} bytes, got {actual}")]
    PayloadTooLong {
        /// Maximum allowed length.
        max: usize,
        /// Actual length supplied.
        actual: usize,
    },
}
