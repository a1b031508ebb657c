//! Link session error types.

use thiserror::Error;

use micarray_protocol::ProtocolError;

/// Errors surfaced by the link session.
///
/// Frame-level corruption is recovered inside the reassembler and never
/// appears here. A command that goes unacknowledged is reported as the
/// `Ok(false)` return of `send_command`, not as an error.
#[derive(Error, Debug)]
pub enum LinkError {
    /// Transport I/O failure. Fatal: the session drops to `Disconnected`.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// The device sent no handshake within the connect timeout. Fatal for
    /// this attempt; the caller may retry `connect`.
    #[error("no handshake from device within {timeout_ms} ms")]
    HandshakeTimeout {
        /// The timeout that elapsed, in milliseconds.
        timeout_ms: u64,
    },

    /// The operation requires a completed handshake.
    #[error("link is not ready")]
    NotReady,

    /// An outgoing payload could not be framed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
