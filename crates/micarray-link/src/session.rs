//! Link session state machine.
//!
//! Owns the transport, the stream reassembler, and the handshake and
//! message-id state. All operations are blocking and bounded by an
//! explicit timeout; the session never spawns threads and never retries
//! on its own. It is meant to be driven by a single owning worker thread
//! so that audio and network components stay responsive elsewhere.

use std::time::{Duration, Instant};

use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use micarray_protocol::{
    Command, DeviceEvent, Frame, FrameReassembler, FrameType, ProtocolError,
    DEFAULT_REASSEMBLY_LIMIT, MAX_PAYLOAD_LEN,
};

use crate::error::LinkError;
use crate::transport::ByteTransport;

/// Size of the scratch buffer used per transport read.
const READ_CHUNK_SIZE: usize = 256;

/// Session tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkConfig {
    /// Interval between transport polls, in milliseconds.
    pub poll_interval_ms: u64,
    /// Ceiling on the reassembly buffer, in bytes.
    pub reassembly_limit: usize,
}

impl Default for LinkConfig {
    fn default() -> Self {
        LinkConfig {
            poll_interval_ms: 10,
            reassembly_limit: DEFAULT_REASSEMBLY_LIMIT,
        }
    }
}

/// Connection state of the link session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No link. The initial state, and where every transport failure,
    /// handshake timeout, or `close` lands.
    Disconnected,
    /// Waiting for the device's handshake frame.
    AwaitingHandshake,
    /// Handshake acknowledged; commands and reads are allowed.
    Ready,
}

/// A host-side session over the board's serial protocol.
///
/// Inbound bytes flow through the reassembler; the session acknowledges
/// the frames that require it, filters the ones that must never be
/// acknowledged, and hands decoded JSON to the caller. Outbound commands
/// get sequenced message ids and a bounded wait for the device's confirm.
pub struct LinkSession<T: ByteTransport> {
    transport: T,
    reassembler: FrameReassembler,
    config: LinkConfig,
    state: SessionState,
    next_msg_id: u16,
    read_buf: Vec<u8>,
}

impl<T: ByteTransport> LinkSession<T> {
    /// Create a session over `transport` with default tunables.
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, LinkConfig::default())
    }

    /// Create a session with explicit tunables.
    pub fn with_config(transport: T, config: LinkConfig) -> Self {
        LinkSession {
            reassembler: FrameReassembler::with_limit(config.reassembly_limit),
            transport,
            config,
            state: SessionState::Disconnected,
            next_msg_id: 1,
            read_buf: vec![0u8; READ_CHUNK_SIZE],
        }
    }

    /// Current connection state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Read-only view of the reassembler, for its traffic counters.
    pub fn reassembler(&self) -> &FrameReassembler {
        &self.reassembler
    }

    /// Establish the link: wait for the device's handshake and confirm it.
    ///
    /// The device announces itself with a Handshake frame as soon as its
    /// firmware is up; the host answers with a Confirm echoing the
    /// handshake's message id. Frames of any other type that arrive
    /// before the handshake are consumed and ignored. Callable again
    /// after a failure or `close`; each attempt starts from a clean
    /// reassembly buffer and un-handshaken state.
    pub fn connect(&mut self, timeout: Duration) -> Result<(), LinkError> {
        debug!("connecting, handshake timeout {:?}", timeout);
        self.state = SessionState::AwaitingHandshake;
        self.reassembler.clear();

        let deadline = Instant::now() + timeout;
        loop {
            self.poll_transport()?;
            while let Some(frame) = self.reassembler.next_frame() {
                if frame.frame_type == FrameType::Handshake {
                    debug!("handshake received, msg_id {}", frame.msg_id);
                    self.send_confirm(frame.msg_id)?;
                    self.state = SessionState::Ready;
                    return Ok(());
                }
                trace!("ignoring {:?} frame before handshake", frame.frame_type);
            }
            if Instant::now() >= deadline {
                self.state = SessionState::Disconnected;
                return Err(LinkError::HandshakeTimeout {
                    timeout_ms: timeout.as_millis() as u64,
                });
            }
            std::thread::sleep(self.poll_interval());
        }
    }

    /// Send a `{"type": kind, "content": content}` command and wait for
    /// an acknowledgement.
    ///
    /// Returns `Ok(true)` once a Confirm arrives, `Ok(false)` when the
    /// timeout elapses first. `Ok(false)` means "not observed to be
    /// acknowledged", not a protocol failure; whether to retry is the
    /// caller's decision.
    pub fn send_command(
        &mut self,
        kind: &str,
        content: Value,
        timeout: Duration,
    ) -> Result<bool, LinkError> {
        self.send(
            &Command::Raw {
                kind: kind.to_string(),
                content,
            },
            timeout,
        )
    }

    /// Send a typed [`Command`] and wait for an acknowledgement.
    pub fn send(&mut self, command: &Command, timeout: Duration) -> Result<bool, LinkError> {
        if self.state != SessionState::Ready {
            return Err(LinkError::NotReady);
        }

        let payload = command.to_payload();
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(ProtocolError::PayloadTooLong {
                max: MAX_PAYLOAD_LEN,
                actual: payload.len(),
            }
            .into());
        }

        let msg_id = self.next_msg_id;
        self.next_msg_id = self.next_msg_id.wrapping_add(1);

        debug!("sending '{}' command, msg_id {}", command.kind(), msg_id);
        self.write_frame(&Frame::new(FrameType::Master, msg_id, payload))?;
        self.await_confirm(timeout)
    }

    /// Read the next application message, acknowledging it.
    ///
    /// Polls until the timeout elapses or a Device/Master frame with a
    /// decodable JSON payload arrives; that frame is confirmed and its
    /// JSON returned. Confirm frames and the board's undocumented `0xFF`
    /// frames are consumed silently; answering an acknowledgement with
    /// an acknowledgement would loop forever. A well-framed payload that
    /// fails to decode is dropped and polling continues. `Ok(None)` on
    /// timeout is a normal outcome, not an error.
    pub fn read_message(&mut self, timeout: Duration) -> Result<Option<Value>, LinkError> {
        if self.state != SessionState::Ready {
            return Err(LinkError::NotReady);
        }

        let deadline = Instant::now() + timeout;
        loop {
            self.poll_transport()?;
            while let Some(frame) = self.reassembler.next_frame() {
                match frame.frame_type {
                    FrameType::Confirm | FrameType::Unknown(_) => {
                        trace!(
                            "consuming {:?} frame, msg_id {}",
                            frame.frame_type,
                            frame.msg_id
                        );
                    }
                    FrameType::Handshake => {
                        trace!("ignoring handshake while ready");
                    }
                    FrameType::Device | FrameType::Master => match frame.payload_json() {
                        Ok(value) => {
                            self.send_confirm(frame.msg_id)?;
                            return Ok(Some(value));
                        }
                        Err(e) => {
                            warn!(
                                "dropping {:?} frame msg_id {}: {}",
                                frame.frame_type, frame.msg_id, e
                            );
                        }
                    },
                }
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            std::thread::sleep(self.poll_interval());
        }
    }

    /// Read the next application message and route it to its typed form.
    pub fn read_event(&mut self, timeout: Duration) -> Result<Option<DeviceEvent>, LinkError> {
        Ok(self.read_message(timeout)?.map(DeviceEvent::from_value))
    }

    /// Drop the link. The transport itself stays with the session; call
    /// [`LinkSession::into_transport`] to take it back.
    pub fn close(&mut self) {
        debug!("closing link session");
        self.state = SessionState::Disconnected;
        self.reassembler.clear();
    }

    /// Consume the session, returning the transport.
    pub fn into_transport(self) -> T {
        self.transport
    }

    fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.config.poll_interval_ms)
    }

    /// Drain everything the transport currently has into the reassembler.
    fn poll_transport(&mut self) -> Result<(), LinkError> {
        loop {
            let n = match self.transport.read_available(&mut self.read_buf) {
                Ok(n) => n,
                Err(e) => {
                    self.state = SessionState::Disconnected;
                    return Err(LinkError::Transport(e));
                }
            };
            if n == 0 {
                return Ok(());
            }
            self.reassembler.push(&self.read_buf[..n]);
        }
    }

    fn write_frame(&mut self, frame: &Frame) -> Result<(), LinkError> {
        if let Err(e) = self.transport.write_all(&frame.encode()) {
            self.state = SessionState::Disconnected;
            return Err(LinkError::Transport(e));
        }
        Ok(())
    }

    fn send_confirm(&mut self, msg_id: u16) -> Result<(), LinkError> {
        trace!("confirming msg_id {}", msg_id);
        self.write_frame(&Frame::confirm(msg_id))
    }

    /// Wait for any Confirm frame.
    ///
    /// The board's confirms are not reliably tied to the command's
    /// message id, so the first Confirm of any id satisfies the wait.
    /// Frames of other types that arrive meanwhile are discarded.
    fn await_confirm(&mut self, timeout: Duration) -> Result<bool, LinkError> {
        let deadline = Instant::now() + timeout;
        loop {
            self.poll_transport()?;
            while let Some(frame) = self.reassembler.next_frame() {
                if frame.frame_type == FrameType::Confirm {
                    trace!("command confirmed (confirm msg_id {})", frame.msg_id);
                    return Ok(true);
                }
                debug!(
                    "discarding {:?} frame while awaiting confirm",
                    frame.frame_type
                );
            }
            if Instant::now() >= deadline {
                debug!("no confirm within {:?}", timeout);
                return Ok(false);
            }
            std::thread::sleep(self.poll_interval());
        }
    }
}
