//! Protocol constants
//!
//! These constants define the frame type codes, wire-level markers, and
//! size bounds used in the microphone-array serial protocol.

// ============================================================================
// Wire Markers
// ============================================================================

/// Sync byte that starts every frame.
pub const SYNC_HEAD: u8 = 0xA5;
/// User id carried in host-originated frames.
pub const USER_ID: u8 = 0x01;

// ============================================================================
// Frame Type Codes
// ============================================================================

/// Handshake frame (device → host) establishing link liveness.
pub const MSG_TYPE_HANDSHAKE: u8 = 0x01;
/// Device report frame carrying JSON (wake events, DOA, etc.).
pub const MSG_TYPE_DEVICE: u8 = 0x02;
/// Acknowledgement frame echoing a prior frame's message id.
pub const MSG_TYPE_CONFIRM: u8 = 0x03;
/// Master (command/control) frame carrying JSON.
pub const MSG_TYPE_MASTER: u8 = 0x04;
/// Observed but undocumented frame type; passed through without semantics.
pub const MSG_TYPE_UNDOCUMENTED: u8 = 0xFF;

// ============================================================================
// Sizes
// ============================================================================

/// Frame header size: sync + user id + type + length (u16) + msg id (u16).
pub const FRAME_HEADER_SIZE: usize = 7;
/// Smallest complete frame: header plus the trailing checksum byte.
pub const MIN_FRAME_SIZE: usize = FRAME_HEADER_SIZE + 1;
/// Largest payload the device is known to send; a header advertising more
/// is treated as corrupt.
pub const MAX_PAYLOAD_LEN: usize = 4096;
/// Default ceiling on buffered bytes in the reassembler.
pub const DEFAULT_REASSEMBLY_LIMIT: usize = 8192;

// ============================================================================
// Device Event Codes
// ============================================================================

/// `eventType` value of a wake report inside an `aiui_event` message.
pub const EVENT_TYPE_WAKEUP: i64 = 4;
