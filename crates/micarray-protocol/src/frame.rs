//! Frame encoding/decoding utilities.
//!
//! Every message on the serial link is carried in a fixed binary frame.
//! All multi-byte integers are little-endian:
//!
//! ```text
//! +------+---------+------+--------+--------+------------------+----------+
//! | sync | user_id | type | length | msg_id | payload          | checksum |
//! | 0xA5 | u8      | u8   | u16    | u16    | `length` bytes   | u8       |
//! +------+---------+------+--------+--------+------------------+----------+
//! ```
//!
//! The checksum is the two's complement of the byte sum over everything
//! that precedes it, so summing a whole frame (checksum included) yields
//! zero modulo 256.

use crate::constants::*;
use crate::error::ProtocolError;

/// Frame type code, mapped from byte 2 of the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameType {
    /// Device-initiated handshake establishing link liveness.
    Handshake,
    /// Device report carrying a JSON payload (wake events, DOA, etc.).
    Device,
    /// Acknowledgement echoing a prior frame's message id.
    Confirm,
    /// Command/control frame carrying a JSON payload.
    Master,
    /// Unrecognized type code, carried through without semantics.
    ///
    /// The device is known to emit `0xFF` frames whose purpose is
    /// undocumented; they must survive decoding without being assigned
    /// meaning.
    Unknown(u8),
}

impl From<u8> for FrameType {
    fn from(code: u8) -> Self {
        match code {
            MSG_TYPE_HANDSHAKE => FrameType::Handshake,
            MSG_TYPE_DEVICE => FrameType::Device,
            MSG_TYPE_CONFIRM => FrameType::Confirm,
            MSG_TYPE_MASTER => FrameType::Master,
            other => FrameType::Unknown(other),
        }
    }
}

impl From<FrameType> for u8 {
    fn from(frame_type: FrameType) -> Self {
        match frame_type {
            FrameType::Handshake => MSG_TYPE_HANDSHAKE,
            FrameType::Device => MSG_TYPE_DEVICE,
            FrameType::Confirm => MSG_TYPE_CONFIRM,
            FrameType::Master => MSG_TYPE_MASTER,
            FrameType::Unknown(code) => code,
        }
    }
}

/// A single protocol frame.
///
/// The sync byte, length field, and checksum are wire artifacts computed
/// during encode/decode and are not stored here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// User id from byte 1 of the header.
    pub user_id: u8,
    /// Frame type from byte 2 of the header.
    pub frame_type: FrameType,
    /// Message id used to correlate acknowledgements.
    pub msg_id: u16,
    /// Raw payload bytes (UTF-8 JSON for Device/Master frames).
    pub payload: Vec<u8>,
}

/// Outcome of trying to parse one frame from the start of a buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    /// A complete, checksum-valid frame. `consumed` is the number of
    /// buffer bytes it occupied.
    Complete {
        /// The decoded frame.
        frame: Frame,
        /// Total bytes consumed, header and checksum included.
        consumed: usize,
    },
    /// Not enough bytes buffered yet to finish the frame.
    Incomplete,
    /// The buffer does not start with a valid frame (bad sync byte,
    /// implausible length, or checksum mismatch).
    Corrupt,
}

/// Compute the frame checksum: two's complement of the byte sum.
pub fn checksum(data: &[u8]) -> u8 {
    let sum = data.iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
    (!sum).wrapping_add(1)
}

impl Frame {
    /// Create a host-originated frame.
    pub fn new(frame_type: FrameType, msg_id: u16, payload: Vec<u8>) -> Self {
        Frame {
            user_id: USER_ID,
            frame_type,
            msg_id,
            payload,
        }
    }

    /// Create the acknowledgement for a frame with the given message id.
    pub fn confirm(msg_id: u16) -> Self {
        Frame::new(FrameType::Confirm, msg_id, Vec::new())
    }

    /// Encode the frame for transmission, appending the checksum.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(MIN_FRAME_SIZE + self.payload.len());
        buf.push(SYNC_HEAD);
        buf.push(self.user_id);
        buf.push(self.frame_type.into());
        buf.extend_from_slice(&(self.payload.len() as u16).to_le_bytes());
        buf.extend_from_slice(&self.msg_id.to_le_bytes());
        buf.extend_from_slice(&self.payload);
        buf.push(checksum(&buf));
        buf
    }

    /// Try to parse one frame from the start of `buf`.
    ///
    /// The buffer is not required to have been pre-aligned: a first byte
    /// that is not the sync constant is reported as [`ParseOutcome::Corrupt`]
    /// rather than assumed away. A length field above [`MAX_PAYLOAD_LEN`]
    /// is likewise corrupt, so a damaged header can never make the caller
    /// wait on tens of kilobytes that will not arrive.
    pub fn parse(buf: &[u8]) -> ParseOutcome {
        if buf.len() < FRAME_HEADER_SIZE {
            return ParseOutcome::Incomplete;
        }
        if buf[0] != SYNC_HEAD {
            return ParseOutcome::Corrupt;
        }

        let length = u16::from_le_bytes([buf[3], buf[4]]) as usize;
        if length > MAX_PAYLOAD_LEN {
            return ParseOutcome::Corrupt;
        }

        let total = FRAME_HEADER_SIZE + length + 1;
        if buf.len() < total {
            return ParseOutcome::Incomplete;
        }

        let expected = checksum(&buf[..total - 1]);
        if buf[total - 1] != expected {
            return ParseOutcome::Corrupt;
        }

        let frame = Frame {
            user_id: buf[1],
            frame_type: FrameType::from(buf[2]),
            msg_id: u16::from_le_bytes([buf[5], buf[6]]),
            payload: buf[FRAME_HEADER_SIZE..FRAME_HEADER_SIZE + length].to_vec(),
        };

        ParseOutcome::Complete {
            frame,
            consumed: total,
        }
    }

    /// Decode the payload as UTF-8 JSON.
    pub fn payload_json(&self) -> Result<serde_json::Value, ProtocolError> {
        let text = std::str::from_utf8(&self.payload)?;
        Ok(serde_json::from_str(text)?)
    }
}
