//! Microphone-Array Serial Protocol
//!
//! This crate provides types and utilities for the binary serial protocol
//! spoken by the ring microphone-array DSP board. The protocol exchanges
//! fixed-layout frames over a half-duplex byte link; Device and Master
//! frames carry JSON `{"type", "content"}` payloads.
//!
//! # Protocol Overview
//!
//! The board initiates with a **Handshake** frame that the host must
//! answer with a **Confirm**. After that:
//!
//! - **Master** frames (host → board) carry commands such as
//!   `manual_wakeup`; the board answers each with a Confirm.
//! - **Device** frames (board → host) carry unsolicited reports such as
//!   wake-word events; the host answers each with a Confirm.
//! - **Confirm** frames are never themselves acknowledged, and neither is
//!   the board's undocumented `0xFF` frame type.
//!
//! This crate is sans-I/O: [`Frame`] and [`FrameReassembler`] work on
//! byte buffers, and the session layer that owns a transport lives in
//! `micarray-link`.
//!
//! # Example
//!
//! ```rust
//! use micarray_protocol::{Command, Frame, FrameReassembler, FrameType};
//!
//! // Build a command frame for transmission.
//! let payload = Command::ManualWakeup { beam: 0 }.to_payload();
//! let wire = Frame::new(FrameType::Master, 1, payload).encode();
//!
//! // Reassemble whatever comes back from the serial port.
//! let mut reassembler = FrameReassembler::new();
//! reassembler.push(&wire);
//! let frame = reassembler.next_frame().unwrap();
//! assert_eq!(frame.frame_type, FrameType::Master);
//! ```

mod commands;
mod constants;
mod error;
mod events;
mod frame;
mod reassembler;

pub use commands::*;
pub use constants::*;
pub use error::*;
pub use events::*;
pub use frame::*;
pub use reassembler::*;
