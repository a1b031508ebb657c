//! Host-side link session for the microphone-array serial protocol.
//!
//! `micarray-protocol` handles the wire format; this crate adds the
//! stateful part of talking to the board: the handshake that gates
//! normal operation, outgoing message-id sequencing, the bounded wait
//! for command acknowledgements, and the acknowledgement of inbound
//! reports without ever answering an acknowledgement with another one.
//!
//! The session is transport-agnostic: implement [`ByteTransport`] over
//! a serial port (or anything else that moves bytes) and hand it to
//! [`LinkSession`].
//!
//! # Example
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use micarray_link::LinkSession;
//! use micarray_protocol::{Command, DeviceEvent};
//!
//! let mut session = LinkSession::new(port);
//! session.connect(Duration::from_secs(10))?;
//! session.send(&Command::ManualWakeup { beam: 0 }, Duration::from_secs(1))?;
//!
//! while let Some(event) = session.read_event(Duration::from_secs(1))? {
//!     if let DeviceEvent::Wakeup(wake) = event {
//!         println!("wake from {} degrees (beam {})", wake.angle, wake.beam);
//!     }
//! }
//! ```

mod error;
mod session;
mod transport;

pub use error::*;
pub use session::*;
pub use transport::*;
