//! Stream reassembly: turning arbitrarily-chunked serial reads into frames.
//!
//! The serial link delivers bytes with no respect for frame boundaries and
//! occasionally corrupts them. The reassembler accumulates whatever the
//! transport produced and yields complete, checksum-valid frames,
//! resynchronizing past garbage one byte at a time when a candidate frame
//! turns out to be corrupt.

use bytes::{Buf, BytesMut};
use log::{debug, trace};

use crate::constants::{DEFAULT_REASSEMBLY_LIMIT, SYNC_HEAD};
use crate::frame::{Frame, ParseOutcome};

/// Accumulates transport bytes and extracts complete frames.
///
/// Corruption never surfaces as an error: a frame that fails validation
/// costs one discarded byte and another scan for the sync constant. The
/// buffer is bounded; if it fills past the configured ceiling without
/// producing a frame it is cleared outright, which bounds both memory and
/// the time spent re-scanning under sustained line noise.
#[derive(Debug)]
pub struct FrameReassembler {
    /// Buffer for accumulating incoming data.
    buffer: BytesMut,
    /// Ceiling on buffered bytes while no frame can be extracted.
    limit: usize,
    frames_extracted: u64,
    corrupt_skips: u64,
    bytes_discarded: u64,
}

impl Default for FrameReassembler {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameReassembler {
    /// Create a reassembler with the default buffer ceiling.
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_REASSEMBLY_LIMIT)
    }

    /// Create a reassembler with a custom buffer ceiling.
    pub fn with_limit(limit: usize) -> Self {
        FrameReassembler {
            buffer: BytesMut::with_capacity(limit.min(DEFAULT_REASSEMBLY_LIMIT)),
            limit,
            frames_extracted: 0,
            corrupt_skips: 0,
            bytes_discarded: 0,
        }
    }

    /// Add received data to the buffer.
    pub fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Try to extract the next complete frame.
    ///
    /// Returns `None` when more bytes are needed. After a `None` return the
    /// buffered byte count is at or below the configured ceiling.
    pub fn next_frame(&mut self) -> Option<Frame> {
        loop {
            if self.buffer.is_empty() {
                return None;
            }

            // Align the buffer head to the sync constant, discarding
            // whatever precedes it.
            if self.buffer[0] != SYNC_HEAD {
                match self.buffer.iter().position(|&b| b == SYNC_HEAD) {
                    Some(pos) => {
                        debug!("resync: dropping {} bytes of leading garbage", pos);
                        self.bytes_discarded += pos as u64;
                        self.buffer.advance(pos);
                    }
                    None => {
                        debug!(
                            "resync: no sync byte in {} buffered bytes, clearing",
                            self.buffer.len()
                        );
                        self.bytes_discarded += self.buffer.len() as u64;
                        self.buffer.clear();
                        return None;
                    }
                }
            }

            match Frame::parse(&self.buffer) {
                ParseOutcome::Complete { frame, consumed } => {
                    trace!(
                        "extracted {:?} frame, msg_id {}, {} bytes",
                        frame.frame_type,
                        frame.msg_id,
                        consumed
                    );
                    self.buffer.advance(consumed);
                    self.frames_extracted += 1;
                    return Some(frame);
                }
                ParseOutcome::Incomplete => {
                    if self.buffer.len() > self.limit {
                        debug!(
                            "reassembly buffer held {} bytes without yielding a frame, clearing",
                            self.buffer.len()
                        );
                        self.bytes_discarded += self.buffer.len() as u64;
                        self.buffer.clear();
                    }
                    return None;
                }
                ParseOutcome::Corrupt => {
                    // The sync byte was a false start. Drop it and rescan;
                    // a real frame boundary inside the buffer survives this.
                    self.corrupt_skips += 1;
                    self.bytes_discarded += 1;
                    self.buffer.advance(1);
                }
            }
        }
    }

    /// Number of complete frames extracted so far.
    pub fn frames_extracted(&self) -> u64 {
        self.frames_extracted
    }

    /// Number of corrupt candidate frames skipped during resync.
    pub fn corrupt_skips(&self) -> u64 {
        self.corrupt_skips
    }

    /// Total bytes discarded as garbage or corruption.
    pub fn bytes_discarded(&self) -> u64 {
        self.bytes_discarded
    }

    /// Get the number of buffered bytes.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Clear the buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FrameType;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn wake_frame() -> Frame {
        Frame::new(
            FrameType::Device,
            42,
            br#"{"type":"wakeup","content":{"angle":180,"beam":3}}"#.to_vec(),
        )
    }

    /// Random bytes guaranteed not to contain the sync constant, so the
    /// garbage cannot masquerade as a frame header.
    fn sync_free_garbage(rng: &mut ChaCha8Rng, len: usize) -> Vec<u8> {
        (0..len)
            .map(|_| loop {
                let b: u8 = rng.gen();
                if b != SYNC_HEAD {
                    break b;
                }
            })
            .collect()
    }

    #[test]
    fn test_whole_frame() {
        let mut reasm = FrameReassembler::new();
        let frame = wake_frame();
        reasm.push(&frame.encode());
        assert_eq!(reasm.next_frame(), Some(frame));
        assert_eq!(reasm.next_frame(), None);
        assert_eq!(reasm.buffered_len(), 0);
    }

    #[test]
    fn test_back_to_back_frames() {
        let mut reasm = FrameReassembler::new();
        let first = Frame::new(FrameType::Handshake, 0, Vec::new());
        let second = wake_frame();
        let mut bytes = first.encode();
        bytes.extend_from_slice(&second.encode());
        reasm.push(&bytes);
        assert_eq!(reasm.next_frame(), Some(first));
        assert_eq!(reasm.next_frame(), Some(second));
        assert_eq!(reasm.next_frame(), None);
    }

    #[test]
    fn test_garbage_prefix_then_frame() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let frame = wake_frame();
        for garbage_len in [1usize, 6, 37, 250] {
            let mut reasm = FrameReassembler::new();
            let mut bytes = sync_free_garbage(&mut rng, garbage_len);
            bytes.extend_from_slice(&frame.encode());
            reasm.push(&bytes);
            assert_eq!(reasm.next_frame(), Some(frame.clone()), "garbage_len {}", garbage_len);
            assert_eq!(reasm.next_frame(), None);
        }
    }

    #[test]
    fn test_arbitrary_chunking() {
        let mut rng = ChaCha8Rng::seed_from_u64(17);
        let frame = wake_frame();
        let encoded = frame.encode();

        for _ in 0..50 {
            let mut reasm = FrameReassembler::new();
            let mut extracted = Vec::new();
            let mut offset = 0;
            while offset < encoded.len() {
                let chunk = rng.gen_range(1..=encoded.len() - offset);
                reasm.push(&encoded[offset..offset + chunk]);
                offset += chunk;
                while let Some(f) = reasm.next_frame() {
                    extracted.push(f);
                }
            }
            assert_eq!(extracted, vec![frame.clone()]);
        }
    }

    #[test]
    fn test_corrupt_frame_then_valid() {
        let mut reasm = FrameReassembler::new();
        let frame = wake_frame();
        let mut corrupted = frame.encode();
        let mid = corrupted.len() / 2;
        corrupted[mid] ^= 0x40;
        reasm.push(&corrupted);
        reasm.push(&frame.encode());
        assert_eq!(reasm.next_frame(), Some(frame));
        assert!(reasm.corrupt_skips() > 0);
    }

    #[test]
    fn test_sustained_noise_is_bounded() {
        let mut rng = ChaCha8Rng::seed_from_u64(29);
        let mut reasm = FrameReassembler::with_limit(1024);
        for _ in 0..200 {
            let chunk = sync_free_garbage(&mut rng, 100);
            reasm.push(&chunk);
            assert_eq!(reasm.next_frame(), None);
            assert!(reasm.buffered_len() <= 1024);
        }
        // A real frame still gets through after all that.
        let frame = wake_frame();
        reasm.push(&frame.encode());
        assert_eq!(reasm.next_frame(), Some(frame));
    }

    #[test]
    fn test_stalled_partial_frame_is_cleared_at_ceiling() {
        let mut reasm = FrameReassembler::with_limit(64);
        // A valid header promising 1 KiB of payload that never arrives.
        let pending = Frame::new(FrameType::Device, 1, vec![0u8; 1024]).encode();
        reasm.push(&pending[..100]);
        assert_eq!(reasm.next_frame(), None);
        assert_eq!(reasm.buffered_len(), 0);
    }

    #[test]
    fn test_counters() {
        let mut reasm = FrameReassembler::new();
        let frame = wake_frame();
        reasm.push(&[0x00, 0x01, 0x02]);
        reasm.push(&frame.encode());
        assert_eq!(reasm.next_frame(), Some(frame));
        assert_eq!(reasm.frames_extracted(), 1);
        assert_eq!(reasm.bytes_discarded(), 3);
    }
}
