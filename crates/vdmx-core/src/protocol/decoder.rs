//! Streaming frame decoder with byte-level resynchronization.
//!
//! The decoder is fed one byte at a time and yields a [`Frame`] whenever a
//! complete, correctly terminated message has been collected. When the byte
//! expected to be the end marker is anything else, the message is dropped and
//! the decoder discards input up to and including the next end marker. Bytes
//! consumed while resynchronizing are never treated as a new start marker,
//! since a corrupted length field means their position is meaningless.

use std::fmt;

use super::constants::{END_OF_MESSAGE, START_OF_MESSAGE};
use super::frame::Frame;

/// Decoder position within a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodeState {
    /// Discarding bytes until a start marker.
    #[default]
    Seeking,
    ReadLabel,
    ReadLenLow,
    ReadLenHigh,
    ReadPayload,
    /// Expecting the end marker.
    ReadEnd,
    /// Discarding bytes until an end marker after a framing error.
    Resync,
}

impl fmt::Display for DecodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeState::Seeking => write!(f, "SEEKING"),
            DecodeState::ReadLabel => write!(f, "READ_LABEL"),
            DecodeState::ReadLenLow => write!(f, "READ_LEN_LO"),
            DecodeState::ReadLenHigh => write!(f, "READ_LEN_HI"),
            DecodeState::ReadPayload => write!(f, "READ_PAYLOAD"),
            DecodeState::ReadEnd => write!(f, "READ_END"),
            DecodeState::Resync => write!(f, "RESYNC"),
        }
    }
}

/// Counters kept by the decoder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderStats {
    /// Frames delivered to the caller.
    pub frames: u64,
    /// Frames dropped because the end marker was missing.
    pub dropped: u64,
    /// Bytes discarded while seeking or resynchronizing.
    pub discarded_bytes: u64,
}

/// Push-driven frame decoder.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    state: DecodeState,
    label: u8,
    expected_len: usize,
    payload: Vec<u8>,
    stats: DecoderStats,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DecodeState {
        self.state
    }

    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    /// Forget any partially collected frame.
    pub fn reset(&mut self) {
        self.state = DecodeState::Seeking;
        self.label = 0;
        self.expected_len = 0;
        self.payload.clear();
    }

    /// Advance the state machine by one byte.
    pub fn push(&mut self, byte: u8) -> Option<Frame> {
        match self.state {
            DecodeState::Seeking => {
                if byte == START_OF_MESSAGE {
                    self.state = DecodeState::ReadLabel;
                } else {
                    self.stats.discarded_bytes += 1;
                }
            }
            DecodeState::ReadLabel => {
                self.label = byte;
                self.state = DecodeState::ReadLenLow;
            }
            DecodeState::ReadLenLow => {
                self.expected_len = byte as usize;
                self.state = DecodeState::ReadLenHigh;
            }
            DecodeState::ReadLenHigh => {
                self.expected_len |= (byte as usize) << 8;
                self.payload.clear();
                self.payload.reserve(self.expected_len);
                self.state = if self.expected_len == 0 {
                    DecodeState::ReadEnd
                } else {
                    DecodeState::ReadPayload
                };
            }
            DecodeState::ReadPayload => {
                self.payload.push(byte);
                if self.payload.len() == self.expected_len {
                    self.state = DecodeState::ReadEnd;
                }
            }
            DecodeState::ReadEnd => {
                if byte == END_OF_MESSAGE {
                    self.state = DecodeState::Seeking;
                    self.stats.frames += 1;
                    let payload = std::mem::take(&mut self.payload);
                    return Some(Frame::new(self.label, payload));
                }
                tracing::debug!(
                    label = self.label,
                    len = self.expected_len,
                    got = %format!("0x{:02X}", byte),
                    "Missing end marker, resynchronizing"
                );
                self.stats.dropped += 1;
                self.stats.discarded_bytes += 1;
                self.payload.clear();
                self.state = DecodeState::Resync;
            }
            DecodeState::Resync => {
                self.stats.discarded_bytes += 1;
                if byte == END_OF_MESSAGE {
                    self.state = DecodeState::Seeking;
                }
            }
        }
        None
    }

    /// Push a slice of bytes, collecting every completed frame.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<Frame> {
        bytes.iter().filter_map(|&b| self.push(b)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(label: u8, payload: &[u8]) -> Vec<u8> {
        Frame::new(label, payload.to_vec()).encode().unwrap()
    }

    #[test]
    fn test_decode_single_frame() {
        let mut decoder = FrameDecoder::new();
        let frames = decoder.feed(&encoded(3, &[8, 0]));
        assert_eq!(frames, vec![Frame::new(3, vec![8, 0])]);
        assert_eq!(decoder.state(), DecodeState::Seeking);
        assert_eq!(decoder.stats().frames, 1);
    }

    #[test]
    fn test_decode_skips_leading_garbage() {
        let mut decoder = FrameDecoder::new();
        let mut bytes = vec![0x00, 0x12, 0xE7, 0x55];
        bytes.extend(encoded(10, &[]));
        let frames = decoder.feed(&bytes);
        assert_eq!(frames, vec![Frame::new(10, Vec::new())]);
        assert_eq!(decoder.stats().discarded_bytes, 4);
    }

    #[test]
    fn test_decode_max_length_frame() {
        let payload: Vec<u8> = (0..u16::MAX as usize).map(|i| (i % 251) as u8).collect();
        let mut decoder = FrameDecoder::new();
        let frames = decoder.feed(&encoded(5, &payload));
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].label, 5);
        assert_eq!(frames[0].payload, payload);
    }

    #[test]
    fn test_payload_may_contain_markers() {
        let payload = [0x7E, 0xE7, 0x7E, 0xE7];
        let mut decoder = FrameDecoder::new();
        let frames = decoder.feed(&encoded(4, &payload));
        assert_eq!(frames, vec![Frame::new(4, payload.to_vec())]);
    }

    #[test]
    fn test_wrong_end_marker_recovers_on_next_frame() {
        let mut bytes = encoded(8, &[1]);
        let last = bytes.len() - 1;
        bytes[last] = 0x00; // corrupt end marker
        bytes.extend([0x11, 0x22, 0xE7]); // trailing junk up to an end marker
        bytes.extend(encoded(10, &[]));

        let mut decoder = FrameDecoder::new();
        let frames = decoder.feed(&bytes);
        assert_eq!(frames, vec![Frame::new(10, Vec::new())]);
        assert_eq!(decoder.stats().dropped, 1);
    }

    #[test]
    fn test_wrong_length_recovers_on_next_frame() {
        // Declares 2 payload bytes but carries 4: the byte read as the end
        // marker is payload, so the decoder resyncs at the real end marker.
        let mut bytes = vec![0x7E, 4, 2, 0, 0xAA, 0xBB, 0xCC, 0xDD, 0xE7];
        bytes.extend(encoded(3, &[]));

        let mut decoder = FrameDecoder::new();
        let frames = decoder.feed(&bytes);
        assert_eq!(frames, vec![Frame::new(3, Vec::new())]);
        assert_eq!(decoder.stats().dropped, 1);
    }

    #[test]
    fn test_resync_does_not_treat_start_marker_as_frame() {
        // During resync a 0x7E is junk: the frame it seems to start is only
        // terminated by the end marker that ends the resync.
        let mut bytes = vec![0x7E, 6, 0, 0, 0x42];
        bytes.extend([0x7E, 10, 0, 0, 0xE7]);
        bytes.extend(encoded(6, &[]));

        let mut decoder = FrameDecoder::new();
        let frames = decoder.feed(&bytes);
        assert_eq!(frames, vec![Frame::new(6, Vec::new())]);
    }

    #[test]
    fn test_frame_split_across_pushes() {
        let bytes = encoded(9, &[0, 1, 2, 3, 4, 5, 6]);
        let mut decoder = FrameDecoder::new();
        let (head, tail) = bytes.split_at(3);
        assert!(decoder.feed(head).is_empty());
        assert_eq!(decoder.state(), DecodeState::ReadLenHigh);
        assert_eq!(decoder.feed(tail).len(), 1);
    }
}
