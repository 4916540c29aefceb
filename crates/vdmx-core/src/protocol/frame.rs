//! Serial wire frame.
//!
//! Layout: `0x7E | label | len_lo | len_hi | payload[len] | 0xE7`.

use byteorder::{LittleEndian, WriteBytesExt};
use thiserror::Error;

use super::constants::{END_OF_MESSAGE, FRAME_OVERHEAD, MAX_PAYLOAD_LEN, START_OF_MESSAGE};
use super::label::Label;

#[derive(Error, Debug)]
pub enum FrameError {
    #[error("Payload too large: {len} bytes (max {max})")]
    PayloadTooLarge { len: usize, max: usize },
}

/// One labeled message exchanged over the serial link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub label: u8,
    pub payload: Vec<u8>,
}

impl Frame {
    pub fn new(label: u8, payload: Vec<u8>) -> Self {
        Self { label, payload }
    }

    pub fn kind(&self) -> Label {
        Label::from_u8(self.label)
    }

    /// Total bytes on the wire once encoded.
    pub fn wire_len(&self) -> usize {
        self.payload.len() + FRAME_OVERHEAD
    }

    /// Serialize the frame for the wire.
    pub fn encode(&self) -> Result<Vec<u8>, FrameError> {
        let len = self.payload.len();
        if len > MAX_PAYLOAD_LEN {
            return Err(FrameError::PayloadTooLarge {
                len,
                max: MAX_PAYLOAD_LEN,
            });
        }

        let mut buf = Vec::with_capacity(self.wire_len());
        buf.push(START_OF_MESSAGE);
        buf.push(self.label);
        // Writing into a Vec cannot fail.
        let _ = buf.write_u16::<LittleEndian>(len as u16);
        buf.extend_from_slice(&self.payload);
        buf.push(END_OF_MESSAGE);
        Ok(buf)
    }
}
