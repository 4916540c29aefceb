//! Protocol module - USB-DMX Pro serial protocol definitions.

pub mod constants;
pub mod decoder;
pub mod frame;
pub mod label;

pub use constants::*;
pub use decoder::{DecodeState, DecoderStats, FrameDecoder};
pub use frame::{Frame, FrameError};
pub use label::Label;
