//! Protocol constants for the USB-DMX "Pro" widget serial protocol.

// ============================================================================
// Framing
// ============================================================================

/// Start-of-message delimiter.
pub const START_OF_MESSAGE: u8 = 0x7E;

/// End-of-message delimiter.
pub const END_OF_MESSAGE: u8 = 0xE7;

/// Bytes of framing around a payload (start, label, 2x length, end).
pub const FRAME_OVERHEAD: usize = 5;

/// Largest payload a 16-bit length field can describe.
pub const MAX_PAYLOAD_LEN: usize = u16::MAX as usize;

// ============================================================================
// Message Labels
// ============================================================================

/// Get Widget Parameters request/reply.
pub const LABEL_GET_PARAMS: u8 = 3;

/// Set Widget Parameters request.
pub const LABEL_SET_PARAMS: u8 = 4;

/// Received DMX packet (widget -> host).
pub const LABEL_RECV_DMX: u8 = 5;

/// Output-only Send DMX packet (host -> widget).
pub const LABEL_SEND_DMX: u8 = 6;

/// Receive DMX on Change mode request.
pub const LABEL_RECV_DMX_ON_CHANGE: u8 = 8;

/// Received DMX Change Of State packet.
pub const LABEL_RECV_DMX_CHANGE: u8 = 9;

/// Get Widget Serial Number request/reply.
pub const LABEL_GET_SERIAL_NUMBER: u8 = 10;

// ============================================================================
// Identity
// ============================================================================

pub const FIRMWARE_VERSION_LSB: u8 = 44;
pub const FIRMWARE_VERSION_MSB: u8 = 1;

/// Reported verbatim on Get Serial Number.
pub const SERIAL_NUMBER: u32 = 0x1337C0DE;

// ============================================================================
// DMX
// ============================================================================

/// Channels in one universe.
pub const DMX_CHANNELS: usize = 512;

/// Standard lighting data start code.
pub const DMX_START_CODE: u8 = 0x00;

/// User configuration area held by the widget.
pub const USER_CONFIG_SIZE: usize = 508;

/// Fixed part of a Set Parameters payload (length, break, MAB, rate).
pub const SET_PARAMS_HEADER_LEN: usize = 5;

/// Bitmask bytes in one change report.
pub const CHANGE_MASK_BYTES: usize = 5;

/// Slots covered by one change report window.
pub const CHANGE_WINDOW_SLOTS: usize = CHANGE_MASK_BYTES * 8;

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_BREAK_TIME: u8 = 9;
pub const DEFAULT_MAB_TIME: u8 = 1;
pub const DEFAULT_OUTPUT_RATE: u8 = 0;
