//! Identity query handlers (GET_SERIAL_NUMBER).

use crate::events::BridgeObserver;
use crate::protocol::Frame;
use crate::protocol::constants::{LABEL_GET_SERIAL_NUMBER, SERIAL_NUMBER};

use super::{HandleResult, HandlerContext};

/// GET_SERIAL_NUMBER - fixed serial number, little endian.
pub fn handle_get_serial_number<O: BridgeObserver>(_ctx: &HandlerContext<'_, O>) -> HandleResult {
    HandleResult::Reply(Frame::new(
        LABEL_GET_SERIAL_NUMBER,
        SERIAL_NUMBER.to_le_bytes().to_vec(),
    ))
}
