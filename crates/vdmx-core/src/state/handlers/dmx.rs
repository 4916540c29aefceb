//! DMX direction handlers (SEND_DMX, RECV_DMX_ON_CHANGE).

use tracing::debug;

use crate::events::{BridgeEvent, BridgeObserver};

use super::{HandleResult, HandlerContext};

/// SEND_DMX - the peer is now the DMX source.
///
/// The mode switch itself comes from the transition table; the DMX data the
/// peer sends along is not used by the bridge.
pub fn handle_send_dmx<O: BridgeObserver>(
    payload: &[u8],
    _ctx: &HandlerContext<'_, O>,
) -> HandleResult {
    debug!(len = payload.len(), "SEND_DMX");
    HandleResult::Handled
}

/// RECV_DMX_ON_CHANGE - `[1]` reports changes only, anything else full frames.
pub fn handle_recv_dmx_on_change<O: BridgeObserver>(
    payload: &[u8],
    ctx: &HandlerContext<'_, O>,
) -> HandleResult {
    if payload.len() != 1 {
        debug!(len = payload.len(), "RECV_DMX_ON_CHANGE with unexpected length");
        return HandleResult::Handled;
    }

    let enabled = payload[0] == 1;
    if ctx.state.set_change_reporting(enabled) != enabled {
        ctx.emit(BridgeEvent::ChangeReportingChanged { enabled });
    }
    HandleResult::Handled
}
