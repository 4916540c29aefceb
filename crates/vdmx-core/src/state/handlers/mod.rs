//! Message handlers - dispatch logic for each serial label.
//!
//! This module is split into submodules by functionality:
//! - `params`: Get/Set widget parameters
//! - `dmx`: DMX direction and change-reporting requests
//! - `info`: Identity queries (serial number)

mod dmx;
mod info;
mod params;

use crate::events::{BridgeEvent, BridgeObserver};
use crate::protocol::{Frame, Label};
use crate::state::machine::DeviceState;
use tracing::debug;

use dmx::{handle_recv_dmx_on_change, handle_send_dmx};
use info::handle_get_serial_number;
use params::{handle_get_params, handle_set_params};

pub use params::SetParametersOutcome;

/// Result of handling a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleResult {
    /// Send this frame back to the peer.
    Reply(Frame),
    /// Message processed, nothing to send.
    Handled,
    /// Label not implemented by the widget.
    Unhandled,
}

/// Handler context containing the shared widget state.
pub struct HandlerContext<'a, O: BridgeObserver> {
    pub state: &'a DeviceState,
    pub observer: &'a O,
}

impl<'a, O: BridgeObserver> HandlerContext<'a, O> {
    pub fn new(state: &'a DeviceState, observer: &'a O) -> Self {
        Self { state, observer }
    }

    pub(crate) fn emit(&self, event: BridgeEvent) {
        self.observer.on_event(&event);
    }
}

/// Handle a decoded frame and produce the widget's reply, if any.
pub fn handle_message<O: BridgeObserver>(frame: &Frame, ctx: &HandlerContext<'_, O>) -> HandleResult {
    let label = frame.kind();

    if let Some((from, to)) = ctx.state.apply_transition(label) {
        ctx.emit(BridgeEvent::InputModeChanged { from, to });
    }

    match label {
        Label::GetParameters => handle_get_params(&frame.payload, ctx),
        Label::SetParameters => {
            handle_set_params(&frame.payload, ctx);
            HandleResult::Handled
        }
        Label::SendDmx => handle_send_dmx(&frame.payload, ctx),
        Label::ReceiveDmxOnChange => handle_recv_dmx_on_change(&frame.payload, ctx),
        Label::GetSerialNumber => handle_get_serial_number(ctx),
        _ => {
            debug!(label = %label, len = frame.payload.len(), "Unhandled label");
            HandleResult::Unhandled
        }
    }
}
