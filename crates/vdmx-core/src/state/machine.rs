//! Emulated widget state.
//!
//! Holds the parameters and modes the serial peer can read and change. Each
//! field is guarded on its own: the wire protocol is not transactional, so a
//! reader may observe one field updated before another.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::protocol::Label;
use crate::protocol::constants::*;

/// Widget parameters reported by Get Parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceParameters {
    pub break_time: u8,
    pub mab_time: u8,
    pub output_rate: u8,
    pub user_config: [u8; USER_CONFIG_SIZE],
}

impl Default for DeviceParameters {
    fn default() -> Self {
        Self {
            break_time: DEFAULT_BREAK_TIME,
            mab_time: DEFAULT_MAB_TIME,
            output_rate: DEFAULT_OUTPUT_RATE,
            user_config: [0; USER_CONFIG_SIZE],
        }
    }
}

/// Whether network DMX is forwarded to the serial peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SerialInputMode {
    /// The peer receives DMX from the bridge.
    #[default]
    ReceiveFromSerial,
    /// The peer is the DMX source; network DMX is not forwarded.
    SendToSerialOnly,
}

impl fmt::Display for SerialInputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SerialInputMode::ReceiveFromSerial => write!(f, "RECEIVE"),
            SerialInputMode::SendToSerialOnly => write!(f, "SEND_ONLY"),
        }
    }
}

/// Effect of an inbound message on the serial input mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeTransition {
    Keep,
    Set(SerialInputMode),
}

/// Serial input mode transition for a message label.
///
/// Read-only polls keep the mode, Send DMX hands DMX sourcing to the peer,
/// and every other label (including unknown ones) hands it back.
pub fn input_mode_transition(label: Label) -> ModeTransition {
    match label {
        Label::GetParameters | Label::GetSerialNumber => ModeTransition::Keep,
        Label::SendDmx => ModeTransition::Set(SerialInputMode::SendToSerialOnly),
        _ => ModeTransition::Set(SerialInputMode::ReceiveFromSerial),
    }
}

/// Shared widget state, owned by the bridge and used by both I/O threads.
#[derive(Debug, Default)]
pub struct DeviceState {
    parameters: Mutex<DeviceParameters>,
    input_mode: Mutex<SerialInputMode>,
    change_reporting: AtomicBool,
}

impl DeviceState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parameters(&self) -> DeviceParameters {
        self.parameters.lock().clone()
    }

    /// Run `f` with the parameters locked.
    pub fn with_parameters<R>(&self, f: impl FnOnce(&mut DeviceParameters) -> R) -> R {
        f(&mut self.parameters.lock())
    }

    pub fn input_mode(&self) -> SerialInputMode {
        *self.input_mode.lock()
    }

    /// Set the input mode, returning the previous one if it changed.
    pub fn set_input_mode(&self, mode: SerialInputMode) -> Option<SerialInputMode> {
        let mut current = self.input_mode.lock();
        if *current == mode {
            return None;
        }
        let previous = *current;
        *current = mode;
        Some(previous)
    }

    /// Apply the transition table for `label`.
    pub fn apply_transition(&self, label: Label) -> Option<(SerialInputMode, SerialInputMode)> {
        match input_mode_transition(label) {
            ModeTransition::Keep => None,
            ModeTransition::Set(mode) => self.set_input_mode(mode).map(|from| (from, mode)),
        }
    }

    /// Whether network DMX should currently be forwarded.
    pub fn forwards_network_dmx(&self) -> bool {
        self.input_mode() == SerialInputMode::ReceiveFromSerial
    }

    pub fn change_reporting(&self) -> bool {
        self.change_reporting.load(Ordering::SeqCst)
    }

    /// Switch change reporting, returning the previous value.
    pub fn set_change_reporting(&self, enabled: bool) -> bool {
        self.change_reporting.swap(enabled, Ordering::SeqCst)
    }
}
