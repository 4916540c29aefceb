//! Event system for observing the bridge.
//!
//! Connectivity transitions, protocol state changes and frame traffic are
//! published to a `BridgeObserver`, so the CLI (or a test) can react to them
//! without being wired into the I/O threads.

use std::fmt;
use std::time::Duration;

use crate::protocol::Label;
use crate::state::SerialInputMode;

/// Direction of a serial frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameDirection {
    Tx, // Transmit (bridge -> controller)
    Rx, // Receive (controller -> bridge)
}

impl fmt::Display for FrameDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameDirection::Tx => write!(f, "TX"),
            FrameDirection::Rx => write!(f, "RX"),
        }
    }
}

/// Events emitted by the bridge.
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeEvent {
    /// Network DMX started arriving after silence.
    ConnectionEstablished,
    /// No network DMX for longer than the link timeout.
    ConnectionLost { silence: Duration },
    /// Serial input mode changed.
    InputModeChanged {
        from: SerialInputMode,
        to: SerialInputMode,
    },
    /// Receive-on-change reporting switched.
    ChangeReportingChanged { enabled: bool },
    /// Set Parameters applied.
    ParametersUpdated,
    /// Set Parameters acknowledged but not applied.
    ParametersRejected { declared: usize, actual: usize },
    /// Serial frame sent or received.
    Frame {
        direction: FrameDirection,
        label: Label,
        length: usize,
    },
    /// Serial frames dropped by the decoder since the last report.
    FramesDropped { count: u64 },
}

/// Observer trait for receiving bridge events.
///
/// Called from the network, serial and watchdog threads alike.
pub trait BridgeObserver: Send + Sync {
    /// Called when an event occurs.
    fn on_event(&self, event: &BridgeEvent);
}

/// No-op observer that discards all events.
pub struct NullObserver;

impl BridgeObserver for NullObserver {
    fn on_event(&self, _event: &BridgeEvent) {}
}

/// Observer that logs events using tracing.
pub struct TracingObserver;

impl BridgeObserver for TracingObserver {
    fn on_event(&self, event: &BridgeEvent) {
        match event {
            BridgeEvent::ConnectionEstablished => {
                tracing::info!("ArtNet connection established");
            }
            BridgeEvent::ConnectionLost { silence } => {
                tracing::warn!(silence_ms = silence.as_millis() as u64, "ArtNet connection lost");
            }
            BridgeEvent::InputModeChanged { from, to } => {
                tracing::info!(from = %from, to = %to, "Serial input mode changed");
            }
            BridgeEvent::ChangeReportingChanged { enabled } => {
                tracing::info!(enabled = enabled, "Receive DMX on change");
            }
            BridgeEvent::ParametersUpdated => {
                tracing::debug!("Widget parameters updated");
            }
            BridgeEvent::ParametersRejected { declared, actual } => {
                tracing::debug!(
                    declared = declared,
                    actual = actual,
                    "Set parameters ignored: user config length mismatch"
                );
            }
            BridgeEvent::Frame {
                direction,
                label,
                length,
            } => {
                tracing::trace!(dir = %direction, label = %label, len = length, "Serial frame");
            }
            BridgeEvent::FramesDropped { count } => {
                tracing::debug!(count = count, "Dropped corrupt serial frames");
            }
        }
    }
}
