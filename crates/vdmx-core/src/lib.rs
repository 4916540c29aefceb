//! vdmx-core: Art-Net to USB-DMX-Pro serial bridge.
//!
//! This crate emulates a USB-DMX "Pro" widget on a serial link and feeds it
//! DMX received over the network, so a fixture controller that speaks the
//! widget protocol can be driven by any Art-Net console.
//!
//! # Architecture
//!
//! The crate is organized into layers:
//!
//! - **Protocol**: Constants, labels, wire frame codec and resyncing decoder
//! - **Transport**: Serial communication abstraction (serialport, mock)
//! - **State**: Widget parameters, input modes and label handlers
//! - **Delta**: Receive-on-change encoding against the last reported universe
//! - **Watchdog**: Network liveness tracking
//! - **Events**: Observer pattern for logging and UI decoupling
//! - **Bridge**: High-level orchestrator
//! - **Config**: TOML configuration
//!
//! Decoding Art-Net itself is left to the caller, which hands every received
//! universe to [`Bridge::on_network_frame`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use vdmx_core::{Bridge, SerialPortTransport, shutdown};
//!
//! let port = SerialPortTransport::open("/dev/ttyUSB0", 115_200, Duration::from_millis(500))
//!     .expect("open serial port");
//! let bridge = Arc::new(Bridge::new(Arc::new(port)));
//! let (trigger, signal) = shutdown::channel();
//!
//! let watchdog = bridge.spawn_watchdog(Duration::from_secs(1), signal.clone()).unwrap();
//! bridge.on_network_frame(&[0u8; 512]).unwrap();
//! trigger.trigger();
//! bridge.run_serial_reader(&signal).unwrap();
//! watchdog.join();
//! ```

pub mod bridge;
pub mod config;
pub mod delta;
pub mod events;
pub mod protocol;
pub mod shutdown;
pub mod state;
pub mod transport;
pub mod watchdog;

// Re-exports for convenience
pub use bridge::Bridge;
pub use config::{ARTNET_PORT, BridgeConfig, ConfigError};
pub use delta::{ChangeReport, DeltaEncoder, full_frame};
pub use events::{BridgeEvent, BridgeObserver, FrameDirection, NullObserver, TracingObserver};
pub use protocol::{Frame, FrameDecoder, FrameError, Label};
pub use shutdown::{ShutdownSignal, ShutdownTrigger};
pub use state::{DeviceParameters, DeviceState, SerialInputMode, SetParametersOutcome};
pub use transport::{MockTransport, SerialPortTransport, SerialTransport, TransportError};
pub use watchdog::{Liveness, LinkEvent, Watchdog};
