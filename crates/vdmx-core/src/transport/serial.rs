//! serialport-based transport implementation.

use std::io::{ErrorKind, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use serialport::SerialPort;
use tracing::{debug, info, instrument};

use super::traits::{SerialTransport, TransportError};

/// Serial port transport.
///
/// The port is cloned into independent reader and writer handles so that a
/// blocking read never holds up a reply or a DMX frame being written.
pub struct SerialPortTransport {
    reader: Mutex<Box<dyn SerialPort>>,
    writer: Mutex<Box<dyn SerialPort>>,
    port_name: String,
    timeout: Duration,
    open: AtomicBool,
}

impl SerialPortTransport {
    /// Open `port_name` at `baud_rate`, 8N1, with a bounded read timeout.
    #[instrument(level = "info", fields(port = %port_name, baud = baud_rate))]
    pub fn open(
        port_name: &str,
        baud_rate: u32,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let open_failed = |e: serialport::Error| TransportError::OpenFailed {
            port: port_name.to_string(),
            message: e.to_string(),
        };

        let writer = serialport::new(port_name, baud_rate)
            .timeout(timeout)
            .open()
            .map_err(open_failed)?;
        let reader = writer.try_clone().map_err(open_failed)?;

        info!(port = %port_name, baud = baud_rate, "Serial port opened");

        Ok(Self {
            reader: Mutex::new(reader),
            writer: Mutex::new(writer),
            port_name: port_name.to_string(),
            timeout,
            open: AtomicBool::new(true),
        })
    }

    /// List serial ports present on this machine.
    pub fn available_ports() -> Result<Vec<String>, TransportError> {
        let ports = serialport::available_ports().map_err(|e| TransportError::OpenFailed {
            port: "*".into(),
            message: e.to_string(),
        })?;
        Ok(ports.into_iter().map(|p| p.port_name).collect())
    }
}

impl SerialTransport for SerialPortTransport {
    fn write(&self, data: &[u8]) -> Result<usize, TransportError> {
        if !self.is_open() {
            return Err(TransportError::Closed);
        }
        self.writer
            .lock()
            .write_all(data)
            .map_err(|e| TransportError::WriteFailed(e.to_string()))?;
        Ok(data.len())
    }

    fn flush(&self) -> Result<(), TransportError> {
        if !self.is_open() {
            return Err(TransportError::Closed);
        }
        self.writer
            .lock()
            .flush()
            .map_err(|e| TransportError::WriteFailed(e.to_string()))
    }

    fn read(&self, buf: &mut [u8]) -> Result<usize, TransportError> {
        if !self.is_open() {
            return Err(TransportError::Closed);
        }
        match self.reader.lock().read(buf) {
            Ok(0) => Err(TransportError::Closed),
            Ok(n) => Ok(n),
            Err(e) if e.kind() == ErrorKind::TimedOut || e.kind() == ErrorKind::WouldBlock => {
                Err(TransportError::Timeout {
                    timeout_ms: self.timeout.as_millis() as u64,
                })
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => {
                Err(TransportError::ReadFailed(e.to_string()))
            }
            Err(e) => Err(TransportError::Io(e)),
        }
    }

    fn close(&self) {
        if self.open.swap(false, Ordering::SeqCst) {
            debug!(port = %self.port_name, "Serial port closed");
        }
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    fn name(&self) -> String {
        self.port_name.clone()
    }
}
