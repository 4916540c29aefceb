//! Serial transport layer abstraction.
//!
//! Defines the `SerialTransport` trait for the byte link to the fixture
//! controller, allowing different implementations (serialport, mock, etc.).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Failed to open {port}: {message}")]
    OpenFailed { port: String, message: String },

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Transport closed")]
    Closed,

    #[error("Timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// Whether the read loop should simply try again.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            TransportError::Timeout { .. } | TransportError::ReadFailed(_)
        )
    }
}

/// Abstract serial transport interface.
///
/// Reads and writes take `&self` so that the reader thread and the writers
/// can share one transport; implementations synchronize internally.
pub trait SerialTransport: Send + Sync {
    /// Write raw bytes, returning once all of them were accepted.
    fn write(&self, data: &[u8]) -> Result<usize, TransportError>;

    /// Flush any buffered output to the link.
    fn flush(&self) -> Result<(), TransportError>;

    /// Read available bytes into `buf`.
    ///
    /// Blocks for at most the transport's read timeout and returns
    /// `TransportError::Timeout` when nothing arrived, or
    /// `TransportError::Closed` once the transport has been closed.
    fn read(&self, buf: &mut [u8]) -> Result<usize, TransportError>;

    /// Close the transport. Pending and later reads fail with `Closed`.
    fn close(&self);

    /// Check if the transport is still open.
    fn is_open(&self) -> bool;

    /// Human readable port name.
    fn name(&self) -> String;
}
