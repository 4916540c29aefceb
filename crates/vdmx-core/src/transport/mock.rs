//! Mock serial transport for testing.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use super::traits::{SerialTransport, TransportError};
use crate::protocol::{Frame, FrameDecoder};

/// Mock transport for unit testing the bridge without hardware.
pub struct MockTransport {
    /// Bytes waiting to be read, as if sent by the peer.
    rx_queue: Arc<(Mutex<VecDeque<u8>>, Condvar)>,
    /// Captured writes.
    write_log: Arc<Mutex<Vec<Vec<u8>>>>,
    /// Number of flush calls.
    flushes: Arc<Mutex<usize>>,
    /// Whether the transport is open.
    open: Arc<Mutex<bool>>,
    /// Simulated read timeout.
    read_timeout: Duration,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            rx_queue: Arc::new((Mutex::new(VecDeque::new()), Condvar::new())),
            write_log: Arc::new(Mutex::new(Vec::new())),
            flushes: Arc::new(Mutex::new(0)),
            open: Arc::new(Mutex::new(true)),
            read_timeout: Duration::from_millis(20),
        }
    }

    /// Queue raw bytes to be returned by later reads.
    pub fn queue_bytes(&self, bytes: &[u8]) {
        let (queue, ready) = &*self.rx_queue;
        queue.lock().unwrap().extend(bytes.iter().copied());
        ready.notify_all();
    }

    /// Queue an encoded frame to be returned by later reads.
    pub fn queue_frame(&self, frame: &Frame) {
        self.queue_bytes(&frame.encode().unwrap());
    }

    /// Bytes queued but not read yet.
    pub fn pending_rx(&self) -> usize {
        self.rx_queue.0.lock().unwrap().len()
    }

    /// Get all captured writes.
    pub fn get_writes(&self) -> Vec<Vec<u8>> {
        self.write_log.lock().unwrap().clone()
    }

    /// Decode everything written so far back into frames.
    pub fn written_frames(&self) -> Vec<Frame> {
        let mut decoder = FrameDecoder::new();
        self.write_log
            .lock()
            .unwrap()
            .iter()
            .flat_map(|w| decoder.feed(w))
            .collect()
    }

    /// Clear captured writes.
    pub fn clear_writes(&self) {
        self.write_log.lock().unwrap().clear();
    }

    pub fn flush_count(&self) -> usize {
        *self.flushes.lock().unwrap()
    }

    /// Simulate the port coming back.
    pub fn reopen(&self) {
        *self.open.lock().unwrap() = true;
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl SerialTransport for MockTransport {
    fn write(&self, data: &[u8]) -> Result<usize, TransportError> {
        if !self.is_open() {
            return Err(TransportError::Closed);
        }
        self.write_log.lock().unwrap().push(data.to_vec());
        Ok(data.len())
    }

    fn flush(&self) -> Result<(), TransportError> {
        if !self.is_open() {
            return Err(TransportError::Closed);
        }
        *self.flushes.lock().unwrap() += 1;
        Ok(())
    }

    fn read(&self, buf: &mut [u8]) -> Result<usize, TransportError> {
        if !self.is_open() {
            return Err(TransportError::Closed);
        }
        let (queue, ready) = &*self.rx_queue;
        let mut queue = queue.lock().unwrap();
        if queue.is_empty() {
            queue = ready.wait_timeout(queue, self.read_timeout).unwrap().0;
        }
        if !self.is_open() {
            return Err(TransportError::Closed);
        }
        if queue.is_empty() {
            return Err(TransportError::Timeout {
                timeout_ms: self.read_timeout.as_millis() as u64,
            });
        }
        let n = buf.len().min(queue.len());
        for (slot, byte) in buf.iter_mut().zip(queue.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn close(&self) {
        *self.open.lock().unwrap() = false;
        self.rx_queue.1.notify_all();
    }

    fn is_open(&self) -> bool {
        *self.open.lock().unwrap()
    }

    fn name(&self) -> String {
        "mock".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_read_queue() {
        let mock = MockTransport::new();
        mock.queue_bytes(&[1, 2, 3]);

        let mut buf = [0u8; 2];
        assert_eq!(mock.read(&mut buf).unwrap(), 2);
        assert_eq!(buf, [1, 2]);
        assert_eq!(mock.read(&mut buf).unwrap(), 1);
        assert_eq!(buf[0], 3);

        // Queue is empty now
        assert!(matches!(
            mock.read(&mut buf),
            Err(TransportError::Timeout { .. })
        ));
    }

    #[test]
    fn test_mock_write_capture() {
        let mock = MockTransport::new();
        mock.write(b"Hello").unwrap();
        mock.write(b"World").unwrap();
        mock.flush().unwrap();

        let writes = mock.get_writes();
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[0], b"Hello");
        assert_eq!(writes[1], b"World");
        assert_eq!(mock.flush_count(), 1);
    }

    #[test]
    fn test_mock_written_frames() {
        let mock = MockTransport::new();
        mock.write(&Frame::new(10, vec![1, 2]).encode().unwrap())
            .unwrap();
        assert_eq!(mock.written_frames(), vec![Frame::new(10, vec![1, 2])]);
    }

    #[test]
    fn test_mock_close() {
        let mock = MockTransport::new();
        assert!(mock.is_open());

        mock.close();
        assert!(!mock.is_open());
        assert!(mock.write(b"test").is_err());
        let mut buf = [0u8; 1];
        assert!(matches!(mock.read(&mut buf), Err(TransportError::Closed)));

        mock.reopen();
        assert!(mock.write(b"test").is_ok());
    }
}
