//! Cooperative shutdown signal.
//!
//! The signal is a broadcast built on a zero-capacity channel that never
//! carries a message: triggering (or dropping) the trigger disconnects the
//! channel, which wakes every thread blocked in `wait_timeout` or selecting
//! on `receiver()` at once.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded};
use parking_lot::Mutex;

/// Owner side; triggering wakes every signal.
#[derive(Clone)]
pub struct ShutdownTrigger {
    sender: Arc<Mutex<Option<Sender<()>>>>,
    flag: Arc<AtomicBool>,
}

/// Waiter side, cheap to clone into each thread.
#[derive(Clone)]
pub struct ShutdownSignal {
    receiver: Receiver<()>,
    flag: Arc<AtomicBool>,
}

/// Create a connected trigger/signal pair.
pub fn channel() -> (ShutdownTrigger, ShutdownSignal) {
    let (sender, receiver) = bounded(0);
    let flag = Arc::new(AtomicBool::new(false));
    (
        ShutdownTrigger {
            sender: Arc::new(Mutex::new(Some(sender))),
            flag: Arc::clone(&flag),
        },
        ShutdownSignal { receiver, flag },
    )
}

impl ShutdownTrigger {
    /// Request shutdown. Idempotent.
    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
        self.sender.lock().take();
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

impl ShutdownSignal {
    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Sleep for up to `timeout`, returning early with `true` on shutdown.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        match self.receiver.recv_timeout(timeout) {
            Err(RecvTimeoutError::Timeout) => self.is_triggered(),
            Ok(()) | Err(RecvTimeoutError::Disconnected) => true,
        }
    }

    /// Receiver that becomes ready (disconnected) on shutdown, for `select!`.
    pub fn receiver(&self) -> &Receiver<()> {
        &self.receiver
    }
}
