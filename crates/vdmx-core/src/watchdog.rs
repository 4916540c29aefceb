//! Network liveness watchdog.
//!
//! Network DMX arrives as a stream of independent frames with no session.
//! `Liveness` turns that stream into edge-triggered connectivity events:
//! `Established` on the first frame after silence, `Lost` once the silence
//! exceeds the link timeout. Both transitions are check-and-set under one
//! lock, so concurrent callers never report the same edge twice.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::debug;

use crate::events::{BridgeEvent, BridgeObserver};
use crate::shutdown::ShutdownSignal;

/// Silence after which the network link counts as lost.
pub const DEFAULT_LINK_TIMEOUT: Duration = Duration::from_secs(3);

/// Period of the watchdog check.
pub const DEFAULT_CHECK_PERIOD: Duration = Duration::from_secs(1);

/// Connectivity edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    Established,
    Lost { silence: Duration },
}

impl From<LinkEvent> for BridgeEvent {
    fn from(event: LinkEvent) -> Self {
        match event {
            LinkEvent::Established => BridgeEvent::ConnectionEstablished,
            LinkEvent::Lost { silence } => BridgeEvent::ConnectionLost { silence },
        }
    }
}

#[derive(Debug, Default)]
struct LivenessState {
    last_seen: Option<Instant>,
    connected: bool,
}

/// Liveness state shared by the network handler and the watchdog thread.
#[derive(Debug)]
pub struct Liveness {
    state: Mutex<LivenessState>,
    timeout: Duration,
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new(DEFAULT_LINK_TIMEOUT)
    }
}

impl Liveness {
    pub fn new(timeout: Duration) -> Self {
        Self {
            state: Mutex::new(LivenessState::default()),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn is_connected(&self) -> bool {
        self.state.lock().connected
    }

    pub fn last_seen(&self) -> Option<Instant> {
        self.state.lock().last_seen
    }

    /// Record a network frame received at `now`.
    ///
    /// Reports `Established` when the link was down or the previous frame is
    /// older than the timeout.
    pub fn record_frame(&self, now: Instant) -> Option<LinkEvent> {
        let mut state = self.state.lock();
        let stale = match state.last_seen {
            Some(last) => now.saturating_duration_since(last) > self.timeout,
            None => true,
        };
        let event = if stale || !state.connected {
            state.connected = true;
            Some(LinkEvent::Established)
        } else {
            None
        };
        state.last_seen = Some(now);
        event
    }

    /// Periodic check at `now`; reports `Lost` once per outage.
    pub fn check(&self, now: Instant) -> Option<LinkEvent> {
        let mut state = self.state.lock();
        if !state.connected {
            return None;
        }
        let silence = state
            .last_seen
            .map(|last| now.saturating_duration_since(last))
            .unwrap_or_default();
        if silence > self.timeout {
            state.connected = false;
            Some(LinkEvent::Lost { silence })
        } else {
            None
        }
    }
}

/// Periodic liveness check thread.
pub struct Watchdog {
    handle: Option<JoinHandle<()>>,
}

impl Watchdog {
    /// Start checking `liveness` every `period` until `shutdown` fires.
    pub fn spawn<O: BridgeObserver + 'static>(
        liveness: Arc<Liveness>,
        observer: Arc<O>,
        period: Duration,
        shutdown: ShutdownSignal,
    ) -> std::io::Result<Self> {
        let handle = thread::Builder::new()
            .name("vdmx-watchdog".into())
            .spawn(move || {
                while !shutdown.wait_timeout(period) {
                    if let Some(event) = liveness.check(Instant::now()) {
                        observer.on_event(&event.into());
                    }
                }
                debug!("Watchdog stopped");
            })?;
        Ok(Self {
            handle: Some(handle),
        })
    }

    /// Wait for the thread to exit. Trigger the shutdown signal first.
    pub fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shutdown;

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    #[test]
    fn test_first_frame_establishes() {
        let liveness = Liveness::default();
        let t0 = Instant::now();
        assert_eq!(liveness.record_frame(t0), Some(LinkEvent::Established));
        assert_eq!(liveness.record_frame(t0 + secs(0.5)), None);
        assert_eq!(liveness.record_frame(t0 + secs(1.0)), None);
        assert!(liveness.is_connected());
    }

    #[test]
    fn test_lost_reported_once() {
        let liveness = Liveness::default();
        let t0 = Instant::now();
        liveness.record_frame(t0);

        assert_eq!(liveness.check(t0 + secs(1.0)), None);
        assert_eq!(liveness.check(t0 + secs(3.0)), None);
        assert!(matches!(
            liveness.check(t0 + secs(3.5)),
            Some(LinkEvent::Lost { .. })
        ));
        assert_eq!(liveness.check(t0 + secs(4.5)), None);
        assert_eq!(liveness.check(t0 + secs(10.0)), None);
        assert!(!liveness.is_connected());
    }

    #[test]
    fn test_reestablished_after_gap() {
        let liveness = Liveness::default();
        let t0 = Instant::now();
        liveness.record_frame(t0);
        liveness.check(t0 + secs(4.0));

        assert_eq!(
            liveness.record_frame(t0 + secs(5.0)),
            Some(LinkEvent::Established)
        );
        assert_eq!(liveness.record_frame(t0 + secs(5.1)), None);
    }

    #[test]
    fn test_gap_between_checks_still_establishes() {
        // The watchdog has not yet noticed the outage when the next frame
        // arrives; the gap alone marks it as a new connection.
        let liveness = Liveness::default();
        let t0 = Instant::now();
        liveness.record_frame(t0);
        assert_eq!(
            liveness.record_frame(t0 + secs(3.2)),
            Some(LinkEvent::Established)
        );
        assert_eq!(liveness.check(t0 + secs(4.0)), None);
    }

    #[test]
    fn test_check_before_any_frame() {
        let liveness = Liveness::default();
        assert_eq!(liveness.check(Instant::now()), None);
    }

    struct Recorder(parking_lot::Mutex<Vec<BridgeEvent>>);

    impl BridgeObserver for Recorder {
        fn on_event(&self, event: &BridgeEvent) {
            self.0.lock().push(event.clone());
        }
    }

    #[test]
    fn test_watchdog_thread_reports_loss() {
        let liveness = Arc::new(Liveness::new(Duration::from_millis(30)));
        let observer = Arc::new(Recorder(parking_lot::Mutex::new(Vec::new())));
        let (trigger, signal) = shutdown::channel();

        liveness.record_frame(Instant::now());
        let watchdog = Watchdog::spawn(
            Arc::clone(&liveness),
            Arc::clone(&observer),
            Duration::from_millis(10),
            signal,
        )
        .unwrap();

        thread::sleep(Duration::from_millis(200));
        trigger.trigger();
        watchdog.join();

        let events = observer.0.lock().clone();
        let lost = events
            .iter()
            .filter(|e| matches!(e, BridgeEvent::ConnectionLost { .. }))
            .count();
        assert_eq!(lost, 1);
        assert!(!liveness.is_connected());
    }
}
