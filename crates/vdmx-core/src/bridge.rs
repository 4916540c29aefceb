//! Bridge - orchestrates network DMX, the serial link and the widget state.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossbeam_channel::{bounded, select};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::delta::{ChangeReport, DeltaEncoder, full_frame};
use crate::events::{BridgeEvent, BridgeObserver, FrameDirection, TracingObserver};
use crate::protocol::constants::DMX_CHANNELS;
use crate::protocol::{Frame, FrameDecoder};
use crate::shutdown::ShutdownSignal;
use crate::state::{DeviceState, HandleResult, HandlerContext, handle_message};
use crate::transport::{SerialTransport, TransportError};
use crate::watchdog::{DEFAULT_LINK_TIMEOUT, Liveness, Watchdog};

const READ_CHUNK: usize = 1024;

/// Output of the serial read pump.
enum ReadEvent {
    Data(Vec<u8>),
    Closed(Option<TransportError>),
}

/// Bridge between Art-Net DMX and the emulated widget on a serial link.
///
/// Shared through an `Arc` by the network dispatch, the serial reader and
/// the watchdog. Frame writes from all of them are serialized by one lock.
pub struct Bridge<T: SerialTransport, O: BridgeObserver> {
    transport: Option<Arc<T>>,
    observer: Arc<O>,
    state: DeviceState,
    encoder: Mutex<DeltaEncoder>,
    liveness: Arc<Liveness>,
    write_lock: Mutex<()>,
}

impl<T: SerialTransport> Bridge<T, TracingObserver> {
    /// Create a bridge that logs its events with tracing.
    pub fn new(transport: Arc<T>) -> Self {
        Self::with_observer(Some(transport), Arc::new(TracingObserver))
    }
}

impl<T: SerialTransport, O: BridgeObserver> Bridge<T, O> {
    /// Create a bridge with a custom observer. Without a transport every
    /// serial operation is a no-op.
    pub fn with_observer(transport: Option<Arc<T>>, observer: Arc<O>) -> Self {
        Self {
            transport,
            observer,
            state: DeviceState::new(),
            encoder: Mutex::new(DeltaEncoder::new()),
            liveness: Arc::new(Liveness::new(DEFAULT_LINK_TIMEOUT)),
            write_lock: Mutex::new(()),
        }
    }

    /// Use `timeout` of network silence as the link-lost threshold.
    pub fn with_link_timeout(mut self, timeout: Duration) -> Self {
        self.liveness = Arc::new(Liveness::new(timeout));
        self
    }

    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    pub fn liveness(&self) -> &Arc<Liveness> {
        &self.liveness
    }

    pub fn transport(&self) -> Option<&Arc<T>> {
        self.transport.as_ref()
    }

    /// Last channel values reported in receive-on-change mode.
    pub fn snapshot(&self) -> [u8; DMX_CHANNELS] {
        *self.encoder.lock().snapshot()
    }

    fn emit(&self, event: BridgeEvent) {
        self.observer.on_event(&event);
    }

    /// Handle one universe of network DMX.
    ///
    /// Returns the number of serial frames written.
    pub fn on_network_frame(&self, channels: &[u8; DMX_CHANNELS]) -> Result<usize> {
        if let Some(event) = self.liveness.record_frame(Instant::now()) {
            self.emit(event.into());
        }

        if self.transport.is_none() || !self.state.forwards_network_dmx() {
            return Ok(0);
        }

        let frames: Vec<Frame> = if self.state.change_reporting() {
            self.encoder
                .lock()
                .encode(channels)
                .iter()
                .map(ChangeReport::to_frame)
                .collect()
        } else {
            vec![full_frame(channels)]
        };

        for frame in &frames {
            self.send(frame)?;
        }
        Ok(frames.len())
    }

    /// Handle one decoded serial frame, writing the reply if there is one.
    pub fn on_serial_frame(&self, frame: &Frame) -> Result<HandleResult> {
        self.emit(BridgeEvent::Frame {
            direction: FrameDirection::Rx,
            label: frame.kind(),
            length: frame.payload.len(),
        });

        let ctx = HandlerContext::new(&self.state, self.observer.as_ref());
        let result = handle_message(frame, &ctx);
        if let HandleResult::Reply(reply) = &result {
            self.send(reply)?;
        }
        Ok(result)
    }

    /// Write one frame and flush it, holding the write lock throughout.
    pub fn send(&self, frame: &Frame) -> Result<()> {
        let Some(transport) = &self.transport else {
            return Ok(());
        };
        let bytes = frame.encode()?;
        {
            let _guard = self.write_lock.lock();
            transport.write(&bytes)?;
            transport.flush()?;
        }
        self.emit(BridgeEvent::Frame {
            direction: FrameDirection::Tx,
            label: frame.kind(),
            length: frame.payload.len(),
        });
        Ok(())
    }

    /// Close the serial transport, ending the reader.
    pub fn close(&self) {
        if let Some(transport) = &self.transport {
            transport.close();
        }
    }
}

impl<T: SerialTransport + 'static, O: BridgeObserver + 'static> Bridge<T, O> {
    /// Start the periodic liveness check.
    pub fn spawn_watchdog(&self, period: Duration, shutdown: ShutdownSignal) -> Result<Watchdog> {
        Ok(Watchdog::spawn(
            Arc::clone(&self.liveness),
            Arc::clone(&self.observer),
            period,
            shutdown,
        )?)
    }

    /// Read, decode and dispatch serial frames until shutdown or until the
    /// transport is closed.
    ///
    /// A pump thread performs the blocking reads and forwards the bytes over
    /// a channel; this loop selects on that channel and the shutdown signal,
    /// so it returns as soon as shutdown is requested. The pump exits once
    /// its current read returns.
    pub fn run_serial_reader(&self, shutdown: &ShutdownSignal) -> Result<()> {
        let Some(transport) = self.transport.clone() else {
            debug!("No serial transport, waiting for shutdown");
            let _ = shutdown.receiver().recv();
            return Ok(());
        };

        let (tx, rx) = bounded::<ReadEvent>(64);
        let pump_shutdown = shutdown.clone();
        thread::Builder::new()
            .name("vdmx-serial-rx".into())
            .spawn(move || {
                let mut buf = [0u8; READ_CHUNK];
                while !pump_shutdown.is_triggered() {
                    let event = match transport.read(&mut buf) {
                        Ok(n) => ReadEvent::Data(buf[..n].to_vec()),
                        Err(e) if e.is_transient() => continue,
                        Err(TransportError::Closed) => ReadEvent::Closed(None),
                        Err(e) => ReadEvent::Closed(Some(e)),
                    };
                    let closed = matches!(event, ReadEvent::Closed(_));
                    if tx.send(event).is_err() || closed {
                        break;
                    }
                }
            })?;

        info!("Serial reader started");
        let mut decoder = FrameDecoder::new();
        let mut reported_drops = 0u64;

        let result = loop {
            if shutdown.is_triggered() {
                break Ok(());
            }
            select! {
                recv(rx) -> msg => match msg {
                    Ok(ReadEvent::Data(bytes)) => {
                        for byte in bytes {
                            if let Some(frame) = decoder.push(byte) {
                                if let Err(e) = self.on_serial_frame(&frame) {
                                    warn!(error = %e, label = frame.label, "Failed to answer serial frame");
                                }
                            }
                        }
                        let dropped = decoder.stats().dropped;
                        if dropped > reported_drops {
                            self.emit(BridgeEvent::FramesDropped {
                                count: dropped - reported_drops,
                            });
                            reported_drops = dropped;
                        }
                    }
                    Ok(ReadEvent::Closed(None)) | Err(_) => {
                        info!("Serial transport closed");
                        break Ok(());
                    }
                    Ok(ReadEvent::Closed(Some(e))) => {
                        warn!(error = %e, "Serial transport failed");
                        break Err(anyhow::Error::from(e));
                    }
                },
                recv(shutdown.receiver()) -> _ => break Ok(()),
            }
        };

        let stats = decoder.stats();
        debug!(
            frames = stats.frames,
            dropped = stats.dropped,
            discarded = stats.discarded_bytes,
            "Serial reader stopped"
        );
        result
    }
}
