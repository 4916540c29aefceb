//! Minimal Art-Net receiver feeding the bridge.
//!
//! Only ArtDmx packets addressed to the configured port-address are used;
//! every other opcode is ignored. Short universes are zero-padded to 512
//! channels before they reach the bridge.

use std::net::{SocketAddr, UdpSocket};
use std::ops::Range;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::{debug, info, warn};
use vdmx_core::protocol::constants::DMX_CHANNELS;
use vdmx_core::{Bridge, BridgeObserver, SerialTransport, ShutdownSignal};

pub const ARTNET_ID: &[u8; 8] = b"Art-Net\0";
pub const OP_CODE_RANGE: Range<usize> = 8..10;
pub const SEQUENCE_OFFSET: usize = 12;
pub const PORT_ADDRESS_RANGE: Range<usize> = 14..16;
pub const LENGTH_RANGE: Range<usize> = 16..18;
pub const DMX_DATA_OFFSET: usize = 18;
pub const ARTDMX_OPCODE: u16 = 0x5000;

/// Socket poll interval, bounds how long shutdown takes to be noticed.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Error)]
pub enum ArtNetError {
    #[error("payload too short: need {needed} bytes, got {actual}")]
    TooShort { needed: usize, actual: usize },
    #[error("invalid ArtDMX length {length}")]
    InvalidLength { length: u16 },
}

#[derive(Debug)]
pub struct ArtDmx {
    pub port_address: u16,
    pub sequence: u8,
    pub channels: [u8; DMX_CHANNELS],
}

fn require_len(payload: &[u8], needed: usize) -> Result<(), ArtNetError> {
    if payload.len() < needed {
        return Err(ArtNetError::TooShort {
            needed,
            actual: payload.len(),
        });
    }
    Ok(())
}

/// Decode an ArtDmx packet; `Ok(None)` for anything that is not ArtDmx.
pub fn parse_artdmx(payload: &[u8]) -> Result<Option<ArtDmx>, ArtNetError> {
    require_len(payload, DMX_DATA_OFFSET)?;

    if &payload[..ARTNET_ID.len()] != ARTNET_ID {
        return Ok(None);
    }
    let opcode = u16::from_le_bytes([payload[OP_CODE_RANGE.start], payload[OP_CODE_RANGE.end - 1]]);
    if opcode != ARTDMX_OPCODE {
        return Ok(None);
    }

    let port_address = u16::from_le_bytes([
        payload[PORT_ADDRESS_RANGE.start],
        payload[PORT_ADDRESS_RANGE.end - 1],
    ]) & 0x7FFF;
    let length = u16::from_be_bytes([payload[LENGTH_RANGE.start], payload[LENGTH_RANGE.end - 1]]);
    if length == 0 || length as usize > DMX_CHANNELS {
        return Err(ArtNetError::InvalidLength { length });
    }

    let end = DMX_DATA_OFFSET + length as usize;
    require_len(payload, end)?;
    let mut channels = [0u8; DMX_CHANNELS];
    channels[..length as usize].copy_from_slice(&payload[DMX_DATA_OFFSET..end]);

    Ok(Some(ArtDmx {
        port_address,
        sequence: payload[SEQUENCE_OFFSET],
        channels,
    }))
}

/// Receive ArtDmx on `bind` and hand universes for `port_address` to the bridge.
pub fn spawn_listener<T, O>(
    bind: SocketAddr,
    port_address: u16,
    bridge: Arc<Bridge<T, O>>,
    shutdown: ShutdownSignal,
) -> Result<JoinHandle<()>>
where
    T: SerialTransport + 'static,
    O: BridgeObserver + 'static,
{
    let socket = UdpSocket::bind(bind).with_context(|| format!("binding Art-Net socket {bind}"))?;
    socket.set_read_timeout(Some(POLL_INTERVAL))?;
    info!(addr = %bind, port_address = %format!("0x{:04X}", port_address), "Art-Net listener started");

    let handle = thread::Builder::new()
        .name("vdmx-artnet".into())
        .spawn(move || {
            let mut buf = [0u8; 1024];
            while !shutdown.is_triggered() {
                let (len, peer) = match socket.recv_from(&mut buf) {
                    Ok(received) => received,
                    Err(e)
                        if matches!(
                            e.kind(),
                            std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
                        ) =>
                    {
                        continue;
                    }
                    Err(e) => {
                        warn!(error = %e, "Art-Net receive failed");
                        continue;
                    }
                };

                match parse_artdmx(&buf[..len]) {
                    Ok(Some(dmx)) if dmx.port_address == port_address => {
                        if let Err(e) = bridge.on_network_frame(&dmx.channels) {
                            warn!(error = %e, "Failed to forward DMX");
                        }
                    }
                    Ok(_) => {}
                    Err(e) => debug!(peer = %peer, error = %e, "Ignoring malformed Art-Net packet"),
                }
            }
            debug!("Art-Net listener stopped");
        })?;
    Ok(handle)
}
