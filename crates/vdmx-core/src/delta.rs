//! Change-of-state encoding for outbound DMX.
//!
//! In receive-on-change mode the bridge only sends the channels that moved
//! since the last report. Slots are numbered as on the DMX line: slot 0 is the
//! start code, channel `c` (0-based) is slot `c + 1`. Each report covers a
//! window of 40 slots starting on a multiple of 8 and carries
//!
//! ```text
//! [window_start / 8] [mask; 5] [changed values...]
//! ```
//!
//! where bit `b` of mask byte `k` is set when slot `window_start + 8k + b`
//! changed. Changed values follow in ascending slot order.

use crate::protocol::Frame;
use crate::protocol::constants::*;

/// Slot count including the start code.
const SLOT_COUNT: usize = DMX_CHANNELS + 1;

/// One change report window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeReport {
    /// Window start slot divided by 8.
    pub block: u8,
    /// Changed-slot bitmask.
    pub mask: [u8; CHANGE_MASK_BYTES],
    /// New values of the changed slots, ascending.
    pub values: Vec<u8>,
}

impl ChangeReport {
    /// First slot covered by this report.
    pub fn start_slot(&self) -> usize {
        self.block as usize * 8
    }

    /// Slots flagged in the mask, ascending.
    pub fn changed_slots(&self) -> Vec<usize> {
        let start = self.start_slot();
        (0..CHANGE_WINDOW_SLOTS)
            .filter(|offset| self.mask[offset >> 3] & (1 << (offset & 0b111)) != 0)
            .map(|offset| start + offset)
            .collect()
    }

    /// Changed channels (0-based), ascending.
    pub fn changed_channels(&self) -> Vec<usize> {
        self.changed_slots().into_iter().map(|slot| slot - 1).collect()
    }

    pub fn to_payload(&self) -> Vec<u8> {
        let mut payload = Vec::with_capacity(1 + CHANGE_MASK_BYTES + self.values.len());
        payload.push(self.block);
        payload.extend_from_slice(&self.mask);
        payload.extend_from_slice(&self.values);
        payload
    }

    pub fn to_frame(&self) -> Frame {
        Frame::new(LABEL_RECV_DMX_CHANGE, self.to_payload())
    }
}

/// Delta encoder holding the last reported channel values.
#[derive(Debug, Clone)]
pub struct DeltaEncoder {
    snapshot: [u8; DMX_CHANNELS],
}

impl Default for DeltaEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl DeltaEncoder {
    pub fn new() -> Self {
        Self {
            snapshot: [0; DMX_CHANNELS],
        }
    }

    /// Last reported channel values.
    pub fn snapshot(&self) -> &[u8; DMX_CHANNELS] {
        &self.snapshot
    }

    /// Compare `channels` against the snapshot and build the change reports,
    /// updating the snapshot for every reported channel.
    ///
    /// Returns no reports when nothing changed.
    pub fn encode(&mut self, channels: &[u8; DMX_CHANNELS]) -> Vec<ChangeReport> {
        let mut reports = Vec::new();
        let mut slot = 1;

        while slot < SLOT_COUNT {
            if self.snapshot[slot - 1] == channels[slot - 1] {
                slot += 1;
                continue;
            }

            let start = slot - slot % 8;
            let end = (start + CHANGE_WINDOW_SLOTS).min(SLOT_COUNT);
            let mut mask = [0u8; CHANGE_MASK_BYTES];
            let mut values = Vec::new();

            // Slots before `slot` in this window are already known unchanged.
            for s in slot..end {
                let value = channels[s - 1];
                if self.snapshot[s - 1] != value {
                    let offset = s - start;
                    mask[offset >> 3] |= 1 << (offset & 0b111);
                    values.push(value);
                    self.snapshot[s - 1] = value;
                }
            }

            reports.push(ChangeReport {
                block: (start / 8) as u8,
                mask,
                values,
            });
            slot = end;
        }

        reports
    }

    /// Forget the snapshot, so the next encode reports every non-zero channel.
    pub fn reset(&mut self) {
        self.snapshot = [0; DMX_CHANNELS];
    }
}

/// Full universe message: `[start_code, channels...]` on the RECV_DMX label.
pub fn full_frame(channels: &[u8; DMX_CHANNELS]) -> Frame {
    let mut payload = Vec::with_capacity(SLOT_COUNT);
    payload.push(DMX_START_CODE);
    payload.extend_from_slice(channels);
    Frame::new(LABEL_RECV_DMX, payload)
}
