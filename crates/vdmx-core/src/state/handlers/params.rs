//! Widget parameter handlers (GET_PARAMS, SET_PARAMS).

use byteorder::{ByteOrder, LittleEndian};
use tracing::debug;

use crate::events::{BridgeEvent, BridgeObserver};
use crate::protocol::Frame;
use crate::protocol::constants::*;

use super::{HandleResult, HandlerContext};

/// What a Set Parameters request did to the widget parameters.
///
/// Anything other than `Applied` leaves the parameters untouched and is not
/// reported to the peer: the message counts as received either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetParametersOutcome {
    Applied,
    /// Shorter than the fixed five byte header.
    TooShort { len: usize },
    /// Declared user config length differs from the bytes that follow.
    LengthMismatch { declared: usize, actual: usize },
    /// Declared user config does not fit the widget's config area.
    ConfigTooLarge { declared: usize },
}

/// GET_PARAMS - report firmware version, timings and user config.
pub fn handle_get_params<O: BridgeObserver>(
    payload: &[u8],
    ctx: &HandlerContext<'_, O>,
) -> HandleResult {
    let requested = if payload.len() == 2 {
        LittleEndian::read_u16(payload) as usize
    } else {
        0
    };
    let n = requested.min(USER_CONFIG_SIZE);

    let params = ctx.state.parameters();
    let mut reply = Vec::with_capacity(SET_PARAMS_HEADER_LEN + n);
    reply.extend_from_slice(&[
        FIRMWARE_VERSION_LSB,
        FIRMWARE_VERSION_MSB,
        params.break_time,
        params.mab_time,
        params.output_rate,
    ]);
    reply.extend_from_slice(&params.user_config[..n]);

    debug!(requested = requested, "GET_PARAMS");
    HandleResult::Reply(Frame::new(LABEL_GET_PARAMS, reply))
}

/// SET_PARAMS - `[len_lo, len_hi, break, mab, rate, user_config[len]]`.
pub fn handle_set_params<O: BridgeObserver>(
    payload: &[u8],
    ctx: &HandlerContext<'_, O>,
) -> SetParametersOutcome {
    let outcome = apply_set_params(payload, ctx);
    match outcome {
        SetParametersOutcome::Applied => ctx.emit(BridgeEvent::ParametersUpdated),
        SetParametersOutcome::TooShort { len } => ctx.emit(BridgeEvent::ParametersRejected {
            declared: 0,
            actual: len,
        }),
        SetParametersOutcome::LengthMismatch { declared, actual } => {
            ctx.emit(BridgeEvent::ParametersRejected { declared, actual })
        }
        SetParametersOutcome::ConfigTooLarge { declared } => {
            ctx.emit(BridgeEvent::ParametersRejected {
                declared,
                actual: declared,
            })
        }
    }
    outcome
}

fn apply_set_params<O: BridgeObserver>(
    payload: &[u8],
    ctx: &HandlerContext<'_, O>,
) -> SetParametersOutcome {
    if payload.len() < SET_PARAMS_HEADER_LEN {
        return SetParametersOutcome::TooShort { len: payload.len() };
    }

    let declared = LittleEndian::read_u16(&payload[..2]) as usize;
    let user_config = &payload[SET_PARAMS_HEADER_LEN..];
    if user_config.len() != declared {
        return SetParametersOutcome::LengthMismatch {
            declared,
            actual: user_config.len(),
        };
    }
    if declared > USER_CONFIG_SIZE {
        return SetParametersOutcome::ConfigTooLarge { declared };
    }

    ctx.state.with_parameters(|params| {
        params.break_time = payload[2];
        params.mab_time = payload[3];
        params.output_rate = payload[4];
        params.user_config[..declared].copy_from_slice(user_config);
    });
    debug!(user_config_len = declared, "SET_PARAMS applied");
    SetParametersOutcome::Applied
}
