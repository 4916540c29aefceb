//! Widget state module.

pub mod handlers;
pub mod machine;

pub use handlers::{HandleResult, HandlerContext, SetParametersOutcome, handle_message};
pub use machine::{
    DeviceParameters, DeviceState, ModeTransition, SerialInputMode, input_mode_transition,
};
