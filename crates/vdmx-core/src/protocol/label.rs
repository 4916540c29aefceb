//! Message label parsing.
//!
//! Every serial frame carries a one-byte label selecting the message type.
//! Labels the widget does not implement are kept as `Other` so handlers can
//! still apply the default mode transition to them.

use std::fmt;

use super::constants::*;

/// Message label of a serial frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    GetParameters,
    SetParameters,
    ReceiveDmx,
    SendDmx,
    ReceiveDmxOnChange,
    ReceiveDmxChange,
    GetSerialNumber,
    Other(u8),
}

impl Label {
    pub fn from_u8(value: u8) -> Self {
        match value {
            LABEL_GET_PARAMS => Label::GetParameters,
            LABEL_SET_PARAMS => Label::SetParameters,
            LABEL_RECV_DMX => Label::ReceiveDmx,
            LABEL_SEND_DMX => Label::SendDmx,
            LABEL_RECV_DMX_ON_CHANGE => Label::ReceiveDmxOnChange,
            LABEL_RECV_DMX_CHANGE => Label::ReceiveDmxChange,
            LABEL_GET_SERIAL_NUMBER => Label::GetSerialNumber,
            other => Label::Other(other),
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            Label::GetParameters => LABEL_GET_PARAMS,
            Label::SetParameters => LABEL_SET_PARAMS,
            Label::ReceiveDmx => LABEL_RECV_DMX,
            Label::SendDmx => LABEL_SEND_DMX,
            Label::ReceiveDmxOnChange => LABEL_RECV_DMX_ON_CHANGE,
            Label::ReceiveDmxChange => LABEL_RECV_DMX_CHANGE,
            Label::GetSerialNumber => LABEL_GET_SERIAL_NUMBER,
            Label::Other(value) => *value,
        }
    }
}

impl From<u8> for Label {
    fn from(value: u8) -> Self {
        Label::from_u8(value)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::GetParameters => write!(f, "GET_PARAMS"),
            Label::SetParameters => write!(f, "SET_PARAMS"),
            Label::ReceiveDmx => write!(f, "RECV_DMX"),
            Label::SendDmx => write!(f, "SEND_DMX"),
            Label::ReceiveDmxOnChange => write!(f, "RECV_DMX_ON_CHANGE"),
            Label::ReceiveDmxChange => write!(f, "RECV_DMX_CHANGE"),
            Label::GetSerialNumber => write!(f, "GET_SERIAL_NUMBER"),
            Label::Other(value) => write!(f, "LABEL_{}", value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_labels() {
        assert_eq!(Label::from_u8(3), Label::GetParameters);
        assert_eq!(Label::from_u8(6), Label::SendDmx);
        assert_eq!(Label::from_u8(10), Label::GetSerialNumber);
        assert_eq!(Label::ReceiveDmxChange.as_u8(), 9);
    }

    #[test]
    fn test_unknown_label_preserved() {
        let label = Label::from_u8(0xC8);
        assert_eq!(label, Label::Other(0xC8));
        assert_eq!(label.as_u8(), 0xC8);
        assert_eq!(label.to_string(), "LABEL_200");
    }
}
