//! Result codes
//!
//! The subset of the server's result-code space this node produces.

use std::fmt;

/// Per-request outcome carried in byte 5 of the response header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ResultCode {
    Ok = 0,
    KeyNotFound = 2,
    ParameterError = 4,
    KeyExists = 5,
    BinTypeError = 12,
}

impl ResultCode {
    pub fn from_u8(code: u8) -> Option<Self> {
        match code {
            0 => Some(ResultCode::Ok),
            2 => Some(ResultCode::KeyNotFound),
            4 => Some(ResultCode::ParameterError),
            5 => Some(ResultCode::KeyExists),
            12 => Some(ResultCode::BinTypeError),
            _ => None,
        }
    }

    pub fn is_ok(self) -> bool {
        self == ResultCode::Ok
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResultCode::Ok => "OK",
            ResultCode::KeyNotFound => "KEY_NOT_FOUND_ERROR",
            ResultCode::ParameterError => "PARAMETER_ERROR",
            ResultCode::KeyExists => "KEY_EXISTS_ERROR",
            ResultCode::BinTypeError => "BIN_TYPE_ERROR",
        };
        write!(f, "{} ({})", name, *self as u8)
    }
}
