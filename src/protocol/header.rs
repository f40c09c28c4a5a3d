//! Record message header
//!
//! ```text
//! ┌────────┬───────┬───────┬───────┬────────┬────────┬────────────┬────────────┬──────────┬──────────┬──────────┐
//! │Len (1) │Inf1(1)│Inf2(1)│Inf3(1)│Unused 1│Result 1│ Generation │ Expiration │ TTL (4)  │Fields (2)│ Ops (2)  │
//! │  = 22  │       │       │       │        │        │    (4)     │    (4)     │batch idx │          │          │
//! └────────┴───────┴───────┴───────┴────────┴────────┴────────────┴────────────┴──────────┴──────────┴──────────┘
//! ```

use super::ResultCode;

/// Size of the record message header
pub const HEADER_SIZE: usize = 22;

/// Read attributes (header byte 1)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Info1(pub u8);

impl Info1 {
    pub const READ: u8 = 0x01;
    pub const GET_ALL: u8 = 0x02;
    pub const BATCH: u8 = 0x08;
    pub const NOBINDATA: u8 = 0x20;

    pub fn read(self) -> bool {
        self.0 & Self::READ != 0
    }

    pub fn get_all(self) -> bool {
        self.0 & Self::GET_ALL != 0
    }

    pub fn batch(self) -> bool {
        self.0 & Self::BATCH != 0
    }

    pub fn no_bin_data(self) -> bool {
        self.0 & Self::NOBINDATA != 0
    }
}

/// Write attributes (header byte 2)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Info2(pub u8);

impl Info2 {
    pub const WRITE: u8 = 0x01;
    pub const DELETE: u8 = 0x02;
    pub const CREATE_ONLY: u8 = 0x20;

    pub fn write(self) -> bool {
        self.0 & Self::WRITE != 0
    }

    pub fn delete(self) -> bool {
        self.0 & Self::DELETE != 0
    }

    pub fn create_only(self) -> bool {
        self.0 & Self::CREATE_ONLY != 0
    }
}

/// Info/policy attributes (header byte 3)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Info3(pub u8);

impl Info3 {
    pub const LAST: u8 = 0x01;
    pub const UPDATE_ONLY: u8 = 0x08;
    pub const CREATE_OR_REPLACE: u8 = 0x10;
    pub const REPLACE_ONLY: u8 = 0x20;

    pub fn last(self) -> bool {
        self.0 & Self::LAST != 0
    }

    pub fn update_only(self) -> bool {
        self.0 & Self::UPDATE_ONLY != 0
    }

    pub fn create_or_replace(self) -> bool {
        self.0 & Self::CREATE_OR_REPLACE != 0
    }

    pub fn replace_only(self) -> bool {
        self.0 & Self::REPLACE_ONLY != 0
    }
}

/// Decoded record message header.
///
/// Generation and expiration are carried through but never interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Header {
    pub info1: Info1,
    pub info2: Info2,
    pub info3: Info3,
    pub result_code: u8,
    pub generation: u32,
    pub expiration: u32,
    /// Record TTL, or the batch index in batch responses
    pub ttl: u32,
    pub field_count: u16,
    pub operation_count: u16,
}

impl Header {
    /// Response header carrying only a result code
    pub fn with_result(code: ResultCode) -> Self {
        Self {
            result_code: code as u8,
            ..Self::default()
        }
    }

    /// Terminator frame of a batch response
    pub fn last() -> Self {
        Self {
            info3: Info3(Info3::LAST),
            ..Self::default()
        }
    }

    pub fn result(&self) -> Option<ResultCode> {
        ResultCode::from_u8(self.result_code)
    }
}
