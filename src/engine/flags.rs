//! Request classification
//!
//! The info1/info2/info3 bit fields, decoded once into named switches.

use crate::protocol::{Header, Info1, Info2, Info3};

/// What a single-record request asks for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestFlags {
    pub has_read: bool,
    pub is_batch: bool,
    /// Suppress bin values in read results (exists / header-only reads)
    pub no_bin_data: bool,
    /// Read every bin after the explicit operations
    pub get_all: bool,
    pub has_write: bool,
    pub is_delete: bool,
    pub create_only: bool,
    /// update-only or replace-only
    pub must_exist: bool,
    /// create-or-replace or replace-only: start from an empty record
    pub replace: bool,
}

impl RequestFlags {
    pub fn from_header(header: &Header) -> Self {
        let (info1, info2, info3) = (header.info1, header.info2, header.info3);
        Self {
            has_read: info1.read(),
            is_batch: info1.batch(),
            no_bin_data: info1.no_bin_data(),
            get_all: info1.get_all(),
            has_write: info2.write(),
            is_delete: info2.delete(),
            create_only: info2.create_only(),
            must_exist: info3.update_only() || info3.replace_only(),
            replace: info3.create_or_replace() || info3.replace_only(),
        }
    }

    /// Plain read of named bins
    pub fn read() -> Self {
        Self {
            has_read: true,
            ..Self::default()
        }
    }

    /// Read of every bin
    pub fn read_all() -> Self {
        Self {
            has_read: true,
            get_all: true,
            ..Self::default()
        }
    }

    /// Existence / metadata check
    pub fn read_header() -> Self {
        Self {
            has_read: true,
            no_bin_data: true,
            ..Self::default()
        }
    }

    /// Merge-style write (create or update)
    pub fn write() -> Self {
        Self {
            has_write: true,
            ..Self::default()
        }
    }

    pub fn delete() -> Self {
        Self {
            has_write: true,
            is_delete: true,
            ..Self::default()
        }
    }

    /// Re-encode into header bits.
    ///
    /// `must_exist` together with `replace` maps to replace-only; either alone
    /// maps to update-only or create-or-replace.
    pub fn info_bits(&self) -> (Info1, Info2, Info3) {
        let mut info1 = 0;
        if self.has_read {
            info1 |= Info1::READ;
        }
        if self.get_all {
            info1 |= Info1::GET_ALL;
        }
        if self.is_batch {
            info1 |= Info1::BATCH;
        }
        if self.no_bin_data {
            info1 |= Info1::NOBINDATA;
        }

        let mut info2 = 0;
        if self.has_write {
            info2 |= Info2::WRITE;
        }
        if self.is_delete {
            info2 |= Info2::DELETE;
        }
        if self.create_only {
            info2 |= Info2::CREATE_ONLY;
        }

        let info3 = match (self.must_exist, self.replace) {
            (true, true) => Info3::REPLACE_ONLY,
            (true, false) => Info3::UPDATE_ONLY,
            (false, true) => Info3::CREATE_OR_REPLACE,
            (false, false) => 0,
        };

        (Info1(info1), Info2(info2), Info3(info3))
    }
}
