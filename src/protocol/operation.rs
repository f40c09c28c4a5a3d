//! Operation definitions
//!
//! Represents the typed operations carried in a record message.

use super::Value;

/// Logical operation types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationType {
    Read,
    /// Metadata-only read. Shares the READ wire tag.
    ReadHeader,
    Write,
    Add,
    Append,
    Prepend,
    Touch,
}

impl OperationType {
    /// Map a wire operation tag. ReadHeader is never produced here because it
    /// has no tag of its own.
    pub fn from_wire(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(OperationType::Read),
            2 => Some(OperationType::Write),
            5 => Some(OperationType::Add),
            9 => Some(OperationType::Append),
            10 => Some(OperationType::Prepend),
            11 => Some(OperationType::Touch),
            _ => None,
        }
    }

    pub fn wire_tag(self) -> u8 {
        match self {
            OperationType::Read | OperationType::ReadHeader => 1,
            OperationType::Write => 2,
            OperationType::Add => 5,
            OperationType::Append => 9,
            OperationType::Prepend => 10,
            OperationType::Touch => 11,
        }
    }
}

/// A decoded operation
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub op_type: OperationType,

    /// `None` on a full-record read
    pub bin_name: Option<String>,

    /// [`Value::Null`] for reads
    pub value: Value,
}

impl Operation {
    pub fn new(op_type: OperationType, bin_name: Option<String>, value: Value) -> Self {
        Self {
            op_type,
            bin_name,
            value,
        }
    }

    /// Read every bin
    pub fn get() -> Self {
        Self::new(OperationType::Read, None, Value::Null)
    }

    /// Read one bin
    pub fn get_bin(name: impl Into<String>) -> Self {
        Self::new(OperationType::Read, Some(name.into()), Value::Null)
    }

    pub fn get_header() -> Self {
        Self::new(OperationType::ReadHeader, None, Value::Null)
    }

    /// Set a bin, or remove it when `value` is null
    pub fn put(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(OperationType::Write, Some(name.into()), value.into())
    }

    pub fn add(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(OperationType::Add, Some(name.into()), value.into())
    }

    pub fn append(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(OperationType::Append, Some(name.into()), value.into())
    }

    pub fn prepend(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(OperationType::Prepend, Some(name.into()), value.into())
    }

    pub fn touch() -> Self {
        Self::new(OperationType::Touch, None, Value::Null)
    }

    /// Exact encoded size including the 8-byte operation prefix
    pub fn estimate_size(&self) -> usize {
        8 + self.bin_name.as_ref().map_or(0, |n| n.len()) + self.value.estimate_size()
    }
}
