//! Particle codec
//!
//! Typed scalar values and their tagged wire encoding. The particle length is
//! always carried by the enclosing field or operation, so particles have no
//! terminator or length prefix of their own.

use std::fmt;

use bytes::BufMut;

use crate::error::{AeroError, Result};

/// Wire tag identifying how a particle's bytes are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ParticleType {
    Null = 0,
    Integer = 1,
    String = 3,
    Blob = 4,
}

impl TryFrom<u8> for ParticleType {
    type Error = AeroError;

    fn try_from(tag: u8) -> Result<Self> {
        match tag {
            0 => Ok(ParticleType::Null),
            1 => Ok(ParticleType::Integer),
            3 => Ok(ParticleType::String),
            4 => Ok(ParticleType::Blob),
            _ => Err(AeroError::protocol(format!(
                "Unsupported particle type: {}",
                tag
            ))),
        }
    }
}

/// A bin value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    Null,
    Integer(i64),
    String(String),
    Blob(Vec<u8>),
}

impl Value {
    /// Decode a particle of the given type
    pub fn decode(particle_type: ParticleType, bytes: &[u8]) -> Result<Self> {
        match particle_type {
            ParticleType::Null => {
                if !bytes.is_empty() {
                    return Err(AeroError::protocol(format!(
                        "Null particle carries {} bytes",
                        bytes.len()
                    )));
                }
                Ok(Value::Null)
            }
            ParticleType::Integer => {
                let raw: [u8; 8] = bytes.try_into().map_err(|_| {
                    AeroError::protocol(format!(
                        "Integer particle must be 8 bytes, got {}",
                        bytes.len()
                    ))
                })?;
                Ok(Value::Integer(i64::from_be_bytes(raw)))
            }
            ParticleType::String => std::str::from_utf8(bytes)
                .map(|s| Value::String(s.to_string()))
                .map_err(|e| AeroError::protocol(format!("String particle is not UTF-8: {}", e))),
            ParticleType::Blob => Ok(Value::Blob(bytes.to_vec())),
        }
    }

    /// Decode a particle from its raw wire tag
    pub fn decode_tagged(tag: u8, bytes: &[u8]) -> Result<Self> {
        Self::decode(ParticleType::try_from(tag)?, bytes)
    }

    pub fn particle_type(&self) -> ParticleType {
        match self {
            Value::Null => ParticleType::Null,
            Value::Integer(_) => ParticleType::Integer,
            Value::String(_) => ParticleType::String,
            Value::Blob(_) => ParticleType::Blob,
        }
    }

    /// Exact number of bytes [`write_to`](Self::write_to) will emit
    pub fn estimate_size(&self) -> usize {
        match self {
            Value::Null => 0,
            Value::Integer(_) => 8,
            Value::String(s) => s.len(),
            Value::Blob(b) => b.len(),
        }
    }

    /// Append the particle bytes to `buf`
    pub fn write_to<B: BufMut>(&self, buf: &mut B) {
        match self {
            Value::Null => {}
            Value::Integer(n) => buf.put_i64(*n),
            Value::String(s) => buf.put_slice(s.as_bytes()),
            Value::Blob(b) => buf.put_slice(b),
        }
    }

    /// Encode into a standalone `(type, bytes)` pair
    pub fn encode(&self) -> (ParticleType, Vec<u8>) {
        let mut bytes = Vec::with_capacity(self.estimate_size());
        self.write_to(&mut bytes);
        (self.particle_type(), bytes)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Integer(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Blob(b) => write!(f, "0x{}", hex::encode(b)),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Blob(b)
    }
}
