//! Protocol codec
//!
//! Message framing shared by both sub-protocols.
//!
//! ## Preamble
//! ```text
//! ┌─────────────┬──────────┬──────────────────────────────┐
//! │ Version (1) │ Type (1) │   Payload length (6, BE)     │
//! └─────────────┴──────────┴──────────────────────────────┘
//! ```

use std::io::{Read, Write};

use crate::error::{AeroError, Result};

/// Size of the framing preamble
pub const PREAMBLE_SIZE: usize = 8;

/// Protocol version written on every outbound message
pub const PROTO_VERSION: u8 = 2;

/// Info sub-protocol message type
pub const MSG_TYPE_INFO: u8 = 1;

/// Record message type
pub const MSG_TYPE_MESSAGE: u8 = 3;

const LENGTH_MASK: u64 = (1 << 48) - 1;

/// Decoded 8-byte preamble
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preamble {
    pub version: u8,
    pub message_type: u8,
    /// Bytes following the preamble
    pub length: u64,
}

impl Preamble {
    pub fn decode(bytes: [u8; PREAMBLE_SIZE]) -> Self {
        Self::from_u64(u64::from_be_bytes(bytes))
    }

    pub fn from_u64(raw: u64) -> Self {
        Self {
            version: (raw >> 56) as u8,
            message_type: (raw >> 48) as u8,
            length: raw & LENGTH_MASK,
        }
    }

    pub fn is_info(&self) -> bool {
        self.message_type == MSG_TYPE_INFO
    }
}

/// Pack version, type and a 48-bit length into one big-endian word
pub fn encode_preamble(version: u8, message_type: u8, length: u64) -> u64 {
    ((version as u64) << 56) | ((message_type as u64) << 48) | (length & LENGTH_MASK)
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read one complete message (preamble included) from a stream
///
/// Blocks until the whole message has arrived. Payloads above `max_size`
/// are rejected before any allocation.
pub fn read_message<R: Read>(reader: &mut R, max_size: usize) -> Result<Vec<u8>> {
    let mut preamble = [0u8; PREAMBLE_SIZE];
    reader.read_exact(&mut preamble)?;

    let length = Preamble::decode(preamble).length;
    if length > max_size as u64 {
        return Err(AeroError::Protocol(format!(
            "Payload too large: {} bytes (max {})",
            length, max_size
        )));
    }

    let mut message = vec![0u8; PREAMBLE_SIZE + length as usize];
    message[..PREAMBLE_SIZE].copy_from_slice(&preamble);
    reader.read_exact(&mut message[PREAMBLE_SIZE..])?;
    Ok(message)
}

/// Write a complete message to a stream
pub fn write_message<W: Write>(writer: &mut W, message: &[u8]) -> Result<()> {
    writer.write_all(message)?;
    writer.flush()?;
    Ok(())
}
