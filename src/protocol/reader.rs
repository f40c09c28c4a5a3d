//! Message reader
//!
//! A forward-only cursor over one complete inbound message. Every read is
//! bounds-checked: running off the end is a protocol error, never a short read.

use std::collections::HashSet;

use crate::error::{AeroError, Result};

use super::{
    field_type, Digest, Header, Info1, Info2, Info3, Key, Operation, OperationType, Value,
    DIGEST_SIZE, HEADER_SIZE,
};

/// Key fields as they appear on the wire, before the required ones are checked
#[derive(Debug, Default, Clone)]
pub struct KeyFields {
    pub namespace: Option<String>,
    pub set: Option<String>,
    pub digest: Option<Digest>,
    pub user_key: Option<Value>,
}

impl KeyFields {
    /// Build a key, requiring a namespace and a digest
    pub fn into_key(self) -> Result<Key> {
        let namespace = self
            .namespace
            .ok_or_else(|| AeroError::protocol("key is missing its namespace field"))?;
        let digest = self
            .digest
            .ok_or_else(|| AeroError::protocol("key is missing its digest field"))?;
        Ok(Key {
            namespace,
            set: self.set,
            digest,
            user_key: self.user_key,
        })
    }
}

/// Sequential reader over an immutable byte buffer
pub struct MessageReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> MessageReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    /// Total buffer length
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }

    // =========================================================================
    // Primitives
    // =========================================================================

    /// Borrow the next `n` bytes and advance past them
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(AeroError::protocol(format!(
                "read of {} bytes at offset {} overruns {}-byte message",
                n,
                self.offset,
                self.bytes.len()
            )));
        }
        let slice = &self.bytes[self.offset..self.offset + n];
        self.offset += n;
        Ok(slice)
    }

    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.read_bytes(n).map(|_| ())
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(u64::from_be_bytes(self.read_array()?))
    }

    pub fn read_utf8(&mut self, length: usize) -> Result<String> {
        let raw = self.read_bytes(length)?;
        std::str::from_utf8(raw)
            .map(str::to_string)
            .map_err(|e| {
                AeroError::protocol(format!(
                    "invalid UTF-8 at offset {}: {}",
                    self.offset - length,
                    e
                ))
            })
    }

    /// Everything not yet consumed
    pub fn read_rest(&mut self) -> &'a [u8] {
        let rest = &self.bytes[self.offset..];
        self.offset = self.bytes.len();
        rest
    }

    // =========================================================================
    // Structured readers
    // =========================================================================

    /// Read the 22-byte record message header
    pub fn read_header(&mut self) -> Result<Header> {
        let length = self.read_u8()? as usize;
        if length < HEADER_SIZE {
            return Err(AeroError::protocol(format!(
                "header length {} is below {}",
                length, HEADER_SIZE
            )));
        }
        let info1 = Info1(self.read_u8()?);
        let info2 = Info2(self.read_u8()?);
        let info3 = Info3(self.read_u8()?);
        self.skip(1)?; // unused
        let result_code = self.read_u8()?;
        let generation = self.read_u32()?;
        let expiration = self.read_u32()?;
        let ttl = self.read_u32()?;
        let field_count = self.read_u16()?;
        let operation_count = self.read_u16()?;
        // forward compatibility with longer headers
        self.skip(length - HEADER_SIZE)?;

        Ok(Header {
            info1,
            info2,
            info3,
            result_code,
            generation,
            expiration,
            ttl,
            field_count,
            operation_count,
        })
    }

    /// Read one `(size)(type)(payload)` field, returning its type and payload
    pub fn read_field(&mut self) -> Result<(u8, &'a [u8])> {
        let size = self.read_u32()? as usize;
        if size == 0 {
            return Err(AeroError::protocol("field size 0 leaves no room for its type"));
        }
        let field_type = self.read_u8()?;
        let payload = self.read_bytes(size - 1)?;
        Ok((field_type, payload))
    }

    /// Read `field_count` key fields. Unknown field types are skipped.
    pub fn read_key_fields(&mut self, field_count: u16) -> Result<KeyFields> {
        let mut fields = KeyFields::default();
        for _ in 0..field_count {
            let (field_type, payload) = self.read_field()?;
            match field_type {
                field_type::NAMESPACE => fields.namespace = Some(utf8_field(payload, "namespace")?),
                field_type::SET => fields.set = Some(utf8_field(payload, "set")?),
                field_type::DIGEST => {
                    let digest: Digest = payload.try_into().map_err(|_| {
                        AeroError::protocol(format!(
                            "digest field must be {} bytes, got {}",
                            DIGEST_SIZE,
                            payload.len()
                        ))
                    })?;
                    fields.digest = Some(digest);
                }
                field_type::KEY => {
                    let (&particle_type, particle) = payload
                        .split_first()
                        .ok_or_else(|| AeroError::protocol("user key field has no particle type"))?;
                    fields.user_key = Some(Value::decode_tagged(particle_type, particle)?);
                }
                other => {
                    tracing::trace!("Skipping key field type {} ({} bytes)", other, payload.len());
                }
            }
        }
        Ok(fields)
    }

    /// Read the key of a single-record request
    pub fn read_key(&mut self, field_count: u16) -> Result<Key> {
        self.read_key_fields(field_count)?.into_key()
    }

    /// Read one operation:
    /// `(size 4)(op 1)(particle 1)(reserved 1)(name len 1)(name)(value)`
    pub fn read_operation(&mut self) -> Result<Operation> {
        let size = self.read_u32()? as usize;
        if size < 4 {
            return Err(AeroError::protocol(format!("operation size {} is below 4", size)));
        }
        let op_tag = self.read_u8()?;
        let particle_type = self.read_u8()?;
        self.skip(1)?; // reserved
        let name_length = self.read_u8()? as usize;

        let body_length = size - 4;
        if name_length > body_length {
            return Err(AeroError::protocol(format!(
                "bin name length {} exceeds operation body {}",
                name_length, body_length
            )));
        }

        let op_type = OperationType::from_wire(op_tag)
            .ok_or_else(|| AeroError::protocol(format!("Unknown operation type: {}", op_tag)))?;
        let bin_name = if name_length > 0 {
            Some(self.read_utf8(name_length)?)
        } else {
            None
        };
        let particle = self.read_bytes(body_length - name_length)?;
        let value = Value::decode_tagged(particle_type, particle)?;

        Ok(Operation::new(op_type, bin_name, value))
    }

    pub fn read_operations(&mut self, count: u16) -> Result<Vec<Operation>> {
        (0..count).map(|_| self.read_operation()).collect()
    }

    /// Read `count` operations and keep only their bin names
    pub fn read_bin_names(&mut self, count: u16) -> Result<HashSet<String>> {
        let mut names = HashSet::with_capacity(count as usize);
        for _ in 0..count {
            if let Some(name) = self.read_operation()?.bin_name {
                names.insert(name);
            }
        }
        Ok(names)
    }
}

fn utf8_field(payload: &[u8], what: &str) -> Result<String> {
    std::str::from_utf8(payload)
        .map(str::to_string)
        .map_err(|e| AeroError::protocol(format!("{} field is not UTF-8: {}", what, e)))
}
