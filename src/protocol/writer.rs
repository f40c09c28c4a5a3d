//! Message writer
//!
//! Append-only accumulator of immutable chunks. Each structured emitter sizes
//! its chunk exactly before filling it, so no buffer ever regrows; the chunks
//! are concatenated once behind the 8-byte preamble in [`MessageWriter::into_bytes`].

use std::collections::HashSet;

use bytes::{BufMut, Bytes, BytesMut};

use crate::store::Record;

use super::codec::{encode_preamble, PREAMBLE_SIZE, PROTO_VERSION};
use super::{field_type, Header, Key, Operation, OperationType, ResultCode, Value, HEADER_SIZE};

/// Builder for one outbound message
#[derive(Debug)]
pub struct MessageWriter {
    message_type: u8,
    length: usize,
    chunks: Vec<Bytes>,
}

impl MessageWriter {
    /// `message_type` is echoed into the preamble
    pub fn new(message_type: u8) -> Self {
        Self {
            message_type,
            length: 0,
            chunks: Vec::new(),
        }
    }

    /// Payload length written so far (excluding the preamble)
    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn write_bytes(&mut self, bytes: Bytes) {
        self.length += bytes.len();
        self.chunks.push(bytes);
    }

    pub fn write_header(&mut self, header: &Header) {
        let mut buf = BytesMut::with_capacity(HEADER_SIZE);
        put_header(&mut buf, header);
        self.write_bytes(buf.freeze());
    }

    /// Write a single `(size)(type)(payload)` field
    pub fn write_field(&mut self, field_type: u8, payload: &[u8]) {
        let mut buf = BytesMut::with_capacity(5 + payload.len());
        put_field(&mut buf, field_type, payload);
        self.write_bytes(buf.freeze());
    }

    /// Write the namespace and digest fields of `key`
    pub fn write_key(&mut self, key: &Key) {
        let mut buf = BytesMut::with_capacity(estimate_key(key));
        put_key(&mut buf, key);
        self.write_bytes(buf.freeze());
    }

    pub fn write_operation(&mut self, operation: &Operation) {
        let mut buf = BytesMut::with_capacity(operation.estimate_size());
        put_operation(
            &mut buf,
            operation.op_type,
            operation.bin_name.as_deref(),
            &operation.value,
        );
        self.write_bytes(buf.freeze());
    }

    /// Write one `name\tvalue\n` info line
    pub fn write_info_line(&mut self, name: &str, value: &[u8]) {
        let mut buf = BytesMut::with_capacity(name.len() + value.len() + 2);
        buf.put_slice(name.as_bytes());
        buf.put_u8(b'\t');
        buf.put_slice(value);
        buf.put_u8(b'\n');
        self.write_bytes(buf.freeze());
    }

    /// Exact body size of [`write_record`](Self::write_record), excluding its header
    pub fn estimate_record(
        key: &Key,
        record: Option<&Record>,
        bin_names: Option<&HashSet<String>>,
        no_bin_data: bool,
    ) -> usize {
        let Some(record) = record else {
            return 0;
        };
        let mut length = estimate_key(key);
        if !no_bin_data {
            length += selected_bins(record, bin_names)
                .map(|(name, value)| 8 + name.len() + value.estimate_size())
                .sum::<usize>();
        }
        length
    }

    /// Write one batch record frame.
    ///
    /// `batch_index` goes into the header TTL slot. An absent record becomes a
    /// lone header carrying `KeyNotFound`, and a selection too large for the
    /// operation count a lone `ParameterError`. `bin_names` of `None` selects
    /// every bin; `no_bin_data` selects none.
    pub fn write_record(
        &mut self,
        batch_index: u32,
        key: &Key,
        record: Option<&Record>,
        bin_names: Option<&HashSet<String>>,
        no_bin_data: bool,
    ) {
        let Some(bins) = record else {
            self.write_failed_record(batch_index, ResultCode::KeyNotFound);
            return;
        };
        let selected = if no_bin_data {
            0
        } else {
            selected_bins(bins, bin_names).count()
        };
        let Ok(operation_count) = u16::try_from(selected) else {
            self.write_failed_record(batch_index, ResultCode::ParameterError);
            return;
        };

        let length = Self::estimate_record(key, record, bin_names, no_bin_data);
        let mut body = BytesMut::with_capacity(length);
        put_key(&mut body, key);

        if !no_bin_data {
            for (name, value) in selected_bins(bins, bin_names) {
                put_operation(&mut body, OperationType::Read, Some(name), value);
            }
        }
        debug_assert_eq!(body.len(), length);

        let header = Header {
            ttl: batch_index,
            field_count: 2,
            operation_count,
            ..Header::default()
        };
        self.write_header(&header);
        self.write_bytes(body.freeze());
    }

    fn write_failed_record(&mut self, batch_index: u32, code: ResultCode) {
        let mut header = Header::with_result(code);
        header.ttl = batch_index;
        self.write_header(&header);
    }

    /// Prepend the preamble and concatenate every chunk
    pub fn into_bytes(self) -> Bytes {
        let mut out = BytesMut::with_capacity(PREAMBLE_SIZE + self.length);
        out.put_u64(encode_preamble(PROTO_VERSION, self.message_type, self.length as u64));
        for chunk in &self.chunks {
            out.put_slice(chunk);
        }
        out.freeze()
    }
}

// =============================================================================
// Fill helpers
// =============================================================================

fn estimate_key(key: &Key) -> usize {
    5 + key.namespace.len() + 5 + key.digest.len()
}

fn selected_bins<'r>(
    record: &'r Record,
    bin_names: Option<&'r HashSet<String>>,
) -> impl Iterator<Item = (&'r String, &'r Value)> {
    record
        .iter()
        .filter(move |(name, _)| bin_names.map_or(true, |names| names.contains(*name)))
}

fn put_header<B: BufMut>(buf: &mut B, header: &Header) {
    buf.put_u8(HEADER_SIZE as u8);
    buf.put_u8(header.info1.0);
    buf.put_u8(header.info2.0);
    buf.put_u8(header.info3.0);
    buf.put_u8(0);
    buf.put_u8(header.result_code);
    buf.put_u32(header.generation);
    buf.put_u32(header.expiration);
    buf.put_u32(header.ttl);
    buf.put_u16(header.field_count);
    buf.put_u16(header.operation_count);
}

fn put_field<B: BufMut>(buf: &mut B, field_type: u8, payload: &[u8]) {
    buf.put_u32(payload.len() as u32 + 1);
    buf.put_u8(field_type);
    buf.put_slice(payload);
}

fn put_key<B: BufMut>(buf: &mut B, key: &Key) {
    put_field(buf, field_type::NAMESPACE, key.namespace.as_bytes());
    put_field(buf, field_type::DIGEST, &key.digest);
}

fn put_operation<B: BufMut>(
    buf: &mut B,
    op_type: OperationType,
    name: Option<&str>,
    value: &Value,
) {
    let name = name.unwrap_or("");
    buf.put_u32((4 + name.len() + value.estimate_size()) as u32);
    buf.put_u8(op_type.wire_tag());
    buf.put_u8(value.particle_type() as u8);
    buf.put_u8(0);
    buf.put_u8(name.len() as u8);
    buf.put_slice(name.as_bytes());
    value.write_to(buf);
}
