//! Batch-get path
//!
//! ## Request body (one batch-index field)
//! ```text
//! │ Count (4) │ AllowInline (1) │ Entry ... │
//!
//! Entry: │ Index (4) │ Digest (20) │ Repeat (1) │
//!        └ when Repeat != 1: │ ReadAttr (1) │ Fields (2) │ Ops (2) │ key fields │ ops │
//! ```
//!
//! A repeat entry reuses the namespace, set and bin filter of the most recent
//! full entry in the same request.

use std::collections::HashSet;

use crate::error::{AeroError, Result};
use crate::protocol::{
    field_type, Digest, Header, Info1, Key, MessageReader, MessageWriter, DIGEST_SIZE,
};
use crate::store::RecordStore;

/// Metadata of the last fully specified entry
#[derive(Debug)]
struct EntrySpec {
    namespace: String,
    set: Option<String>,
    bin_names: Option<HashSet<String>>,
    no_bin_data: bool,
}

/// Answer a batch request: one record frame per entry, then a last-frame
/// terminator. Absent records are reported inline.
pub(crate) fn batch_get(
    store: &dyn RecordStore,
    header: &Header,
    reader: &mut MessageReader<'_>,
    writer: &mut MessageWriter,
) -> Result<()> {
    let mut body = None;
    for _ in 0..header.field_count {
        let (field, payload) = reader.read_field()?;
        match field {
            field_type::BATCH_INDEX | field_type::BATCH_INDEX_WITH_SET => body = Some(payload),
            other => tracing::trace!("Skipping batch field type {}", other),
        }
    }
    let body = body.ok_or_else(|| AeroError::protocol("batch request has no batch-index field"))?;

    let mut entries = MessageReader::new(body);
    let count = entries.read_u32()?;
    entries.skip(1)?; // allow inline
    tracing::debug!("Batch get of {} keys", count);

    let mut last: Option<EntrySpec> = None;
    for _ in 0..count {
        let index = entries.read_u32()?;
        let digest: Digest = entries
            .read_bytes(DIGEST_SIZE)?
            .try_into()
            .map_err(|_| AeroError::protocol("batch digest is not 20 bytes"))?;
        let repeat = entries.read_u8()? == 1;

        if !repeat {
            let read_attr = Info1(entries.read_u8()?);
            let field_count = entries.read_u16()?;
            let operation_count = entries.read_u16()?;
            let fields = entries.read_key_fields(field_count)?;
            let namespace = fields
                .namespace
                .ok_or_else(|| {
                    AeroError::protocol(format!("batch entry {} has no namespace", index))
                })?;
            let bin_names = if operation_count > 0 {
                Some(entries.read_bin_names(operation_count)?)
            } else {
                None
            };
            last = Some(EntrySpec {
                namespace,
                set: fields.set,
                bin_names,
                no_bin_data: header.info1.no_bin_data() || read_attr.no_bin_data(),
            });
        }

        let spec = last.as_ref().ok_or_else(|| {
            AeroError::protocol(format!("batch entry {} repeats with nothing to repeat", index))
        })?;
        let key = Key {
            namespace: spec.namespace.clone(),
            set: spec.set.clone(),
            digest,
            user_key: None,
        };
        let record = store.get(&key);
        writer.write_record(
            index,
            &key,
            record.as_ref(),
            spec.bin_names.as_ref(),
            spec.no_bin_data,
        );
    }

    writer.write_header(&Header::last());
    Ok(())
}
