//! Single-record operation engine
//!
//! Interprets one request as an ordered operation list against one key.
//! The list runs against a private working copy of the record; the copy is
//! committed only if every operation succeeds, so a request either applies
//! completely or leaves the store untouched.

use bytes::Bytes;

use crate::error::{AeroError, Result};
use crate::protocol::{
    field_type, Header, Key, MessageReader, MessageWriter, Operation, OperationType, ResultCode,
    Value, MSG_TYPE_MESSAGE,
};
use crate::store::{Record, RecordStore};

use super::RequestFlags;

/// Longest bin name the operation encoding can carry
pub const MAX_BIN_NAME: usize = 255;

/// Most bins a record may hold, and most bins one response may carry: the
/// header operation count is 16 bits
pub const MAX_BINS: usize = u16::MAX as usize;

/// A decoded single-record request
#[derive(Debug, Clone)]
pub struct Request {
    pub flags: RequestFlags,
    pub key: Key,
    pub operations: Vec<Operation>,
}

impl Request {
    pub fn new(flags: RequestFlags, key: Key) -> Self {
        Self {
            flags,
            key,
            operations: Vec::new(),
        }
    }

    pub fn operation(mut self, operation: Operation) -> Self {
        self.operations.push(operation);
        self
    }

    /// Decode the key and operation list following `header`.
    ///
    /// A nameless read in a no-bin-data request is a header read: the wire
    /// has no separate tag for it.
    pub fn decode(header: &Header, reader: &mut MessageReader<'_>) -> Result<Self> {
        let flags = RequestFlags::from_header(header);
        let key = reader.read_key(header.field_count)?;
        let mut operations = reader.read_operations(header.operation_count)?;
        if flags.no_bin_data {
            for op in operations
                .iter_mut()
                .filter(|op| op.op_type == OperationType::Read && op.bin_name.is_none())
            {
                op.op_type = OperationType::ReadHeader;
            }
        }
        Ok(Self {
            flags,
            key,
            operations,
        })
    }

    /// Encode as a complete record message, the way a client would send it.
    /// Fails when the operation list does not fit the 16-bit count.
    pub fn encode(&self) -> Result<Bytes> {
        let operation_count = u16::try_from(self.operations.len()).map_err(|_| {
            AeroError::protocol(format!(
                "{} operations exceed the operation count field",
                self.operations.len()
            ))
        })?;
        let mut writer = MessageWriter::new(MSG_TYPE_MESSAGE);
        let (info1, info2, info3) = self.flags.info_bits();
        let field_count = 2 + self.key.set.is_some() as u16 + self.key.user_key.is_some() as u16;
        writer.write_header(&Header {
            info1,
            info2,
            info3,
            field_count,
            operation_count,
            ..Header::default()
        });
        writer.write_key(&self.key);
        if let Some(set) = &self.key.set {
            writer.write_field(field_type::SET, set.as_bytes());
        }
        if let Some(user_key) = &self.key.user_key {
            let mut payload = Vec::with_capacity(1 + user_key.estimate_size());
            payload.push(user_key.particle_type() as u8);
            user_key.write_to(&mut payload);
            writer.write_field(field_type::KEY, &payload);
        }
        for operation in &self.operations {
            writer.write_operation(operation);
        }
        Ok(writer.into_bytes())
    }
}

/// Result of one single-record request
#[derive(Debug, Clone)]
pub struct Outcome {
    pub result: ResultCode,
    pub key: Key,
    /// Key fields are echoed for any successful request with a read component
    pub echo_key: bool,
    /// Bins returned by read operations, in operation order
    pub bins: Vec<Operation>,
}

impl Outcome {
    fn failure(key: &Key, result: ResultCode) -> Self {
        Self {
            result,
            key: key.clone(),
            echo_key: false,
            bins: Vec::new(),
        }
    }

    /// Serialize as a response body. Failures are a lone header, and so is
    /// a bin list too long for the operation count.
    pub fn write_to(&self, writer: &mut MessageWriter) {
        let operation_count = match u16::try_from(self.bins.len()) {
            Ok(count) if self.result.is_ok() => count,
            Ok(_) => {
                writer.write_header(&Header::with_result(self.result));
                return;
            }
            Err(_) => {
                writer.write_header(&Header::with_result(ResultCode::ParameterError));
                return;
            }
        };
        writer.write_header(&Header {
            field_count: if self.echo_key { 2 } else { 0 },
            operation_count,
            ..Header::with_result(self.result)
        });
        if self.echo_key {
            writer.write_key(&self.key);
        }
        for bin in &self.bins {
            writer.write_operation(bin);
        }
    }

    /// Value of a returned bin
    pub fn bin(&self, name: &str) -> Option<&Value> {
        self.bins
            .iter()
            .find(|op| op.bin_name.as_deref() == Some(name))
            .map(|op| &op.value)
    }
}

/// Which reads the operation list has already performed
#[derive(Debug, Default)]
struct ReadState {
    full_read: bool,
    header_read: bool,
}

/// Run `request` against `store`. The caller holds the key's lock.
pub(crate) fn execute(store: &dyn RecordStore, request: &Request) -> Outcome {
    match run(store, request) {
        Ok(bins) => Outcome {
            result: ResultCode::Ok,
            key: request.key.clone(),
            echo_key: request.flags.has_read,
            bins,
        },
        Err(code) => {
            tracing::debug!(
                "Request on {}:{} failed with {}",
                request.key.namespace,
                request.key.digest_hex(),
                code
            );
            Outcome::failure(&request.key, code)
        }
    }
}

fn run(
    store: &dyn RecordStore,
    request: &Request,
) -> std::result::Result<Vec<Operation>, ResultCode> {
    let flags = &request.flags;
    let key = &request.key;
    let current = store.get(key);
    let existed = current.is_some();

    if flags.create_only && existed {
        return Err(ResultCode::KeyExists);
    }
    if flags.must_exist && !existed {
        return Err(ResultCode::KeyNotFound);
    }
    if flags.has_read && !flags.has_write && !existed {
        return Err(ResultCode::KeyNotFound);
    }

    if flags.is_delete {
        return if store.remove(key) {
            Ok(Vec::new())
        } else {
            Err(ResultCode::KeyNotFound)
        };
    }

    // `get` hands out a snapshot, so the stored record stays untouched
    // until the commit below.
    let mut working = match current {
        Some(record) if !flags.replace => record,
        _ => Record::new(),
    };

    let implicit = flags.get_all.then(Operation::get);
    let mut state = ReadState::default();
    let mut response = Vec::new();
    for operation in request.operations.iter().chain(implicit.iter()) {
        apply(operation, flags, existed, &mut working, &mut state, &mut response)?;
    }
    if response.len() > MAX_BINS {
        return Err(ResultCode::ParameterError);
    }

    if flags.has_write {
        if working.len() > MAX_BINS {
            return Err(ResultCode::ParameterError);
        }
        store.put(key.clone(), working);
    }
    Ok(response)
}

fn apply(
    operation: &Operation,
    flags: &RequestFlags,
    existed: bool,
    working: &mut Record,
    state: &mut ReadState,
    response: &mut Vec<Operation>,
) -> std::result::Result<(), ResultCode> {
    match operation.op_type {
        OperationType::Read => match &operation.bin_name {
            Some(name) => {
                if !flags.no_bin_data {
                    if let Some(value) = working.get(name) {
                        response.push(read_result(name, value));
                    }
                }
            }
            None => {
                if state.full_read || state.header_read {
                    return Err(ResultCode::ParameterError);
                }
                state.full_read = true;
                if !flags.no_bin_data {
                    response.extend(working.iter().map(|(name, value)| read_result(name, value)));
                }
            }
        },
        OperationType::ReadHeader => {
            if state.full_read {
                return Err(ResultCode::ParameterError);
            }
            state.header_read = true;
        }
        OperationType::Write => {
            let name = bin_name(operation)?;
            if operation.value.is_null() {
                working.remove(name);
            } else {
                working.insert(name.to_string(), operation.value.clone());
            }
        }
        OperationType::Add => {
            let name = check_modify(operation, flags)?;
            let sum = match (working.get(name), &operation.value) {
                (None, Value::Integer(n)) => *n,
                (Some(Value::Integer(current)), Value::Integer(n)) => current.wrapping_add(*n),
                _ => return Err(ResultCode::BinTypeError),
            };
            working.insert(name.to_string(), Value::Integer(sum));
        }
        OperationType::Append | OperationType::Prepend => {
            let name = check_modify(operation, flags)?;
            let incoming = match &operation.value {
                Value::String(s) => s,
                _ => return Err(ResultCode::BinTypeError),
            };
            let joined = match working.get(name) {
                None => incoming.clone(),
                Some(Value::String(current)) if operation.op_type == OperationType::Append => {
                    format!("{}{}", current, incoming)
                }
                Some(Value::String(current)) => format!("{}{}", incoming, current),
                Some(_) => return Err(ResultCode::BinTypeError),
            };
            working.insert(name.to_string(), Value::String(joined));
        }
        OperationType::Touch => {
            if !existed {
                return Err(ResultCode::KeyNotFound);
            }
            if flags.replace {
                return Err(ResultCode::ParameterError);
            }
        }
    }
    Ok(())
}

fn read_result(name: &str, value: &Value) -> Operation {
    Operation::new(OperationType::Read, Some(name.to_string()), value.clone())
}

fn bin_name(operation: &Operation) -> std::result::Result<&str, ResultCode> {
    match operation.bin_name.as_deref() {
        Some(name) if name.len() <= MAX_BIN_NAME => Ok(name),
        _ => Err(ResultCode::ParameterError),
    }
}

/// Shared guards of add/append/prepend
fn check_modify<'a>(
    operation: &'a Operation,
    flags: &RequestFlags,
) -> std::result::Result<&'a str, ResultCode> {
    if flags.replace || operation.value.is_null() {
        return Err(ResultCode::ParameterError);
    }
    bin_name(operation)
}
