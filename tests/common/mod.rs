//! Shared test helpers: request builders and a response parser.

#![allow(dead_code)]

use bytes::{BufMut, Bytes, BytesMut};

use aeromock::engine::{Request, RequestFlags};
use aeromock::protocol::{
    encode_preamble, field_type, Digest, Header, Info1, Key, KeyFields, MessageReader,
    MessageWriter, Operation, ResultCode, Value, DIGEST_SIZE, MSG_TYPE_INFO, MSG_TYPE_MESSAGE,
    PREAMBLE_SIZE, PROTO_VERSION,
};
use aeromock::{Config, Engine};

// =============================================================================
// Setup
// =============================================================================

pub fn engine() -> Engine {
    Engine::new(Config::default()).unwrap()
}

pub fn digest(n: u8) -> Digest {
    let mut digest = [0u8; DIGEST_SIZE];
    digest[0] = n;
    digest[DIGEST_SIZE - 1] = n.wrapping_mul(7);
    digest
}

pub fn key(n: u8) -> Key {
    Key::new("test", digest(n))
}

// =============================================================================
// Responses
// =============================================================================

/// One decoded record frame
#[derive(Debug)]
pub struct Frame {
    pub header: Header,
    pub key: KeyFields,
    pub bins: Vec<Operation>,
}

impl Frame {
    pub fn result(&self) -> ResultCode {
        self.header.result().unwrap()
    }

    pub fn bin(&self, name: &str) -> Option<&Value> {
        self.bins
            .iter()
            .find(|op| op.bin_name.as_deref() == Some(name))
            .map(|op| &op.value)
    }
}

fn read_frame(reader: &mut MessageReader<'_>) -> Frame {
    let header = reader.read_header().unwrap();
    let key = reader.read_key_fields(header.field_count).unwrap();
    let bins = reader.read_operations(header.operation_count).unwrap();
    Frame { header, key, bins }
}

/// Parse a single-record response
pub fn parse_response(bytes: &[u8]) -> Frame {
    let mut reader = MessageReader::new(bytes);
    let preamble = reader.read_u64().unwrap();
    assert_eq!((preamble >> 56) as u8, PROTO_VERSION);
    assert_eq!(preamble & 0xFFFF_FFFF_FFFF, (bytes.len() - PREAMBLE_SIZE) as u64);
    let frame = read_frame(&mut reader);
    assert_eq!(reader.remaining(), 0, "trailing bytes after response");
    frame
}

/// Parse a batch response; the terminator frame is checked and dropped
pub fn parse_batch_response(bytes: &[u8]) -> Vec<Frame> {
    let mut reader = MessageReader::new(bytes);
    reader.skip(PREAMBLE_SIZE).unwrap();
    let mut frames = Vec::new();
    loop {
        let frame = read_frame(&mut reader);
        if frame.header.info3.last() {
            break;
        }
        frames.push(frame);
    }
    assert_eq!(reader.remaining(), 0, "trailing bytes after batch terminator");
    frames
}

/// Encode, handle and parse one request
pub fn send(engine: &Engine, request: &Request) -> Frame {
    let response = engine.handle(&request.encode().unwrap()).unwrap();
    parse_response(&response)
}

pub fn put(engine: &Engine, key: &Key, bins: &[(&str, Value)]) {
    let request = bins
        .iter()
        .fold(Request::new(RequestFlags::write(), key.clone()), |req, (name, value)| {
            req.operation(Operation::put(*name, value.clone()))
        });
    assert_eq!(engine.operate(&request).result, ResultCode::Ok);
}

// =============================================================================
// Info
// =============================================================================

pub fn info_request(names: &[&str]) -> Bytes {
    let mut body = String::new();
    for name in names {
        body.push_str(name);
        body.push('\n');
    }
    let mut message = BytesMut::with_capacity(PREAMBLE_SIZE + body.len());
    message.put_u64(encode_preamble(PROTO_VERSION, MSG_TYPE_INFO, body.len() as u64));
    message.put_slice(body.as_bytes());
    message.freeze()
}

/// Parse `name\tvalue\n` lines
pub fn parse_info(bytes: &[u8]) -> Vec<(String, String)> {
    assert_eq!(bytes[1], MSG_TYPE_INFO);
    String::from_utf8(bytes[PREAMBLE_SIZE..].to_vec())
        .unwrap()
        .lines()
        .map(|line| {
            let (name, value) = line.split_once('\t').unwrap();
            (name.to_string(), value.to_string())
        })
        .collect()
}

// =============================================================================
// Batch
// =============================================================================

/// One batch-index entry
pub struct BatchEntry {
    pub index: u32,
    pub digest: Digest,
    /// `None` repeats the previous entry's metadata
    pub spec: Option<BatchSpec>,
}

pub struct BatchSpec {
    pub namespace: String,
    pub set: Option<String>,
    pub bins: Vec<String>,
    pub read_attr: u8,
}

impl BatchSpec {
    pub fn namespace(namespace: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            set: None,
            bins: Vec::new(),
            read_attr: Info1::READ,
        }
    }
}

pub fn batch_request(entries: &[BatchEntry], info1: u8) -> Bytes {
    let with_set = entries
        .iter()
        .any(|e| e.spec.as_ref().map_or(false, |s| s.set.is_some()));

    let mut body = BytesMut::new();
    body.put_u32(entries.len() as u32);
    body.put_u8(1); // allow inline
    for entry in entries {
        body.put_u32(entry.index);
        body.put_slice(&entry.digest);
        match &entry.spec {
            None => body.put_u8(1),
            Some(spec) => {
                body.put_u8(0);
                body.put_u8(spec.read_attr);
                let field_count = 1 + spec.set.is_some() as u16;
                body.put_u16(field_count);
                body.put_u16(spec.bins.len() as u16);
                put_field(&mut body, field_type::NAMESPACE, spec.namespace.as_bytes());
                if let Some(set) = &spec.set {
                    put_field(&mut body, field_type::SET, set.as_bytes());
                }
                for bin in &spec.bins {
                    let mut op = MessageWriter::new(MSG_TYPE_MESSAGE);
                    op.write_operation(&Operation::get_bin(bin.clone()));
                    body.put_slice(&op.into_bytes()[PREAMBLE_SIZE..]);
                }
            }
        }
    }

    let batch_type = if with_set {
        field_type::BATCH_INDEX_WITH_SET
    } else {
        field_type::BATCH_INDEX
    };
    let mut writer = MessageWriter::new(MSG_TYPE_MESSAGE);
    writer.write_header(&Header {
        info1: Info1(info1 | Info1::BATCH),
        field_count: 1,
        ..Header::default()
    });
    writer.write_field(batch_type, &body);
    writer.into_bytes()
}

fn put_field(buf: &mut BytesMut, field_type: u8, payload: &[u8]) {
    buf.put_u32(payload.len() as u32 + 1);
    buf.put_u8(field_type);
    buf.put_slice(payload);
}
