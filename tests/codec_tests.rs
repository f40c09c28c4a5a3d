//! Codec Tests
//!
//! Tests for framing, particles, headers, operations and request encoding.

mod common;

use std::io::Cursor;

use aeromock::engine::{Request, RequestFlags};
use aeromock::protocol::{
    encode_preamble, read_message, write_message, Header, Info1, Info2, Info3, MessageReader,
    MessageWriter, Operation, OperationType, ParticleType, Value, HEADER_SIZE, MSG_TYPE_INFO,
    MSG_TYPE_MESSAGE, PREAMBLE_SIZE, PROTO_VERSION,
};
use aeromock::AeroError;
use proptest::prelude::*;

use common::key;

fn body(bytes: &[u8]) -> MessageReader<'_> {
    let mut reader = MessageReader::new(bytes);
    reader.skip(PREAMBLE_SIZE).unwrap();
    reader
}

// =============================================================================
// Particle Tests
// =============================================================================

fn value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<i64>().prop_map(Value::Integer),
        ".{0,64}".prop_map(Value::String),
        proptest::collection::vec(any::<u8>(), 0..64).prop_map(Value::Blob),
    ]
}

proptest! {
    #[test]
    fn test_particle_round_trip(value in value_strategy()) {
        let (particle_type, bytes) = value.encode();
        prop_assert_eq!(bytes.len(), value.estimate_size());
        prop_assert_eq!(Value::decode(particle_type, &bytes).unwrap(), value);
    }

    #[test]
    fn test_operation_round_trip(name in "[a-z]{1,14}", value in value_strategy()) {
        let op = Operation::put(name, value);
        let mut writer = MessageWriter::new(MSG_TYPE_MESSAGE);
        writer.write_operation(&op);
        let bytes = writer.into_bytes();
        prop_assert_eq!(bytes.len(), PREAMBLE_SIZE + op.estimate_size());
        prop_assert_eq!(body(&bytes).read_operation().unwrap(), op);
    }
}

#[test]
fn test_integer_is_big_endian() {
    let (particle_type, bytes) = Value::Integer(0x0102_0304_0506_0708).encode();
    assert_eq!(particle_type, ParticleType::Integer);
    assert_eq!(bytes, vec![1, 2, 3, 4, 5, 6, 7, 8]);
}

#[test]
fn test_integer_requires_eight_bytes() {
    assert!(Value::decode(ParticleType::Integer, &[0, 0, 0, 1]).is_err());
    assert!(Value::decode(ParticleType::Integer, &[0; 9]).is_err());
}

#[test]
fn test_empty_string_is_not_null() {
    assert_eq!(
        Value::decode(ParticleType::String, &[]).unwrap(),
        Value::String(String::new())
    );
    assert!(Value::decode(ParticleType::Null, &[1]).is_err());
}

#[test]
fn test_invalid_particles() {
    assert!(Value::decode(ParticleType::String, &[0xFF, 0xFE]).is_err());
    assert!(matches!(
        Value::decode_tagged(2, &[]),
        Err(AeroError::Protocol(_))
    ));
}

// =============================================================================
// Framing Tests
// =============================================================================

#[test]
fn test_read_message_from_stream() {
    let mut stream = Vec::new();
    stream.extend_from_slice(&encode_preamble(PROTO_VERSION, MSG_TYPE_INFO, 5).to_be_bytes());
    stream.extend_from_slice(b"node\n");
    stream.extend_from_slice(&encode_preamble(PROTO_VERSION, MSG_TYPE_INFO, 0).to_be_bytes());

    let mut cursor = Cursor::new(stream);
    let first = read_message(&mut cursor, 1024).unwrap();
    assert_eq!(&first[PREAMBLE_SIZE..], b"node\n");
    let second = read_message(&mut cursor, 1024).unwrap();
    assert_eq!(second.len(), PREAMBLE_SIZE);
}

#[test]
fn test_read_message_rejects_oversize() {
    let stream = encode_preamble(PROTO_VERSION, MSG_TYPE_MESSAGE, 4096).to_be_bytes();
    let mut cursor = Cursor::new(stream.to_vec());
    assert!(matches!(
        read_message(&mut cursor, 1024),
        Err(AeroError::Protocol(_))
    ));
}

#[test]
fn test_read_message_short_stream() {
    let mut stream = encode_preamble(PROTO_VERSION, MSG_TYPE_MESSAGE, 10).to_be_bytes().to_vec();
    stream.extend_from_slice(&[0; 4]);
    let mut cursor = Cursor::new(stream);
    assert!(matches!(read_message(&mut cursor, 1024), Err(AeroError::Io(_))));
}

#[test]
fn test_write_message() {
    let mut writer = MessageWriter::new(MSG_TYPE_INFO);
    writer.write_info_line("node", b"A");
    let message = writer.into_bytes();

    let mut out = Vec::new();
    write_message(&mut out, &message).unwrap();
    assert_eq!(out, message.to_vec());
    assert_eq!(&out[PREAMBLE_SIZE..], b"node\tA\n");
}

// =============================================================================
// Header Tests
// =============================================================================

#[test]
fn test_header_round_trip() {
    let header = Header {
        info1: Info1(Info1::READ | Info1::GET_ALL),
        info2: Info2(Info2::WRITE),
        info3: Info3(Info3::UPDATE_ONLY),
        result_code: 2,
        generation: 7,
        expiration: 100,
        ttl: 42,
        field_count: 3,
        operation_count: 4,
    };
    let mut writer = MessageWriter::new(MSG_TYPE_MESSAGE);
    writer.write_header(&header);
    let bytes = writer.into_bytes();
    assert_eq!(bytes.len(), PREAMBLE_SIZE + HEADER_SIZE);
    assert_eq!(body(&bytes).read_header().unwrap(), header);
}

#[test]
fn test_header_length_below_minimum() {
    let mut raw = vec![0u8; HEADER_SIZE];
    raw[0] = 10;
    assert!(MessageReader::new(&raw).read_header().is_err());
}

#[test]
fn test_header_extra_bytes_are_skipped() {
    let mut raw = vec![0u8; HEADER_SIZE + 2];
    raw[0] = (HEADER_SIZE + 2) as u8;
    raw[HEADER_SIZE - 1] = 9; // operation count sits before the extra bytes
    let mut reader = MessageReader::new(&raw);
    let header = reader.read_header().unwrap();
    assert_eq!(header.operation_count, 9);
    assert_eq!(reader.remaining(), 0);
}

// =============================================================================
// Operation Tests
// =============================================================================

#[test]
fn test_operation_size_counts_everything_after_itself() {
    let op = Operation::put("ab", 1);
    let mut writer = MessageWriter::new(MSG_TYPE_MESSAGE);
    writer.write_operation(&op);
    let bytes = writer.into_bytes();
    let raw = &bytes[PREAMBLE_SIZE..];
    assert_eq!(u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]), 4 + 2 + 8);
    assert_eq!(raw[4], 2); // write
    assert_eq!(raw[5], ParticleType::Integer as u8);
    assert_eq!(raw[7], 2);
    assert_eq!(&raw[8..10], b"ab");
}

#[test]
fn test_unknown_operation_tag() {
    let raw = [0, 0, 0, 4, 99, 0, 0, 0];
    assert!(MessageReader::new(&raw).read_operation().is_err());
}

#[test]
fn test_operation_name_overruns_size() {
    let raw = [0, 0, 0, 4, 1, 0, 0, 5, b'a'];
    assert!(MessageReader::new(&raw).read_operation().is_err());
}

#[test]
fn test_wire_tags() {
    for (op_type, tag) in [
        (OperationType::Read, 1),
        (OperationType::Write, 2),
        (OperationType::Add, 5),
        (OperationType::Append, 9),
        (OperationType::Prepend, 10),
        (OperationType::Touch, 11),
    ] {
        assert_eq!(op_type.wire_tag(), tag);
        assert_eq!(OperationType::from_wire(tag), Some(op_type));
    }
    assert_eq!(OperationType::ReadHeader.wire_tag(), 1);
}

// =============================================================================
// Request Tests
// =============================================================================

#[test]
fn test_request_round_trip_with_set_and_user_key() {
    let flags = RequestFlags {
        has_read: true,
        must_exist: true,
        replace: true,
        ..RequestFlags::write()
    };
    let request = Request::new(flags, key(3).with_set("users").with_user_key("alice"))
        .operation(Operation::put("name", "alice"))
        .operation(Operation::add("visits", 1))
        .operation(Operation::get_bin("visits"));

    let encoded = request.encode().unwrap();
    let mut reader = body(&encoded);
    let header = reader.read_header().unwrap();
    assert_eq!(header.field_count, 4);
    assert_eq!(header.operation_count, 3);
    assert!(header.info3.replace_only());

    let decoded = Request::decode(&header, &mut reader).unwrap();
    assert_eq!(decoded.flags, flags);
    assert_eq!(decoded.key.set.as_deref(), Some("users"));
    assert_eq!(decoded.key.user_key, Some(Value::from("alice")));
    assert_eq!(decoded.key, request.key);
    assert_eq!(decoded.operations, request.operations);
    assert_eq!(reader.remaining(), 0);
}

#[test]
fn test_request_without_namespace_is_rejected() {
    let mut writer = MessageWriter::new(MSG_TYPE_MESSAGE);
    writer.write_header(&Header {
        info1: Info1(Info1::READ),
        field_count: 1,
        ..Header::default()
    });
    writer.write_field(aeromock::protocol::field_type::DIGEST, &[0u8; 20]);
    let bytes = writer.into_bytes();
    let mut reader = body(&bytes);
    let header = reader.read_header().unwrap();
    assert!(Request::decode(&header, &mut reader).is_err());
}

#[test]
fn test_short_digest_is_rejected() {
    let mut writer = MessageWriter::new(MSG_TYPE_MESSAGE);
    writer.write_field(aeromock::protocol::field_type::NAMESPACE, b"test");
    writer.write_field(aeromock::protocol::field_type::DIGEST, &[0u8; 19]);
    let bytes = writer.into_bytes();
    assert!(body(&bytes).read_key(2).is_err());
}

#[test]
fn test_response_preamble_matches_body() {
    let engine = common::engine();
    let response = engine
        .handle(&Request::new(RequestFlags::read_all(), key(1)).encode().unwrap())
        .unwrap();
    assert_eq!(response[0], PROTO_VERSION);
    assert_eq!(response[1], MSG_TYPE_MESSAGE);
    assert_eq!(response.len(), PREAMBLE_SIZE + HEADER_SIZE);
}

#[test]
fn test_trailing_bytes_past_payload_are_ignored() {
    let engine = common::engine();
    let mut message = Request::new(RequestFlags::read_all(), key(1))
        .encode()
        .unwrap()
        .to_vec();
    message.extend_from_slice(&[0xAA; 5]);
    assert!(engine.handle(&message).is_ok());
}

#[test]
fn test_encode_rejects_too_many_operations() {
    let request = (0..=u16::MAX as usize).fold(
        Request::new(RequestFlags::write(), key(1)),
        |req, i| req.operation(Operation::put(format!("b{}", i), 1)),
    );
    assert!(matches!(request.encode(), Err(AeroError::Protocol(_))));
}
