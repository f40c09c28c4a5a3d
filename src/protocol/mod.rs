//! Protocol Module
//!
//! The binary client/server wire protocol.
//!
//! ## Message Format
//!
//! Every message starts with an 8-byte preamble (see [`codec`]). Info messages
//! (type 1) carry newline-separated text. Record messages (type 3) carry:
//!
//! ```text
//! ┌──────────────┬─────────────────────────┬────────────────────────────┐
//! │ Header (22)  │ Fields (field count ×)  │ Operations (op count ×)    │
//! └──────────────┴─────────────────────────┴────────────────────────────┘
//!
//! Field:     │ Size (4) │ Type (1) │ Payload (size - 1)                 │
//! Operation: │ Size (4) │ Op (1) │ Particle (1) │ 0 (1) │ NameLen (1) │ Name │ Value │
//! ```
//!
//! The field/operation size counts every byte after the size word itself.

pub mod codec;
mod header;
mod key;
mod operation;
mod reader;
mod result;
mod value;
mod writer;

pub use codec::{
    encode_preamble, read_message, write_message, Preamble, MSG_TYPE_INFO, MSG_TYPE_MESSAGE,
    PREAMBLE_SIZE, PROTO_VERSION,
};
pub use header::{Header, Info1, Info2, Info3, HEADER_SIZE};
pub use key::{Digest, Key, DIGEST_SIZE};
pub use operation::{Operation, OperationType};
pub use reader::{KeyFields, MessageReader};
pub use result::ResultCode;
pub use value::{ParticleType, Value};
pub use writer::MessageWriter;

/// Field type tags
pub mod field_type {
    pub const NAMESPACE: u8 = 0;
    pub const SET: u8 = 1;
    pub const KEY: u8 = 2;
    pub const DIGEST: u8 = 4;
    pub const BATCH_INDEX: u8 = 41;
    pub const BATCH_INDEX_WITH_SET: u8 = 42;
}
