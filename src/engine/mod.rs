//! Engine Module
//!
//! Turns one complete inbound message into one complete response message.
//!
//! ## Responsibilities
//! - Route info messages to the [`InfoTable`]
//! - Route batch reads to the batch path
//! - Run single-record requests atomically per key
//!
//! ## Concurrency Model
//!
//! The engine is shared by every connection. A single-record request holds
//! its key's lock stripe from the initial lookup to the final commit, so
//! requests on the same key never interleave. Requests on different keys run
//! in parallel. Batch reads take no stripe; each lookup sees a whole record.

mod batch;
mod flags;
mod info;
mod locks;
mod operate;

use std::sync::Arc;

use bytes::Bytes;

use crate::config::Config;
use crate::error::{AeroError, Result};
use crate::protocol::{MessageReader, MessageWriter, Preamble};
use crate::store::{MemoryStore, RecordStore};

pub use flags::RequestFlags;
pub use info::InfoTable;
pub use operate::{Outcome, Request, MAX_BINS, MAX_BIN_NAME};

use locks::KeyLocks;

/// The request engine
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Record storage, shared with anything else holding the Arc
    store: Arc<dyn RecordStore>,

    /// Serializes requests per key
    locks: KeyLocks,

    /// Info sub-protocol answers
    info: InfoTable,
}

impl Engine {
    /// Create an engine over a fresh in-memory store
    pub fn new(config: Config) -> Result<Self> {
        Self::with_store(config, Arc::new(MemoryStore::new()))
    }

    /// Create an engine over an existing store
    pub fn with_store(config: Config, store: Arc<dyn RecordStore>) -> Result<Self> {
        config.validate()?;
        let info = InfoTable::from_config(&config);
        let locks = KeyLocks::new(config.lock_stripes);
        Ok(Self {
            config,
            store,
            locks,
            info,
        })
    }

    /// Handle one complete message (preamble included)
    ///
    /// An `Err` is always a [`AeroError::Protocol`] or worse: the input could
    /// not be decoded and the connection should be closed. Request-level
    /// failures are encoded in the returned response.
    pub fn handle(&self, message: &[u8]) -> Result<Bytes> {
        let mut reader = MessageReader::new(message);
        let preamble = Preamble::from_u64(reader.read_u64()?);
        let payload = reader.read_bytes(usize::try_from(preamble.length).map_err(|_| {
            AeroError::protocol(format!("payload length {} is not addressable", preamble.length))
        })?)?;
        if reader.remaining() > 0 {
            tracing::trace!("Ignoring {} bytes past the declared payload", reader.remaining());
        }

        let mut writer = MessageWriter::new(preamble.message_type);
        if preamble.is_info() {
            tracing::trace!("Info request: {:?}", String::from_utf8_lossy(payload));
            self.info.respond(payload, &mut writer);
            return Ok(writer.into_bytes());
        }

        let mut reader = MessageReader::new(payload);
        let header = reader.read_header()?;
        if header.info1.batch() {
            batch::batch_get(self.store.as_ref(), &header, &mut reader, &mut writer)?;
        } else {
            let request = Request::decode(&header, &mut reader)?;
            tracing::trace!(
                "Request on {}:{} flags={:?} ops={}",
                request.key.namespace,
                request.key.digest_hex(),
                request.flags,
                request.operations.len()
            );
            self.operate(&request).write_to(&mut writer);
        }
        Ok(writer.into_bytes())
    }

    /// Run a decoded single-record request
    pub fn operate(&self, request: &Request) -> Outcome {
        let _key_guard = self.locks.lock(&request.key);
        operate::execute(self.store.as_ref(), request)
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the record store
    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Get the info table
    pub fn info(&self) -> &InfoTable {
        &self.info
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}
