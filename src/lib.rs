//! # aeromock
//!
//! A single-node, in-memory emulator of the Aerospike client/server wire
//! protocol, good enough for an unmodified client to run against:
//! - Info handshake (node, services, partition ownership)
//! - Single-record get / exists / put / add / append / prepend / touch / delete
//! - Batch get
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │               (thread per connection)                        │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │  complete message
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                      Engine                                  │
//! │        info │ batch get │ single-record operations           │
//! └───────┬─────────────────────────────────────┬───────────────┘
//!         │                                     │
//!         ▼                                     ▼
//!   ┌─────────────┐                      ┌─────────────┐
//!   │  Protocol   │                      │ RecordStore │
//!   │reader/writer│                      │  (RwLock)   │
//!   └─────────────┘                      └─────────────┘
//! ```
//!
//! Nothing is persisted. Generation, expiration and TTL are carried on the
//! wire but never enforced.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;

pub mod engine;
pub mod network;
pub mod protocol;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::Config;
pub use engine::Engine;
pub use error::{AeroError, Result};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of aeromock
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
