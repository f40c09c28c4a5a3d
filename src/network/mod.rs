//! Network Module
//!
//! TCP server and client handling.
//!
//! ## Architecture
//! - Single non-blocking acceptor loop
//! - One thread per client connection
//! - Every message routed through the shared Engine

mod connection;
mod server;

pub use connection::Connection;
pub use server::Server;
