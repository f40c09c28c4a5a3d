//! Configuration for aeromock
//!
//! Centralized configuration with sensible defaults.

use std::net::SocketAddr;

use crate::error::{AeroError, Result};

/// Maximum inbound payload size (16 MB)
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Main configuration for an aeromock instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Cluster Identity
    // -------------------------------------------------------------------------
    /// Namespaces this node claims to own. Reported through `replicas-all`;
    /// clients refuse to route to a node that owns none.
    pub namespaces: Vec<String>,

    /// `host:port` advertised through the `service*` info keys.
    /// `None` advertises `listen_addr`.
    pub service_addr: Option<String>,

    // -------------------------------------------------------------------------
    // Engine Configuration
    // -------------------------------------------------------------------------
    /// Number of lock stripes used to serialize requests on the same key
    pub lock_stripes: usize,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Max concurrent client connections
    pub max_connections: usize,

    /// Connection read timeout (milliseconds, 0 disables).
    /// Clients keep pooled sockets idle for long stretches.
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 disables)
    pub write_timeout_ms: u64,

    /// Largest accepted payload after the 8-byte preamble
    pub max_message_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            namespaces: vec!["test".to_string()],
            service_addr: None,
            lock_stripes: 64,
            listen_addr: "127.0.0.1:3000".to_string(),
            max_connections: 1024,
            read_timeout_ms: 0,
            write_timeout_ms: 5000,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// The address reported to clients in `service`, `services` and
    /// `service-clear-std`
    pub fn advertised_service(&self) -> &str {
        self.service_addr.as_deref().unwrap_or(&self.listen_addr)
    }

    /// Check the settings that would otherwise fail late (at bind time or
    /// on the first client handshake)
    pub fn validate(&self) -> Result<()> {
        if self.namespaces.is_empty() {
            return Err(AeroError::Config(
                "at least one namespace is required".to_string(),
            ));
        }
        if let Some(ns) = self.namespaces.iter().find(|ns| ns.is_empty() || ns.len() > 31) {
            return Err(AeroError::Config(format!(
                "invalid namespace name {:?} (1..=31 bytes)",
                ns
            )));
        }
        if self.lock_stripes == 0 {
            return Err(AeroError::Config("lock_stripes must be positive".to_string()));
        }
        if self.max_connections == 0 {
            return Err(AeroError::Config(
                "max_connections must be positive".to_string(),
            ));
        }
        self.listen_addr.parse::<SocketAddr>().map_err(|e| {
            AeroError::Config(format!("invalid listen address {}: {}", self.listen_addr, e))
        })?;
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Replace the namespace list
    pub fn namespaces<I, S>(mut self, namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.namespaces = namespaces.into_iter().map(Into::into).collect();
        self
    }

    /// Set the advertised service address
    pub fn service_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.service_addr = Some(addr.into());
        self
    }

    /// Set the number of per-key lock stripes
    pub fn lock_stripes(mut self, count: usize) -> Self {
        self.config.lock_stripes = count;
        self
    }

    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the maximum number of concurrent connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    /// Set the inbound payload cap (in bytes)
    pub fn max_message_size(mut self, size: usize) -> Self {
        self.config.max_message_size = size;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
