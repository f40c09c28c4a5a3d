//! TCP Server
//!
//! Accepts connections and runs each on its own thread. Clients keep pools of
//! long-lived sockets, so connections are not multiplexed over a fixed pool.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::sync::WaitGroup;
use parking_lot::Mutex;

use crate::engine::Engine;
use crate::error::Result;

use super::Connection;

/// How often the accept loop checks the shutdown flag while idle
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Live connections, kept so shutdown can unblock their reads
#[derive(Default)]
struct Registry {
    next_id: AtomicU64,
    streams: Mutex<HashMap<u64, TcpStream>>,
}

impl Registry {
    fn len(&self) -> usize {
        self.streams.lock().len()
    }

    fn register(self: &Arc<Self>, stream: TcpStream) -> Slot {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.streams.lock().insert(id, stream);
        Slot {
            id,
            registry: Arc::clone(self),
        }
    }

    fn close_all(&self) {
        for stream in self.streams.lock().values() {
            let _ = stream.shutdown(Shutdown::Both);
        }
    }
}

/// Deregisters its connection on drop
struct Slot {
    id: u64,
    registry: Arc<Registry>,
}

impl Drop for Slot {
    fn drop(&mut self) {
        self.registry.streams.lock().remove(&self.id);
    }
}

/// TCP server for aeromock
pub struct Server {
    engine: Arc<Engine>,
    listener: TcpListener,
    shutdown: Arc<AtomicBool>,
    registry: Arc<Registry>,
}

impl Server {
    /// Bind the engine's configured listen address
    pub fn bind(engine: Arc<Engine>) -> Result<Self> {
        let listener = TcpListener::bind(&engine.config().listen_addr)?;
        listener.set_nonblocking(true)?;
        tracing::info!("Listening on {}", listener.local_addr()?);
        Ok(Self {
            engine,
            listener,
            shutdown: Arc::new(AtomicBool::new(false)),
            registry: Arc::new(Registry::default()),
        })
    }

    /// The bound address (useful when binding port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Flag that stops [`run`](Self::run) when set
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Signal the server to shutdown gracefully
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Number of open client connections
    pub fn connection_count(&self) -> usize {
        self.registry.len()
    }

    /// Start the server (blocking until shutdown)
    ///
    /// On shutdown, open connections are closed and their threads joined.
    pub fn run(&self) -> Result<()> {
        let config = self.engine.config();
        let wait_group = WaitGroup::new();

        while !self.shutdown.load(Ordering::SeqCst) {
            let (stream, addr) = match self.listener.accept() {
                Ok(accepted) => accepted,
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                    continue;
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::warn!("Accept failed: {}", e);
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                    continue;
                }
            };

            if self.registry.len() >= config.max_connections {
                tracing::warn!(
                    "Rejecting {}: {} connections already open",
                    addr,
                    config.max_connections
                );
                continue;
            }

            // a failed setup costs only this connection
            if let Err(e) = self.start_connection(stream, addr, &wait_group) {
                tracing::warn!("Dropping {}: connection setup failed: {}", addr, e);
            }
        }

        tracing::info!(
            "Shutting down, closing {} connections",
            self.registry.len()
        );
        self.registry.close_all();
        wait_group.wait();
        Ok(())
    }

    /// Register `stream` and hand it to its own thread
    fn start_connection(
        &self,
        stream: TcpStream,
        addr: SocketAddr,
        wait_group: &WaitGroup,
    ) -> Result<()> {
        let config = self.engine.config();

        // accepted sockets inherit non-blocking mode on some platforms
        stream.set_nonblocking(false)?;
        let slot = self.registry.register(stream.try_clone()?);
        let engine = Arc::clone(&self.engine);
        let (read_ms, write_ms) = (config.read_timeout_ms, config.write_timeout_ms);
        let done = wait_group.clone();

        // on a spawn failure the closure is dropped, releasing the slot
        thread::Builder::new()
            .name(format!("conn-{}", addr))
            .spawn(move || {
                let _slot = slot;
                let _done = done;
                let result = Connection::new(stream, engine).and_then(|mut connection| {
                    connection.set_timeouts(read_ms, write_ms)?;
                    connection.handle()
                });
                if let Err(e) = result {
                    tracing::debug!("Connection {} ended with error: {}", addr, e);
                }
            })?;
        Ok(())
    }
}
