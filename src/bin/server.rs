//! aeromock Server Binary
//!
//! Starts the TCP server for aeromock.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use aeromock::network::Server;
use aeromock::{Config, Engine};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

/// aeromock Server
#[derive(Parser, Debug)]
#[command(name = "aeromock-server")]
#[command(about = "In-memory Aerospike protocol emulator")]
#[command(version)]
struct Args {
    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:3000")]
    listen: String,

    /// Address advertised to clients (defaults to the listen address)
    #[arg(short, long)]
    service: Option<String>,

    /// Namespaces to serve (comma separated)
    #[arg(short, long, value_delimiter = ',', default_value = "test")]
    namespaces: Vec<String>,

    /// Maximum concurrent connections
    #[arg(short, long, default_value = "1024")]
    max_connections: usize,

    /// Idle read timeout in milliseconds (0 = never)
    #[arg(long, default_value = "0")]
    read_timeout_ms: u64,

    /// Per-key lock stripes
    #[arg(long, default_value = "64")]
    lock_stripes: usize,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,aeromock=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("aeromock Server v{}", aeromock::VERSION);
    tracing::info!("Listen address: {}", args.listen);
    tracing::info!("Namespaces: {}", args.namespaces.join(","));

    // Build config from args
    let mut builder = Config::builder()
        .listen_addr(&args.listen)
        .namespaces(args.namespaces)
        .max_connections(args.max_connections)
        .read_timeout_ms(args.read_timeout_ms)
        .lock_stripes(args.lock_stripes);
    if let Some(service) = args.service {
        builder = builder.service_addr(service);
    }
    let config = builder.build();

    let engine = match Engine::new(config) {
        Ok(e) => Arc::new(e),
        Err(e) => {
            tracing::error!("Failed to create engine: {}", e);
            std::process::exit(1);
        }
    };

    let server = match Server::bind(engine) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", args.listen, e);
            std::process::exit(1);
        }
    };

    let shutdown = server.shutdown_handle();
    if let Err(e) = ctrlc::set_handler(move || {
        tracing::info!("Received Ctrl+C, initiating shutdown...");
        shutdown.store(true, Ordering::SeqCst);
    }) {
        tracing::warn!("Signal handler setup failed: {}", e);
    }

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
