//! aeromock CLI Client
//!
//! Command-line interface for poking at a running node.

use std::io::{BufReader, Write};
use std::net::TcpStream;

use aeromock::config::DEFAULT_MAX_MESSAGE_SIZE;
use aeromock::engine::{Request, RequestFlags};
use aeromock::protocol::{
    encode_preamble, read_message, Digest, Key, MessageReader, Operation, ResultCode,
    MSG_TYPE_INFO, PREAMBLE_SIZE, PROTO_VERSION,
};
use aeromock::{AeroError, Result};
use clap::{Parser, Subcommand};

/// aeromock CLI
#[derive(Parser, Debug)]
#[command(name = "aeromock-cli")]
#[command(about = "CLI for an aeromock node")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:3000")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Query info values (all of them when no names are given)
    Info {
        /// Info names
        names: Vec<String>,
    },

    /// Read a record by digest
    Get {
        /// Namespace
        #[arg(short, long, default_value = "test")]
        namespace: String,

        /// Record digest, 40 hex characters
        digest: String,

        /// Bins to read (all when omitted)
        bins: Vec<String>,
    },

    /// Delete a record by digest
    Del {
        /// Namespace
        #[arg(short, long, default_value = "test")]
        namespace: String,

        /// Record digest, 40 hex characters
        digest: String,
    },
}

fn main() {
    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let stream = TcpStream::connect(&args.server)?;
    let mut writer = stream.try_clone()?;
    let mut reader = BufReader::new(stream);

    let request = match &args.command {
        Commands::Info { names } => {
            let mut body = names.join("\n").into_bytes();
            if !body.is_empty() {
                body.push(b'\n');
            }
            let mut message = encode_preamble(PROTO_VERSION, MSG_TYPE_INFO, body.len() as u64)
                .to_be_bytes()
                .to_vec();
            message.extend_from_slice(&body);
            message
        }
        Commands::Get {
            namespace,
            digest,
            bins,
        } => {
            let key = Key::new(namespace.clone(), parse_digest(digest)?);
            let request = if bins.is_empty() {
                Request::new(RequestFlags::read_all(), key)
            } else {
                bins.iter().fold(Request::new(RequestFlags::read(), key), |req, bin| {
                    req.operation(Operation::get_bin(bin.clone()))
                })
            };
            request.encode()?.to_vec()
        }
        Commands::Del { namespace, digest } => {
            let key = Key::new(namespace.clone(), parse_digest(digest)?);
            Request::new(RequestFlags::delete(), key).encode()?.to_vec()
        }
    };

    writer.write_all(&request)?;
    writer.flush()?;
    let response = read_message(&mut reader, DEFAULT_MAX_MESSAGE_SIZE)?;

    match args.command {
        Commands::Info { .. } => {
            print!("{}", String::from_utf8_lossy(&response[PREAMBLE_SIZE..]));
        }
        Commands::Get { .. } | Commands::Del { .. } => print_record(&response)?,
    }
    Ok(())
}

fn parse_digest(text: &str) -> Result<Digest> {
    let bytes = hex::decode(text)
        .map_err(|e| AeroError::Config(format!("digest is not hex: {}", e)))?;
    bytes
        .try_into()
        .map_err(|b: Vec<u8>| {
            AeroError::Config(format!("digest must be 20 bytes, got {}", b.len()))
        })
}

fn print_record(response: &[u8]) -> Result<()> {
    let mut reader = MessageReader::new(response);
    reader.skip(PREAMBLE_SIZE)?;
    let header = reader.read_header()?;
    match header.result() {
        Some(ResultCode::Ok) => {}
        Some(code) => {
            println!("{}", code);
            return Ok(());
        }
        None => {
            println!("result code {}", header.result_code);
            return Ok(());
        }
    }

    let _key = reader.read_key_fields(header.field_count)?;
    for operation in reader.read_operations(header.operation_count)? {
        println!(
            "{} = {}",
            operation.bin_name.unwrap_or_default(),
            operation.value
        );
    }
    println!("OK");
    Ok(())
}
