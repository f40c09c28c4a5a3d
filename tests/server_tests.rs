//! End-to-end tests over a real TCP socket

mod common;

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use aeromock::config::DEFAULT_MAX_MESSAGE_SIZE;
use aeromock::engine::{Request, RequestFlags};
use aeromock::network::Server;
use aeromock::protocol::{read_message, Operation, ResultCode, Value};
use aeromock::{Config, Engine};

use common::{info_request, key, parse_info, parse_response};

struct Running {
    addr: SocketAddr,
    shutdown: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl Running {
    fn stop(self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.handle.join().unwrap();
    }
}

fn start(listen: &str) -> Running {
    start_with(Config::builder().listen_addr(listen).build())
}

fn start_with(config: Config) -> Running {
    let engine = Arc::new(Engine::new(config).unwrap());
    let server = Server::bind(engine).unwrap();
    let addr = server.local_addr().unwrap();
    let shutdown = server.shutdown_handle();
    let handle = thread::spawn(move || server.run().unwrap());
    Running {
        addr,
        shutdown,
        handle,
    }
}

fn roundtrip(stream: &mut TcpStream, message: &[u8]) -> Vec<u8> {
    stream.write_all(message).unwrap();
    read_message(stream, DEFAULT_MAX_MESSAGE_SIZE).unwrap()
}

/// One info round trip on a fresh connection, `None` if the server hung up
fn try_info(addr: SocketAddr) -> Option<(TcpStream, Vec<u8>)> {
    let mut stream = TcpStream::connect(addr).ok()?;
    stream.set_read_timeout(Some(Duration::from_secs(5))).ok()?;
    stream.write_all(&info_request(&["node"])).ok()?;
    let response = read_message(&mut stream, DEFAULT_MAX_MESSAGE_SIZE).ok()?;
    Some((stream, response))
}

#[test]
fn test_info_over_tcp() {
    let server = start("127.0.0.1:0");
    let mut stream = TcpStream::connect(server.addr).unwrap();

    let response = roundtrip(&mut stream, &info_request(&["node", "partition-generation"]));
    let lines = parse_info(&response);
    assert_eq!(lines[0], ("node".to_string(), "BB9E152A39B2100".to_string()));
    assert_eq!(lines[1].1, "1");

    drop(stream);
    server.stop();
}

#[test]
fn test_put_get_over_tcp() {
    let server = start("127.0.0.1:0");
    let mut stream = TcpStream::connect(server.addr).unwrap();

    let write = Request::new(RequestFlags::write(), key(1))
        .operation(Operation::put("name", "test"))
        .operation(Operation::put("age", 10));
    let frame = parse_response(&roundtrip(&mut stream, &write.encode().unwrap()));
    assert_eq!(frame.result(), ResultCode::Ok);

    // several requests share one pooled connection
    for _ in 0..3 {
        let read = Request::new(RequestFlags::read_all(), key(1));
        let frame = parse_response(&roundtrip(&mut stream, &read.encode().unwrap()));
        assert_eq!(frame.bin("name"), Some(&Value::from("test")));
        assert_eq!(frame.bin("age"), Some(&Value::Integer(10)));
    }

    drop(stream);
    server.stop();
}

#[test]
fn test_records_visible_across_connections() {
    let server = start("127.0.0.1:0");
    let mut first = TcpStream::connect(server.addr).unwrap();
    let mut second = TcpStream::connect(server.addr).unwrap();

    let write = Request::new(RequestFlags::write(), key(2)).operation(Operation::put("a", 1));
    roundtrip(&mut first, &write.encode().unwrap());

    let read = Request::new(RequestFlags::read_all(), key(2));
    let frame = parse_response(&roundtrip(&mut second, &read.encode().unwrap()));
    assert_eq!(frame.bin("a"), Some(&Value::Integer(1)));

    drop(first);
    drop(second);
    server.stop();
}

#[test]
fn test_protocol_error_closes_connection() {
    let server = start("127.0.0.1:0");
    let mut stream = TcpStream::connect(server.addr).unwrap();
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();

    // record message whose header claims a length below the minimum
    let mut message = vec![2, 3, 0, 0, 0, 0, 0, 22];
    message.push(4);
    message.extend_from_slice(&[0; 21]);
    stream.write_all(&message).unwrap();

    let mut buf = [0u8; 1];
    let read = stream.read(&mut buf).unwrap_or(0);
    assert_eq!(read, 0);

    server.stop();
}

#[test]
fn test_shutdown_closes_open_connections() {
    let server = start("127.0.0.1:0");
    let mut stream = TcpStream::connect(server.addr).unwrap();
    roundtrip(&mut stream, &info_request(&["node"]));

    // the idle connection must not keep the server alive
    server.stop();

    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    let mut buf = [0u8; 1];
    assert_eq!(stream.read(&mut buf).unwrap_or(0), 0);
}

#[test]
fn test_dropped_connection_leaves_server_serving() {
    let config = Config::builder()
        .listen_addr("127.0.0.1:0")
        .max_connections(1)
        .build();
    let server = start_with(config);

    let (mut first, _) = try_info(server.addr).unwrap();

    // over the cap: this socket is dropped, the accept loop keeps going
    assert!(try_info(server.addr).is_none());
    roundtrip(&mut first, &info_request(&["node"]));

    // the slot frees once the first client leaves
    drop(first);
    let mut served = None;
    for _ in 0..100 {
        served = try_info(server.addr);
        if served.is_some() {
            break;
        }
        thread::sleep(Duration::from_millis(20));
    }
    let (stream, response) = served.unwrap();
    assert_eq!(parse_info(&response)[0].0, "node");

    drop(stream);
    server.stop();
}

#[test]
fn test_connection_churn_leaves_server_serving() {
    let server = start("127.0.0.1:0");
    for _ in 0..20 {
        let stream = TcpStream::connect(server.addr).unwrap();
        drop(stream);
    }
    let (stream, response) = try_info(server.addr).unwrap();
    assert_eq!(parse_info(&response)[0].0, "node");

    drop(stream);
    server.stop();
}
