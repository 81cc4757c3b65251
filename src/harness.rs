//! Test harness: ephemeral-port startup and a blocking line-JSON client.
//!
//! Integration tests start a real TCP server with [`start_mock_server`] and
//! speak to it through [`MockClient`]; unit-level tests can skip the socket
//! and call `MockServer::handle_request` directly.

use std::io::{self, BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;

use salad_protocol::{RpcRequest, RpcResponse};

use crate::clock::Clock;
use crate::plan::Plan;
use crate::server::{serve, MockServer, ServerHandle};

/// Start a server on an ephemeral localhost port.
pub fn start_mock_server(plan: Plan) -> io::Result<(Arc<MockServer>, ServerHandle)> {
    let server = Arc::new(MockServer::new(plan));
    let handle = serve(Arc::clone(&server), "127.0.0.1:0")?;
    Ok((server, handle))
}

/// Start a server with an injected clock.
pub fn start_mock_server_with_clock(
    plan: Plan,
    clock: Arc<dyn Clock>,
) -> io::Result<(Arc<MockServer>, ServerHandle)> {
    let server = Arc::new(MockServer::with_clock(plan, clock));
    let handle = serve(Arc::clone(&server), "127.0.0.1:0")?;
    Ok((server, handle))
}

/// Blocking client speaking the newline-delimited JSON envelope.
pub struct MockClient {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
    next_id: u64,
}

impl MockClient {
    pub fn connect(addr: SocketAddr) -> io::Result<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        let reader = BufReader::new(stream.try_clone()?);
        Ok(Self {
            reader,
            writer: stream,
            next_id: 0,
        })
    }

    /// Issue one RPC and wait for its response.
    pub fn call(&mut self, method: &str, payload: serde_json::Value) -> io::Result<RpcResponse> {
        self.next_id += 1;
        let request = RpcRequest {
            method: method.to_string(),
            request_id: format!("req-{}", self.next_id),
            payload,
        };
        let body = serde_json::to_string(&request)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        writeln!(self.writer, "{body}")?;
        self.writer.flush()?;

        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "server closed the connection",
            ));
        }
        serde_json::from_str(&line).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
    }
}

/// In-process call helper for tests that do not need a socket.
pub fn call_in_process(
    server: &MockServer,
    method: &str,
    payload: serde_json::Value,
) -> RpcResponse {
    server.handle_request(&RpcRequest {
        method: method.to_string(),
        request_id: String::new(),
        payload,
    })
}
