//! Dispatch core and TCP server binding.
//!
//! Every handler invocation is serialized through one server-wide mutex:
//! call counting, fault-rule evaluation, state mutation, clock reads, and
//! side effects all happen inside the critical section. Handlers complete
//! synchronously; the mutex holder never parks.

use std::collections::HashMap;
use std::io::{self, BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use salad_protocol::messages::AnyRequest;
use salad_protocol::{Method, RpcRequest, RpcResponse, RpcStatus, StatusCode};

use crate::clock::{Clock, SystemClock};
use crate::fault;
use crate::handlers;
use crate::plan::Plan;
use crate::side_effects::{FileSideEffects, NoopSideEffects, SideEffects};
use crate::state::State;

/// Everything a handler may touch during one call.
pub struct RuntimeContext<'a> {
    pub plan: &'a Plan,
    pub state: &'a mut State,
    pub clock: &'a dyn Clock,
    /// 1-based ordinal of this call among completed calls of its method.
    pub call_n: u64,
    pub side_effects: &'a dyn SideEffects,
}

struct Inner {
    state: State,
    calls: HashMap<Method, u64>,
}

/// The mock server: an immutable plan plus mutexed mutable state.
pub struct MockServer {
    plan: Arc<Plan>,
    clock: Arc<dyn Clock>,
    side_effects: Box<dyn SideEffects>,
    inner: Mutex<Inner>,
}

impl MockServer {
    pub fn new(plan: Plan) -> Self {
        Self::with_parts(plan, Arc::new(SystemClock), None)
    }

    pub fn with_clock(plan: Plan, clock: Arc<dyn Clock>) -> Self {
        Self::with_parts(plan, clock, None)
    }

    /// Full-control constructor. When no sink is given, the file sink is
    /// chosen iff the plan asks for placeholder files.
    pub fn with_parts(
        plan: Plan,
        clock: Arc<dyn Clock>,
        side_effects: Option<Box<dyn SideEffects>>,
    ) -> Self {
        let side_effects = side_effects.unwrap_or_else(|| {
            if plan.needs_file_side_effects() {
                Box::new(FileSideEffects)
            } else {
                Box::new(NoopSideEffects)
            }
        });
        let state = State::seed(&plan, clock.as_ref());
        Self {
            plan: Arc::new(plan),
            clock,
            side_effects,
            inner: Mutex::new(Inner {
                state,
                calls: HashMap::new(),
            }),
        }
    }

    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    /// Completed invocations of a method so far.
    pub fn calls(&self, method: Method) -> u64 {
        let inner = self.inner.lock().unwrap();
        inner.calls.get(&method).copied().unwrap_or(0)
    }

    /// Handle one envelope. Never panics on bad input; malformed requests
    /// become error responses.
    pub fn handle_request(&self, request: &RpcRequest) -> RpcResponse {
        let method: Method = match request.method.parse() {
            Ok(method) => method,
            Err(err) => {
                return RpcResponse::error(
                    request.request_id.clone(),
                    RpcStatus::unimplemented(err.to_string()),
                );
            }
        };

        let typed = match AnyRequest::decode(method, request.payload.clone()) {
            Ok(typed) => typed,
            Err(err) => {
                return RpcResponse::error(
                    request.request_id.clone(),
                    RpcStatus::invalid_argument(format!("{method}: decode request: {err}")),
                );
            }
        };

        match self.exec(method, &typed) {
            Ok(payload) => RpcResponse::success(request.request_id.clone(), payload),
            Err(status) => RpcResponse::error(request.request_id.clone(), status),
        }
    }

    fn exec(&self, method: Method, request: &AnyRequest) -> Result<serde_json::Value, RpcStatus> {
        let mut inner = self.inner.lock().unwrap();

        let call_n = {
            let count = inner.calls.entry(method).or_insert(0);
            *count += 1;
            *count
        };

        if let Some(rule) = fault::first_match(&self.plan.faults, method, request, call_n) {
            tracing::warn!(method = %method, call = call_n, code = %rule.code, "fault rule hit");
            // A rule responding OK does not produce an error.
            if rule.code != StatusCode::Ok {
                return Err(RpcStatus::new(rule.code, rule.message.clone()));
            }
        }

        let Inner { state, .. } = &mut *inner;
        let mut ctx = RuntimeContext {
            plan: &self.plan,
            state,
            clock: self.clock.as_ref(),
            call_n,
            side_effects: self.side_effects.as_ref(),
        };
        let result = handlers::dispatch(&mut ctx, request);
        match &result {
            Ok(_) => tracing::info!(method = %method, call = call_n, outcome = "ok", "rpc"),
            Err(status) => {
                tracing::info!(method = %method, call = call_n, outcome = %status.code, "rpc")
            }
        }
        result
    }
}

/// Handle to a running server: address plus cooperative shutdown.
pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown: Arc<AtomicBool>,
    join: Option<JoinHandle<()>>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting connections and join the accept thread. In-flight
    /// connections finish on their own threads.
    pub fn shutdown(mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

/// Bind a TCP listener and serve the mock until the handle is shut down.
pub fn serve(server: Arc<MockServer>, addr: &str) -> io::Result<ServerHandle> {
    let listener = TcpListener::bind(addr)?;
    let local_addr = listener.local_addr()?;
    listener.set_nonblocking(true)?;

    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&shutdown);
    let join = thread::spawn(move || accept_loop(listener, server, flag));

    Ok(ServerHandle {
        local_addr,
        shutdown,
        join: Some(join),
    })
}

fn accept_loop(listener: TcpListener, server: Arc<MockServer>, shutdown: Arc<AtomicBool>) {
    loop {
        if shutdown.load(Ordering::Relaxed) {
            break;
        }
        match listener.accept() {
            Ok((stream, _)) => {
                let server = Arc::clone(&server);
                thread::spawn(move || {
                    if let Err(err) = serve_connection(stream, server) {
                        tracing::debug!("connection ended with error: {err}");
                    }
                });
            }
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                thread::sleep(Duration::from_millis(25));
            }
            Err(err) => {
                tracing::warn!("accept error: {err}");
                thread::sleep(Duration::from_millis(25));
            }
        }
    }
}

fn serve_connection(stream: TcpStream, server: Arc<MockServer>) -> io::Result<()> {
    stream.set_nodelay(true)?;
    let reader = BufReader::new(stream.try_clone()?);
    let mut writer = stream;

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let response = match serde_json::from_str::<RpcRequest>(&line) {
            Ok(request) => server.handle_request(&request),
            Err(err) => RpcResponse::error(
                String::new(),
                RpcStatus::invalid_argument(format!("invalid request envelope: {err}")),
            ),
        };
        let body = serde_json::to_string(&response)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        writeln!(writer, "{body}")?;
        writer.flush()?;
    }
    Ok(())
}
