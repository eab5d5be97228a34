//! Threaded mock collaborator for scenario testing
//!
//! Every notification is delivered from a worker thread spawned by the mock,
//! never from the thread that called into it.

#![allow(dead_code)]

use callgate::network::{
    ConnectOptions, ConnectionEvents, ErrorCode, Method, Request, Resource, StreamEvents,
    Transport,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::env;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Code the mock reports when the security handshake never completes.
pub const NEGOTIATION_TIMED_OUT: ErrorCode = 1049;
/// Code the mock reports for an exchange cut short by connection teardown.
pub const CONNECTION_CLOSED: ErrorCode = 2058;

/// Installs a test subscriber once; `RUST_LOG` selects the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Wait bound for scenarios expected to succeed, overridable from `.env`.
pub fn scenario_timeout() -> Duration {
    dotenvy::dotenv().ok();
    env::var("CALLGATE_TEST_TIMEOUT_MS")
        .ok()
        .and_then(|value| value.parse().ok())
        .map(Duration::from_millis)
        .unwrap_or(callgate::config::DEFAULT_TIMEOUT)
}

/// Byte at `offset` of every mock response body.
pub fn body_byte(offset: usize) -> u8 {
    (offset % 251) as u8
}

#[derive(Debug, Clone, Copy)]
pub enum Setup {
    /// Report a connection after `delay`.
    Succeed(Duration),
    /// Report `code` without a connection after `delay`.
    Fail(Duration, ErrorCode),
    /// Never report.
    Never,
}

#[derive(Debug, Clone, Copy)]
pub enum Completion {
    /// Report `code` after the body.
    Report(ErrorCode),
    /// Stall after the body until the connection is released.
    Stall,
}

#[derive(Debug, Clone, Copy)]
pub struct Behavior {
    pub setup: Setup,
    pub reject_connect: Option<ErrorCode>,
    pub reject_request: Option<ErrorCode>,
    pub reject_acquire: Option<(Resource, ErrorCode)>,
    pub body_size: usize,
    pub max_chunk: usize,
    pub seed: u64,
    pub completion: Completion,
    /// `None` never confirms teardown.
    pub shutdown: Option<ErrorCode>,
}

impl Default for Behavior {
    fn default() -> Self {
        Self {
            setup: Setup::Succeed(Duration::from_millis(10)),
            reject_connect: None,
            reject_request: None,
            reject_acquire: None,
            body_size: 4096,
            max_chunk: 1024,
            seed: 7,
            completion: Completion::Report(0),
            shutdown: Some(0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockConnection {
    pub id: u32,
}

#[derive(Debug, PartialEq, Eq)]
pub struct MockExchange {
    pub id: u32,
}

/// Calls the harness made, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Acquire(Resource),
    Release(Resource),
    Connect,
    IssueRequest,
    ReleaseExchange,
    ReleaseConnection,
}

/// A stalled exchange, completed only when its connection is released.
#[derive(Default)]
struct Pending {
    body: Option<JoinHandle<()>>,
    stream: Option<Arc<dyn StreamEvents>>,
}

pub struct MockTransport {
    behavior: Behavior,
    calls: Vec<Call>,
    requests: Vec<(Method, Option<usize>)>,
    held: Vec<Resource>,
    next_id: u32,
    connection_events: Option<Arc<dyn ConnectionEvents<MockConnection>>>,
    pending: Arc<Mutex<Pending>>,
    workers: Vec<JoinHandle<()>>,
}

impl MockTransport {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            calls: Vec::new(),
            requests: Vec::new(),
            held: Vec::new(),
            next_id: 1,
            connection_events: None,
            pending: Arc::new(Mutex::new(Pending::default())),
            workers: Vec::new(),
        }
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    /// Method and body length of every accepted request.
    pub fn requests(&self) -> &[(Method, Option<usize>)] {
        &self.requests
    }

    /// Shuts `connection` down from the collaborator's side, as a peer
    /// closing the socket would.
    pub fn close_from_peer(&mut self, connection: MockConnection, code: ErrorCode) {
        if let Some(events) = self.connection_events.clone() {
            self.spawn(move || events.on_shutdown(connection, code));
        }
    }

    /// Upstream resources acquired and not yet released.
    pub fn held(&self) -> &[Resource] {
        &self.held
    }

    pub fn count(&self, call: Call) -> usize {
        self.calls.iter().filter(|c| **c == call).count()
    }

    pub fn position(&self, call: Call) -> Option<usize> {
        self.calls.iter().position(|c| *c == call)
    }

    /// Waits for every worker, so late notifications have landed.
    pub fn join(&mut self) {
        for worker in self.workers.drain(..) {
            worker.join().unwrap();
        }
    }

    fn spawn(&mut self, work: impl FnOnce() + Send + 'static) {
        self.workers.push(thread::spawn(work));
    }
}

impl Drop for MockTransport {
    fn drop(&mut self) {
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

impl Transport for MockTransport {
    type Connection = MockConnection;
    type Exchange = MockExchange;

    fn acquire(&mut self, resource: Resource) -> Result<(), ErrorCode> {
        self.calls.push(Call::Acquire(resource));
        if let Some((rejected, code)) = self.behavior.reject_acquire {
            if rejected == resource {
                return Err(code);
            }
        }
        self.held.push(resource);
        Ok(())
    }

    fn release(&mut self, resource: Resource) {
        self.calls.push(Call::Release(resource));
        assert_eq!(self.held.pop(), Some(resource), "released out of order");
    }

    fn connect(
        &mut self,
        _options: &ConnectOptions,
        events: Arc<dyn ConnectionEvents<MockConnection>>,
    ) -> Result<(), ErrorCode> {
        self.calls.push(Call::Connect);
        if let Some(code) = self.behavior.reject_connect {
            return Err(code);
        }
        self.connection_events = Some(Arc::clone(&events));
        let connection = MockConnection { id: self.next_id };
        self.next_id += 1;
        let setup = self.behavior.setup;
        match setup {
            Setup::Succeed(delay) => self.spawn(move || {
                thread::sleep(delay);
                events.on_setup(Some(connection), 0);
            }),
            Setup::Fail(delay, code) => self.spawn(move || {
                thread::sleep(delay);
                events.on_setup(None, code);
            }),
            Setup::Never => {}
        }
        Ok(())
    }

    fn issue_request(
        &mut self,
        _connection: &MockConnection,
        request: &Request<'_>,
        events: Arc<dyn StreamEvents>,
    ) -> Result<MockExchange, ErrorCode> {
        self.calls.push(Call::IssueRequest);
        assert!(request.header("Host").is_some());
        if let Some(code) = self.behavior.reject_request {
            return Err(code);
        }
        self.requests
            .push((request.method, request.body.map(<[u8]>::len)));
        let exchange = MockExchange { id: self.next_id };
        self.next_id += 1;

        let behavior = self.behavior;
        let pending = Arc::clone(&self.pending);
        let worker = thread::spawn(move || {
            events.on_response_headers(&[]);
            let mut rng = StdRng::seed_from_u64(behavior.seed);
            let mut offset = 0;
            while offset < behavior.body_size {
                let len = rng
                    .gen_range(1..=behavior.max_chunk)
                    .min(behavior.body_size - offset);
                let chunk: Vec<u8> = (offset..offset + len).map(body_byte).collect();
                events.on_response_body(&chunk);
                offset += len;
            }
            match behavior.completion {
                Completion::Report(code) => events.on_complete(code),
                Completion::Stall => pending.lock().unwrap().stream = Some(events),
            }
        });
        match behavior.completion {
            Completion::Report(_) => self.workers.push(worker),
            Completion::Stall => self.pending.lock().unwrap().body = Some(worker),
        }
        Ok(exchange)
    }

    fn release_exchange(&mut self, _exchange: MockExchange) {
        self.calls.push(Call::ReleaseExchange);
    }

    fn release_connection(&mut self, connection: MockConnection) {
        self.calls.push(Call::ReleaseConnection);
        let events = self.connection_events.clone();
        let pending = Arc::clone(&self.pending);
        let shutdown = self.behavior.shutdown;
        self.spawn(move || {
            thread::sleep(Duration::from_millis(5));
            let body = pending.lock().unwrap().body.take();
            if let Some(body) = body {
                body.join().unwrap();
            }
            let stalled = pending.lock().unwrap().stream.take();
            if let Some(stream) = stalled {
                stream.on_complete(CONNECTION_CLOSED);
            }
            if let (Some(events), Some(code)) = (events, shutdown) {
                events.on_shutdown(connection, code);
            }
        });
    }
}
