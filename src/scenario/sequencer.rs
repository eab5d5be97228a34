use core::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::{Report, State, Verdict};
use crate::lifecycle::{ConnectionLifecycle, StreamLifecycle, StreamRecord};
use crate::network::error::{Error, ErrorCode, UsageError};
use crate::network::{
    ConnectOptions, ConnectionEvents, Request, Resource, ResourceLedger, StreamEvents, Transport,
};

/// Runs one scenario against a collaborator.
///
/// Each step blocks at most `timeout` on a collaborator notification. Steps
/// may be called one by one, or all at once through [`Sequencer::run`].
pub struct Sequencer<T: Transport> {
    transport: T,
    options: ConnectOptions,
    timeout: Duration,
    state: State,
    ledger: ResourceLedger,
    connection: Arc<ConnectionLifecycle<T::Connection>>,
    stream: Arc<StreamLifecycle>,
    handle: Option<T::Connection>,
    exchange: Option<T::Exchange>,
    completed: Option<StreamRecord>,
    shutdown_code: Option<ErrorCode>,
}

impl<T: Transport> fmt::Debug for Sequencer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sequencer")
            .field("state", &self.state)
            .field("host", &self.options.host)
            .field("port", &self.options.port)
            .field("held", &self.ledger.held())
            .field("connection", &self.handle)
            .field("exchange", &self.exchange.is_some())
            .finish()
    }
}

impl<T: Transport> Sequencer<T> {
    /// Creates a sequencer in `Idle`. Nothing is acquired until [`connect`](Self::connect).
    pub fn new(transport: T, options: ConnectOptions, timeout: Duration) -> Self {
        Self {
            transport,
            options,
            timeout,
            state: State::Idle,
            ledger: ResourceLedger::new(),
            connection: Arc::new(ConnectionLifecycle::new()),
            stream: Arc::new(StreamLifecycle::new()),
            handle: None,
            exchange: None,
            completed: None,
            shutdown_code: None,
        }
    }

    /// Replaces the stream controller before any request is issued, e.g. to
    /// acknowledge body chunks with a fixed window.
    pub fn with_stream(mut self, stream: StreamLifecycle) -> Self {
        self.stream = Arc::new(stream);
        self
    }

    /// Current lifecycle state.
    pub fn state(&self) -> State {
        self.state
    }

    /// The collaborator.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The collaborator, mutably.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Upstream resources currently held, oldest first.
    pub fn held_resources(&self) -> &[Resource] {
        self.ledger.held()
    }

    /// The connection controller handed to the collaborator.
    pub fn connection_lifecycle(&self) -> &ConnectionLifecycle<T::Connection> {
        &self.connection
    }

    /// The stream controller handed to the collaborator.
    pub fn stream_lifecycle(&self) -> &StreamLifecycle {
        &self.stream
    }

    fn check(&self, next: State) -> Result<(), Error> {
        if self.state.can_advance_to(next) {
            Ok(())
        } else {
            Err(UsageError::InvalidTransition {
                from: self.state,
                to: next,
            }
            .into())
        }
    }

    fn advance(&mut self, next: State) -> Result<(), Error> {
        self.check(next)?;
        tracing::debug!(from = ?self.state, to = ?next, "scenario transition");
        self.state = next;
        Ok(())
    }

    fn acquire(&mut self, resource: Resource) -> Result<(), Error> {
        self.ledger.push(resource)?;
        if let Err(code) = self.transport.acquire(resource) {
            self.ledger.pop();
            tracing::warn!(resource = resource.as_str(), code, "resource acquisition rejected");
            return Err(Error::Rejected(code));
        }
        tracing::debug!(resource = resource.as_str(), "resource acquired");
        Ok(())
    }

    fn release_upstream(&mut self) {
        while let Some(resource) = self.ledger.pop() {
            self.transport.release(resource);
            tracing::debug!(resource = resource.as_str(), "resource released");
        }
    }

    /// Acquires the upstream resources, starts the connect and waits for setup.
    pub fn connect(&mut self) -> Result<T::Connection, Error> {
        self.advance(State::Connecting)?;
        self.acquire(Resource::EventLoopGroup)?;
        self.acquire(Resource::HostResolver)?;
        self.acquire(Resource::ClientBootstrap)?;
        if self.options.security.is_some() {
            self.acquire(Resource::SecurityContext)?;
        }

        tracing::info!(
            host = self.options.host.as_str(),
            port = self.options.port,
            secure = self.options.security.is_some(),
            "connecting"
        );
        let events: Arc<dyn ConnectionEvents<T::Connection>> = self.connection.clone();
        self.transport
            .connect(&self.options, events)
            .map_err(Error::Rejected)?;

        let connection = self.connection.await_setup(self.timeout).inspect_err(|err| {
            tracing::warn!(%err, "connection setup did not succeed");
        })?;
        self.handle = Some(connection.clone());
        self.advance(State::Connected)?;
        Ok(connection)
    }

    /// Starts an exchange on the established connection.
    ///
    /// Fails with [`Error::Closed`] if the collaborator has already shut the
    /// connection down; the handle is never used after its shutdown.
    pub fn issue_request(&mut self, request: &Request<'_>) -> Result<(), Error> {
        self.check(State::RequestIssued)?;
        let connection = self.handle.as_ref().ok_or(UsageError::NotEstablished)?;
        if let Some(code) = self.connection.shutdown_code() {
            tracing::warn!(code, "connection shut down before the request was issued");
            return Err(Error::Closed(code));
        }

        tracing::info!(method = request.method.as_str(), path = request.path, "issuing request");
        let events: Arc<dyn StreamEvents> = self.stream.clone();
        let exchange = self
            .transport
            .issue_request(connection, request, events)
            .map_err(Error::Rejected)?;
        self.exchange = Some(exchange);
        self.advance(State::RequestIssued)
    }

    /// Waits for the in-flight exchange to complete.
    pub fn await_stream(&mut self) -> Result<StreamRecord, Error> {
        self.check(State::StreamComplete)?;
        if self.exchange.is_none() {
            return Err(UsageError::NoExchange.into());
        }
        let record = self.stream.await_complete(self.timeout)?;
        tracing::info!(
            body_size = record.body_size,
            chunks = record.chunks,
            "exchange complete"
        );
        self.completed = Some(record.clone());
        self.advance(State::StreamComplete)?;
        Ok(record)
    }

    /// Releases the completed exchange.
    pub fn release_stream(&mut self) -> Result<(), Error> {
        if self.exchange.is_none() {
            return Err(UsageError::NoExchange.into());
        }
        if !self.stream.is_complete() {
            return Err(UsageError::ExchangeStillActive.into());
        }
        self.advance(State::ReleasingStream)?;
        if let Some(exchange) = self.exchange.take() {
            self.transport.release_exchange(exchange);
        }
        Ok(())
    }

    /// Requests connection teardown. Any exchange must already be released.
    pub fn release_connection(&mut self) -> Result<(), Error> {
        if self.exchange.is_some() {
            return Err(UsageError::ExchangeStillHeld.into());
        }
        self.check(State::ReleasingConnection)?;
        let connection = self.handle.take().ok_or(UsageError::NotEstablished)?;
        if self.connection.is_shutdown() {
            tracing::debug!("connection already shut down by the collaborator");
        } else {
            self.transport.release_connection(connection);
        }
        self.advance(State::ReleasingConnection)
    }

    /// Waits for the collaborator to confirm teardown, then releases the
    /// upstream resources and closes the scenario.
    ///
    /// The upstream resources are released even when the wait times out; the
    /// timeout is still returned.
    pub fn await_shutdown(&mut self) -> Result<ErrorCode, Error> {
        self.advance(State::AwaitingShutdown)?;
        let outcome = self.connection.await_shutdown(self.timeout);
        match outcome {
            Ok(0) => tracing::debug!("connection shutdown confirmed"),
            Ok(code) => tracing::warn!(code, "connection shut down with an error"),
            Err(err) => tracing::warn!(%err, "connection shutdown not confirmed"),
        }
        self.release_upstream();
        self.advance(State::Closed)?;
        let code = outcome?;
        self.shutdown_code = Some(code);
        Ok(code)
    }

    /// Runs the whole scenario: connect, optionally fetch `request`, tear down.
    ///
    /// Timeouts and collaborator failures go through [`abort`](Self::abort).
    ///
    /// # Panics
    ///
    /// Panics on a [`UsageError`], e.g. when the sequencer has already run.
    pub fn run(&mut self, request: Option<&Request<'_>>) -> Report {
        let report = match self.drive(request) {
            Ok(()) => self.report(Verdict::Success),
            Err(err) => self.abort(err),
        };
        tracing::info!(verdict = ?report.verdict, state = ?report.state, "scenario finished");
        report
    }

    /// Ends the scenario after `cause`, releasing whatever is still held.
    ///
    /// From `Connecting`, `Connected` or `RequestIssued` the scenario enters
    /// `Failed` and cleans up best-effort. Once the exchange has completed
    /// the orderly teardown is finished instead, so a caller whose own
    /// validation fails can still release everything in order.
    ///
    /// # Panics
    ///
    /// Panics if `cause` is a [`UsageError`]; cleanup is not attempted with
    /// the sequencing in an unknown state.
    pub fn abort(&mut self, cause: Error) -> Report {
        let Some(verdict) = Verdict::from_error(cause) else {
            panic!("scenario sequencing defect: {cause}");
        };
        if self.state.can_advance_to(State::Failed) {
            self.fail(cause);
        } else if !self.state.is_terminal() && self.state != State::Idle {
            if let Err(err) = self.teardown() {
                tracing::warn!(%err, "teardown after abort did not finish");
            }
        }
        self.report(verdict)
    }

    fn drive(&mut self, request: Option<&Request<'_>>) -> Result<(), Error> {
        self.connect()?;
        if let Some(request) = request {
            self.issue_request(request)?;
            self.await_stream()?;
        }
        self.teardown()
    }

    fn teardown(&mut self) -> Result<(), Error> {
        if self.state == State::StreamComplete {
            self.release_stream()?;
        }
        if matches!(self.state, State::Connected | State::ReleasingStream) {
            self.release_connection()?;
        }
        if self.state == State::ReleasingConnection {
            self.await_shutdown()?;
        }
        Ok(())
    }

    /// Enters `Failed` and releases whatever is held.
    ///
    /// An exchange whose completion was never observed cannot be released
    /// yet, so its connection goes first. This is the one place the release
    /// order is not the exact reverse of acquisition.
    fn fail(&mut self, cause: Error) {
        tracing::warn!(%cause, state = ?self.state, "scenario failed, releasing held resources");
        debug_assert!(self.state.can_advance_to(State::Failed));
        self.state = State::Failed;

        let mut released = false;
        if let Some(exchange) = self.exchange.take() {
            if self.stream.is_complete() {
                self.transport.release_exchange(exchange);
            } else {
                // Tearing down the connection makes the collaborator fail the
                // in-flight exchange, which lets it be released.
                released = self.release_live_connection();
                match self.stream.await_complete(self.timeout) {
                    Ok(_) | Err(Error::AsyncFailure(_)) => {
                        self.transport.release_exchange(exchange)
                    }
                    Err(err) => {
                        tracing::warn!(%err, "exchange never completed, abandoning its handle")
                    }
                }
            }
        }
        if !released {
            released = self.release_live_connection();
        }
        if released {
            match self.connection.await_shutdown(self.timeout) {
                Ok(code) => self.shutdown_code = Some(code),
                Err(err) => tracing::warn!(%err, "connection shutdown not confirmed during cleanup"),
            }
        }

        self.release_upstream();
    }

    /// Returns whether a connection was held, handing it back to the
    /// collaborator unless its shutdown was already observed.
    fn release_live_connection(&mut self) -> bool {
        // A setup that landed after its wait timed out is still a live connection.
        let Some(connection) = self
            .handle
            .take()
            .or_else(|| self.connection.established())
        else {
            return false;
        };
        if !self.connection.is_shutdown() {
            self.transport.release_connection(connection);
        }
        true
    }

    fn report(&self, verdict: Verdict) -> Report {
        Report {
            verdict,
            state: self.state,
            body_size: self.completed.as_ref().map(|record| record.body_size),
            checksum: self.completed.as_ref().map(|record| record.checksum),
            shutdown_code: self.shutdown_code,
        }
    }
}
