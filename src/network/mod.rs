//! The contract between the harness and the callback-driven network client
//! it drives.
//!
//! The collaborator owns sockets, name resolution, the security layer and
//! protocol framing. The harness only sees the [`Transport`] trait, through
//! which it starts work, and the two notification traits through which the
//! collaborator reports progress from its own threads.
//!

#![allow(missing_docs)]
#![deny(unsafe_code)]

use core::fmt::Debug;
use std::sync::Arc;

/// Common error types for harness operations
pub mod error;

/// Request, header and connect parameters
pub mod request;

/// Upstream resource kinds and their ordering ledger
pub mod resource;

pub use error::{Error, ErrorCode, UsageError};
pub use request::{ConnectOptions, Header, Method, Request, SecurityOptions};
pub use resource::{Resource, ResourceLedger};

/// Re-exports of common traits
pub mod prelude {
    pub use super::{ConnectionEvents, StreamEvents, Transport};
}

/// Notifications about one connection attempt.
///
/// Both entry points may be called from any collaborator thread, including
/// one other than the thread that started the connect.
pub trait ConnectionEvents<C>: Send + Sync {
    /// The connect attempt finished: `Some` handle with code 0 on success,
    /// `None` with a nonzero code on failure. Called at most once.
    fn on_setup(&self, connection: Option<C>, error_code: ErrorCode);

    /// The collaborator has released everything behind `connection`. Called
    /// once, after a successful setup. The handle must not be used again.
    fn on_shutdown(&self, connection: C, error_code: ErrorCode);
}

/// Notifications about one request/response exchange.
pub trait StreamEvents: Send + Sync {
    /// Response headers arrived.
    fn on_response_headers(&self, _headers: &[Header]) {}

    /// The next body chunk, in transmission order.
    ///
    /// Returns the number of bytes the receiver is ready to take next, or
    /// `None` for the collaborator's default, unlimited continuation.
    fn on_response_body(&self, chunk: &[u8]) -> Option<usize>;

    /// The exchange finished. Called once, after every body chunk.
    fn on_complete(&self, error_code: ErrorCode);
}

/// The external collaborator.
///
/// Every method returns immediately. `connect` and `issue_request` report only
/// whether the attempt was accepted; outcomes arrive through the events.
pub trait Transport {
    /// Opaque handle to an established connection.
    type Connection: Clone + Debug + Send + 'static;
    /// Handle to an in-flight exchange.
    type Exchange;

    /// Creates an upstream resource.
    fn acquire(&mut self, resource: Resource) -> Result<(), ErrorCode>;

    /// Tears down an upstream resource.
    fn release(&mut self, resource: Resource);

    /// Begins an asynchronous connect.
    fn connect(
        &mut self,
        options: &ConnectOptions,
        events: Arc<dyn ConnectionEvents<Self::Connection>>,
    ) -> Result<(), ErrorCode>;

    /// Begins an exchange on an established connection.
    fn issue_request(
        &mut self,
        connection: &Self::Connection,
        request: &Request<'_>,
        events: Arc<dyn StreamEvents>,
    ) -> Result<Self::Exchange, ErrorCode>;

    /// Drops the harness's hold on a finished exchange.
    fn release_exchange(&mut self, exchange: Self::Exchange);

    /// Begins connection teardown; confirmed later through `on_shutdown`.
    fn release_connection(&mut self, connection: Self::Connection);
}
