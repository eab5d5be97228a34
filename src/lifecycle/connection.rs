use std::time::Duration;

use crate::network::error::{Error, ErrorCode};
use crate::network::ConnectionEvents;
use crate::sync::WaitCell;

/// What the harness knows about one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionRecord<C> {
    /// Handle delivered by a successful setup.
    pub connection: Option<C>,
    /// Last code reported by setup or shutdown.
    pub error_code: ErrorCode,
    /// Set once the collaborator confirms teardown.
    pub shutdown: bool,
}

impl<C> Default for ConnectionRecord<C> {
    fn default() -> Self {
        Self {
            connection: None,
            error_code: 0,
            shutdown: false,
        }
    }
}

impl<C> ConnectionRecord<C> {
    fn setup_observed(&self) -> bool {
        self.error_code != 0 || self.connection.is_some()
    }

    fn shutdown_observed(&self) -> bool {
        self.error_code != 0 || self.shutdown
    }
}

/// Bridges connection setup and shutdown notifications into blocking waits.
#[derive(Debug)]
pub struct ConnectionLifecycle<C> {
    record: WaitCell<ConnectionRecord<C>>,
}

impl<C> Default for ConnectionLifecycle<C> {
    fn default() -> Self {
        Self {
            record: WaitCell::new(ConnectionRecord::default()),
        }
    }
}

impl<C: Clone> ConnectionLifecycle<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks until setup is reported or `timeout` elapses.
    pub fn await_setup(&self, timeout: Duration) -> Result<C, Error> {
        let record = self
            .record
            .wait_for(timeout, ConnectionRecord::setup_observed)?;
        match record.connection {
            Some(connection) if record.error_code == 0 => Ok(connection),
            _ => Err(Error::AsyncFailure(record.error_code)),
        }
    }

    /// Blocks until shutdown is confirmed, or setup failure is known, or
    /// `timeout` elapses. Returns the collaborator's teardown code.
    pub fn await_shutdown(&self, timeout: Duration) -> Result<ErrorCode, Error> {
        let record = self
            .record
            .wait_for(timeout, ConnectionRecord::shutdown_observed)?;
        if record.shutdown {
            Ok(record.error_code)
        } else {
            Err(Error::AsyncFailure(record.error_code))
        }
    }

    /// The handle, while setup has succeeded and shutdown is not yet observed.
    pub fn established(&self) -> Option<C> {
        self.record.inspect(|record| {
            if record.shutdown || record.error_code != 0 {
                None
            } else {
                record.connection.clone()
            }
        })
    }

    pub fn is_shutdown(&self) -> bool {
        self.record.inspect(|record| record.shutdown)
    }

    /// The teardown code, once shutdown has been observed.
    pub fn shutdown_code(&self) -> Option<ErrorCode> {
        self.record
            .inspect(|record| record.shutdown.then_some(record.error_code))
    }

    pub fn snapshot(&self) -> ConnectionRecord<C> {
        self.record.inspect(ConnectionRecord::clone)
    }
}

impl<C: Send> ConnectionEvents<C> for ConnectionLifecycle<C> {
    fn on_setup(&self, connection: Option<C>, error_code: ErrorCode) {
        tracing::debug!(
            error_code,
            established = connection.is_some(),
            "connection setup notified"
        );
        self.record.update(|record| {
            record.connection = connection;
            record.error_code = error_code;
        });
    }

    fn on_shutdown(&self, _connection: C, error_code: ErrorCode) {
        tracing::debug!(error_code, "connection shutdown notified");
        self.record.update(|record| {
            record.shutdown = true;
            record.error_code = error_code;
        });
    }
}
