//! # Scenario Sequencer
//!
//! Drives one connect, fetch and teardown scenario against a
//! [`Transport`](crate::network::Transport), one blocking step at a time.
//!
//! ## Design
//!
//! The sequencer is a state machine. Every step validates its transition
//! before touching the collaborator, so a step called out of order is reported
//! as a [`UsageError`](crate::network::UsageError) and nothing is started:
//!
//! * `Idle`: nothing acquired.
//! * `Connecting`: upstream resources acquired, connect in flight.
//! * `Connected`: setup confirmed, connection handle held.
//! * `RequestIssued`: exchange in flight.
//! * `StreamComplete`: completion observed.
//! * `ReleasingStream`: exchange released.
//! * `ReleasingConnection`: connection teardown requested.
//! * `AwaitingShutdown`: waiting for the collaborator to confirm teardown.
//! * `Closed`: everything released.
//!
//! `Failed` is reachable from `Connecting`, `Connected` and `RequestIssued`
//! when a wait times out, the collaborator reports a failure, or it shuts the
//! connection down before the request is issued. Entering it
//! releases whatever is held, in reverse acquisition order.
//!
//! Resources are acquired in the order event-loop-group, host-resolver,
//! client-bootstrap, security-context, connection, exchange, and released in
//! exactly the reverse order.

use crate::network::error::{Error, ErrorCode};

mod sequencer;

pub use sequencer::Sequencer;

/// Where a scenario is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Nothing acquired yet.
    Idle,
    /// Upstream resources acquired, waiting for setup.
    Connecting,
    /// Setup succeeded.
    Connected,
    /// An exchange is in flight.
    RequestIssued,
    /// The exchange completed successfully.
    StreamComplete,
    /// The exchange has been released.
    ReleasingStream,
    /// Connection teardown requested.
    ReleasingConnection,
    /// Waiting for the collaborator to confirm teardown.
    AwaitingShutdown,
    /// Every resource has been released.
    Closed,
    /// A wait timed out or the collaborator reported a failure.
    Failed,
}

impl State {
    /// Whether a scenario in `self` may move to `next`.
    pub fn can_advance_to(self, next: State) -> bool {
        use State::*;
        matches!(
            (self, next),
            (Idle, Connecting)
                | (Connecting, Connected)
                | (Connected, RequestIssued)
                | (Connected, ReleasingConnection)
                | (RequestIssued, StreamComplete)
                | (StreamComplete, ReleasingStream)
                | (ReleasingStream, ReleasingConnection)
                | (ReleasingConnection, AwaitingShutdown)
                | (AwaitingShutdown, Closed)
                | (Connecting | Connected | RequestIssued, Failed)
        )
    }

    /// `Closed` and `Failed` admit no further steps.
    pub fn is_terminal(self) -> bool {
        matches!(self, State::Closed | State::Failed)
    }
}

/// Outcome of a scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Every step succeeded and teardown was confirmed.
    Success,
    /// The collaborator refused an attempt or reported this code.
    Failure(ErrorCode),
    /// A wait reached its deadline.
    Timeout,
    /// The collaborator shut the connection down, with this code, before the
    /// scenario was done with it.
    Closed(ErrorCode),
    /// The caller ended the scenario over its own configuration.
    Invalid,
}

impl Verdict {
    /// `None` for usage errors, which end no scenario.
    fn from_error(err: Error) -> Option<Self> {
        match err {
            Error::Timeout => Some(Verdict::Timeout),
            Error::AsyncFailure(code) | Error::Rejected(code) => Some(Verdict::Failure(code)),
            Error::Closed(code) => Some(Verdict::Closed(code)),
            Error::InvalidConfig => Some(Verdict::Invalid),
            Error::Usage(_) => None,
        }
    }
}

/// What a finished scenario reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// Overall outcome.
    pub verdict: Verdict,
    /// State the scenario ended in.
    pub state: State,
    /// Body bytes received, when the exchange completed successfully.
    pub body_size: Option<u64>,
    /// CRC-32 of the body, when the exchange completed successfully.
    pub checksum: Option<u32>,
    /// Code the collaborator reported with its shutdown confirmation.
    pub shutdown_code: Option<ErrorCode>,
}
