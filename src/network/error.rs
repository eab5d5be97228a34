//! Common error types for harness operations

use core::fmt;

use crate::scenario::State;

/// Result code reported by the collaborator. `0` means success; any other
/// value is a failure reason whose meaning belongs to the collaborator.
pub type ErrorCode = i32;

/// A common error type for harness operations.
///
/// `Timeout`, `AsyncFailure`, `Rejected` and `Closed` are runtime conditions the
/// sequencer recovers from by cleaning up. `Usage` marks a defect in the
/// caller's sequencing and is never recovered.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// A bounded wait reached its deadline before its predicate held.
    Timeout,
    /// The collaborator reported a nonzero result code through a notification.
    AsyncFailure(ErrorCode),
    /// The collaborator refused an attempt before it started.
    Rejected(ErrorCode),
    /// The collaborator shut the connection down, with this code, before a
    /// step could use it.
    Closed(ErrorCode),
    /// Configuration could not be parsed or does not fit its bounds.
    InvalidConfig,
    /// Acquisition or release was attempted out of order.
    Usage(UsageError),
}

impl Error {
    /// Returns `false` for errors that indicate a sequencing defect.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Error::Usage(_))
    }

    /// The collaborator's code, when the error carries one.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Error::AsyncFailure(code) | Error::Rejected(code) | Error::Closed(code) => {
                Some(*code)
            }
            _ => None,
        }
    }
}

impl From<UsageError> for Error {
    fn from(err: UsageError) -> Self {
        Error::Usage(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Timeout => f.write_str("wait deadline elapsed"),
            Error::AsyncFailure(code) => write!(f, "collaborator reported error code {code}"),
            Error::Rejected(code) => write!(f, "collaborator rejected the attempt with code {code}"),
            Error::Closed(code) => write!(f, "connection shut down with code {code}"),
            Error::InvalidConfig => f.write_str("invalid scenario configuration"),
            Error::Usage(usage) => write!(f, "usage error: {usage}"),
        }
    }
}

/// Sequencing defects.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum UsageError {
    /// The scenario state machine does not allow this step.
    InvalidTransition {
        /// State the scenario was in.
        from: State,
        /// State the step tried to enter.
        to: State,
    },
    /// A resource was acquired before the one it depends on.
    OutOfOrderAcquire,
    /// A request or release needed an established connection.
    NotEstablished,
    /// The exchange was released before its completion was observed.
    ExchangeStillActive,
    /// The connection was released while an exchange was still held.
    ExchangeStillHeld,
    /// No exchange has been issued.
    NoExchange,
}

impl fmt::Display for UsageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UsageError::InvalidTransition { from, to } => {
                write!(f, "cannot move from {from:?} to {to:?}")
            }
            UsageError::OutOfOrderAcquire => f.write_str("resource acquired out of order"),
            UsageError::NotEstablished => f.write_str("connection is not established"),
            UsageError::ExchangeStillActive => {
                f.write_str("exchange released before its completion was observed")
            }
            UsageError::ExchangeStillHeld => {
                f.write_str("connection released while an exchange is held")
            }
            UsageError::NoExchange => f.write_str("no exchange has been issued"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::Timeout => defmt::write!(f, "Timeout"),
            Error::AsyncFailure(code) => defmt::write!(f, "AsyncFailure({})", code),
            Error::Rejected(code) => defmt::write!(f, "Rejected({})", code),
            Error::Closed(code) => defmt::write!(f, "Closed({})", code),
            Error::InvalidConfig => defmt::write!(f, "InvalidConfig"),
            Error::Usage(usage) => defmt::write!(f, "Usage({})", usage),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for UsageError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            UsageError::InvalidTransition { .. } => defmt::write!(f, "InvalidTransition"),
            UsageError::OutOfOrderAcquire => defmt::write!(f, "OutOfOrderAcquire"),
            UsageError::NotEstablished => defmt::write!(f, "NotEstablished"),
            UsageError::ExchangeStillActive => defmt::write!(f, "ExchangeStillActive"),
            UsageError::ExchangeStillHeld => defmt::write!(f, "ExchangeStillHeld"),
            UsageError::NoExchange => defmt::write!(f, "NoExchange"),
        }
    }
}
