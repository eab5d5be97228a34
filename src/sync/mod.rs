//! Deadline-bounded waiting on shared state.
//!
//! [`WaitCell`] pairs a record with a mutex and a condition variable. Writers
//! mutate the record through [`WaitCell::update`], which wakes every waiter
//! once the write is committed. Readers block in [`WaitCell::wait_until`]
//! until a predicate over the record holds or the deadline passes.
//!
//! ```rust
//! use callgate::sync::WaitCell;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let cell = Arc::new(WaitCell::new(0u32));
//! let writer = Arc::clone(&cell);
//! std::thread::spawn(move || writer.update(|n| *n = 3));
//!
//! let seen = cell.wait_for(Duration::from_secs(1), |n| *n == 3).unwrap();
//! assert_eq!(seen, 3);
//! ```

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::network::error::Error;

/// A record guarded by a lock, with a signal for state changes.
#[derive(Debug, Default)]
pub struct WaitCell<S> {
    state: Mutex<S>,
    signal: Condvar,
}

impl<S> WaitCell<S> {
    /// Wraps `state`.
    pub fn new(state: S) -> Self {
        Self {
            state: Mutex::new(state),
            signal: Condvar::new(),
        }
    }

    // Every write to a record is a plain field assignment, so a panic on
    // another thread cannot leave it half-updated.
    fn lock(&self) -> MutexGuard<'_, S> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Applies `f` under the lock, then wakes every waiter.
    pub fn update<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        let result = {
            let mut state = self.lock();
            f(&mut state)
        };
        self.signal.notify_all();
        result
    }

    /// Reads the record under the lock without waiting.
    pub fn inspect<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.lock())
    }

    /// Blocks until `predicate` holds or `deadline` passes.
    ///
    /// On success, returns a copy of the record taken while the predicate
    /// still held. On expiry, returns [`Error::Timeout`]; the record stays
    /// live and later updates remain visible to later waits.
    pub fn wait_until<P>(&self, deadline: Instant, mut predicate: P) -> Result<S, Error>
    where
        S: Clone,
        P: FnMut(&S) -> bool,
    {
        let mut state = self.lock();
        loop {
            if predicate(&state) {
                return Ok(state.clone());
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(Error::Timeout);
            }
            // Wakes may be spurious or for an unrelated change; the loop re-checks.
            state = match self.signal.wait_timeout(state, remaining) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
    }

    /// [`wait_until`](Self::wait_until) with a deadline of `timeout` from now.
    ///
    /// A `timeout` too large for the clock to represent waits without a
    /// deadline.
    pub fn wait_for<P>(&self, timeout: Duration, predicate: P) -> Result<S, Error>
    where
        S: Clone,
        P: FnMut(&S) -> bool,
    {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.wait_until(deadline, predicate),
            None => Ok(self.wait_unbounded(predicate)),
        }
    }

    fn wait_unbounded<P>(&self, mut predicate: P) -> S
    where
        S: Clone,
        P: FnMut(&S) -> bool,
    {
        let mut state = self.lock();
        while !predicate(&state) {
            state = self
                .signal
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        state.clone()
    }
}
