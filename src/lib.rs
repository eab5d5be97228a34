//! # callgate - blocking harness for callback-driven network clients
//!
//! A network client that reports progress through callbacks on its own
//! threads is hard to verify deterministically. This crate wraps such a client
//! (the *collaborator*) and turns its notifications into blocking,
//! deadline-bounded waits, then sequences a whole connect, fetch and teardown
//! scenario on top of them.
//!
//! ## Layers
//!
//! - **[`sync`]**: [`WaitCell`](sync::WaitCell), a record behind a mutex and a
//!   condition variable, with a predicate wait that never outlives its deadline.
//! - **[`lifecycle`]**: the connection and stream controllers. They are the
//!   collaborator's notification sinks and the sequencer's waiting surface.
//! - **[`scenario`]**: the [`Sequencer`](scenario::Sequencer) state machine that
//!   acquires resources, connects, issues a request, validates completion and
//!   releases everything in reverse order.
//! - **[`network`]**: the collaborator contract ([`Transport`](network::Transport)
//!   and the event traits) and the shared error type.
//! - **[`config`]**: scenario descriptions parsed from JSON.
//!
//! ## Usage
//!
//! Add this to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! callgate = "0.1.0"
//! ```
//!
//! ### Running a scenario
//!
//! ```rust,no_run
//! use callgate::config::ScenarioConfig;
//! use callgate::scenario::{Sequencer, Verdict};
//! # use callgate::network::*;
//! # use std::sync::Arc;
//! # struct Client;
//! # impl Transport for Client {
//! #     type Connection = u32;
//! #     type Exchange = u32;
//! #     fn acquire(&mut self, _: Resource) -> Result<(), ErrorCode> { Ok(()) }
//! #     fn release(&mut self, _: Resource) {}
//! #     fn connect(&mut self, _: &ConnectOptions, _: Arc<dyn ConnectionEvents<u32>>) -> Result<(), ErrorCode> { Ok(()) }
//! #     fn issue_request(&mut self, _: &u32, _: &Request<'_>, _: Arc<dyn StreamEvents>) -> Result<u32, ErrorCode> { Ok(0) }
//! #     fn release_exchange(&mut self, _: u32) {}
//! #     fn release_connection(&mut self, _: u32) {}
//! # }
//!
//! let config = ScenarioConfig::from_json(
//!     r#"{"host":"example.com","port":443,"path":"/http_test_doc.txt"}"#,
//! )?;
//! let request = config.request()?;
//!
//! let mut sequencer = Sequencer::new(Client, config.connect_options()?, config.timeout());
//! let report = sequencer.run(request.as_ref());
//!
//! if report.verdict == Verdict::Success {
//!     println!("received {:?} bytes", report.body_size);
//! }
//! # Ok::<(), callgate::network::Error>(())
//! ```
//!
//! ## Logging
//!
//! State transitions, resource handling and notifications are emitted as
//! `tracing` events. Install any subscriber to see them.
//!
//! ## Optional Features
//!
//! - `defmt`: `defmt::Format` for the error types

#![deny(missing_docs)]
#![warn(missing_debug_implementations)]

/// Collaborator contract, request types and the shared error type.
///
/// The collaborator performs all socket, security-layer and protocol work;
/// this module only describes how the harness talks to it.
pub mod network;

/// Deadline-bounded waiting on shared state.
pub mod sync;

/// Connection and stream controllers fed by collaborator notifications.
pub mod lifecycle;

/// The scenario state machine.
pub mod scenario;

/// Scenario configuration.
pub mod config;
