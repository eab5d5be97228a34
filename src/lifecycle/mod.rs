//! Lifecycle controllers for connections and exchanges.
//!
//! Each controller is the notification sink the collaborator calls from its
//! own threads, and the waiting surface the sequencer blocks on. A controller
//! owns only the record its own notifications mutate:
//!
//! - [`ConnectionLifecycle`]: setup and shutdown of one connection.
//! - [`StreamLifecycle`]: headers, body chunks and completion of one exchange.
//!
//! Both are shared as `Arc`s and handed to the collaborator as trait objects
//! ([`ConnectionEvents`](crate::network::ConnectionEvents),
//! [`StreamEvents`](crate::network::StreamEvents)).

#![allow(missing_docs)]

pub mod connection;
pub mod stream;

pub use connection::{ConnectionLifecycle, ConnectionRecord};
pub use stream::{StreamLifecycle, StreamRecord};
