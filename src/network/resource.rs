//! Upstream resources a connection depends on, and the ledger that keeps
//! their acquisition and release ordered.

use heapless::Vec;

use crate::network::error::{Error, UsageError};

/// Collaborator resources that must exist before a connection is attempted,
/// listed in acquisition order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Resource {
    EventLoopGroup,
    HostResolver,
    ClientBootstrap,
    SecurityContext,
}

impl Resource {
    pub const ALL: [Resource; 4] = [
        Resource::EventLoopGroup,
        Resource::HostResolver,
        Resource::ClientBootstrap,
        Resource::SecurityContext,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::EventLoopGroup => "event-loop-group",
            Resource::HostResolver => "host-resolver",
            Resource::ClientBootstrap => "client-bootstrap",
            Resource::SecurityContext => "security-context",
        }
    }
}

/// Tracks which upstream resources are held.
///
/// Acquisition must follow [`Resource::ALL`] order (skipping is allowed, so a
/// connection without a security layer never acquires `SecurityContext`).
/// Release is strictly last-in, first-out.
#[derive(Debug, Default)]
pub struct ResourceLedger {
    held: Vec<Resource, 4>,
}

impl ResourceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `resource` as held.
    pub fn push(&mut self, resource: Resource) -> Result<(), Error> {
        if self.held.last().is_some_and(|last| *last >= resource) {
            return Err(UsageError::OutOfOrderAcquire.into());
        }
        self.held
            .push(resource)
            .map_err(|_| Error::Usage(UsageError::OutOfOrderAcquire))
    }

    /// Removes and returns the most recently acquired resource.
    pub fn pop(&mut self) -> Option<Resource> {
        self.held.pop()
    }

    pub fn held(&self) -> &[Resource] {
        &self.held
    }

    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }
}
