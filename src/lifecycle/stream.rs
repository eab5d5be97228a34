use std::time::Duration;

use crate::network::error::{Error, ErrorCode};
use crate::network::{Header, StreamEvents};
use crate::sync::WaitCell;

/// What the harness knows about one exchange.
#[derive(Debug, Clone, Default)]
pub struct StreamRecord {
    /// Total body bytes received so far.
    pub body_size: u64,
    /// Number of body notifications received.
    pub chunks: u64,
    /// Code reported on completion.
    pub error_code: ErrorCode,
    /// Set once completion is reported.
    pub complete: bool,
    /// CRC-32 of every body byte received so far.
    pub checksum: u32,
}

impl StreamRecord {
    fn complete_observed(&self) -> bool {
        self.error_code != 0 || self.complete
    }
}

/// Bridges response notifications into a blocking completion wait and
/// accumulates the received body size.
#[derive(Debug, Default)]
pub struct StreamLifecycle {
    record: WaitCell<StreamRecord>,
    window: Option<usize>,
}

impl StreamLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acknowledges every body chunk with a fixed `window` instead of the
    /// collaborator's default continuation.
    pub fn with_window(window: usize) -> Self {
        Self {
            window: Some(window),
            ..Self::default()
        }
    }

    /// Blocks until completion is reported or `timeout` elapses.
    pub fn await_complete(&self, timeout: Duration) -> Result<StreamRecord, Error> {
        let record = self
            .record
            .wait_for(timeout, StreamRecord::complete_observed)?;
        if record.error_code != 0 {
            return Err(Error::AsyncFailure(record.error_code));
        }
        Ok(record)
    }

    pub fn is_complete(&self) -> bool {
        self.record.inspect(StreamRecord::complete_observed)
    }

    pub fn snapshot(&self) -> StreamRecord {
        self.record.inspect(StreamRecord::clone)
    }
}

impl StreamEvents for StreamLifecycle {
    fn on_response_headers(&self, headers: &[Header]) {
        tracing::trace!(count = headers.len(), "response headers received");
    }

    fn on_response_body(&self, chunk: &[u8]) -> Option<usize> {
        self.record.update(|record| {
            record.body_size += chunk.len() as u64;
            record.chunks += 1;
            let mut hasher = crc32fast::Hasher::new_with_initial(record.checksum);
            hasher.update(chunk);
            record.checksum = hasher.finalize();
        });
        self.window
    }

    fn on_complete(&self, error_code: ErrorCode) {
        let body_size = self.record.update(|record| {
            record.error_code = error_code;
            record.complete = true;
            record.body_size
        });
        tracing::debug!(error_code, body_size, "exchange complete notified");
    }
}
