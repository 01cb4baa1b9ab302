//! Simulated background processing.
//!
//! Order placement and contact form submission stand in for a slow backend
//! by waiting a fixed time. The wait runs as a spawned tokio task so it can be
//! awaited by the request and cancelled from elsewhere.

use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinHandle;

/// Errors from a [`ProcessingTask`].
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("processing was cancelled")]
    Cancelled,
    #[error("processing task failed")]
    Panicked,
}

/// A fixed-length wait running on the tokio runtime.
#[derive(Debug)]
pub struct ProcessingTask {
    delay: Duration,
    handle: JoinHandle<()>,
}

impl ProcessingTask {
    /// Start waiting for `delay`.
    #[must_use]
    pub fn start(delay: Duration) -> Self {
        let handle = tokio::spawn(tokio::time::sleep(delay));
        Self { delay, handle }
    }

    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Abort the wait. A pending [`wait`](Self::wait) returns `Cancelled`.
    pub fn cancel(&self) {
        self.handle.abort();
    }

    /// Wait for the task to finish.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessingError::Cancelled`] if the task was aborted.
    pub async fn wait(self) -> Result<(), ProcessingError> {
        self.handle.await.map_err(|e| {
            if e.is_cancelled() {
                ProcessingError::Cancelled
            } else {
                ProcessingError::Panicked
            }
        })
    }
}
