use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::{SubtrackError, SubtrackResult};

/// Per-call controls for read operations that may scan many rows.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    pub cancel: Option<CancellationToken>,
    pub timeout: Option<Duration>,
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Fills in `timeout` when the caller did not set one.
    pub fn or_timeout(mut self, fallback: Option<Duration>) -> Self {
        if self.timeout.is_none() {
            self.timeout = fallback;
        }
        self
    }
}

/// Drives `fut` to completion unless the token fires or the timeout elapses
/// first. The future is dropped on abort, so nothing after the abort point
/// runs.
pub async fn run_cancellable<T, F>(
    operation: &str,
    options: &CallOptions,
    fut: F,
) -> SubtrackResult<T>
where
    F: Future<Output = SubtrackResult<T>>,
{
    if let Some(token) = &options.cancel {
        if token.is_cancelled() {
            warn!(operation, "Operation cancelled before start");
            return Err(SubtrackError::Cancelled(operation.to_string()));
        }
    }

    let guarded = async move {
        match options.timeout {
            Some(limit) => match tokio::time::timeout(limit, fut).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(operation, timeout_ms = limit.as_millis() as u64, "Operation timed out");
                    Err(SubtrackError::TimedOut {
                        operation: operation.to_string(),
                        timeout_ms: limit.as_millis() as u64,
                    })
                }
            },
            None => fut.await,
        }
    };

    match &options.cancel {
        Some(token) => {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    warn!(operation, "Operation cancelled");
                    Err(SubtrackError::Cancelled(operation.to_string()))
                }
                result = guarded => result,
            }
        }
        None => guarded.await,
    }
}
