//! Per-call deadline and cancellation

use crate::error::{ClientError, ClientResult};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Carries an optional deadline and cancellation token into an upstream call
///
/// ```
/// use rivven_schema_client::CallContext;
/// use std::time::Duration;
///
/// let ctx = CallContext::new().with_timeout(Duration::from_secs(5));
/// assert!(ctx.deadline().is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    deadline: Option<Instant>,
    cancel: Option<CancellationToken>,
}

impl CallContext {
    /// No deadline, not cancellable
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|t| t.is_cancelled())
    }

    /// Drive `call` until it finishes, the deadline passes or the token fires
    ///
    /// On timeout or cancellation the future is dropped before it completes.
    pub async fn run<T, F>(&self, operation: &str, call: F) -> ClientResult<T>
    where
        F: Future<Output = ClientResult<T>>,
    {
        if self.is_cancelled() {
            return Err(ClientError::Cancelled);
        }

        let guarded = async {
            match &self.cancel {
                Some(token) => tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        debug!(operation, "Upstream call cancelled");
                        Err(ClientError::Cancelled)
                    }
                    result = call => result,
                },
                None => call.await,
            }
        };

        match self.deadline {
            Some(deadline) => match tokio::time::timeout_at(deadline, guarded).await {
                Ok(result) => result,
                Err(_) => {
                    debug!(operation, "Upstream call deadline exceeded");
                    Err(ClientError::Timeout(operation.to_string()))
                }
            },
            None => guarded.await,
        }
    }
}
