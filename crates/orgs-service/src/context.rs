//! Per-request cancellation and deadline

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{OrgError, OrgResult};

/// Cancellation signal and optional deadline carried by one request.
///
/// The service races every store call against this context. Store futures
/// are dropped on cancellation, which applies nothing of an unfinished
/// batch.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use orgs_service::RequestContext;
///
/// let ctx = RequestContext::new().with_timeout(Duration::from_secs(5));
/// assert!(ctx.deadline().is_some());
/// ctx.cancel();
/// assert!(ctx.is_canceled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl RequestContext {
    /// A context that is never canceled and has no deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Share an existing cancellation token, e.g. a child of a server
    /// shutdown token.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_canceled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// This context with its deadline tightened to at most `timeout` from now.
    pub(crate) fn bounded(&self, timeout: Option<Duration>) -> Self {
        let Some(timeout) = timeout else {
            return self.clone();
        };
        let limit = Instant::now() + timeout;
        Self {
            cancel: self.cancel.clone(),
            deadline: Some(self.deadline.map_or(limit, |d| d.min(limit))),
        }
    }

    /// Run `fut` unless the context is canceled or its deadline passes first.
    pub async fn run<F, T>(&self, fut: F) -> OrgResult<T>
    where
        F: Future<Output = OrgResult<T>>,
    {
        if self.cancel.is_cancelled() {
            return Err(OrgError::Canceled);
        }

        match self.deadline {
            Some(deadline) => tokio::select! {
                biased;
                _ = self.cancel.cancelled() => Err(OrgError::Canceled),
                _ = tokio::time::sleep_until(deadline) => Err(OrgError::DeadlineExceeded),
                result = fut => result,
            },
            None => tokio::select! {
                biased;
                _ = self.cancel.cancelled() => Err(OrgError::Canceled),
                result = fut => result,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_completes() {
        let ctx = RequestContext::new();
        let result = ctx.run(async { Ok::<_, OrgError>(7) }).await;
        assert_eq!(result, Ok(7));
    }

    #[tokio::test]
    async fn test_canceled_before_start() {
        let ctx = RequestContext::new();
        ctx.cancel();
        let result = ctx.run(async { Ok::<_, OrgError>(7) }).await;
        assert_eq!(result, Err(OrgError::Canceled));
    }

    #[tokio::test]
    async fn test_cancel_while_pending() {
        let ctx = RequestContext::new();
        let canceler = ctx.clone();
        tokio::spawn(async move {
            tokio::task::yield_now().await;
            canceler.cancel();
        });

        let result = ctx
            .run(std::future::pending::<OrgResult<()>>())
            .await;
        assert_eq!(result, Err(OrgError::Canceled));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_exceeded() {
        let ctx = RequestContext::new().with_timeout(Duration::from_millis(50));
        let result = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok::<_, OrgError>(())
            })
            .await;
        assert_eq!(result, Err(OrgError::DeadlineExceeded));
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounded_keeps_earlier_deadline() {
        let ctx = RequestContext::new().with_timeout(Duration::from_millis(10));
        let bounded = ctx.bounded(Some(Duration::from_secs(60)));
        assert_eq!(bounded.deadline(), ctx.deadline());

        let open = RequestContext::new().bounded(Some(Duration::from_millis(10)));
        assert!(open.deadline().is_some());
        assert!(RequestContext::new().bounded(None).deadline().is_none());
    }
}
