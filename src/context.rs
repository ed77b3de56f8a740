// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 jetflow contributors

//! Request context
//!
//! Carries the deadline and cancellation signal of one caller request.
//! Every backing-store and collaborator call is raced against it, so a
//! cancelled request aborts the in-flight call and reports
//! [`JetflowError::Cancelled`] rather than a domain error.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::errors::{JetflowError, JetflowResult};

/// Deadline and cancellation for one request
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    deadline: Option<Instant>,
    /// Every signal attached along the derivation chain
    cancelled: Vec<watch::Receiver<bool>>,
}

/// Cancels the context it was created with
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

impl RequestContext {
    /// A context that never expires
    pub fn background() -> Self {
        Self::default()
    }

    /// Expire `timeout` from now, or earlier if a deadline is already set
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        });
        self
    }

    /// Attach a further cancellation signal.
    ///
    /// Signals attached earlier still apply, so the derived context is
    /// cancelled by its own handle or by any handle of its parents.
    pub fn with_cancel(mut self) -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        self.cancelled.push(rx);
        (self, CancelHandle { tx })
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.iter().any(|rx| *rx.borrow())
    }

    /// Fail fast if the context is already done
    pub fn check(&self) -> JetflowResult<()> {
        if self.is_cancelled() {
            return Err(JetflowError::Cancelled);
        }

        if self.deadline.is_some_and(|d| d <= Instant::now()) {
            return Err(JetflowError::DeadlineExceeded);
        }

        Ok(())
    }

    /// Run `fut`, aborting it when the context is cancelled or expires
    pub async fn run<T, F>(&self, fut: F) -> JetflowResult<T>
    where
        F: Future<Output = JetflowResult<T>>,
    {
        self.check()?;

        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            result = fut => result,
            _ = any_cancelled(&self.cancelled) => Err(JetflowError::Cancelled),
            _ = expired => Err(JetflowError::DeadlineExceeded),
        }
    }
}

/// Resolves once any of `signals` is cancelled
fn any_cancelled(
    signals: &[watch::Receiver<bool>],
) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
    Box::pin(async move {
        let Some((first, rest)) = signals.split_first() else {
            return std::future::pending().await;
        };

        let mut rx = first.clone();
        let first = async move {
            // A dropped handle can no longer cancel
            let closed = rx.wait_for(|c| *c).await.is_err();
            if closed {
                std::future::pending::<()>().await;
            }
        };

        tokio::select! {
            _ = first => {}
            _ = any_cancelled(rest) => {}
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_background_context_runs_to_completion() {
        let ctx = RequestContext::background();
        let value = ctx.run(async { Ok(42) }).await.unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn test_cancel_aborts_in_flight_call() {
        let (ctx, handle) = RequestContext::background().with_cancel();

        let task = tokio::spawn(async move {
            ctx.run(async {
                std::future::pending::<()>().await;
                Ok(())
            })
            .await
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        handle.cancel();

        let result = task.await.unwrap();
        assert!(matches!(result, Err(JetflowError::Cancelled)));
    }

    #[tokio::test]
    async fn test_already_cancelled_context_fails_fast() {
        let (ctx, handle) = RequestContext::background().with_cancel();
        handle.cancel();
        assert!(ctx.is_cancelled());
        assert!(matches!(ctx.check(), Err(JetflowError::Cancelled)));
    }

    #[tokio::test]
    async fn test_deadline_exceeded() {
        let ctx = RequestContext::background().with_timeout(Duration::from_millis(5));
        let result: JetflowResult<()> = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(JetflowError::DeadlineExceeded)));
    }

    #[test]
    fn test_earliest_deadline_wins() {
        let now = Instant::now();
        let ctx = RequestContext::background()
            .with_deadline(now + Duration::from_secs(5))
            .with_deadline(now + Duration::from_secs(1));
        assert_eq!(ctx.deadline(), Some(now + Duration::from_secs(1)));
    }

    #[tokio::test]
    async fn test_derived_context_sees_parent_cancel() {
        let (parent, parent_handle) = RequestContext::background().with_cancel();
        let (child, child_handle) = parent.clone().with_cancel();

        child_handle.cancel();
        assert!(child.is_cancelled());
        assert!(!parent.is_cancelled());

        let (child, _child_handle) = parent.clone().with_cancel();
        let task = tokio::spawn(async move {
            child
                .run(async {
                    std::future::pending::<()>().await;
                    Ok(())
                })
                .await
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        parent_handle.cancel();

        let result = task.await.unwrap();
        assert!(matches!(result, Err(JetflowError::Cancelled)));
    }
}
