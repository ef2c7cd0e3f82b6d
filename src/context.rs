//! # Bounded cancellation context for graceful shutdown.
//!
//! [`ShutdownContext`] is the deadline-carrying handle handed to
//! [`Runnable::shutdown`](crate::Runnable::shutdown). It bundles a
//! [`CancellationToken`] with the instant at which the grace period ends.
//!
//! ## Rules
//! - The token is cancelled when the deadline passes **or** the parent token is cancelled.
//! - A zero grace period produces a context that is already expired.
//! - A grace period past the clock's range is treated as "far future", never an overflow.
//! - The first expiry cause sticks: a context cancelled by its parent keeps
//!   reporting [`RunnableError::Canceled`] after the deadline passes.
//! - Cancelling the context never affects the parent.
//!
//! ```text
//! parent token ──► child token ──┬──► cancelled() / is_expired()
//!                                │
//!            sleep_until(deadline) ──► cancel child
//! ```

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::error::RunnableError;

/// Deadline used when `now + grace` does not fit in an [`Instant`] (about 30 years).
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

const LIVE: u8 = 0;
const DEADLINE: u8 = 1;
const CANCELED: u8 = 2;

/// Deadline-carrying cancellation handle passed to graceful shutdown.
///
/// Cheap to clone; all clones observe the same cancellation.
#[derive(Clone, Debug)]
pub struct ShutdownContext {
    token: CancellationToken,
    deadline: Instant,
    grace: Duration,
    cause: Arc<AtomicU8>,
}

impl ShutdownContext {
    /// Creates a root context that expires after `grace`.
    ///
    /// Must be called from within a tokio runtime (a timer task is spawned).
    pub fn new(grace: Duration) -> Self {
        Self::child_of(&CancellationToken::new(), grace)
    }

    /// Creates a context derived from `parent` that expires after `grace`.
    ///
    /// Cancelling `parent` cancels the context early.
    pub fn child_of(parent: &CancellationToken, grace: Duration) -> Self {
        let token = parent.child_token();
        let now = Instant::now();
        let deadline = now.checked_add(grace).unwrap_or_else(|| now + FAR_FUTURE);
        let cause = Arc::new(AtomicU8::new(LIVE));

        if grace.is_zero() {
            record(&cause, DEADLINE);
            token.cancel();
        } else {
            let timer = token.clone();
            let cause = Arc::clone(&cause);
            tokio::spawn(async move {
                tokio::select! {
                    biased;
                    _ = timer.cancelled() => {
                        record(&cause, CANCELED);
                    }
                    _ = time::sleep_until(deadline) => {
                        record(&cause, DEADLINE);
                        timer.cancel();
                    }
                }
            });
        }

        Self {
            token,
            deadline,
            grace,
            cause,
        }
    }

    /// The instant at which the grace period ends.
    #[inline]
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// The grace period this context was created with.
    #[inline]
    pub fn grace(&self) -> Duration {
        self.grace
    }

    /// Time left until the deadline (`Duration::ZERO` once passed).
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// True once the deadline passed or the context was cancelled.
    pub fn is_expired(&self) -> bool {
        self.token.is_cancelled() || Instant::now() >= self.deadline
    }

    /// The underlying token, for handing to code that only understands tokens.
    #[inline]
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Completes when the context expires.
    pub async fn cancelled(&self) {
        tokio::select! {
            _ = self.token.cancelled() => {}
            _ = time::sleep_until(self.deadline) => {}
        }
    }

    /// Why the context expired, or `None` while it is still live.
    ///
    /// - deadline reached first → [`RunnableError::DeadlineExceeded`]
    /// - cancelled first → [`RunnableError::Canceled`]
    ///
    /// Once decided, the cause never changes.
    pub fn err(&self) -> Option<RunnableError> {
        let cause = match self.cause.load(Ordering::Acquire) {
            LIVE if self.token.is_cancelled() => record(&self.cause, CANCELED),
            LIVE if Instant::now() >= self.deadline => record(&self.cause, DEADLINE),
            cause => cause,
        };
        match cause {
            DEADLINE => Some(RunnableError::DeadlineExceeded { grace: self.grace }),
            CANCELED => Some(RunnableError::Canceled),
            _ => None,
        }
    }

    /// Drives `fut` until it completes or the context expires, whichever comes first.
    ///
    /// # Example
    /// ```
    /// use std::time::Duration;
    /// use runvisor::{RunnableError, ShutdownContext};
    ///
    /// # #[tokio::main(flavor = "current_thread", start_paused = true)]
    /// # async fn main() {
    /// let ctx = ShutdownContext::new(Duration::from_millis(100));
    /// let res = ctx
    ///     .run_until(async {
    ///         tokio::time::sleep(Duration::from_secs(1)).await;
    ///         Ok(())
    ///     })
    ///     .await;
    /// assert!(matches!(res, Err(RunnableError::DeadlineExceeded { .. })));
    /// # }
    /// ```
    pub async fn run_until<F>(&self, fut: F) -> Result<(), RunnableError>
    where
        F: Future<Output = Result<(), RunnableError>>,
    {
        tokio::select! {
            res = fut => res,
            _ = self.cancelled() => Err(self.err().unwrap_or(RunnableError::Canceled)),
        }
    }

    /// Cancels the context; `err` reports [`RunnableError::Canceled`] unless
    /// it already expired.
    pub(crate) fn cancel(&self) {
        if Instant::now() >= self.deadline {
            record(&self.cause, DEADLINE);
        } else {
            record(&self.cause, CANCELED);
        }
        self.token.cancel();
    }
}

/// Stores `cause` unless one is already set; returns the cause in effect.
fn record(slot: &AtomicU8, cause: u8) -> u8 {
    match slot.compare_exchange(LIVE, cause, Ordering::AcqRel, Ordering::Acquire) {
        Ok(_) => cause,
        Err(current) => current,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn expires_at_deadline() {
        let ctx = ShutdownContext::new(Duration::from_millis(500));
        assert!(!ctx.is_expired());
        assert!(ctx.err().is_none());

        ctx.cancelled().await;

        assert!(ctx.is_expired());
        assert_eq!(ctx.remaining(), Duration::ZERO);
        assert!(matches!(
            ctx.err(),
            Some(RunnableError::DeadlineExceeded { grace }) if grace == Duration::from_millis(500)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn timer_cancels_the_token() {
        let ctx = ShutdownContext::new(Duration::from_secs(1));
        let token = ctx.token().clone();

        token.cancelled().await;
        assert!(ctx.is_expired());
    }

    #[tokio::test(start_paused = true)]
    async fn zero_grace_is_already_expired() {
        let ctx = ShutdownContext::new(Duration::ZERO);
        assert!(ctx.is_expired());
        assert!(ctx.token().is_cancelled());
        assert!(matches!(
            ctx.err(),
            Some(RunnableError::DeadlineExceeded { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn parent_cancel_reports_canceled() {
        let parent = CancellationToken::new();
        let ctx = ShutdownContext::child_of(&parent, Duration::from_secs(10));

        parent.cancel();

        assert!(ctx.is_expired());
        assert!(matches!(ctx.err(), Some(RunnableError::Canceled)));

        time::advance(Duration::from_secs(11)).await;
        assert!(matches!(ctx.err(), Some(RunnableError::Canceled)));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_cause_survives_the_deadline_unobserved() {
        let parent = CancellationToken::new();
        let ctx = ShutdownContext::child_of(&parent, Duration::from_secs(10));

        parent.cancel();
        time::advance(Duration::from_secs(11)).await;

        assert!(matches!(ctx.err(), Some(RunnableError::Canceled)));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_cause_survives_a_later_cancel() {
        let ctx = ShutdownContext::new(Duration::from_secs(1));
        ctx.cancelled().await;

        ctx.cancel();

        assert!(matches!(
            ctx.err(),
            Some(RunnableError::DeadlineExceeded { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn huge_grace_saturates_instead_of_overflowing() {
        let ctx = ShutdownContext::new(Duration::MAX);

        assert!(!ctx.is_expired());
        assert!(ctx.remaining() > Duration::from_secs(86_400 * 365));
        assert_eq!(ctx.grace(), Duration::MAX);
        assert!(ctx.err().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn cancelling_context_leaves_parent_alone() {
        let parent = CancellationToken::new();
        let ctx = ShutdownContext::child_of(&parent, Duration::from_secs(10));

        ctx.cancel();

        assert!(ctx.is_expired());
        assert!(!parent.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn run_until_returns_inner_result_when_fast() {
        let ctx = ShutdownContext::new(Duration::from_secs(1));
        let res = ctx.run_until(async { Ok(()) }).await;
        assert!(res.is_ok());

        let res = ctx
            .run_until(async { Err(RunnableError::fail("drain failed")) })
            .await;
        assert!(matches!(res, Err(RunnableError::Fail { .. })));
    }
}
