//! Error types used by the orchestrator and by runnables.
//!
//! This module defines two main error enums:
//!
//! - [`RunnableError`]: errors raised by a hosted service (`run`, `shutdown`, `terminate`).
//! - [`ExecuteError`]: the single outcome of a failed [`execute`](crate::execute) call.
//!
//! Both types provide `as_label` for logs/metrics.

use std::fmt::Display;
use std::time::Duration;

use thiserror::Error;

use crate::core::Signal;

/// # Errors produced by a runnable.
///
/// A runnable reports these from any of its three lifecycle operations.
/// The orchestrator itself produces [`RunnableError::DeadlineExceeded`] when
/// `shutdown` outlives its grace period, and [`RunnableError::Panicked`] when
/// `run` unwinds.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RunnableError {
    /// The operation failed.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Graceful shutdown did not finish before the context deadline.
    #[error("shutdown deadline of {grace:?} exceeded")]
    DeadlineExceeded {
        /// The grace period that was exhausted.
        grace: Duration,
    },

    /// The shutdown context was cancelled by its parent before completion.
    #[error("context cancelled")]
    Canceled,

    /// The operation panicked.
    #[error("panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },
}

impl RunnableError {
    /// Builds a [`RunnableError::Fail`] from anything printable.
    ///
    /// # Example
    /// ```
    /// use runvisor::RunnableError;
    ///
    /// let err = RunnableError::fail("listener closed");
    /// assert_eq!(err.to_string(), "execution failed: listener closed");
    /// ```
    pub fn fail(error: impl Display) -> Self {
        RunnableError::Fail {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RunnableError::Fail { .. } => "runnable_failed",
            RunnableError::DeadlineExceeded { .. } => "runnable_deadline_exceeded",
            RunnableError::Canceled => "runnable_canceled",
            RunnableError::Panicked { .. } => "runnable_panicked",
        }
    }
}

/// # Errors returned by [`execute`](crate::execute).
///
/// Identifies which phase failed. A failed `shutdown` is never surfaced on its
/// own: it only appears as the `shutdown` cause of [`ExecuteError::Terminate`].
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ExecuteError {
    /// `run` returned an error before any termination request was observed.
    #[error("running the runner: {source}")]
    Run {
        /// The error returned by `run`.
        source: RunnableError,
    },

    /// Graceful shutdown failed and the forced termination failed as well.
    #[error("failed to terminate the runner: {source}")]
    Terminate {
        /// The error returned by `terminate`.
        source: RunnableError,
        /// The shutdown failure that triggered the escalation.
        shutdown: RunnableError,
    },

    /// Subscribing to an OS signal failed; the runner was never started.
    #[error("failed to subscribe to {signal}: {source}")]
    Subscribe {
        /// The signal that could not be registered.
        signal: Signal,
        /// The underlying registration error.
        source: std::io::Error,
    },
}

impl ExecuteError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use runvisor::{ExecuteError, RunnableError};
    ///
    /// let err = ExecuteError::Run { source: RunnableError::fail("boom") };
    /// assert_eq!(err.as_label(), "execute_run_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ExecuteError::Run { .. } => "execute_run_failed",
            ExecuteError::Terminate { .. } => "execute_terminate_failed",
            ExecuteError::Subscribe { .. } => "execute_subscribe_failed",
        }
    }

    /// True if the failure originated from running the service.
    pub fn is_run_failure(&self) -> bool {
        matches!(self, ExecuteError::Run { .. })
    }

    /// True if the failure originated from terminating the service after a failed shutdown.
    pub fn is_terminate_failure(&self) -> bool {
        matches!(self, ExecuteError::Terminate { .. })
    }
}

/// Renders a panic payload as text.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_failure_wraps_source_message() {
        let err = ExecuteError::Run {
            source: RunnableError::fail("run error"),
        };
        assert!(err.is_run_failure());
        assert!(!err.is_terminate_failure());
        assert_eq!(
            err.to_string(),
            "running the runner: execution failed: run error"
        );
    }

    #[test]
    fn terminate_failure_is_distinct_from_run_failure() {
        let err = ExecuteError::Terminate {
            source: RunnableError::fail("kill refused"),
            shutdown: RunnableError::DeadlineExceeded {
                grace: Duration::from_millis(500),
            },
        };
        assert!(err.is_terminate_failure());
        assert!(!err.is_run_failure());
        assert_eq!(err.as_label(), "execute_terminate_failed");
        assert!(err.to_string().starts_with("failed to terminate the runner"));
    }

    #[test]
    fn labels_are_stable() {
        assert_eq!(RunnableError::Canceled.as_label(), "runnable_canceled");
        assert_eq!(
            RunnableError::Panicked { info: "x".into() }.as_label(),
            "runnable_panicked"
        );
        assert_eq!(
            RunnableError::DeadlineExceeded {
                grace: Duration::ZERO
            }
            .as_label(),
            "runnable_deadline_exceeded"
        );
    }
}
