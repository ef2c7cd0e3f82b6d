//! # Long-running service contract.
//!
//! A [`Runnable`] is anything the orchestrator can host: an HTTP server, a worker
//! pool, a daemon loop. It exposes three operations and nothing else; the
//! orchestrator never looks inside.
//!
//! ## Concurrency
//! `shutdown` and `terminate` are called while `run` may still be executing on
//! another task. Implementors own their internal synchronization.

use std::sync::Arc;

use async_trait::async_trait;

use crate::context::ShutdownContext;
use crate::error::RunnableError;

/// Shared handle to a runnable.
pub type RunnableRef = Arc<dyn Runnable>;

/// # Service with run / graceful-stop / forced-stop operations.
///
/// # Example
/// ```
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use async_trait::async_trait;
/// use runvisor::{Runnable, RunnableError, ShutdownContext};
///
/// #[derive(Default)]
/// struct Ticker {
///     stop: tokio::sync::Notify,
///     stopped: AtomicBool,
/// }
///
/// #[async_trait]
/// impl Runnable for Ticker {
///     fn name(&self) -> &str { "ticker" }
///
///     async fn run(&self) -> Result<(), RunnableError> {
///         self.stop.notified().await;
///         Ok(())
///     }
///
///     async fn shutdown(&self, ctx: ShutdownContext) -> Result<(), RunnableError> {
///         ctx.run_until(async {
///             self.stopped.store(true, Ordering::SeqCst);
///             self.stop.notify_one();
///             Ok(())
///         })
///         .await
///     }
///
///     async fn terminate(&self) -> Result<(), RunnableError> {
///         self.stop.notify_one();
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Runnable: Send + Sync + 'static {
    /// Human-readable name used in events and logs.
    fn name(&self) -> &str {
        "runnable"
    }

    /// Runs the service until it stops on its own.
    ///
    /// Must not return while the service is healthy.
    async fn run(&self) -> Result<(), RunnableError>;

    /// Stops the service gracefully within the budget carried by `ctx`.
    ///
    /// Implementations must watch `ctx` and return promptly once it expires,
    /// reporting an error if the stop did not complete.
    async fn shutdown(&self, ctx: ShutdownContext) -> Result<(), RunnableError>;

    /// Stops the service immediately, abandoning in-flight work.
    async fn terminate(&self) -> Result<(), RunnableError>;
}
