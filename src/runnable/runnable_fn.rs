//! # Closure-backed runnable (`RunnableFn`)
//!
//! [`RunnableFn`] wraps three closures, one per lifecycle operation. Each call
//! produces a fresh future, so there is no hidden state between calls; shared
//! state goes into an explicit `Arc<...>` captured by the closures.
//!
//! ## Example
//! ```rust
//! use runvisor::{RunnableFn, RunnableRef, RunnableError, ShutdownContext};
//!
//! let svc: RunnableRef = RunnableFn::arc(
//!     "worker",
//!     || async { Ok::<_, RunnableError>(()) },
//!     |_ctx: ShutdownContext| async { Ok::<_, RunnableError>(()) },
//!     || async { Ok::<_, RunnableError>(()) },
//! );
//!
//! assert_eq!(svc.name(), "worker");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::context::ShutdownContext;
use crate::error::RunnableError;
use crate::runnable::Runnable;

/// Closure-backed runnable.
pub struct RunnableFn<R, S, T> {
    name: Cow<'static, str>,
    run: R,
    shutdown: S,
    terminate: T,
}

impl<R, S, T> RunnableFn<R, S, T> {
    /// Creates a new closure-backed runnable.
    ///
    /// Prefer [`RunnableFn::arc`] when you immediately need a [`RunnableRef`](crate::RunnableRef).
    pub fn new(name: impl Into<Cow<'static, str>>, run: R, shutdown: S, terminate: T) -> Self {
        Self {
            name: name.into(),
            run,
            shutdown,
            terminate,
        }
    }

    /// Creates the runnable and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, run: R, shutdown: S, terminate: T) -> Arc<Self> {
        Arc::new(Self::new(name, run, shutdown, terminate))
    }
}

impl<R, S, T> std::fmt::Debug for RunnableFn<R, S, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunnableFn").field("name", &self.name).finish()
    }
}

#[async_trait]
impl<R, RFut, S, SFut, T, TFut> Runnable for RunnableFn<R, S, T>
where
    R: Fn() -> RFut + Send + Sync + 'static,
    RFut: Future<Output = Result<(), RunnableError>> + Send + 'static,
    S: Fn(ShutdownContext) -> SFut + Send + Sync + 'static,
    SFut: Future<Output = Result<(), RunnableError>> + Send + 'static,
    T: Fn() -> TFut + Send + Sync + 'static,
    TFut: Future<Output = Result<(), RunnableError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self) -> Result<(), RunnableError> {
        (self.run)().await
    }

    async fn shutdown(&self, ctx: ShutdownContext) -> Result<(), RunnableError> {
        (self.shutdown)(ctx).await
    }

    async fn terminate(&self) -> Result<(), RunnableError> {
        (self.terminate)().await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn each_call_produces_a_fresh_future() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);

        let svc = RunnableFn::new(
            "counter",
            move || {
                let c = Arc::clone(&c);
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, RunnableError>(())
                }
            },
            |_ctx: ShutdownContext| async { Ok::<_, RunnableError>(()) },
            || async { Err::<(), _>(RunnableError::fail("no kill switch")) },
        );

        svc.run().await.unwrap();
        svc.run().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(svc.terminate().await.is_err());
        assert_eq!(svc.name(), "counter");
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_closure_receives_context() {
        let svc = RunnableFn::new(
            "ctx",
            || async { Ok::<_, RunnableError>(()) },
            |ctx: ShutdownContext| async move {
                assert_eq!(ctx.grace(), Duration::from_secs(3));
                Ok::<_, RunnableError>(())
            },
            || async { Ok::<_, RunnableError>(()) },
        );

        svc.shutdown(ShutdownContext::new(Duration::from_secs(3)))
            .await
            .unwrap();
    }
}
