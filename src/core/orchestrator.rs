//! # Orchestrator: runs one service and drives its shutdown.
//!
//! The [`Orchestrator`] owns the event bus and the parent cancellation token.
//! [`Orchestrator::execute`] hosts exactly one [`Runnable`] per call.
//!
//! ## State machine
//! ```text
//! Idle ──start──► Running
//! Running ──run() Err──────────────► Failed            → Err(Run)
//! Running ──run() Ok───────────────► Completed         → Ok
//! Running ──termination request────► ShutdownRequested
//! ShutdownRequested ──shutdown() Ok within grace──► GracefulDone → Ok
//! ShutdownRequested ──shutdown() Err / deadline───► Escalating
//! Escalating ──terminate() Ok──────► ForcedDone        → Ok
//! Escalating ──terminate() Err─────► Fatal             → Err(Terminate)
//! ```
//!
//! ## Flow
//! ```text
//! execute(runner, cfg)
//!   ├─► signals::subscribe(cfg.signals) ─► forwarders ─► cfg.listener
//!   ├─► tokio::spawn(runner.run())
//!   └─► select! {
//!         listener.recv()  ─► ShutdownContext::child_of(parent, grace)
//!                             ├─► timeout_at(deadline, runner.shutdown(ctx))
//!                             └─► on failure: runner.terminate()
//!         run finished     ─► Ok / Err(Run)
//!       }
//! ```
//!
//! ## Rules
//! - Exactly one branch of the race is taken; the loser is never awaited.
//! - On the shutdown path the `run` task is **detached**: it may still be
//!   executing after `execute` returns.
//! - `run`, `shutdown` and `terminate` are each invoked at most once.
//! - Forced termination after a failed shutdown reports `Ok(())`; subscribers
//!   see [`EventKind::ShutdownFailed`] followed by [`EventKind::Terminated`].

use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::broadcast;
use tokio::task::JoinError;
use tokio::time;
use tokio_util::sync::CancellationToken;

use super::builder::OrchestratorBuilder;
use super::config::{ShutdownConfig, Signal};
use super::signals;
use crate::{
    context::ShutdownContext,
    error::{ExecuteError, RunnableError, panic_message},
    events::{Bus, Event, EventKind},
    runnable::Runnable,
};

/// Hosts one runnable per [`execute`](Orchestrator::execute) call.
pub struct Orchestrator {
    bus: Bus,
    parent: CancellationToken,
    listener_stop: CancellationToken,
}

impl Orchestrator {
    /// Returns a builder.
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::new()
    }

    pub(crate) fn new_internal(
        bus: Bus,
        parent: CancellationToken,
        listener_stop: CancellationToken,
    ) -> Self {
        Self {
            bus,
            parent,
            listener_stop,
        }
    }

    /// The lifecycle event bus.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Subscribes to lifecycle events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Runs `runner` until it finishes on its own or a termination request
    /// arrives, then drives graceful shutdown with escalation.
    ///
    /// Blocks until the runnable reaches a terminal state.
    ///
    /// # Errors
    /// - [`ExecuteError::Subscribe`]: a signal could not be registered (`run` never started)
    /// - [`ExecuteError::Run`]: `run` failed or panicked before any termination request
    /// - [`ExecuteError::Terminate`]: `shutdown` failed and `terminate` failed too
    pub async fn execute<R>(&self, runner: Arc<R>, cfg: ShutdownConfig) -> Result<(), ExecuteError>
    where
        R: Runnable + ?Sized,
    {
        let (signal_set, grace, mut listener) = cfg.into_parts();
        let name: Arc<str> = Arc::from(runner.name());

        let _forwarders = signals::subscribe(&signal_set, &listener.trigger())?;
        self.bus.publish(
            Event::new(EventKind::SignalsSubscribed).with_reason(join_signals(&signal_set)),
        );

        self.bus
            .publish(Event::new(EventKind::RunStarting).with_runnable(Arc::clone(&name)));
        let mut run = {
            let runner = Arc::clone(&runner);
            tokio::spawn(async move { runner.run().await })
        };

        tokio::select! {
            signal = listener.recv() => {
                // `run` stays detached from here on.
                self.shutdown(&*runner, &name, signal, grace).await
            }
            joined = &mut run => self.finish_run(&name, joined),
        }
    }

    /// Maps the outcome of `run` finishing first.
    fn finish_run(
        &self,
        name: &Arc<str>,
        joined: Result<Result<(), RunnableError>, JoinError>,
    ) -> Result<(), ExecuteError> {
        let res = joined.unwrap_or_else(|e| {
            Err(if e.is_panic() {
                RunnableError::Panicked {
                    info: panic_message(&*e.into_panic()),
                }
            } else {
                RunnableError::Canceled
            })
        });

        match res {
            Ok(()) => {
                self.bus
                    .publish(Event::new(EventKind::RunCompleted).with_runnable(Arc::clone(name)));
                Ok(())
            }
            Err(source) => {
                self.bus.publish(
                    Event::new(EventKind::RunFailed)
                        .with_runnable(Arc::clone(name))
                        .with_reason(source.to_string()),
                );
                Err(ExecuteError::Run { source })
            }
        }
    }

    /// Graceful shutdown bounded by `grace`, escalating to `terminate` on failure.
    async fn shutdown<R>(
        &self,
        runner: &R,
        name: &Arc<str>,
        signal: Signal,
        grace: Duration,
    ) -> Result<(), ExecuteError>
    where
        R: Runnable + ?Sized,
    {
        self.bus.publish(
            Event::new(EventKind::ShutdownRequested)
                .with_runnable(Arc::clone(name))
                .with_signal(signal)
                .with_grace(grace),
        );

        let ctx = ShutdownContext::child_of(&self.parent, grace);
        let graceful = std::panic::AssertUnwindSafe(runner.shutdown(ctx.clone())).catch_unwind();
        let res = match time::timeout_at(ctx.deadline(), graceful).await {
            Ok(Ok(res)) => res,
            Ok(Err(panic)) => Err(RunnableError::Panicked {
                info: panic_message(&*panic),
            }),
            Err(_elapsed) => Err(RunnableError::DeadlineExceeded { grace }),
        };
        // Stops the deadline timer; clones kept by `shutdown` observe expiry.
        ctx.cancel();

        let shutdown_err = match res {
            Ok(()) => {
                self.bus.publish(
                    Event::new(EventKind::ShutdownCompleted)
                        .with_runnable(Arc::clone(name))
                        .with_grace(grace),
                );
                return Ok(());
            }
            Err(e) => e,
        };

        self.bus.publish(
            Event::new(EventKind::ShutdownFailed)
                .with_runnable(Arc::clone(name))
                .with_grace(grace)
                .with_reason(shutdown_err.to_string()),
        );
        self.terminate(runner, name, shutdown_err).await
    }

    async fn terminate<R>(
        &self,
        runner: &R,
        name: &Arc<str>,
        shutdown: RunnableError,
    ) -> Result<(), ExecuteError>
    where
        R: Runnable + ?Sized,
    {
        self.bus
            .publish(Event::new(EventKind::TerminateRequested).with_runnable(Arc::clone(name)));

        let res = match std::panic::AssertUnwindSafe(runner.terminate())
            .catch_unwind()
            .await
        {
            Ok(res) => res,
            Err(panic) => Err(RunnableError::Panicked {
                info: panic_message(&*panic),
            }),
        };

        match res {
            Ok(()) => {
                self.bus
                    .publish(Event::new(EventKind::Terminated).with_runnable(Arc::clone(name)));
                Ok(())
            }
            Err(source) => {
                self.bus.publish(
                    Event::new(EventKind::TerminateFailed)
                        .with_runnable(Arc::clone(name))
                        .with_reason(source.to_string()),
                );
                Err(ExecuteError::Terminate { source, shutdown })
            }
        }
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        self.listener_stop.cancel();
    }
}

/// Runs `runner` under `cfg` with a one-off orchestrator.
///
/// With the `logging` feature, lifecycle events go to `tracing` via
/// [`LogWriter`](crate::LogWriter).
///
/// # Example
/// ```
/// use std::time::Duration;
/// use runvisor::{
///     RunnableError, RunnableFn, ShutdownConfig, ShutdownContext, ShutdownListener, Signal,
/// };
///
/// # #[tokio::main(flavor = "current_thread", start_paused = true)]
/// # async fn main() {
/// let svc = RunnableFn::arc(
///     "sleeper",
///     || async {
///         tokio::time::sleep(Duration::from_secs(3600)).await;
///         Ok::<_, RunnableError>(())
///     },
///     |_ctx: ShutdownContext| async { Ok::<_, RunnableError>(()) },
///     || async { Ok::<_, RunnableError>(()) },
/// );
///
/// let listener = ShutdownListener::new(1);
/// listener.trigger().notify(Signal::Terminate);
///
/// let cfg = ShutdownConfig::default()
///     .with_signals([])
///     .with_listener(listener);
/// runvisor::execute(svc, cfg).await.unwrap();
/// # }
/// ```
pub async fn execute<R>(runner: Arc<R>, cfg: ShutdownConfig) -> Result<(), ExecuteError>
where
    R: Runnable + ?Sized,
{
    #[allow(unused_mut)]
    let mut builder = Orchestrator::builder();
    #[cfg(feature = "logging")]
    {
        builder = builder.with_subscriber(Arc::new(crate::subscribers::LogWriter::new()));
    }
    builder.build().execute(runner, cfg).await
}

fn join_signals(signals: &[Signal]) -> String {
    signals
        .iter()
        .map(Signal::as_str)
        .collect::<Vec<_>>()
        .join(",")
}
