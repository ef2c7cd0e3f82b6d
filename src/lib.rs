//! # runvisor
//!
//! **Runvisor** hosts one long-lived service and coordinates its shutdown.
//!
//! It runs the service, watches for termination requests (OS signals or
//! injected triggers), and on request tries a time-bounded graceful stop before
//! escalating to a forced one.
//!
//! ## Architecture
//! ```text
//!   OS signals ──► forwarders ──┐
//!   tests ──► ShutdownTrigger ──┴──► ShutdownListener (capacity ≥ 1)
//!                                          │
//!                                          ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Orchestrator::execute(runner, cfg)                               │
//! │                                                                   │
//! │   tokio::spawn(runner.run()) ──┐                                  │
//! │                                ├─► select! (first one wins)       │
//! │   listener.recv() ─────────────┘                                  │
//! │                                                                   │
//! │   run first     ─► Ok / Err(Run)                                  │
//! │   request first ─► runner.shutdown(ShutdownContext{grace})        │
//! │                     ├─ Ok            ─► Ok                        │
//! │                     └─ Err/deadline  ─► runner.terminate()        │
//! │                                           ├─ Ok  ─► Ok            │
//! │                                           └─ Err ─► Err(Terminate)│
//! └──────────────────────────────┬────────────────────────────────────┘
//!                                │ publish(Event)
//!                                ▼
//!                      Bus ──► SubscriberSet ──► LogWriter / custom
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                          |
//! |-------------------|---------------------------------------------------------------|---------------------------------------------|
//! | **Runnables**     | Service contract and closure-backed implementation.           | [`Runnable`], [`RunnableFn`]                |
//! | **Orchestration** | Run, race, graceful shutdown, escalation.                     | [`Orchestrator`], [`execute`]               |
//! | **Configuration** | Signals, grace period, notification queue.                    | [`ShutdownConfig`], [`ShutdownListener`]    |
//! | **Deadlines**     | Bounded cancellation context for graceful shutdown.           | [`ShutdownContext`]                         |
//! | **Subscriber API**| Hook into lifecycle events (logging, metrics, alerting).      | [`Subscribe`], [`Event`]                    |
//! | **Errors**        | Typed errors identifying the failed phase.                    | [`ExecuteError`], [`RunnableError`]         |
//!
//! ## Optional features
//! - `logging` (default): exports [`LogWriter`], which forwards events to `tracing`.
//!
//! ## Example
//! ```rust,no_run
//! use std::time::Duration;
//! use runvisor::{RunnableError, RunnableFn, ShutdownConfig, ShutdownContext};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let stop = std::sync::Arc::new(tokio::sync::Notify::new());
//!     let (s1, s2) = (stop.clone(), stop.clone());
//!
//!     let svc = RunnableFn::arc(
//!         "server",
//!         move || {
//!             let stop = s1.clone();
//!             async move {
//!                 stop.notified().await;
//!                 Ok::<_, RunnableError>(())
//!             }
//!         },
//!         move |ctx: ShutdownContext| {
//!             let stop = s2.clone();
//!             async move { ctx.run_until(async { stop.notify_one(); Ok(()) }).await }
//!         },
//!         || async { Ok::<_, RunnableError>(()) },
//!     );
//!
//!     let cfg = ShutdownConfig::default().with_grace(Duration::from_secs(10));
//!     runvisor::execute(svc, cfg).await?;
//!     Ok(())
//! }
//! ```

mod context;
mod core;
mod error;
mod events;
mod runnable;
mod subscribers;

// ---- Public re-exports ----

pub use context::ShutdownContext;
pub use self::core::{
    DEFAULT_BUS_CAPACITY, DEFAULT_GRACE, DEFAULT_LISTENER_CAPACITY, Orchestrator,
    OrchestratorBuilder, ShutdownConfig, ShutdownListener, ShutdownOption, ShutdownTrigger,
    Signal, execute,
};
pub use error::{ExecuteError, RunnableError};
pub use events::{Bus, Event, EventKind};
pub use runnable::{Runnable, RunnableFn, RunnableRef};
pub use subscribers::{Subscribe, SubscriberSet};

#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
