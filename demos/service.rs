//! # Example: service
//!
//! A ticking worker hosted by [`Orchestrator`] with [`LogWriter`] attached.
//!
//! Demonstrates how to:
//! - Implement [`Runnable`] for a service with its own stop switch.
//! - Honor the [`ShutdownContext`] deadline in `shutdown`.
//! - Watch the escalation path by setting `SLOW_DRAIN=1`.
//!
//! ## Flow
//! ```text
//! main()
//!   ├─► tracing_subscriber::fmt().init()
//!   ├─► Orchestrator::builder().with_subscriber(LogWriter).build()
//!   └─► execute(worker, ShutdownConfig{ grace = 2s })
//!         ├─► publish(RunStarting)
//!         ├─► Ctrl-C / SIGTERM
//!         ├─► publish(ShutdownRequested)
//!         ├─► worker.shutdown(ctx)
//!         │     ├─ drained in time      ─► publish(ShutdownCompleted)
//!         │     └─ SLOW_DRAIN=1, 5s drain ─► publish(ShutdownFailed)
//!         │                                  ├─► worker.terminate()
//!         │                                  └─► publish(Terminated)
//!         └─► exit
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example service
//! SLOW_DRAIN=1 cargo run --example service
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use runvisor::{
    LogWriter, Orchestrator, Runnable, RunnableError, ShutdownConfig, ShutdownContext,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

struct Worker {
    ticks: AtomicU64,
    stop: CancellationToken,
    drain: Duration,
}

#[async_trait]
impl Runnable for Worker {
    fn name(&self) -> &str {
        "ticker"
    }

    async fn run(&self) -> Result<(), RunnableError> {
        let mut interval = tokio::time::interval(Duration::from_millis(500));
        loop {
            tokio::select! {
                _ = self.stop.cancelled() => return Ok(()),
                _ = interval.tick() => {
                    let n = self.ticks.fetch_add(1, Ordering::Relaxed) + 1;
                    tracing::debug!(tick = n, "tick");
                }
            }
        }
    }

    async fn shutdown(&self, ctx: ShutdownContext) -> Result<(), RunnableError> {
        tracing::info!(remaining = ?ctx.remaining(), "draining");
        ctx.run_until(async {
            tokio::time::sleep(self.drain).await;
            self.stop.cancel();
            Ok(())
        })
        .await
    }

    async fn terminate(&self) -> Result<(), RunnableError> {
        self.stop.cancel();
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("runvisor=info,service=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    let drain = if std::env::var_os("SLOW_DRAIN").is_some() {
        Duration::from_secs(5)
    } else {
        Duration::from_millis(300)
    };

    let worker = Arc::new(Worker {
        ticks: AtomicU64::new(0),
        stop: CancellationToken::new(),
        drain,
    });

    let orchestrator = Orchestrator::builder()
        .with_subscriber(Arc::new(LogWriter::new()))
        .build();

    tracing::info!("press Ctrl-C to stop");
    let cfg = ShutdownConfig::default().with_grace(Duration::from_secs(2));
    orchestrator.execute(Arc::clone(&worker), cfg).await?;

    tracing::info!(ticks = worker.ticks.load(Ordering::Relaxed), "done");
    Ok(())
}
