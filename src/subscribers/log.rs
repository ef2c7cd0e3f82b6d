//! # LogWriter: lifecycle events as `tracing` records
//!
//! A minimal subscriber that forwards every [`Event`] to `tracing`. The host
//! application decides where records go by installing a `tracing` subscriber.
//!
//! ## Levels
//! - `info`: normal path (run started/completed, shutdown requested/completed)
//! - `warn`: escalation (shutdown failed, terminate requested, forced stop)
//! - `error`: fatal outcomes and subscriber faults

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let runnable = e.runnable.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("");

        match e.kind {
            EventKind::SignalsSubscribed => {
                debug!(seq = e.seq, signals = reason, "signals subscribed");
            }
            EventKind::RunStarting => {
                info!(seq = e.seq, runnable, "starting");
            }
            EventKind::RunCompleted => {
                info!(seq = e.seq, runnable, "finished on its own");
            }
            EventKind::RunFailed => {
                error!(seq = e.seq, runnable, err = reason, "run failed");
            }
            EventKind::ShutdownRequested => {
                info!(
                    seq = e.seq,
                    runnable,
                    signal = ?e.signal,
                    grace_ms = e.grace_ms,
                    "shutdown requested"
                );
            }
            EventKind::ShutdownCompleted => {
                info!(seq = e.seq, runnable, "stopped within grace");
            }
            EventKind::ShutdownFailed => {
                warn!(
                    seq = e.seq,
                    runnable,
                    grace_ms = e.grace_ms,
                    err = reason,
                    "graceful shutdown failed; escalating"
                );
            }
            EventKind::TerminateRequested => {
                warn!(seq = e.seq, runnable, "terminating");
            }
            EventKind::Terminated => {
                warn!(seq = e.seq, runnable, "terminated forcibly");
            }
            EventKind::TerminateFailed => {
                error!(seq = e.seq, runnable, err = reason, "terminate failed");
            }
            EventKind::SubscriberOverflow => {
                warn!(subscriber = runnable, reason, "subscriber overflow");
            }
            EventKind::SubscriberPanicked => {
                error!(subscriber = runnable, info = reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use tracing::Level;

    use super::*;

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Capture {
        fn lines(&self) -> Vec<String> {
            String::from_utf8_lossy(&self.0.lock().unwrap())
                .lines()
                .map(str::to_owned)
                .collect()
        }

        fn line_with(&self, needle: &str) -> String {
            self.lines()
                .into_iter()
                .find(|l| l.contains(needle))
                .unwrap_or_else(|| panic!("no record containing {needle:?}"))
        }
    }

    impl io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn capturing() -> (Capture, tracing::subscriber::DefaultGuard) {
        let capture = Capture::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_max_level(Level::DEBUG)
            .with_ansi(false)
            .without_time()
            .finish();
        (capture, tracing::subscriber::set_default(subscriber))
    }

    #[tokio::test(flavor = "current_thread")]
    async fn escalation_is_a_warning_and_fatal_outcome_an_error() {
        let (capture, _guard) = capturing();
        let writer = LogWriter::new();

        writer
            .on_event(
                &Event::new(EventKind::ShutdownFailed)
                    .with_runnable("db")
                    .with_grace(Duration::from_millis(500))
                    .with_reason("drain failed"),
            )
            .await;
        writer
            .on_event(&Event::new(EventKind::Terminated).with_runnable("db"))
            .await;
        writer
            .on_event(
                &Event::new(EventKind::TerminateFailed)
                    .with_runnable("db")
                    .with_reason("terminate refused"),
            )
            .await;

        let failed = capture.line_with("graceful shutdown failed; escalating");
        assert!(failed.contains("WARN"), "{failed}");
        assert!(failed.contains("grace_ms=500"), "{failed}");
        assert!(failed.contains("drain failed"), "{failed}");
        assert!(failed.contains("db"), "{failed}");

        let forced = capture.line_with("terminated forcibly");
        assert!(forced.contains("WARN"), "{forced}");

        let fatal = capture.line_with("terminate failed");
        assert!(fatal.contains("ERROR"), "{fatal}");
        assert!(fatal.contains("terminate refused"), "{fatal}");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn normal_path_is_info() {
        let (capture, _guard) = capturing();
        let writer = LogWriter::new();

        writer
            .on_event(&Event::new(EventKind::RunStarting).with_runnable("db"))
            .await;
        writer
            .on_event(&Event::new(EventKind::ShutdownCompleted).with_runnable("db"))
            .await;

        for msg in ["starting", "stopped within grace"] {
            let line = capture.line_with(msg);
            assert!(line.contains("INFO"), "{line}");
        }
        assert!(capture.lines().iter().all(|l| !l.contains("WARN")));
    }
}
