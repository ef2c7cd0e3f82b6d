//! # Lifecycle events emitted by the orchestrator.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Run events**: the service started, finished, or failed on its own
//! - **Shutdown events**: termination requested, graceful stop outcome, escalation
//! - **Subscriber events**: delivery problems inside the fan-out
//!
//! The [`Event`] struct carries metadata such as timestamps, the runnable name,
//! the observed signal, the grace period, and a reason.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use runvisor::{Event, EventKind, Signal};
//!
//! let ev = Event::new(EventKind::ShutdownRequested)
//!     .with_runnable("http")
//!     .with_signal(Signal::Terminate)
//!     .with_grace(Duration::from_secs(5));
//!
//! assert_eq!(ev.kind, EventKind::ShutdownRequested);
//! assert_eq!(ev.runnable.as_deref(), Some("http"));
//! assert_eq!(ev.grace_ms, Some(5_000));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::core::Signal;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Run events ===
    /// Signal forwarders are installed.
    ///
    /// Sets: `reason` (comma-separated signal names).
    SignalsSubscribed,

    /// `run` is being spawned.
    ///
    /// Sets: `runnable`.
    RunStarting,

    /// `run` returned `Ok` before any termination request.
    ///
    /// Sets: `runnable`.
    RunCompleted,

    /// `run` returned an error (or panicked) before any termination request.
    ///
    /// Sets: `runnable`, `reason`.
    RunFailed,

    // === Shutdown events ===
    /// A termination request was observed; graceful shutdown begins.
    ///
    /// Sets: `runnable`, `signal`, `grace_ms`.
    ShutdownRequested,

    /// `shutdown` returned `Ok` within the grace period.
    ///
    /// Sets: `runnable`, `grace_ms`.
    ShutdownCompleted,

    /// `shutdown` failed or outlived the grace period; escalation follows.
    ///
    /// Sets: `runnable`, `grace_ms`, `reason`.
    ShutdownFailed,

    /// `terminate` is being invoked.
    ///
    /// Sets: `runnable`.
    TerminateRequested,

    /// `terminate` returned `Ok`; the service was stopped forcibly.
    ///
    /// Sets: `runnable`.
    Terminated,

    /// `terminate` failed; the outcome is fatal.
    ///
    /// Sets: `runnable`, `reason`.
    TerminateFailed,

    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets: `runnable` (subscriber name), `reason` (panic message).
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `runnable` (subscriber name), `reason`.
    SubscriberOverflow,
}

/// Lifecycle event with optional metadata.
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Name of the runnable (or subscriber, for subscriber events).
    pub runnable: Option<Arc<str>>,
    /// Termination signal that started the shutdown path.
    pub signal: Option<Signal>,
    /// Grace period in milliseconds (compact).
    pub grace_ms: Option<u32>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            runnable: None,
            signal: None,
            grace_ms: None,
            reason: None,
        }
    }

    /// Attaches the runnable name.
    #[inline]
    pub fn with_runnable(mut self, name: impl Into<Arc<str>>) -> Self {
        self.runnable = Some(name.into());
        self
    }

    /// Attaches the observed signal.
    #[inline]
    pub fn with_signal(mut self, signal: Signal) -> Self {
        self.signal = Some(signal);
        self
    }

    /// Attaches a grace period (stored as milliseconds).
    #[inline]
    pub fn with_grace(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.grace_ms = Some(ms);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_runnable(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_runnable(subscriber)
            .with_reason(info)
    }

    /// True for events that end an `execute` call.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.kind,
            EventKind::RunCompleted
                | EventKind::RunFailed
                | EventKind::ShutdownCompleted
                | EventKind::Terminated
                | EventKind::TerminateFailed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_is_monotonic() {
        let a = Event::new(EventKind::RunStarting);
        let b = Event::new(EventKind::RunCompleted);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn grace_is_clamped_to_u32_millis() {
        let ev = Event::new(EventKind::ShutdownRequested).with_grace(Duration::from_secs(u64::MAX));
        assert_eq!(ev.grace_ms, Some(u32::MAX));
    }

    #[test]
    fn terminal_kinds() {
        assert!(Event::new(EventKind::Terminated).is_terminal());
        assert!(Event::new(EventKind::ShutdownCompleted).is_terminal());
        assert!(!Event::new(EventKind::ShutdownFailed).is_terminal());
        assert!(!Event::new(EventKind::ShutdownRequested).is_terminal());
    }
}
