//! # Shutdown configuration.
//!
//! Provides [`ShutdownConfig`], the per-call settings for [`execute`](crate::execute):
//! which termination signals to watch, how long graceful shutdown may take, and
//! which queue delivers termination notifications.
//!
//! ## Defaults
//! - `signals = [Interrupt, Terminate]`
//! - `grace = 5s`
//! - `listener = ShutdownListener::new(1)`
//!
//! ## Sentinel values
//! - `grace = 0s` → shutdown is handed an already-expired context (escalation is expected)
//! - `listener capacity = 0` → clamped to 1
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use runvisor::{ShutdownConfig, ShutdownListener, Signal};
//!
//! let listener = ShutdownListener::new(1);
//! let trigger = listener.trigger();
//!
//! let cfg = ShutdownConfig::default()
//!     .with_signals([Signal::Interrupt])
//!     .with_grace(Duration::from_millis(500))
//!     .with_listener(listener);
//!
//! // Tests inject termination requests directly.
//! trigger.notify(Signal::Interrupt);
//! assert_eq!(cfg.grace(), Duration::from_millis(500));
//! ```

use std::fmt;
use std::time::Duration;

use tokio::sync::mpsc;

/// Default upper bound given to graceful shutdown.
pub const DEFAULT_GRACE: Duration = Duration::from_secs(5);

/// Default notification queue capacity.
pub const DEFAULT_LISTENER_CAPACITY: usize = 1;

/// Termination request kinds.
///
/// On Unix every kind maps to a real signal. Elsewhere only [`Signal::Interrupt`]
/// (Ctrl-C) is observable; other kinds are accepted and never fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// `SIGINT` / Ctrl-C.
    Interrupt,
    /// `SIGTERM` (default kill signal, used by systemd/Kubernetes).
    Terminate,
    /// `SIGQUIT`.
    Quit,
    /// `SIGHUP`.
    Hangup,
    /// `SIGUSR1`.
    User1,
    /// `SIGUSR2`.
    User2,
}

impl Signal {
    /// Conventional short name (`"SIGINT"`, `"SIGTERM"`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Interrupt => "SIGINT",
            Signal::Terminate => "SIGTERM",
            Signal::Quit => "SIGQUIT",
            Signal::Hangup => "SIGHUP",
            Signal::User1 => "SIGUSR1",
            Signal::User2 => "SIGUSR2",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receiving side of the termination notification queue.
///
/// Holds a sender of its own, so the queue never reports "closed" while a
/// caller waits on it.
#[derive(Debug)]
pub struct ShutdownListener {
    tx: mpsc::Sender<Signal>,
    rx: mpsc::Receiver<Signal>,
}

impl ShutdownListener {
    /// Creates a listener with the given queue capacity (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        Self { tx, rx }
    }

    /// Returns a handle that enqueues termination requests.
    pub fn trigger(&self) -> ShutdownTrigger {
        ShutdownTrigger {
            tx: self.tx.clone(),
        }
    }

    /// Queue capacity.
    pub fn capacity(&self) -> usize {
        self.tx.max_capacity()
    }

    /// Waits for the next termination request.
    pub(crate) async fn recv(&mut self) -> Signal {
        match self.rx.recv().await {
            Some(sig) => sig,
            // `self.tx` keeps the channel open; this branch is unreachable in practice.
            None => std::future::pending().await,
        }
    }
}

impl Default for ShutdownListener {
    fn default() -> Self {
        Self::new(DEFAULT_LISTENER_CAPACITY)
    }
}

/// Sending side of the termination notification queue.
///
/// Cheap to clone. Used by OS signal forwarders and by tests.
#[derive(Clone, Debug)]
pub struct ShutdownTrigger {
    tx: mpsc::Sender<Signal>,
}

impl ShutdownTrigger {
    /// Enqueues a termination request without blocking.
    ///
    /// Returns `false` if the queue is full (a request is already pending) or the
    /// listener is gone.
    pub fn notify(&self, signal: Signal) -> bool {
        self.tx.try_send(signal).is_ok()
    }

    /// True once the listener has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// One configuration override; see [`ShutdownConfig::from_options`].
#[derive(Debug)]
pub enum ShutdownOption {
    /// Replaces the watched signal set.
    Signals(Vec<Signal>),
    /// Replaces the grace period.
    Grace(Duration),
    /// Replaces the notification queue.
    Listener(ShutdownListener),
}

/// Per-call shutdown settings.
#[derive(Debug)]
pub struct ShutdownConfig {
    signals: Vec<Signal>,
    grace: Duration,
    listener: ShutdownListener,
}

impl ShutdownConfig {
    /// Applies `options` in order over the defaults (last writer wins per field).
    ///
    /// # Example
    /// ```
    /// use std::time::Duration;
    /// use runvisor::{ShutdownConfig, ShutdownOption};
    ///
    /// let cfg = ShutdownConfig::from_options([
    ///     ShutdownOption::Grace(Duration::from_secs(1)),
    ///     ShutdownOption::Grace(Duration::from_secs(2)),
    /// ]);
    /// assert_eq!(cfg.grace(), Duration::from_secs(2));
    /// ```
    pub fn from_options(options: impl IntoIterator<Item = ShutdownOption>) -> Self {
        options
            .into_iter()
            .fold(Self::default(), |cfg, opt| cfg.apply(opt))
    }

    /// Applies a single option.
    pub fn apply(self, option: ShutdownOption) -> Self {
        match option {
            ShutdownOption::Signals(signals) => self.with_signals(signals),
            ShutdownOption::Grace(grace) => self.with_grace(grace),
            ShutdownOption::Listener(listener) => self.with_listener(listener),
        }
    }

    /// Sets the termination signals to subscribe to.
    pub fn with_signals(mut self, signals: impl IntoIterator<Item = Signal>) -> Self {
        self.signals = signals.into_iter().collect();
        self
    }

    /// Sets the graceful shutdown budget.
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Sets the notification queue.
    pub fn with_listener(mut self, listener: ShutdownListener) -> Self {
        self.listener = listener;
        self
    }

    /// Watched signals.
    #[inline]
    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    /// Graceful shutdown budget.
    #[inline]
    pub fn grace(&self) -> Duration {
        self.grace
    }

    /// Notification queue.
    #[inline]
    pub fn listener(&self) -> &ShutdownListener {
        &self.listener
    }

    pub(crate) fn into_parts(self) -> (Vec<Signal>, Duration, ShutdownListener) {
        (self.signals, self.grace, self.listener)
    }
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            signals: vec![Signal::Interrupt, Signal::Terminate],
            grace: DEFAULT_GRACE,
            listener: ShutdownListener::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = ShutdownConfig::default();
        assert_eq!(cfg.signals(), &[Signal::Interrupt, Signal::Terminate]);
        assert_eq!(cfg.grace(), Duration::from_secs(5));
        assert_eq!(cfg.listener().capacity(), 1);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        assert_eq!(ShutdownListener::new(0).capacity(), 1);
        assert_eq!(ShutdownListener::new(8).capacity(), 8);
    }

    #[test]
    fn options_only_touch_their_own_field() {
        let cfg = ShutdownConfig::from_options([ShutdownOption::Signals(vec![Signal::Hangup])]);
        assert_eq!(cfg.signals(), &[Signal::Hangup]);
        assert_eq!(cfg.grace(), DEFAULT_GRACE);
        assert_eq!(cfg.listener().capacity(), DEFAULT_LISTENER_CAPACITY);
    }

    #[test]
    fn options_apply_in_order() {
        let cfg = ShutdownConfig::from_options([
            ShutdownOption::Signals(vec![Signal::Quit]),
            ShutdownOption::Grace(Duration::from_millis(10)),
            ShutdownOption::Listener(ShutdownListener::new(4)),
            ShutdownOption::Signals(vec![Signal::User1, Signal::User2]),
        ]);
        assert_eq!(cfg.signals(), &[Signal::User1, Signal::User2]);
        assert_eq!(cfg.grace(), Duration::from_millis(10));
        assert_eq!(cfg.listener().capacity(), 4);
    }

    #[test]
    fn full_queue_keeps_the_pending_request() {
        let listener = ShutdownListener::new(1);
        let trigger = listener.trigger();
        assert!(trigger.notify(Signal::Terminate));
        assert!(!trigger.notify(Signal::Interrupt));
        assert!(!trigger.is_closed());
    }

    #[tokio::test]
    async fn request_sent_before_waiting_is_not_lost() {
        let mut listener = ShutdownListener::new(1);
        listener.trigger().notify(Signal::Terminate);
        assert_eq!(listener.recv().await, Signal::Terminate);
    }

    #[test]
    fn trigger_reports_closed_after_listener_drop() {
        let listener = ShutdownListener::new(1);
        let trigger = listener.trigger();
        drop(listener);
        assert!(trigger.is_closed());
        assert!(!trigger.notify(Signal::Interrupt));
    }

    #[test]
    fn signal_names() {
        assert_eq!(Signal::Interrupt.to_string(), "SIGINT");
        assert_eq!(Signal::Terminate.as_str(), "SIGTERM");
    }
}
