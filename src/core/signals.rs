//! # OS signal subscription.
//!
//! Forwards process signals into a [`ShutdownTrigger`] so the orchestrator only
//! ever waits on its [`ShutdownListener`](super::ShutdownListener).
//!
//! ## Signals
//! **Unix platforms:** every [`Signal`] kind maps to a `tokio::signal::unix::SignalKind`.
//!
//! **Other platforms:** only [`Signal::Interrupt`] via [`tokio::signal::ctrl_c`].
//!
//! ## Lifetime
//! Forwarder tasks are aborted when [`SignalForwarders`] is dropped. The OS-level
//! handler installed by tokio stays in place for the rest of the process, so a
//! second `execute` on the same signal reuses it rather than restoring the
//! default disposition in between.

use tokio::task::JoinSet;

use super::config::{ShutdownTrigger, Signal};
use crate::error::ExecuteError;

/// Running signal forwarders; aborted on drop.
pub(crate) struct SignalForwarders {
    _tasks: JoinSet<()>,
}

/// Subscribes `trigger` to each signal in `signals` (duplicates ignored).
///
/// Fails with [`ExecuteError::Subscribe`] on the first signal that cannot be
/// registered; already started forwarders are aborted.
pub(crate) fn subscribe(
    signals: &[Signal],
    trigger: &ShutdownTrigger,
) -> Result<SignalForwarders, ExecuteError> {
    let mut tasks = JoinSet::new();
    let mut seen: Vec<Signal> = Vec::with_capacity(signals.len());

    for &sig in signals {
        if seen.contains(&sig) {
            continue;
        }
        seen.push(sig);
        forward(&mut tasks, sig, trigger.clone())?;
    }
    Ok(SignalForwarders { _tasks: tasks })
}

#[cfg(unix)]
fn forward(
    tasks: &mut JoinSet<()>,
    sig: Signal,
    trigger: ShutdownTrigger,
) -> Result<(), ExecuteError> {
    use tokio::signal::unix::{SignalKind, signal};

    let kind = match sig {
        Signal::Interrupt => SignalKind::interrupt(),
        Signal::Terminate => SignalKind::terminate(),
        Signal::Quit => SignalKind::quit(),
        Signal::Hangup => SignalKind::hangup(),
        Signal::User1 => SignalKind::user_defined1(),
        Signal::User2 => SignalKind::user_defined2(),
    };
    let mut stream = signal(kind).map_err(|source| ExecuteError::Subscribe {
        signal: sig,
        source,
    })?;

    tasks.spawn(async move {
        while stream.recv().await.is_some() {
            if !trigger.notify(sig) && trigger.is_closed() {
                break;
            }
        }
    });
    Ok(())
}

#[cfg(not(unix))]
fn forward(
    tasks: &mut JoinSet<()>,
    sig: Signal,
    trigger: ShutdownTrigger,
) -> Result<(), ExecuteError> {
    if sig != Signal::Interrupt {
        return Ok(());
    }
    tasks.spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if !trigger.notify(sig) && trigger.is_closed() {
                break;
            }
        }
    });
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::core::config::ShutdownListener;

    #[tokio::test]
    async fn delivered_signal_reaches_the_listener() {
        let mut listener = ShutdownListener::new(1);
        let _fwd = subscribe(&[Signal::User1, Signal::User1], &listener.trigger()).unwrap();

        // Handler is installed above, so SIGUSR1 no longer kills the test process.
        let status = std::process::Command::new("kill")
            .args(["-USR1", &std::process::id().to_string()])
            .status()
            .unwrap();
        assert!(status.success());

        let got = tokio::time::timeout(Duration::from_secs(5), listener.recv())
            .await
            .unwrap();
        assert_eq!(got, Signal::User1);
    }
}
