use std::sync::Arc;

use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio_util::sync::CancellationToken;

use super::orchestrator::Orchestrator;
use crate::{
    events::Bus,
    subscribers::{Subscribe, SubscriberSet},
};

/// Default capacity of the lifecycle event bus.
pub const DEFAULT_BUS_CAPACITY: usize = 64;

/// Builder for constructing an [`Orchestrator`] with optional features.
pub struct OrchestratorBuilder {
    subscribers: Vec<Arc<dyn Subscribe>>,
    parent: CancellationToken,
    bus_capacity: usize,
}

impl OrchestratorBuilder {
    /// Creates a new builder with no subscribers and a fresh parent token.
    pub fn new() -> Self {
        Self {
            subscribers: Vec::new(),
            parent: CancellationToken::new(),
            bus_capacity: DEFAULT_BUS_CAPACITY,
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive lifecycle events through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Adds one subscriber.
    pub fn with_subscriber(mut self, subscriber: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Sets the parent of every shutdown context.
    ///
    /// Cancelling it cuts a running grace period short.
    pub fn with_parent(mut self, parent: CancellationToken) -> Self {
        self.parent = parent;
        self
    }

    /// Sets the event bus capacity (minimum 1).
    pub fn with_bus_capacity(mut self, capacity: usize) -> Self {
        self.bus_capacity = capacity;
        self
    }

    /// Builds the orchestrator.
    ///
    /// When subscribers are present this spawns their workers and the bus
    /// listener, so it must be called from within a tokio runtime.
    pub fn build(self) -> Orchestrator {
        let bus = Bus::new(self.bus_capacity);
        let stop = CancellationToken::new();

        if !self.subscribers.is_empty() {
            let subs = SubscriberSet::new(self.subscribers, bus.clone());
            subscriber_listener(&bus, subs, stop.clone());
        }
        Orchestrator::new_internal(bus, self.parent, stop)
    }
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Forwards bus events to the subscriber set until `stop` fires, then drains
/// what is left and waits for subscriber workers to finish.
fn subscriber_listener(bus: &Bus, subs: SubscriberSet, stop: CancellationToken) {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                res = rx.recv() => match res {
                    Ok(ev) => subs.emit(&ev),
                    Err(RecvError::Lagged(n)) => {
                        tracing::warn!(skipped = n, "subscriber listener lagged");
                    }
                    Err(RecvError::Closed) => break,
                },
                _ = stop.cancelled() => {
                    loop {
                        match rx.try_recv() {
                            Ok(ev) => subs.emit(&ev),
                            Err(TryRecvError::Lagged(_)) => continue,
                            Err(_) => break,
                        }
                    }
                    break;
                }
            }
        }
        subs.shutdown().await;
    });
}
