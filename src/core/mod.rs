//! Runtime core: configuration, signal plumbing, and the orchestrator.
//!
//! Internal modules:
//! - [`config`]: per-call shutdown settings and the notification queue;
//! - [`signals`]: forwards OS signals into the notification queue;
//! - [`orchestrator`]: runs one service and drives shutdown with escalation;
//! - [`builder`]: wires subscribers and the parent token into an orchestrator.

mod builder;
mod config;
mod orchestrator;
mod signals;

pub use builder::{DEFAULT_BUS_CAPACITY, OrchestratorBuilder};
pub use config::{
    DEFAULT_GRACE, DEFAULT_LISTENER_CAPACITY, ShutdownConfig, ShutdownListener, ShutdownOption,
    ShutdownTrigger, Signal,
};
pub use orchestrator::{Orchestrator, execute};
