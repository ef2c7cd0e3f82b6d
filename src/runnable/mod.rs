//! # Runnable abstractions.
//!
//! This module provides the hosted-service contract:
//! - [`Runnable`] - trait with run / graceful-stop / forced-stop operations
//! - [`RunnableFn`] - closure-backed implementation
//! - [`RunnableRef`] - shared reference to a runnable (`Arc<dyn Runnable>`)

mod runnable;
mod runnable_fn;

pub use runnable::{Runnable, RunnableRef};
pub use runnable_fn::RunnableFn;
