//! kube-stager operator library.

/// Log and trace integrations
pub mod telemetry;

/// Metrics
pub mod metrics;
pub use metrics::Metrics;

pub mod apis;
pub mod config;
pub mod defaults;
pub mod drivers;
pub mod errors;
pub mod labels;
pub mod naming;
pub mod reconcilers;
pub mod slot_allocator;
pub mod template;

pub use errors::{ControllerError, Error, Result};
pub use reconcilers::site::{init, Context, Diagnostics, State};
