//! Streaming telemetry collector core.
//!
//! Keeps a live registry of monitored devices in line with a watched
//! configuration file, and renders telemetry messages from any number of
//! concurrent producers through one serialized output pipeline.
pub mod admin;
mod app;
mod config;
pub(crate) mod constants;
mod errors;
pub mod metrics;
mod output;
mod reconcile;
mod targets;
pub mod utils;
mod watch;

pub use app::*;
pub use config::*;
pub use errors::*;
pub use output::*;
pub use reconcile::*;
pub use targets::*;
pub use watch::*;

//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub mod test_utils;
