//! Application context wiring the collector components together.
//!
//! ## Example
//! ```ignore
//! let shutdown = CancellationToken::new();
//! let loaded = CollectorConfig::load()?;
//! let app = AppBuilder::new(loaded.config, loaded.path, shutdown.clone()).build();
//! app.load_initial_targets().await;
//! app.start_admin_server();
//! app.watch_config()?;
//! // ...
//! app.shutdown(App::default_drain_timeout()).await;
//! ```
mod app;
mod builder;
pub use app::*;
pub use builder::*;
