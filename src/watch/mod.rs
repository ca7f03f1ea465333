//! Configuration change notifications.
//!
//! [`FileWatcher`] turns filesystem events on the configuration file into
//! [`ConfigEvent`]s on a channel; [`ConfigWatcher`] owns the receiving end and
//! hands every event to the reconciler from a dedicated task.
mod event;
mod watcher;
pub use event::*;
pub use watcher::*;
