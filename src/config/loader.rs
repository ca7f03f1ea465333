use std::path::PathBuf;
use std::sync::Arc;

use arc_swap::ArcSwap;
#[cfg(test)]
use mockall::automock;
use tracing::debug;

use super::CollectorConfig;
use super::TargetSet;
use crate::Result;

/// Source of the desired target set.
#[cfg_attr(test, automock)]
pub trait TargetLoader: Send + Sync + 'static {
    /// Reads the currently declared targets.
    ///
    /// # Errors
    /// - [`crate::TargetError::NoTargetsFound`] when the source declares no targets; callers treat
    ///   this as an empty desired set
    /// - Any other error means the source could not be read and nothing should change
    fn get_targets(&self) -> Result<TargetSet>;

    /// Number of targets in the last successfully read declaration, whether
    /// or not they made it into the registry.
    fn declared_count(&self) -> usize;

    /// File whose changes should trigger a reload, if any.
    fn watch_path(&self) -> Option<PathBuf>;
}

/// Loads targets from a TOML file, re-reading it on every request.
///
/// The last successfully parsed configuration is kept so other components
/// can observe the live-reloadable settings without touching the file.
pub struct FileTargetLoader {
    path: Option<PathBuf>,
    current: ArcSwap<CollectorConfig>,
}

impl FileTargetLoader {
    pub fn new(
        path: Option<PathBuf>,
        initial: CollectorConfig,
    ) -> Self {
        Self {
            path,
            current: ArcSwap::from_pointee(initial),
        }
    }

    /// Snapshot of the last successfully loaded configuration
    pub fn current(&self) -> Arc<CollectorConfig> {
        self.current.load_full()
    }
}

impl TargetLoader for FileTargetLoader {
    fn get_targets(&self) -> Result<TargetSet> {
        if let Some(path) = &self.path {
            let config = CollectorConfig::from_file(path)?.validate()?;
            debug!(path = %path.display(), targets = config.targets.len(), "config reloaded");
            self.current.store(Arc::new(config));
        }
        self.current.load().resolved_targets()
    }

    fn declared_count(&self) -> usize {
        self.current.load().targets.len()
    }

    fn watch_path(&self) -> Option<PathBuf> {
        self.path.clone()
    }
}
