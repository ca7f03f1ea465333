use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::App;
use crate::CollectorConfig;
use crate::DefaultFormatter;
use crate::DialSettings;
use crate::FileTargetLoader;
use crate::Formatter;
use crate::OutputPipeline;
use crate::OutputSettings;
use crate::Reconciler;
use crate::TargetLoader;
use crate::TargetManager;
use crate::TargetRegistry;

/// Assembles an [`App`].
///
/// Unless overridden, targets are read from `config_path` through a
/// [`FileTargetLoader`], registered in a [`TargetManager`], and rendered with
/// the [`DefaultFormatter`] to stdout.
pub struct AppBuilder {
    config: CollectorConfig,
    config_path: Option<PathBuf>,
    loader: Option<Arc<dyn TargetLoader>>,
    registry: Option<Arc<dyn TargetRegistry>>,
    formatter: Option<Arc<dyn Formatter>>,
    shutdown: CancellationToken,
}

impl AppBuilder {
    pub fn new(
        config: CollectorConfig,
        config_path: Option<PathBuf>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            config,
            config_path,
            loader: None,
            registry: None,
            formatter: None,
            shutdown,
        }
    }

    pub fn loader(
        mut self,
        loader: Arc<dyn TargetLoader>,
    ) -> Self {
        self.loader = Some(loader);
        self
    }

    pub fn registry(
        mut self,
        registry: Arc<dyn TargetRegistry>,
    ) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn formatter(
        mut self,
        formatter: Arc<dyn Formatter>,
    ) -> Self {
        self.formatter = Some(formatter);
        self
    }

    pub fn build(self) -> App {
        let global = &self.config.global;
        let loader = self.loader.unwrap_or_else(|| {
            Arc::new(FileTargetLoader::new(self.config_path, self.config.clone()))
        });
        let registry = self
            .registry
            .unwrap_or_else(|| Arc::new(TargetManager::new(DialSettings::from(global))));
        let formatter = self.formatter.unwrap_or_else(|| Arc::new(DefaultFormatter));

        let reconciler = Arc::new(Reconciler::new(
            loader.clone(),
            registry.clone(),
            self.shutdown.clone(),
        ));
        let output = Arc::new(OutputPipeline::stdio(
            formatter,
            OutputSettings::from(global),
            loader.clone(),
        ));

        App::new(self.config, loader, registry, reconciler, output, self.shutdown)
    }
}
