use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::admin;
use crate::constants::SHUTDOWN_DRAIN_TIMEOUT_MS;
use crate::utils::async_task::spawn_task;
use crate::CollectorConfig;
use crate::ConfigEvent;
use crate::ConfigEventKind;
use crate::ConfigWatcher;
use crate::OutputPipeline;
use crate::ReconcileReport;
use crate::Reconciler;
use crate::Result;
use crate::TargetLoader;
use crate::TargetRegistry;

pub struct App {
    config: CollectorConfig,
    loader: Arc<dyn TargetLoader>,
    registry: Arc<dyn TargetRegistry>,
    reconciler: Arc<Reconciler>,
    output: Arc<OutputPipeline>,
    shutdown: CancellationToken,
    /// Watcher and other background tasks, awaited on shutdown
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl App {
    pub(super) fn new(
        config: CollectorConfig,
        loader: Arc<dyn TargetLoader>,
        registry: Arc<dyn TargetRegistry>,
        reconciler: Arc<Reconciler>,
        output: Arc<OutputPipeline>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            config,
            loader,
            registry,
            reconciler,
            output,
            shutdown,
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub fn default_drain_timeout() -> Duration {
        Duration::from_millis(SHUTDOWN_DRAIN_TIMEOUT_MS)
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    pub fn registry(&self) -> Arc<dyn TargetRegistry> {
        self.registry.clone()
    }

    pub fn reconciler(&self) -> Arc<Reconciler> {
        self.reconciler.clone()
    }

    /// Shared print pipeline for message producers
    pub fn output(&self) -> Arc<OutputPipeline> {
        self.output.clone()
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Startup pass: registers every declared target as if the
    /// configuration source had just been created.
    pub async fn load_initial_targets(&self) -> Option<ReconcileReport> {
        let path = self.loader.watch_path().unwrap_or_default();
        let report = self
            .reconciler
            .reconcile(&ConfigEvent::new(ConfigEventKind::Create, path))
            .await;
        match &report {
            Some(r) => info!("loaded {} target(s)", r.added.len()),
            None => error!("initial target load failed"),
        }
        report
    }

    /// Serves the admin endpoint when an API address is configured.
    ///
    /// A bind failure is logged and the collector keeps running without it.
    pub fn start_admin_server(&self) -> Option<SocketAddr> {
        let api = &self.config.global.api;
        if api.is_empty() {
            debug!("admin endpoint disabled");
            return None;
        }
        let addr: SocketAddr = match api.parse() {
            Ok(addr) => addr,
            Err(e) => {
                error!("invalid api address {:?}: {}", api, e);
                return None;
            }
        };
        match admin::start_admin_server(addr, self.registry.clone(), self.shutdown.clone()) {
            Ok(bound) => Some(bound),
            Err(e) => {
                error!("failed to start admin endpoint: {}", e);
                None
            }
        }
    }

    /// Starts reconciling on every change of the configuration file.
    ///
    /// Without a configuration file there is nothing to watch and the call
    /// is a no-op.
    ///
    /// # Errors
    /// Failures to set up the filesystem watch
    pub fn watch_config(&self) -> Result<()> {
        let Some(path) = self.loader.watch_path() else {
            debug!("no config file to watch");
            return Ok(());
        };
        let watcher = ConfigWatcher::watch_file(path)?;
        self.spawn_watcher(watcher);
        Ok(())
    }

    pub(crate) fn spawn_watcher(
        &self,
        watcher: ConfigWatcher,
    ) {
        let reconciler = self.reconciler.clone();
        let shutdown = self.shutdown.clone();
        let handle = spawn_task("config-watcher", move || async move {
            watcher.run(reconciler, shutdown).await;
            Ok(())
        });
        self.tasks.lock().push(handle);
    }

    /// Path of the watched configuration file, if any
    pub fn config_path(&self) -> Option<PathBuf> {
        self.loader.watch_path()
    }

    /// Cancels every background activity and waits up to `drain_timeout` for
    /// in-flight target initializations.
    ///
    /// Returns `true` if everything drained in time.
    pub async fn shutdown(
        &self,
        drain_timeout: Duration,
    ) -> bool {
        info!("shutting down collector");
        self.shutdown.cancel();

        let tasks: Vec<JoinHandle<()>> = self.tasks.lock().drain(..).collect();
        for task in tasks {
            if let Err(e) = task.await {
                error!("background task failed: {:?}", e);
            }
        }

        let drained = self.reconciler.drain(drain_timeout).await;
        if drained {
            debug!("pending target initializations drained");
        } else {
            warn!(
                pending = self.reconciler.pending_inits(),
                "target initializations still running after {:?}", drain_timeout
            );
        }
        drained
    }
}
