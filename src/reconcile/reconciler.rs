//! Diff-and-apply engine between the declared and the live target sets.
//!
//! ## Pass sequence
//! 1. Take the reconciliation lock, held until the pass returns
//! 2. Read the declared targets (an empty declaration is a valid empty set)
//! 3. Delete live targets that are no longer declared
//! 4. Add declared targets that are not live, and spawn their initialization
//!
//! Targets are compared by name only. A target whose parameters change while
//! its name stays the same is left alone.
//!
//! Per-target failures are logged and never stop the remaining work of a
//! pass. Nothing is retried: the next change notification runs a fresh pass.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::trace;

use crate::metrics;
use crate::ConfigEvent;
use crate::TargetLoader;
use crate::TargetRegistry;
use crate::TargetSet;

/// What one reconciliation pass did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub added: Vec<String>,
    pub deleted: Vec<String>,
    pub failed_adds: Vec<String>,
    pub failed_deletes: Vec<String>,
}

impl ReconcileReport {
    pub fn is_noop(&self) -> bool {
        self.added.is_empty()
            && self.deleted.is_empty()
            && self.failed_adds.is_empty()
            && self.failed_deletes.is_empty()
    }
}

pub struct Reconciler {
    loader: Arc<dyn TargetLoader>,
    registry: Arc<dyn TargetRegistry>,
    /// Serializes passes
    lock: Mutex<()>,
    /// Outstanding target initializations
    pending: TaskTracker,
    shutdown: CancellationToken,
}

impl Reconciler {
    pub fn new(
        loader: Arc<dyn TargetLoader>,
        registry: Arc<dyn TargetRegistry>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            loader,
            registry,
            lock: Mutex::new(()),
            pending: TaskTracker::new(),
            shutdown,
        }
    }

    /// Handles one change notification.
    ///
    /// Returns `None` when the event kind does not call for a pass or when the
    /// declared targets could not be read; the registry is untouched in both
    /// cases.
    pub async fn reconcile(
        &self,
        event: &ConfigEvent,
    ) -> Option<ReconcileReport> {
        debug!(kind = ?event.kind, path = %event.path.display(), "got config change notification");
        if !event.kind.triggers_reconcile() {
            trace!("ignoring config notification {:?}", event.kind);
            return None;
        }

        let _guard = self.lock.lock().await;

        let desired = match self.loader.get_targets() {
            Ok(targets) => targets,
            Err(e) if e.is_no_targets() => TargetSet::new(),
            Err(e) => {
                error!("failed getting targets from new config: {}", e);
                return None;
            }
        };
        let live = self.registry.target_names();

        let report = self.apply(&desired, &live);
        if !report.is_noop() {
            info!(
                added = report.added.len(),
                deleted = report.deleted.len(),
                failed = report.failed_adds.len() + report.failed_deletes.len(),
                "targets reconciled"
            );
        }
        Some(report)
    }

    fn apply(
        &self,
        desired: &TargetSet,
        live: &HashSet<String>,
    ) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        let mut stale: Vec<&String> = live
            .iter()
            .filter(|n| !desired.contains_key(*n))
            .collect();
        stale.sort();
        for name in stale {
            debug!("target {:?} deleted from config", name);
            match self.registry.delete_target(name) {
                Ok(()) => {
                    metrics::record_target_operation("delete", true);
                    report.deleted.push(name.clone());
                }
                Err(e) => {
                    metrics::record_target_operation("delete", false);
                    error!("failed to delete target {:?}: {}", name, e);
                    report.failed_deletes.push(name.clone());
                }
            }
        }

        let mut fresh: Vec<(&String, _)> = desired
            .iter()
            .filter(|(n, _)| !live.contains(*n))
            .collect();
        fresh.sort_by(|a, b| a.0.cmp(b.0));
        for (name, config) in fresh {
            debug!("target {:?} added to config", name);
            if let Err(e) = self.registry.add_target(config.clone()) {
                metrics::record_target_operation("add", false);
                error!("failed adding target {:?}: {}", name, e);
                report.failed_adds.push(name.clone());
                continue;
            }
            metrics::record_target_operation("add", true);
            self.spawn_init(name.clone());
            report.added.push(name.clone());
        }

        report
    }

    fn spawn_init(
        &self,
        name: String,
    ) {
        let registry = self.registry.clone();
        let shutdown = self.shutdown.clone();
        let in_flight = metrics::GaugeGuard::new(&metrics::PENDING_TARGET_INITS);
        self.pending.spawn(async move {
            let _in_flight = in_flight;
            registry.init_target(shutdown, name).await;
        });
    }

    /// Number of target initializations still running
    pub fn pending_inits(&self) -> usize {
        self.pending.len()
    }

    /// Closes the pending-init group and waits up to `timeout` for in-flight
    /// initializations to finish.
    ///
    /// Returns `true` if everything drained in time.
    pub async fn drain(
        &self,
        timeout: Duration,
    ) -> bool {
        self.pending.close();
        tokio::time::timeout(timeout, self.pending.wait()).await.is_ok()
    }
}
