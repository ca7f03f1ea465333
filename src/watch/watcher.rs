use std::ffi::OsString;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use notify::event::ModifyKind;
use notify::Event;
use notify::EventKind;
use notify::RecommendedWatcher;
use notify::RecursiveMode;
use notify::Watcher;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use super::ConfigEvent;
use super::ConfigEventKind;
use crate::constants::CONFIG_EVENT_BUFFER;
use crate::Error;
use crate::Reconciler;
use crate::Result;

/// Filesystem watch on a single configuration file.
///
/// The parent directory is watched rather than the file itself so that
/// editors replacing the file on save keep producing events.
pub struct FileWatcher {
    path: PathBuf,
    // dropping the watcher stops the notify thread and closes the channel
    _watcher: RecommendedWatcher,
}

impl FileWatcher {
    pub fn start(path: impl Into<PathBuf>) -> Result<(Self, mpsc::Receiver<ConfigEvent>)> {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(|n| n.to_os_string())
            .ok_or_else(|| Error::InvalidConfig(format!("{} is not a file path", path.display())))?;
        let dir = watch_dir(&path);

        let (tx, rx) = mpsc::channel(CONFIG_EVENT_BUFFER);
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => forward(&tx, &file_name, event),
            Err(e) => error!("config watch error: {}", e),
        })?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        info!("watching config file {}", path.display());

        Ok((
            Self {
                path,
                _watcher: watcher,
            },
            rx,
        ))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

pub(crate) fn watch_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Runs on the notify thread.
fn forward(
    tx: &mpsc::Sender<ConfigEvent>,
    file_name: &OsString,
    event: Event,
) {
    let Some(path) = event
        .paths
        .iter()
        .find(|p| p.file_name() == Some(file_name.as_os_str()))
    else {
        return;
    };

    match event.kind {
        EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(_)) => {
            warn!(kind = ?event.kind, "config file {} removed or renamed", path.display());
        }
        _ => {}
    }

    let config_event = ConfigEvent::new(ConfigEventKind::from(&event.kind), path.clone());
    if tx.blocking_send(config_event).is_err() {
        debug!("config event receiver dropped");
    }
}

/// Feeds configuration change events to the reconciler, one at a time.
pub struct ConfigWatcher {
    events: mpsc::Receiver<ConfigEvent>,
    source: Option<FileWatcher>,
}

impl ConfigWatcher {
    pub fn new(events: mpsc::Receiver<ConfigEvent>) -> Self {
        Self { events, source: None }
    }

    pub fn watch_file(path: impl Into<PathBuf>) -> Result<Self> {
        let (source, events) = FileWatcher::start(path)?;
        Ok(Self {
            events,
            source: Some(source),
        })
    }

    /// Returns when the event channel closes or `shutdown` fires.
    pub async fn run(
        mut self,
        reconciler: Arc<Reconciler>,
        shutdown: CancellationToken,
    ) {
        if let Some(source) = &self.source {
            debug!("config watcher started for {}", source.path().display());
        }
        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    debug!("config watcher shutting down");
                    break;
                }
                event = self.events.recv() => {
                    let Some(event) = event else {
                        debug!("config event channel closed");
                        break;
                    };
                    if let Some(report) = reconciler.reconcile(&event).await {
                        debug!(?report, "reconcile pass finished");
                    }
                }
            }
        }
    }
}
