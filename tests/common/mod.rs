use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use telemetry_collector::TargetRegistry;
use tempfile::TempDir;
use tokio::time::Instant;

pub const WAIT_FOR_RELOAD_IN_SEC: u64 = 10;

pub struct ConfigFile {
    // keeps the directory alive for the duration of the test
    _dir: TempDir,
    pub path: PathBuf,
}

impl ConfigFile {
    pub fn new(content: &str) -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("collector.toml");
        fs::write(&path, content).expect("write config");
        Self { _dir: dir, path }
    }

    /// Replaces the file content in place
    pub fn rewrite(
        &self,
        content: &str,
    ) {
        fs::write(&self.path, content).expect("rewrite config");
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Config declaring `targets` by name, addresses on the loopback interface
pub fn config_with_targets(targets: &[&str]) -> String {
    let mut content = String::from("[global]\ninsecure = true\ntimeout_in_ms = 500\n\n");
    for (i, name) in targets.iter().enumerate() {
        content.push_str(&format!("[targets.{name}]\naddress = \"127.0.0.1:{}\"\n\n", 1 + i));
    }
    content
}

pub fn names(list: &[&str]) -> HashSet<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Polls the registry until its names equal `expected`
pub async fn wait_for_targets(
    registry: &Arc<dyn TargetRegistry>,
    expected: &[&str],
) -> bool {
    let expected = names(expected);
    let deadline = Instant::now() + Duration::from_secs(WAIT_FOR_RELOAD_IN_SEC);
    while Instant::now() < deadline {
        if registry.target_names() == expected {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}
