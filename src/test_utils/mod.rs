//! In-memory collaborators shared by unit tests.
use std::collections::HashMap;
use std::collections::HashSet;
use std::io;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use config::ConfigError;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tonic::async_trait;

use crate::Result;
use crate::TargetConfig;
use crate::TargetError;
use crate::TargetLoader;
use crate::TargetRegistry;
use crate::TargetSet;

pub(crate) fn target_set(targets: &[(&str, &str)]) -> TargetSet {
    targets
        .iter()
        .map(|(name, address)| (name.to_string(), TargetConfig::new(*name, *address)))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RegistryCall {
    Add(String),
    Delete(String),
    Init(String),
}

/// Registry double with failure injection and call recording
#[derive(Default)]
pub(crate) struct FakeRegistry {
    live: Mutex<HashMap<String, TargetConfig>>,
    calls: Mutex<Vec<RegistryCall>>,
    fail_add: Mutex<HashSet<String>>,
    fail_delete: Mutex<HashSet<String>>,
    /// When set, init tasks block until this fires (or shutdown does)
    init_gate: Option<CancellationToken>,
    /// Synchronous delay inside add/delete to widen race windows
    mutation_delay: Option<Duration>,
    panic_on_init: bool,
    active_mutations: AtomicUsize,
    max_active_mutations: AtomicUsize,
    completed_inits: AtomicUsize,
}

impl FakeRegistry {
    pub(crate) fn with_live(targets: TargetSet) -> Self {
        let registry = Self::default();
        *registry.live.lock() = targets;
        registry
    }

    pub(crate) fn with_init_gate(
        mut self,
        gate: CancellationToken,
    ) -> Self {
        self.init_gate = Some(gate);
        self
    }

    pub(crate) fn with_mutation_delay(
        mut self,
        delay: Duration,
    ) -> Self {
        self.mutation_delay = Some(delay);
        self
    }

    /// Init tasks panic instead of completing
    pub(crate) fn with_panicking_init(mut self) -> Self {
        self.panic_on_init = true;
        self
    }

    pub(crate) fn fail_add_for(
        &self,
        name: &str,
    ) {
        self.fail_add.lock().insert(name.to_string());
    }

    pub(crate) fn fail_delete_for(
        &self,
        name: &str,
    ) {
        self.fail_delete.lock().insert(name.to_string());
    }

    pub(crate) fn calls(&self) -> Vec<RegistryCall> {
        self.calls.lock().clone()
    }

    pub(crate) fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    /// Add/delete calls only; init calls are spawned and land asynchronously
    pub(crate) fn mutations(&self) -> Vec<RegistryCall> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c, RegistryCall::Init(_)))
            .collect()
    }

    pub(crate) fn live_config(
        &self,
        name: &str,
    ) -> Option<TargetConfig> {
        self.live.lock().get(name).cloned()
    }

    pub(crate) fn max_active_mutations(&self) -> usize {
        self.max_active_mutations.load(Ordering::SeqCst)
    }

    pub(crate) fn completed_inits(&self) -> usize {
        self.completed_inits.load(Ordering::SeqCst)
    }

    fn enter_mutation(&self) {
        let active = self.active_mutations.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active_mutations.fetch_max(active, Ordering::SeqCst);
        if let Some(delay) = self.mutation_delay {
            std::thread::sleep(delay);
        }
    }

    fn exit_mutation(&self) {
        self.active_mutations.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl TargetRegistry for FakeRegistry {
    fn add_target(
        &self,
        config: TargetConfig,
    ) -> Result<()> {
        self.enter_mutation();
        self.calls.lock().push(RegistryCall::Add(config.name.clone()));
        let result = if self.fail_add.lock().contains(&config.name) {
            Err(TargetError::InvalidAddress {
                name: config.name.clone(),
                address: config.address.clone(),
            }
            .into())
        } else {
            self.live.lock().insert(config.name.clone(), config);
            Ok(())
        };
        self.exit_mutation();
        result
    }

    fn delete_target(
        &self,
        name: &str,
    ) -> Result<()> {
        self.enter_mutation();
        self.calls.lock().push(RegistryCall::Delete(name.to_string()));
        let result = if self.fail_delete.lock().contains(name) {
            Err(TargetError::NotFound(name.to_string()).into())
        } else {
            self.live.lock().remove(name);
            Ok(())
        };
        self.exit_mutation();
        result
    }

    fn target_names(&self) -> HashSet<String> {
        self.live.lock().keys().cloned().collect()
    }

    fn target_count(&self) -> usize {
        self.live.lock().len()
    }

    async fn init_target(
        &self,
        shutdown: CancellationToken,
        name: String,
    ) {
        self.calls.lock().push(RegistryCall::Init(name.clone()));
        if self.panic_on_init {
            panic!("init of {name} failed");
        }
        if let Some(gate) = &self.init_gate {
            tokio::select! {
                _ = gate.cancelled() => {}
                _ = shutdown.cancelled() => {}
            }
        }
        self.completed_inits.fetch_add(1, Ordering::SeqCst);
    }
}

/// Loader double serving whatever snapshot the test installs
#[derive(Default)]
pub(crate) struct StaticLoader {
    targets: Mutex<TargetSet>,
    broken: Mutex<bool>,
}

impl StaticLoader {
    pub(crate) fn new(targets: TargetSet) -> Self {
        Self {
            targets: Mutex::new(targets),
            broken: Mutex::new(false),
        }
    }

    pub(crate) fn set(
        &self,
        targets: TargetSet,
    ) {
        *self.targets.lock() = targets;
    }

    pub(crate) fn set_broken(
        &self,
        broken: bool,
    ) {
        *self.broken.lock() = broken;
    }
}

impl TargetLoader for StaticLoader {
    fn get_targets(&self) -> Result<TargetSet> {
        if *self.broken.lock() {
            return Err(ConfigError::Message("unreadable config".into()).into());
        }
        let targets = self.targets.lock().clone();
        if targets.is_empty() {
            return Err(TargetError::NoTargetsFound.into());
        }
        Ok(targets)
    }

    fn declared_count(&self) -> usize {
        self.targets.lock().len()
    }

    fn watch_path(&self) -> Option<PathBuf> {
        None
    }
}

/// Cloneable in-memory sink for output assertions
#[derive(Clone, Default)]
pub(crate) struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub(crate) fn contents(&self) -> String {
        String::from_utf8(self.0.lock().clone()).expect("output is utf8")
    }
}

impl Write for SharedBuffer {
    fn write(
        &mut self,
        buf: &[u8],
    ) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
