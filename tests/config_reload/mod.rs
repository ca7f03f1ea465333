use std::sync::Arc;
use std::time::Duration;

use telemetry_collector::AppBuilder;
use telemetry_collector::CollectorConfig;
use telemetry_collector::ConfigEvent;
use telemetry_collector::ConfigEventKind;
use telemetry_collector::DialSettings;
use telemetry_collector::FileTargetLoader;
use telemetry_collector::Reconciler;
use telemetry_collector::TargetManager;
use telemetry_collector::TargetRegistry;
use telemetry_collector::TargetState;
use tokio_util::sync::CancellationToken;

use crate::common::config_with_targets;
use crate::common::names;
use crate::common::wait_for_targets;
use crate::common::ConfigFile;

struct Stack {
    manager: Arc<TargetManager>,
    reconciler: Reconciler,
}

fn load(file: &ConfigFile) -> CollectorConfig {
    CollectorConfig::from_file(file.path())
        .and_then(CollectorConfig::validate)
        .expect("valid config")
}

fn stack(file: &ConfigFile) -> Stack {
    let loader = Arc::new(FileTargetLoader::new(Some(file.path.clone()), load(file)));
    let manager = Arc::new(TargetManager::new(DialSettings {
        block: false,
        ..Default::default()
    }));
    let reconciler = Reconciler::new(loader, manager.clone(), CancellationToken::new());
    Stack { manager, reconciler }
}

fn event(
    kind: ConfigEventKind,
    file: &ConfigFile,
) -> ConfigEvent {
    ConfigEvent::new(kind, file.path())
}

#[tokio::test]
async fn test_registry_follows_file_rewrites() {
    let file = ConfigFile::new(&config_with_targets(&["r1", "r2"]));
    let s = stack(&file);

    let report = s.reconciler.reconcile(&event(ConfigEventKind::Create, &file)).await.unwrap();
    assert_eq!(report.added, vec!["r1", "r2"]);
    assert_eq!(s.manager.target_names(), names(&["r1", "r2"]));

    file.rewrite(&config_with_targets(&["r2", "r3"]));
    let report = s.reconciler.reconcile(&event(ConfigEventKind::Write, &file)).await.unwrap();
    assert_eq!(report.deleted, vec!["r1"]);
    assert_eq!(report.added, vec!["r3"]);
    assert_eq!(s.manager.target_names(), names(&["r2", "r3"]));

    file.rewrite("[targets.r4\naddress = ");
    assert!(s.reconciler.reconcile(&event(ConfigEventKind::Write, &file)).await.is_none());
    assert_eq!(s.manager.target_names(), names(&["r2", "r3"]));

    file.rewrite("[global]\ninsecure = true\n");
    let report = s.reconciler.reconcile(&event(ConfigEventKind::Write, &file)).await.unwrap();
    assert_eq!(report.deleted, vec!["r2", "r3"]);
    assert_eq!(s.manager.target_count(), 0);
}

#[tokio::test]
async fn test_added_targets_get_initialized() {
    let file = ConfigFile::new(&config_with_targets(&["r1"]));
    let s = stack(&file);

    s.reconciler.reconcile(&event(ConfigEventKind::Create, &file)).await.unwrap();
    assert!(s.reconciler.drain(Duration::from_secs(5)).await);

    assert_eq!(s.manager.state("r1"), Some(TargetState::Connected));
    assert!(s.manager.channel("r1").is_some());
}

#[tokio::test]
async fn test_other_events_keep_live_targets() {
    let file = ConfigFile::new(&config_with_targets(&["r1"]));
    let s = stack(&file);
    s.reconciler.reconcile(&event(ConfigEventKind::Create, &file)).await.unwrap();

    file.rewrite(&config_with_targets(&[]));
    assert!(s.reconciler.reconcile(&event(ConfigEventKind::Other, &file)).await.is_none());

    assert_eq!(s.manager.target_names(), names(&["r1"]));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_app_reloads_watched_config_file() {
    let file = ConfigFile::new(&config_with_targets(&["r1", "r2"]));
    let app =
        AppBuilder::new(load(&file), Some(file.path.clone()), CancellationToken::new()).build();
    let registry: Arc<dyn TargetRegistry> = app.registry();

    app.load_initial_targets().await.expect("initial pass");
    assert_eq!(registry.target_names(), names(&["r1", "r2"]));

    app.watch_config().expect("watch config file");
    file.rewrite(&config_with_targets(&["r2", "r3", "r4"]));
    assert!(wait_for_targets(&registry, &["r2", "r3", "r4"]).await);

    file.rewrite(&config_with_targets(&["r4"]));
    assert!(wait_for_targets(&registry, &["r4"]).await);

    app.shutdown(Duration::from_secs(5)).await;
}
