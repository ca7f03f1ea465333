use telemetry_collector::utils::file_io;
use telemetry_collector::App;
use telemetry_collector::AppBuilder;
use telemetry_collector::CollectorConfig;
use telemetry_collector::GlobalSettings;
use telemetry_collector::Result;
use telemetry_collector::SystemError;
use tokio::signal::unix::signal;
use tokio::signal::unix::SignalKind;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing::warn;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    let loaded = CollectorConfig::load()?;
    let config = loaded.config;

    // Initializing Logs
    let _guard = init_observability(&config.global)?;
    if let (Some(path), Some(e)) = (&loaded.path, &loaded.fallback_error) {
        warn!("failed reading config file {}: {}", path.display(), e);
    }
    debug!(
        "version {} ({}), commit {}",
        env!("CARGO_PKG_VERSION"),
        option_env!("VERGEN_GIT_BRANCH").unwrap_or("unknown"),
        option_env!("VERGEN_GIT_SHA").unwrap_or("unknown"),
    );
    debug!(?config, "configuration loaded");

    // Initializing Shutdown Signal
    let shutdown = CancellationToken::new();

    let app = AppBuilder::new(config, loaded.path, shutdown.clone()).build();
    app.load_initial_targets().await;
    app.start_admin_server();
    if let Err(e) = app.watch_config() {
        error!("config changes will not be picked up: {}", e);
    }

    info!("Collector started. Waiting for CTRL+C signal...");
    if let Err(e) = graceful_shutdown(shutdown).await {
        error!("Failed to shutdown: {:?}", e);
    }

    app.shutdown(App::default_drain_timeout()).await;
    info!("Exiting program.");
    Ok(())
}

async fn graceful_shutdown(shutdown: CancellationToken) -> Result<()> {
    let mut sigint = signal(SignalKind::interrupt()).map_err(SystemError::Io)?;
    let mut sigterm = signal(SignalKind::terminate()).map_err(SystemError::Io)?;
    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT detected.");
        },
        _ = sigterm.recv() => {
            info!("SIGTERM detected.");
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl+C detected.");
        },
    }

    shutdown.cancel();
    Ok(())
}

/// Routes logs to the configured file, to stderr, or nowhere.
///
/// The returned guard flushes the file writer when dropped.
pub fn init_observability(settings: &GlobalSettings) -> Result<Option<WorkerGuard>> {
    if !settings.logging_enabled() {
        return Ok(None);
    }

    let default_level = if settings.debug {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let filter = || {
        EnvFilter::builder()
            .with_default_directive(default_level.into())
            .from_env_lossy()
    };

    if !settings.log_file.is_empty() {
        let log_file = file_io::open_file_for_append(&settings.log_file)?;
        let (non_blocking, guard) = tracing_appender::non_blocking(log_file);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_filter(filter());
        tracing_subscriber::registry().with(layer).init();
        return Ok(Some(guard));
    }

    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(filter());
    tracing_subscriber::registry().with(layer).init();
    Ok(None)
}
