//! Optional HTTP admin endpoint.
//!
//! Routes:
//! - `GET /api/v1/targets`: JSON array of live target names, sorted
//! - `GET /api/v1/healthz`: `ok`
//! - `GET /metrics`: Prometheus text exposition
#[cfg(test)]
mod admin_test;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::info;
use warp::Filter;
use warp::Rejection;
use warp::Reply;

use crate::metrics;
use crate::Result;
use crate::SystemError;
use crate::TargetRegistry;

pub fn routes(
    registry: Arc<dyn TargetRegistry>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let registry = warp::any().map(move || registry.clone());

    let targets = warp::path!("api" / "v1" / "targets")
        .and(warp::get())
        .and(registry)
        .and_then(targets_handler);
    let healthz = warp::path!("api" / "v1" / "healthz").and(warp::get()).map(|| "ok");
    let metrics = warp::path!("metrics").and(warp::get()).and_then(metrics_handler);

    targets.or(healthz).or(metrics)
}

/// Binds the admin endpoint on `addr` and serves it in the background until
/// `shutdown` fires.
///
/// Returns the bound address, which differs from `addr` when port 0 is used.
///
/// # Errors
/// [`SystemError::AdminServer`] if the address cannot be bound
pub fn start_admin_server(
    addr: SocketAddr,
    registry: Arc<dyn TargetRegistry>,
    shutdown: CancellationToken,
) -> Result<SocketAddr> {
    metrics::register_custom_metrics();

    let (bound, server) = warp::serve(routes(registry))
        .try_bind_with_graceful_shutdown(addr, async move {
            shutdown.cancelled().await;
            debug!("admin endpoint shutting down");
        })
        .map_err(|e| SystemError::AdminServer(format!("{addr}: {e}")))?;
    info!("admin endpoint listening on {}", bound);

    tokio::spawn(server);
    Ok(bound)
}

async fn targets_handler(
    registry: Arc<dyn TargetRegistry>,
) -> std::result::Result<impl Reply, Rejection> {
    let mut names: Vec<String> = registry.target_names().into_iter().collect();
    names.sort();
    Ok(warp::reply::json(&names))
}

async fn metrics_handler() -> std::result::Result<impl Reply, Rejection> {
    Ok(metrics::gather_metrics())
}
