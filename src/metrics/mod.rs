use std::sync::Once;

use lazy_static::lazy_static;
use prometheus::Encoder;
use prometheus::IntCounter;
use prometheus::IntCounterVec;
use prometheus::IntGauge;
use prometheus::Opts;
use prometheus::Registry;
use tracing::error;

lazy_static! {
    pub static ref TARGET_OPERATIONS: IntCounterVec = IntCounterVec::new(
        Opts::new("target_operations_total", "Target registry operations by kind and result"),
        &["op", "result"]
    )
    .expect("metric can not be created");

    pub static ref PRINT_FAILURES: IntCounter =
        IntCounter::new("print_failures_total", "Messages that could not be rendered")
            .expect("metric can not be created");

    pub static ref PENDING_TARGET_INITS: IntGauge =
        IntGauge::new("pending_target_inits", "Target initializations still in flight")
            .expect("metric can not be created");

    pub static ref REGISTRY: Registry = Registry::new();
}

static REGISTER: Once = Once::new();

pub(crate) fn register_custom_metrics() {
    REGISTER.call_once(|| {
        REGISTRY
            .register(Box::new(TARGET_OPERATIONS.clone()))
            .expect("collector can be registered");
        REGISTRY
            .register(Box::new(PRINT_FAILURES.clone()))
            .expect("collector can be registered");
        REGISTRY
            .register(Box::new(PENDING_TARGET_INITS.clone()))
            .expect("collector can be registered");
    });
}

pub(crate) fn record_target_operation(
    op: &str,
    success: bool,
) {
    let result = if success { "ok" } else { "error" };
    TARGET_OPERATIONS.with_label_values(&[op, result]).inc();
}

/// Holds one unit of a gauge until dropped, unwinding included
pub(crate) struct GaugeGuard(IntGauge);

impl GaugeGuard {
    pub(crate) fn new(gauge: &IntGauge) -> Self {
        gauge.inc();
        Self(gauge.clone())
    }
}

impl Drop for GaugeGuard {
    fn drop(&mut self) {
        self.0.dec();
    }
}

/// Prometheus text exposition of the collector metrics
pub fn gather_metrics() -> String {
    register_custom_metrics();
    let encoder = prometheus::TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        error!("could not encode custom metrics: {}", e);
    }
    match String::from_utf8(buffer) {
        Ok(v) => v,
        Err(e) => {
            error!("custom metrics could not be from_utf8'd: {}", e);
            String::default()
        }
    }
}
