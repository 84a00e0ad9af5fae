//! Prometheus metrics for the Amp ledger.
//!
//! All metrics follow the naming convention: `amp_<area>_<metric>_<unit>`.
//! Metrics can be updated before `register_metrics` runs; registration only
//! makes them visible to `encode_metrics`.

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge,
    Opts, Registry, TextEncoder,
};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // TRANSFER METRICS
    // =========================================================================

    /// Transfers by originating operation and outcome
    pub static ref TRANSFERS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("amp_ledger_transfers_total", "Total transfer attempts"),
        &["kind", "outcome"]  // kind: transfer/transfer_from/by_partition/mint, outcome: success/failure
    ).expect("metric creation failed");

    /// Transfers that moved tokens into a different partition
    pub static ref PARTITION_CHANGES: IntCounter = IntCounter::new(
        "amp_ledger_partition_changes_total",
        "Total transfers that changed partition"
    ).expect("metric creation failed");

    /// Operation latency inside the service lock
    pub static ref OPERATION_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "amp_ledger_operation_duration_seconds",
            "Time spent executing a ledger operation"
        ).buckets(exponential_buckets(0.00001, 2.0, 16).expect("valid buckets"))
    ).expect("metric creation failed");

    // =========================================================================
    // HOOK METRICS
    // =========================================================================

    /// Vetoes raised by sender/recipient hooks and strategy validators
    pub static ref HOOK_REJECTIONS: IntCounterVec = IntCounterVec::new(
        Opts::new("amp_hooks_rejections_total", "Transfers vetoed by external hooks"),
        &["hook"]  // hook: sender/recipient/from_partition/to_partition/operator_scope
    ).expect("metric creation failed");

    // =========================================================================
    // SUPPLY METRICS
    // =========================================================================

    /// Successful mint operations
    pub static ref MINT_OPERATIONS: IntCounter = IntCounter::new(
        "amp_supply_mint_operations_total",
        "Total successful mint operations"
    ).expect("metric creation failed");

    /// Number of partitions with non-zero supply (plus the default partition)
    pub static ref ACTIVE_PARTITIONS: IntGauge = IntGauge::new(
        "amp_supply_active_partitions",
        "Current number of active partitions"
    ).expect("metric creation failed");

    // =========================================================================
    // ERROR METRICS
    // =========================================================================

    /// Ledger errors by error code
    pub static ref LEDGER_ERRORS: IntCounterVec = IntCounterVec::new(
        Opts::new("amp_ledger_errors_total", "Ledger errors by error code"),
        &["code"]
    ).expect("metric creation failed");
}

/// Handle for the metrics registry
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Transfers
        Box::new(TRANSFERS_TOTAL.clone()),
        Box::new(PARTITION_CHANGES.clone()),
        Box::new(OPERATION_DURATION.clone()),
        // Hooks
        Box::new(HOOK_REJECTIONS.clone()),
        // Supply
        Box::new(MINT_OPERATIONS.clone()),
        Box::new(ACTIVE_PARTITIONS.clone()),
        // Errors
        Box::new(LEDGER_ERRORS.clone()),
    ];

    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        self.histogram.observe(duration);
    }
}

/// Start timing for a histogram. Observation happens on drop.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr) => {
        $crate::metrics::HistogramTimer::new(&$histogram)
    };
}
