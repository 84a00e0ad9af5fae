//! # Amp Telemetry
//!
//! Observability for the Amp ledger.
//!
//! ## Components
//!
//! - **Logs**: `tracing` + `tracing-subscriber` (pretty or JSON, `EnvFilter`)
//! - **Metrics**: Prometheus counters, gauges and histograms
//!
//! ## Usage
//!
//! ```rust,ignore
//! use amp_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     let config = TelemetryConfig::from_env();
//!     let _guard = init_telemetry(&config).expect("Failed to init telemetry");
//!
//!     // Ledger code here; logs and metrics are now being collected
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `AMP_SERVICE_NAME` | `amp-ledger` | Service name in logs |
//! | `AMP_LOG_LEVEL` | `info` | Log level filter |
//! | `AMP_JSON_LOGS` | `false` | JSON formatted output |
//! | `AMP_METRICS_PORT` | `9100` | Prometheus scrape port |

#![warn(missing_docs)]

mod config;
mod logging;
pub mod metrics;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use metrics::{
    encode_metrics, register_metrics, MetricsHandle, ACTIVE_PARTITIONS, HOOK_REJECTIONS,
    LEDGER_ERRORS, MINT_OPERATIONS, OPERATION_DURATION, PARTITION_CHANGES, TRANSFERS_TOTAL,
};
pub use tracing_setup::{init_test_tracing, init_tracing, TracingGuard};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The global subscriber could not be installed.
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracerInit(String),

    /// A metric could not be registered or encoded.
    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    /// Configuration value rejected.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and metrics.
///
/// Returns a guard that must be held for the lifetime of the application.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    if config.metrics_port == 0 {
        return Err(TelemetryError::Config(
            "metrics port must be non-zero".to_string(),
        ));
    }

    // Metrics first (synchronous, no global subscriber needed)
    let metrics_handle = register_metrics()?;

    let tracing_guard = tracing_setup::init_tracing(config)?;

    Ok(TelemetryGuard {
        _tracing: tracing_guard,
        _metrics: metrics_handle,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    _tracing: TracingGuard,
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry...");
    }
}

/// Convenience macro for creating a span with component context.
///
/// # Example
///
/// ```rust,ignore
/// use amp_telemetry::component_span;
///
/// fn settle() {
///     let _span = component_span!("settle", component = "collateral", batch = 7);
/// }
/// ```
#[macro_export]
macro_rules! component_span {
    ($name:expr, $($field:tt)*) => {
        tracing::info_span!($name, $($field)*)
    };
}
