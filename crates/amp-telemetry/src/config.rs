//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for ledger logging and metrics.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to every log line
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error)
    pub log_level: String,

    /// Whether to enable console output (for development)
    pub console_output: bool,

    /// Whether to enable JSON formatted logs
    pub json_logs: bool,

    /// Prometheus metrics port
    pub metrics_port: u16,

    /// Deployment identifier (devnet, testnet, mainnet)
    pub network: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "amp-ledger".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
            metrics_port: 9100,
            network: "devnet".to_string(),
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `AMP_SERVICE_NAME`: Service name (default: amp-ledger)
    /// - `AMP_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `AMP_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `AMP_JSON_LOGS`: Enable JSON logs (default: false in dev, true in containers)
    /// - `AMP_METRICS_PORT`: Prometheus metrics port (default: 9100)
    /// - `AMP_NETWORK`: Deployment name (default: devnet)
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();

        Self {
            service_name: env::var("AMP_SERVICE_NAME")
                .unwrap_or_else(|_| "amp-ledger".to_string()),

            log_level: env::var("AMP_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            console_output: env::var("AMP_CONSOLE_OUTPUT")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(true),

            json_logs: env::var("AMP_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(is_container),

            metrics_port: env::var("AMP_METRICS_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(9100),

            network: env::var("AMP_NETWORK").unwrap_or_else(|_| "devnet".to_string()),
        }
    }

    /// Configuration for tests: quiet, human readable, no console spam.
    pub fn for_tests() -> Self {
        Self {
            log_level: "warn".to_string(),
            console_output: false,
            ..Self::default()
        }
    }

    /// Get the full service name including the network.
    pub fn full_service_name(&self) -> String {
        format!("{}-{}", self.service_name, self.network)
    }
}
