//! Telemetry module
//!
//! Structured logging and Prometheus metrics

mod logging;
mod metrics;

pub use logging::{init_logging, LogFormat};
pub use metrics::{init_metrics, record_fetch, record_fetch_latency, set_gauge, GaugeMetric};

use crate::config::TelemetryConfig;

/// Guard held for the lifetime of the process
pub struct TelemetryGuard {
    metrics_port: Option<u16>,
}

impl TelemetryGuard {
    /// Port of the Prometheus endpoint, when one was started
    pub fn metrics_port(&self) -> Option<u16> {
        self.metrics_port
    }
}

/// Initialize all telemetry subsystems
pub fn init_telemetry(config: &TelemetryConfig) -> anyhow::Result<TelemetryGuard> {
    init_logging(&config.log_level, config.log_format)?;

    if let Some(port) = config.metrics_port {
        init_metrics(port)?;
    }

    Ok(TelemetryGuard {
        metrics_port: config.metrics_port,
    })
}
