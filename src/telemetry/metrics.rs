//! Prometheus metrics

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Gauge metric types
#[derive(Debug, Clone, Copy)]
pub enum GaugeMetric {
    /// Latest fear & greed score
    FearGreedScore,
    /// Latest on-chain bias score
    BiasScore,
    /// Consecutive failed fetches for a feed
    FailureStreak,
}

impl GaugeMetric {
    fn name(self) -> &'static str {
        match self {
            Self::FearGreedScore => "marketpulse_fear_greed_score",
            Self::BiasScore => "marketpulse_bias_score",
            Self::FailureStreak => "marketpulse_feed_failure_streak",
        }
    }
}

/// Start the Prometheus scrape endpoint on `port`
pub fn init_metrics(port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to start metrics exporter: {}", e))?;

    tracing::info!(%addr, "Prometheus exporter listening");
    Ok(())
}

/// Count one completed fetch attempt by outcome (`fresh` or `fallback`)
pub fn record_fetch(feed: &str, outcome: &'static str) {
    metrics::counter!(
        "marketpulse_feed_fetches_total",
        "feed" => feed.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

/// Record how long one fetch attempt took
pub fn record_fetch_latency(feed: &str, duration: Duration) {
    metrics::histogram!("marketpulse_feed_fetch_latency_ms", "feed" => feed.to_string())
        .record(duration.as_secs_f64() * 1000.0);
}

/// Set a gauge value, optionally labelled with a feed or symbol
pub fn set_gauge(metric: GaugeMetric, label: Option<&str>, value: f64) {
    match label {
        Some(label) => {
            metrics::gauge!(metric.name(), "label" => label.to_string()).set(value)
        }
        None => metrics::gauge!(metric.name()).set(value),
    }
}
