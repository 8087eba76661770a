//! Configuration types for market-pulse

use crate::feed::{BackendConfig, CoinGeckoConfig, BACKEND_URL, COINGECKO_API_URL};
use crate::poll::PollConfig;
use crate::telemetry::LogFormat;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendSettings,
    #[serde(default)]
    pub coingecko: CoinGeckoSettings,
    #[serde(default)]
    pub poll: PollSettings,
    #[serde(default)]
    pub synth: SynthConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Dashboard backend connection
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendSettings {
    #[serde(default = "default_backend_url")]
    pub base_url: String,
    /// Transport timeout for a single HTTP request
    #[serde(default = "default_http_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_backend_url() -> String {
    BACKEND_URL.to_string()
}
fn default_http_timeout_secs() -> u64 {
    10
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: default_backend_url(),
            timeout_secs: default_http_timeout_secs(),
        }
    }
}

impl BackendSettings {
    pub fn client_config(&self) -> BackendConfig {
        BackendConfig {
            base_url: self.base_url.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

/// CoinGecko connection
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CoinGeckoSettings {
    #[serde(default = "default_coingecko_url")]
    pub base_url: String,
    #[serde(default = "default_http_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    /// Coin ids whose historical charts are polled
    #[serde(default = "default_chart_coins")]
    pub chart_coins: Vec<String>,
    #[serde(default = "default_chart_days")]
    pub chart_days: u32,
}

fn default_coingecko_url() -> String {
    COINGECKO_API_URL.to_string()
}
fn default_per_page() -> u32 {
    30
}
fn default_chart_coins() -> Vec<String> {
    vec!["bitcoin".to_string(), "ethereum".to_string()]
}
fn default_chart_days() -> u32 {
    30
}

impl Default for CoinGeckoSettings {
    fn default() -> Self {
        Self {
            base_url: default_coingecko_url(),
            timeout_secs: default_http_timeout_secs(),
            per_page: default_per_page(),
            chart_coins: default_chart_coins(),
            chart_days: default_chart_days(),
        }
    }
}

impl CoinGeckoSettings {
    pub fn client_config(&self) -> CoinGeckoConfig {
        CoinGeckoConfig {
            base_url: self.base_url.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            per_page: self.per_page,
        }
    }
}

/// Polling parameters for one feed, in milliseconds
///
/// Any field left out of the file takes the feed's own default, not a
/// global one.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FeedPollConfig {
    pub foreground_interval_ms: u64,
    pub background_interval_ms: u64,
    pub cache_ttl_ms: u64,
    pub request_timeout_ms: u64,
    pub fallback_seed: u64,
}

impl FeedPollConfig {
    fn with_defaults(foreground_ms: u64, background_ms: u64, ttl_ms: u64, seed: u64) -> Self {
        Self {
            foreground_interval_ms: foreground_ms,
            background_interval_ms: background_ms,
            cache_ttl_ms: ttl_ms,
            request_timeout_ms: 6_000,
            fallback_seed: seed,
        }
    }

    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            foreground_interval: Duration::from_millis(self.foreground_interval_ms.max(1)),
            background_interval: Duration::from_millis(self.background_interval_ms.max(1)),
            cache_ttl: Duration::from_millis(self.cache_ttl_ms),
            request_timeout: Duration::from_millis(self.request_timeout_ms.max(1)),
            fallback_seed: self.fallback_seed,
        }
    }
}

/// Partial per-feed overrides as they appear in the file
#[derive(Debug, Clone, Default, Deserialize)]
struct FeedPollOverrides {
    foreground_interval_ms: Option<u64>,
    background_interval_ms: Option<u64>,
    cache_ttl_ms: Option<u64>,
    request_timeout_ms: Option<u64>,
    fallback_seed: Option<u64>,
}

impl FeedPollOverrides {
    fn apply(self, base: FeedPollConfig) -> FeedPollConfig {
        FeedPollConfig {
            foreground_interval_ms: self
                .foreground_interval_ms
                .unwrap_or(base.foreground_interval_ms),
            background_interval_ms: self
                .background_interval_ms
                .unwrap_or(base.background_interval_ms),
            cache_ttl_ms: self.cache_ttl_ms.unwrap_or(base.cache_ttl_ms),
            request_timeout_ms: self.request_timeout_ms.unwrap_or(base.request_timeout_ms),
            fallback_seed: self.fallback_seed.unwrap_or(base.fallback_seed),
        }
    }
}

/// Polling parameters for every live feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PollSettings {
    pub prices: FeedPollConfig,
    pub analysis: FeedPollConfig,
    pub cot: FeedPollConfig,
    pub global: FeedPollConfig,
    pub coins: FeedPollConfig,
    pub charts: FeedPollConfig,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            prices: FeedPollConfig::with_defaults(12_000, 30_000, 15_000, 42),
            analysis: FeedPollConfig::with_defaults(30_000, 60_000, 30_000, 43),
            cot: FeedPollConfig::with_defaults(30_000, 60_000, 30_000, 44),
            global: FeedPollConfig::with_defaults(300_000, 600_000, 300_000, 45),
            coins: FeedPollConfig::with_defaults(300_000, 600_000, 300_000, 46),
            charts: FeedPollConfig::with_defaults(600_000, 1_800_000, 600_000, 47),
        }
    }
}

impl<'de> Deserialize<'de> for PollSettings {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            #[serde(default)]
            prices: FeedPollOverrides,
            #[serde(default)]
            analysis: FeedPollOverrides,
            #[serde(default)]
            cot: FeedPollOverrides,
            #[serde(default)]
            global: FeedPollOverrides,
            #[serde(default)]
            coins: FeedPollOverrides,
            #[serde(default)]
            charts: FeedPollOverrides,
        }

        let raw = Raw::deserialize(deserializer)?;
        let defaults = PollSettings::default();
        Ok(Self {
            prices: raw.prices.apply(defaults.prices),
            analysis: raw.analysis.apply(defaults.analysis),
            cot: raw.cot.apply(defaults.cot),
            global: raw.global.apply(defaults.global),
            coins: raw.coins.apply(defaults.coins),
            charts: raw.charts.apply(defaults.charts),
        })
    }
}

/// On-chain synthesis parameters
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SynthConfig {
    /// Width of the seeding time bucket
    #[serde(default = "default_time_bucket_secs")]
    pub time_bucket_secs: u64,
    #[serde(default = "default_whale_count")]
    pub whale_count: usize,
    #[serde(default = "default_netflow_days")]
    pub netflow_days: u32,
}

fn default_time_bucket_secs() -> u64 {
    3_600
}
fn default_whale_count() -> usize {
    15
}
fn default_netflow_days() -> u32 {
    14
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            time_bucket_secs: default_time_bucket_secs(),
            whale_count: default_whale_count(),
            netflow_days: default_netflow_days(),
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
    /// Prometheus exporter port; no exporter when unset
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            metrics_port: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
