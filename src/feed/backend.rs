//! Dashboard backend client
//!
//! Three polled endpoints: `/market/prices`, `/analysis/multi-source` and
//! `/cot/data`. Payloads are parsed leniently: unknown fields are ignored,
//! entries missing the fields we need are skipped, and a payload that
//! yields nothing usable is reported as malformed.

use super::types::{
    canonical_symbol, display_name, CotPositioning, CotReport, MarketSnapshot,
    MultiSourceAnalysis, Quote, VixReading,
};
use super::{get_text, FeedError, FeedSource};
use crate::scoring::{Direction, DirectionalCall, PositioningBias, Regime};
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;

/// Default backend base URL
pub const BACKEND_URL: &str = "http://localhost:8000/api";

/// COT reporting categories that lead an asset, in order of preference
const LEADING_CATEGORIES: [&str; 2] = ["asset_manager", "managed_money"];

/// Configuration for the backend client
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub base_url: String,
    /// Transport-level timeout; the poller applies its own fetch deadline
    pub timeout: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: BACKEND_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Client for the dashboard backend
#[derive(Debug, Clone)]
pub struct BackendClient {
    config: BackendConfig,
    client: Client,
}

impl BackendClient {
    pub fn new(config: BackendConfig) -> Result<Self, FeedError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(FeedError::Transport)?;
        Ok(Self { config, client })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Fetch live index and FX quotes
    pub async fn prices(&self) -> Result<MarketSnapshot, FeedError> {
        let body = get_text(
            &self.client,
            self.config.timeout,
            &self.url("/market/prices"),
            &[],
        )
        .await?;
        parse_prices(&body)
    }

    /// Fetch the hourly multi-source analysis
    pub async fn analysis(&self) -> Result<MultiSourceAnalysis, FeedError> {
        let body = get_text(
            &self.client,
            self.config.timeout,
            &self.url("/analysis/multi-source"),
            &[],
        )
        .await?;
        parse_analysis(&body)
    }

    /// Fetch weekly COT positioning for all tracked assets
    pub async fn cot(&self) -> Result<CotReport, FeedError> {
        let body = get_text(
            &self.client,
            self.config.timeout,
            &self.url("/cot/data"),
            &[],
        )
        .await?;
        parse_cot(&body)
    }
}

/// `/market/prices` as a polled feed
pub struct PricesFeed {
    client: BackendClient,
}

impl PricesFeed {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FeedSource for PricesFeed {
    type Snapshot = MarketSnapshot;

    fn name(&self) -> &str {
        "prices"
    }

    async fn fetch(&self) -> Result<MarketSnapshot, FeedError> {
        self.client.prices().await
    }
}

/// `/analysis/multi-source` as a polled feed
pub struct AnalysisFeed {
    client: BackendClient,
}

impl AnalysisFeed {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FeedSource for AnalysisFeed {
    type Snapshot = MultiSourceAnalysis;

    fn name(&self) -> &str {
        "analysis"
    }

    async fn fetch(&self) -> Result<MultiSourceAnalysis, FeedError> {
        self.client.analysis().await
    }
}

/// `/cot/data` as a polled feed
pub struct CotFeed {
    client: BackendClient,
}

impl CotFeed {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FeedSource for CotFeed {
    type Snapshot = CotReport;

    fn name(&self) -> &str {
        "cot"
    }

    async fn fetch(&self) -> Result<CotReport, FeedError> {
        self.client.cot().await
    }
}

/// Parse `{ "SP500": {"price": .., "change": ..}, ... }`
pub(crate) fn parse_prices(body: &str) -> Result<MarketSnapshot, FeedError> {
    let value: serde_json::Value = serde_json::from_str(body)?;
    let entries = value
        .as_object()
        .ok_or_else(|| FeedError::MalformedPayload("prices payload is not an object".into()))?;

    let mut quotes = BTreeMap::new();
    for (key, entry) in entries {
        let Some(price) = entry.get("price").and_then(json_decimal) else {
            tracing::debug!(key = %key, "Skipping quote without a numeric price");
            continue;
        };
        let change_pct = entry
            .get("change")
            .and_then(json_decimal)
            .unwrap_or(Decimal::ZERO);
        let symbol = canonical_symbol(key);
        quotes.insert(
            symbol.to_string(),
            Quote {
                price,
                change_pct,
                name: display_name(symbol).map(str::to_string),
            },
        );
    }

    if quotes.is_empty() {
        return Err(FeedError::MalformedPayload("prices payload has no quotes".into()));
    }
    Ok(MarketSnapshot::new(quotes))
}

/// Parse a JSON number into a Decimal without going through binary floats
fn json_decimal(value: &serde_json::Value) -> Option<Decimal> {
    let serde_json::Value::Number(number) = value else {
        return None;
    };
    let text = number.to_string();
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

#[derive(Debug, Deserialize)]
struct RawAnalysis {
    analyses: BTreeMap<String, RawCall>,
    #[serde(default)]
    vix: Option<RawVix>,
    #[serde(default)]
    regime: Regime,
}

#[derive(Debug, Deserialize)]
struct RawCall {
    direction: Direction,
    #[serde(default)]
    confidence: f64,
}

#[derive(Debug, Deserialize)]
struct RawVix {
    current: Option<f64>,
    #[serde(default)]
    change: Option<f64>,
}

/// Parse `{ analyses: {SYM: {direction, confidence}}, vix: {current, change}, regime }`
pub(crate) fn parse_analysis(body: &str) -> Result<MultiSourceAnalysis, FeedError> {
    let raw: RawAnalysis = serde_json::from_str(body)?;

    if raw.analyses.is_empty() {
        return Err(FeedError::MalformedPayload("analysis payload has no assets".into()));
    }

    let calls = raw
        .analyses
        .into_iter()
        .map(|(key, call)| {
            (
                canonical_symbol(&key).to_string(),
                DirectionalCall {
                    direction: call.direction,
                    confidence: call.confidence,
                },
            )
        })
        .collect();

    let vix = raw.vix.and_then(|v| {
        v.current.map(|current| VixReading {
            current,
            change: v.change.unwrap_or(0.0),
        })
    });

    Ok(MultiSourceAnalysis {
        calls,
        vix,
        regime: raw.regime,
    })
}

#[derive(Debug, Deserialize)]
struct RawCot {
    data: BTreeMap<String, RawCotEntry>,
}

#[derive(Debug, Deserialize)]
struct RawCotEntry {
    #[serde(default)]
    categories: BTreeMap<String, RawCategory>,
    #[serde(default)]
    bias: Option<PositioningBias>,
}

#[derive(Debug, Deserialize)]
struct RawCategory {
    #[serde(default)]
    long: Option<f64>,
    #[serde(default)]
    short: Option<f64>,
}

/// Parse `{ data: {SYM: {categories: {asset_manager|managed_money: {long, short}}, bias}} }`
pub(crate) fn parse_cot(body: &str) -> Result<CotReport, FeedError> {
    let raw: RawCot = serde_json::from_str(body)?;

    let mut positions = BTreeMap::new();
    for (key, entry) in raw.data {
        let leading = LEADING_CATEGORIES
            .iter()
            .filter_map(|name| entry.categories.get(*name))
            .find_map(|c| Some((c.long?, c.short?)));

        let Some((long, short)) = leading else {
            tracing::debug!(key = %key, "Skipping COT entry without a leading category");
            continue;
        };

        positions.insert(
            canonical_symbol(&key).to_string(),
            CotPositioning {
                long: contracts(long),
                short: contracts(short),
                bias: entry.bias,
            },
        );
    }

    if positions.is_empty() {
        return Err(FeedError::MalformedPayload("COT payload has no positions".into()));
    }
    Ok(CotReport { positions })
}

fn contracts(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value.round() as u64
    } else {
        0
    }
}
