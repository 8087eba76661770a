//! CoinGecko public API client

use super::types::{ChartSeries, CoinCharts, CoinMarket, GlobalStats};
use super::{get_text, FeedError, FeedSource};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// CoinGecko API base URL
pub const COINGECKO_API_URL: &str = "https://api.coingecko.com/api/v3";

/// Configuration for the CoinGecko client
#[derive(Debug, Clone)]
pub struct CoinGeckoConfig {
    pub base_url: String,
    pub timeout: Duration,
    /// Rows requested from `/coins/markets`
    pub per_page: u32,
}

impl Default for CoinGeckoConfig {
    fn default() -> Self {
        Self {
            base_url: COINGECKO_API_URL.to_string(),
            timeout: Duration::from_secs(10),
            per_page: 30,
        }
    }
}

/// Client for CoinGecko market data
#[derive(Debug, Clone)]
pub struct CoinGeckoClient {
    config: CoinGeckoConfig,
    client: Client,
}

impl CoinGeckoClient {
    pub fn new(config: CoinGeckoConfig) -> Result<Self, FeedError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(FeedError::Transport)?;
        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Top coins by market cap
    pub async fn top_coins(&self) -> Result<Vec<CoinMarket>, FeedError> {
        let per_page = self.config.per_page.to_string();
        let body = get_text(
            &self.client,
            self.config.timeout,
            &self.url("/coins/markets"),
            &[
                ("vs_currency", "usd"),
                ("order", "market_cap_desc"),
                ("per_page", per_page.as_str()),
                ("page", "1"),
            ],
        )
        .await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Aggregate market statistics
    pub async fn global(&self) -> Result<GlobalStats, FeedError> {
        let body = get_text(
            &self.client,
            self.config.timeout,
            &self.url("/global"),
            &[],
        )
        .await?;
        parse_global(&body)
    }

    /// Price, market cap and volume history for `coin_id` over `days`
    pub async fn market_chart(&self, coin_id: &str, days: u32) -> Result<ChartSeries, FeedError> {
        let days = days.to_string();
        let body = get_text(
            &self.client,
            self.config.timeout,
            &self.url(&format!("/coins/{coin_id}/market_chart")),
            &[("vs_currency", "usd"), ("days", days.as_str())],
        )
        .await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// `/global` as a polled feed
///
/// The snapshot is `None` until the first successful fetch.
pub struct GlobalFeed {
    client: CoinGeckoClient,
}

impl GlobalFeed {
    pub fn new(client: CoinGeckoClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FeedSource for GlobalFeed {
    type Snapshot = Option<GlobalStats>;

    fn name(&self) -> &str {
        "global"
    }

    async fn fetch(&self) -> Result<Option<GlobalStats>, FeedError> {
        self.client.global().await.map(Some)
    }
}

/// `/coins/markets` as a polled feed
pub struct CoinsFeed {
    client: CoinGeckoClient,
}

impl CoinsFeed {
    pub fn new(client: CoinGeckoClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FeedSource for CoinsFeed {
    type Snapshot = Vec<CoinMarket>;

    fn name(&self) -> &str {
        "coins"
    }

    async fn fetch(&self) -> Result<Vec<CoinMarket>, FeedError> {
        let coins = self.client.top_coins().await?;
        if coins.is_empty() {
            return Err(FeedError::MalformedPayload("empty coin list".into()));
        }
        Ok(coins)
    }
}

/// Market charts for a fixed set of coins as one polled feed
///
/// A coin whose chart fails is left out of the fetched map, so the poller
/// keeps its previous series; the fetch only fails when every coin does.
pub struct ChartFeed {
    client: CoinGeckoClient,
    coin_ids: Vec<String>,
    days: u32,
}

impl ChartFeed {
    pub fn new(client: CoinGeckoClient, coin_ids: Vec<String>, days: u32) -> Self {
        Self {
            client,
            coin_ids,
            days,
        }
    }

    pub fn coin_ids(&self) -> &[String] {
        &self.coin_ids
    }
}

#[async_trait]
impl FeedSource for ChartFeed {
    type Snapshot = CoinCharts;

    fn name(&self) -> &str {
        "charts"
    }

    async fn fetch(&self) -> Result<CoinCharts, FeedError> {
        let mut charts = CoinCharts::new();
        let mut last_error = None;

        for coin_id in &self.coin_ids {
            match self.client.market_chart(coin_id, self.days).await {
                Ok(chart) => {
                    charts.insert(coin_id.clone(), chart);
                }
                Err(e) => {
                    tracing::warn!(coin_id = %coin_id, error = %e, "Chart fetch failed");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if charts.is_empty() => Err(e),
            _ => Ok(charts),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawGlobalEnvelope {
    data: RawGlobal,
}

#[derive(Debug, Deserialize)]
struct RawGlobal {
    #[serde(default)]
    active_cryptocurrencies: u64,
    #[serde(default)]
    markets: u64,
    #[serde(default)]
    total_market_cap: BTreeMap<String, f64>,
    #[serde(default)]
    total_volume: BTreeMap<String, f64>,
    #[serde(default)]
    market_cap_percentage: BTreeMap<String, f64>,
    #[serde(default)]
    market_cap_change_percentage_24h_usd: f64,
}

pub(crate) fn parse_global(body: &str) -> Result<GlobalStats, FeedError> {
    let raw = serde_json::from_str::<RawGlobalEnvelope>(body)?.data;

    let total_market_cap_usd = raw
        .total_market_cap
        .get("usd")
        .copied()
        .ok_or_else(|| FeedError::MalformedPayload("global payload missing usd market cap".into()))?;

    Ok(GlobalStats {
        active_cryptocurrencies: raw.active_cryptocurrencies,
        markets: raw.markets,
        total_market_cap_usd,
        total_volume_usd: raw.total_volume.get("usd").copied().unwrap_or(0.0),
        btc_dominance_pct: raw.market_cap_percentage.get("btc").copied().unwrap_or(0.0),
        eth_dominance_pct: raw.market_cap_percentage.get("eth").copied().unwrap_or(0.0),
        market_cap_change_24h_pct: raw.market_cap_change_percentage_24h_usd,
    })
}
