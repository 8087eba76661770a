//! Live feed snapshot types

use crate::scoring::{Direction, DirectionalCall, PositioningBias, Regime};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Latest price and daily change for one instrument
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub price: Decimal,
    /// Percent change on the session
    pub change_pct: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Symbol -> quote
///
/// Produced by the prices feed or its fallback walk and never mutated
/// afterwards; the next poll supersedes it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarketSnapshot {
    quotes: BTreeMap<String, Quote>,
}

impl MarketSnapshot {
    pub fn new(quotes: BTreeMap<String, Quote>) -> Self {
        Self { quotes }
    }

    /// Last known closing levels used before the first successful fetch
    pub fn macro_defaults() -> Self {
        let seed = [
            ("SPX", dec!(6941.47), dec!(-0.01)),
            ("NDX", dec!(21450.80), dec!(0.29)),
            ("XAU", dec!(5055.20), dec!(-0.48)),
            ("VIX", dec!(17.62), dec!(-0.96)),
            ("DXY", dec!(96.60), dec!(-0.31)),
        ];
        let quotes = seed
            .into_iter()
            .map(|(symbol, price, change_pct)| {
                (
                    symbol.to_string(),
                    Quote {
                        price,
                        change_pct,
                        name: display_name(symbol).map(str::to_string),
                    },
                )
            })
            .collect();
        Self { quotes }
    }

    pub fn get(&self, symbol: &str) -> Option<&Quote> {
        self.quotes.get(symbol)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Quote)> {
        self.quotes.iter()
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    /// Overlay `fresh` quotes, keeping symbols the update did not mention
    pub fn overlay(&self, fresh: MarketSnapshot) -> MarketSnapshot {
        let mut quotes = self.quotes.clone();
        quotes.extend(fresh.quotes);
        MarketSnapshot { quotes }
    }

    pub(crate) fn map_quotes(&self, mut f: impl FnMut(&str, &Quote) -> Quote) -> MarketSnapshot {
        let quotes = self
            .quotes
            .iter()
            .map(|(symbol, quote)| (symbol.clone(), f(symbol, quote)))
            .collect();
        MarketSnapshot { quotes }
    }
}

/// Map backend instrument keys onto dashboard symbols
pub fn canonical_symbol(key: &str) -> &str {
    match key {
        "SP500" => "SPX",
        "NAS100" => "NDX",
        "XAUUSD" => "XAU",
        other => other,
    }
}

/// Human-readable instrument name
pub fn display_name(symbol: &str) -> Option<&'static str> {
    match symbol {
        "SPX" => Some("S&P 500"),
        "NDX" => Some("NASDAQ 100"),
        "XAU" => Some("Gold"),
        "VIX" => Some("Volatility"),
        "DXY" => Some("Dollar Index"),
        "EURUSD" => Some("Euro / US Dollar"),
        "BTCUSD" => Some("Bitcoin"),
        _ => None,
    }
}

/// VIX level and session change
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VixReading {
    pub current: f64,
    #[serde(default)]
    pub change: f64,
}

/// Hourly multi-source directional analysis across tracked assets
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MultiSourceAnalysis {
    pub calls: BTreeMap<String, DirectionalCall>,
    pub vix: Option<VixReading>,
    pub regime: Regime,
}

impl MultiSourceAnalysis {
    pub fn directional_calls(&self) -> Vec<DirectionalCall> {
        self.calls.values().copied().collect()
    }

    /// Number of calls pointing in `direction`
    pub fn count(&self, direction: Direction) -> usize {
        self.calls
            .values()
            .filter(|c| c.direction == direction)
            .count()
    }
}

/// Long/short totals for the reporting category that leads an asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CotPositioning {
    pub long: u64,
    pub short: u64,
    pub bias: Option<PositioningBias>,
}

/// Weekly Commitment of Traders positioning per asset
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CotReport {
    pub positions: BTreeMap<String, CotPositioning>,
}

impl CotReport {
    /// Last published asset-manager books used before the first fetch
    pub fn weekly_defaults() -> Self {
        let seed = [
            ("SPX", 95_000, 110_000, PositioningBias::Bear),
            ("NDX", 58_000, 82_000, PositioningBias::Bear),
            ("XAU", 115_000, 52_000, PositioningBias::Bull),
        ];
        let positions = seed
            .into_iter()
            .map(|(symbol, long, short, bias)| {
                (
                    symbol.to_string(),
                    CotPositioning {
                        long,
                        short,
                        bias: Some(bias),
                    },
                )
            })
            .collect();
        Self { positions }
    }

    pub fn get(&self, symbol: &str) -> Option<&CotPositioning> {
        self.positions.get(symbol)
    }
}

/// Aggregate crypto market statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalStats {
    pub active_cryptocurrencies: u64,
    pub markets: u64,
    pub total_market_cap_usd: f64,
    pub total_volume_usd: f64,
    pub btc_dominance_pct: f64,
    pub eth_dominance_pct: f64,
    pub market_cap_change_24h_pct: f64,
}

/// One row of the CoinGecko market table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinMarket {
    pub id: String,
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub current_price: Option<f64>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub total_volume: Option<f64>,
    #[serde(default)]
    pub price_change_percentage_24h: Option<f64>,
}

/// Historical chart as `[unix_ms, value]` pairs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    #[serde(default)]
    pub prices: Vec<[f64; 2]>,
    #[serde(default)]
    pub market_caps: Vec<[f64; 2]>,
    #[serde(default)]
    pub total_volumes: Vec<[f64; 2]>,
}

/// Coin id -> historical chart
pub type CoinCharts = BTreeMap<String, ChartSeries>;

impl ChartSeries {
    pub fn last_price(&self) -> Option<f64> {
        self.prices.last().map(|p| p[1])
    }
}
