//! Exchange flow and wallet synthesis
//!
//! Flow amounts are in USD millions, rounded to whole millions.

use crate::generator::SeededRng;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

const WALLET_LABELS: [&str; 6] = [
    "Binance",
    "Coinbase",
    "Kraken",
    "Jump Trading",
    "Wintermute",
    "Paradigm",
];

/// One day of exchange flows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowPoint {
    pub date: NaiveDate,
    pub inflow: f64,
    pub outflow: f64,
    /// `inflow - outflow`; negative means coins leaving exchanges
    pub net: f64,
}

impl FlowPoint {
    fn new(date: NaiveDate, inflow: f64, outflow: f64) -> Self {
        Self {
            date,
            inflow,
            outflow,
            net: inflow - outflow,
        }
    }
}

/// A ranked holder address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletRank {
    pub rank: u32,
    pub address: String,
    /// Known entity label (only the top three are labelled)
    pub label: Option<String>,
    pub balance_usd: f64,
    pub pnl_pct: f64,
    pub last_active_hours: u32,
}

/// Daily exchange netflow for `days + 1` days ending at `anchor`
///
/// Inflow and outflow are drawn independently in [50, 250].
pub fn exchange_netflow(days: u32, anchor: DateTime<Utc>, rng: &mut SeededRng) -> Vec<FlowPoint> {
    daily_flows(days, anchor, rng, 50.0, 250.0)
}

/// Daily exchange flows for `days + 1` days ending at `anchor`
///
/// Inflow and outflow are drawn independently in [20, 170].
pub fn exchange_flows(days: u32, anchor: DateTime<Utc>, rng: &mut SeededRng) -> Vec<FlowPoint> {
    daily_flows(days, anchor, rng, 20.0, 170.0)
}

fn daily_flows(
    days: u32,
    anchor: DateTime<Utc>,
    rng: &mut SeededRng,
    lo: f64,
    hi: f64,
) -> Vec<FlowPoint> {
    (0..=days)
        .rev()
        .map(|days_back| {
            let date = (anchor - Duration::days(i64::from(days_back))).date_naive();
            let inflow = rng.range(lo, hi).round();
            let outflow = rng.range(lo, hi).round();
            FlowPoint::new(date, inflow, outflow)
        })
        .collect()
}

/// Top `count` wallets by balance
pub fn top_wallets(count: usize, rng: &mut SeededRng) -> Vec<WalletRank> {
    (0..count)
        .map(|i| {
            let address = format!("0x{}...{}", rng.hex_digits(6), rng.hex_digits(4));
            let label = (i < 3).then(|| WALLET_LABELS[rng.index(WALLET_LABELS.len())].to_string());
            WalletRank {
                rank: i as u32 + 1,
                address,
                label,
                balance_usd: rng.range(1e8, 1e8 + 9e9),
                pnl_pct: (rng.next_f64() - 0.3) * 200.0,
                last_active_hours: rng.index(24) as u32,
            }
        })
        .collect()
}
