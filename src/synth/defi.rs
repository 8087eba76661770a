//! DeFi and derivatives snapshot synthesis

use super::round_dp;
use crate::generator::SeededRng;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

const OTHERS: &str = "Others";
const TVL_HISTORY_DAYS: u32 = 30;

/// Named protocols with their (offset, spread) share ranges
const PROTOCOLS: [(&str, f64, f64); 5] = [
    ("Uniswap", 10.0, 30.0),
    ("Aave", 5.0, 20.0),
    ("Lido", 8.0, 25.0),
    ("Maker", 3.0, 15.0),
    ("Curve", 2.0, 10.0),
];

/// A protocol's share of TVL in whole percent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolShare {
    pub name: String,
    pub share: u32,
}

/// Liquidations during one hour of the day (USD millions)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourlyLiquidations {
    pub hour: u8,
    pub longs: u32,
    pub shorts: u32,
}

/// Daily TVL observation (USD billions)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TvlPoint {
    pub date: NaiveDate,
    pub tvl_billions: f64,
}

/// DeFi and derivatives state for one asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefiSnapshot {
    pub tvl: f64,
    pub tvl_change_pct: f64,
    pub dex_volume: f64,
    /// Shares sum to exactly 100
    pub protocols: Vec<ProtocolShare>,
    pub liquidations: Vec<HourlyLiquidations>,
    pub tvl_history: Vec<TvlPoint>,
    pub funding_rate: f64,
    pub open_interest: f64,
}

/// Assign "Others" the remainder so shares total 100
///
/// Named shares that already exceed 100 are scaled down proportionally
/// first.
pub(crate) fn with_remainder(named: Vec<(&str, u32)>) -> Vec<ProtocolShare> {
    let sum: u32 = named.iter().map(|(_, share)| share).sum();
    let mut shares: Vec<ProtocolShare> = named
        .into_iter()
        .map(|(name, share)| ProtocolShare {
            name: name.to_string(),
            share: if sum > 100 { share * 100 / sum } else { share },
        })
        .collect();

    let assigned: u32 = shares.iter().map(|p| p.share).sum();
    shares.push(ProtocolShare {
        name: OTHERS.to_string(),
        share: 100 - assigned,
    });
    shares
}

/// Synthesize a DeFi snapshot
pub fn defi_snapshot(symbol: &str, anchor: DateTime<Utc>, rng: &mut SeededRng) -> DefiSnapshot {
    let tvl = rng.range(1e9, 51e9);
    let dex_volume = rng.range(1e8, 1e8 + 5e9);

    let named = PROTOCOLS
        .iter()
        .map(|(name, offset, spread)| (*name, (rng.next_f64() * spread + offset).round() as u32))
        .collect();
    let protocols = with_remainder(named);

    let liquidations = (0..24u8)
        .map(|hour| HourlyLiquidations {
            hour,
            longs: (rng.next_f64() * 50.0).round() as u32,
            shorts: (rng.next_f64() * 50.0).round() as u32,
        })
        .collect();

    let tvl_history = (0..TVL_HISTORY_DAYS)
        .map(|i| {
            let draw = SeededRng::for_symbol(symbol, u64::from(i) + 200).next_f64();
            TvlPoint {
                date: (anchor - Duration::days(i64::from(TVL_HISTORY_DAYS - i))).date_naive(),
                tvl_billions: round_dp(tvl * (0.85 + draw * 0.3) / 1e9, 2),
            }
        })
        .collect();

    let tvl_change_pct = round_dp((rng.next_f64() - 0.4) * 20.0, 1);
    let open_interest = rng.range(5e8, 5e8 + 20e9);
    let funding_rate = round_dp((rng.next_f64() - 0.5) * 0.1, 4);

    DefiSnapshot {
        tvl,
        tvl_change_pct,
        dex_volume,
        protocols,
        liquidations,
        tvl_history,
        funding_rate,
        open_interest,
    }
}
