//! Project fundamentals synthesis

use super::{round_dp, SynthesisError};
use crate::generator::SeededRng;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

const DEV_ACTIVITY_MONTHS: u32 = 12;

/// Commits and contributors for one month
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevActivity {
    /// Month as `YYYY-MM`
    pub month: String,
    pub commits: u32,
    pub contributors: u32,
}

/// Social reach and sentiment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialSentiment {
    /// Sentiment score in [30, 100]
    pub score: u8,
    pub twitter: u64,
    pub reddit: u64,
    pub telegram: u64,
}

/// Supply and development fundamentals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectFundamentals {
    pub total_supply: f64,
    pub circulating_supply: f64,
    /// Circulating as a percentage of total, one decimal
    pub circulating_ratio: f64,
    /// Hard cap, when the asset has one
    pub max_supply: Option<f64>,
    pub dev_activity: Vec<DevActivity>,
    pub social: SocialSentiment,
}

/// Known total supply for flagship assets
pub fn known_total_supply(symbol: &str) -> Option<f64> {
    match symbol {
        "BTC" => Some(21_000_000.0),
        "ETH" => Some(120_000_000.0),
        _ => None,
    }
}

fn max_supply(symbol: &str) -> Option<f64> {
    match symbol {
        "BTC" => Some(21_000_000.0),
        _ => None,
    }
}

/// Circulating supply as a percentage of total
pub fn circulating_ratio(circulating: f64, total: f64) -> Result<f64, SynthesisError> {
    if !circulating.is_finite() || !total.is_finite() {
        return Err(SynthesisError::NonFinite("circulating_ratio"));
    }
    if total <= 0.0 {
        return Err(SynthesisError::NonPositiveSupply(total));
    }
    Ok(round_dp(circulating / total * 100.0, 1))
}

/// Synthesize project fundamentals
pub fn project_fundamentals(
    symbol: &str,
    anchor: DateTime<Utc>,
    rng: &mut SeededRng,
) -> ProjectFundamentals {
    let total_supply =
        known_total_supply(symbol).unwrap_or_else(|| rng.range(500e6, 500e6 + 10e9));
    let circulating_supply = total_supply * rng.range(0.5, 0.95);

    let circulating_ratio = circulating_ratio(circulating_supply, total_supply).unwrap_or_else(|e| {
        tracing::warn!(symbol, error = %e, "Circulating ratio undefined, using 0");
        0.0
    });

    let dev_activity = (0..DEV_ACTIVITY_MONTHS)
        .map(|i| {
            let month = anchor - Duration::days(30 * i64::from(DEV_ACTIVITY_MONTHS - i));
            DevActivity {
                month: month.format("%Y-%m").to_string(),
                commits: rng.range(50.0, 350.0).round() as u32,
                contributors: rng.range(10.0, 110.0).round() as u32,
            }
        })
        .collect();

    let social = SocialSentiment {
        score: rng.range(30.0, 100.0).round() as u8,
        twitter: rng.range(1e4, 1e4 + 5e5).round() as u64,
        reddit: rng.range(1e3, 1e3 + 1e5).round() as u64,
        telegram: rng.range(500.0, 500.0 + 5e4).round() as u64,
    };

    ProjectFundamentals {
        total_supply,
        circulating_supply,
        circulating_ratio,
        max_supply: max_supply(symbol),
        dev_activity,
        social,
    }
}
