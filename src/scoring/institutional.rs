//! Institutional positioning metrics derived from COT long/short totals

use super::to_score;
use serde::{Deserialize, Serialize};

const CONFIDENCE_MIN: f64 = 40.0;
const CONFIDENCE_MAX: f64 = 95.0;
const CROWDING_MIN: f64 = 30.0;
const CROWDING_MAX: f64 = 98.0;
const SQUEEZE_MAX: f64 = 95.0;

/// Positioning bias attached to a COT report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositioningBias {
    Bull,
    Bear,
    #[serde(other)]
    Neutral,
}

/// Metrics derived from one category's long/short totals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstitutionalMetrics {
    pub net_position: i64,
    /// Long share of open contracts, whole percent
    pub long_ratio: u8,
    pub confidence: u8,
    pub crowding: u8,
    pub squeeze_risk: u8,
}

/// Derive positioning metrics
///
/// Without an explicit bias, a net short book is treated as bearish
/// for the squeeze estimate.
pub fn institutional_metrics(
    long: u64,
    short: u64,
    bias: Option<PositioningBias>,
) -> InstitutionalMetrics {
    let net_position = i64::try_from(long)
        .unwrap_or(i64::MAX)
        .saturating_sub(i64::try_from(short).unwrap_or(i64::MAX));

    let total = long as f64 + short as f64;
    let ratio = if total > 0.0 {
        (long as f64 / total * 100.0).round()
    } else {
        50.0
    };

    let confidence = (ratio.max(100.0 - ratio) + 10.0).clamp(CONFIDENCE_MIN, CONFIDENCE_MAX);
    let crowding = ((ratio - 50.0).abs() + 50.0).clamp(CROWDING_MIN, CROWDING_MAX);

    let bias = bias.unwrap_or(if net_position < 0 {
        PositioningBias::Bear
    } else {
        PositioningBias::Neutral
    });
    let squeeze = match bias {
        PositioningBias::Bear => 70.0 + 25.0 * (crowding - 50.0) / 48.0,
        PositioningBias::Bull => {
            let lean = ((ratio - 50.0) / 50.0).clamp(0.0, 1.0);
            (30.0 + 25.0 * (1.0 - lean)).max(20.0)
        }
        PositioningBias::Neutral => 50.0,
    };

    InstitutionalMetrics {
        net_position,
        long_ratio: to_score(ratio),
        confidence: to_score(confidence),
        crowding: to_score(crowding),
        squeeze_risk: to_score(squeeze.clamp(0.0, SQUEEZE_MAX)),
    }
}
