//! Cross-asset fear & greed index
//!
//! score = 0.34 * bias + 0.33 * volatility + 0.23 * regime + 0.10 * conviction
//!
//! Every component is on a 0-100 scale before weighting.

use super::to_score;
use serde::{Deserialize, Serialize};
use std::fmt;

const WEIGHT_BIAS: f64 = 0.34;
const WEIGHT_VOLATILITY: f64 = 0.33;
const WEIGHT_REGIME: f64 = 0.23;
const WEIGHT_CONVICTION: f64 = 0.10;

/// VIX operating band; readings outside are clamped before scaling
const VIX_FLOOR: f64 = 12.0;
const VIX_CEILING: f64 = 32.0;

/// Directional call for a tracked asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    #[serde(alias = "UP")]
    Up,
    #[serde(alias = "DOWN")]
    Down,
    #[serde(other)]
    Neutral,
}

/// Market regime as reported by the analysis feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Regime {
    RiskOn,
    RiskOff,
    #[default]
    #[serde(other)]
    Neutral,
}

/// One asset's directional call with confidence in [0, 100]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectionalCall {
    pub direction: Direction,
    pub confidence: f64,
}

impl DirectionalCall {
    fn weight(&self) -> f64 {
        if self.confidence.is_finite() {
            self.confidence.clamp(0.0, 100.0)
        } else {
            0.0
        }
    }

    fn signed_weight(&self) -> f64 {
        match self.direction {
            Direction::Up => self.weight(),
            Direction::Down => -self.weight(),
            Direction::Neutral => 0.0,
        }
    }
}

/// Sentiment band of the index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FearGreedLabel {
    #[serde(rename = "Extreme Fear")]
    ExtremeFear,
    Fear,
    Neutral,
    Greed,
    #[serde(rename = "Extreme Greed")]
    ExtremeGreed,
}

impl FearGreedLabel {
    /// Classify a score
    pub fn from_score(score: u8) -> Self {
        match score {
            76.. => Self::ExtremeGreed,
            58..=75 => Self::Greed,
            0..=24 => Self::ExtremeFear,
            25..=42 => Self::Fear,
            _ => Self::Neutral,
        }
    }
}

impl fmt::Display for FearGreedLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::ExtremeFear => "Extreme Fear",
            Self::Fear => "Fear",
            Self::Neutral => "Neutral",
            Self::Greed => "Greed",
            Self::ExtremeGreed => "Extreme Greed",
        };
        f.write_str(label)
    }
}

/// Component scores, each in [0, 100]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriverBreakdown {
    pub bias: f64,
    pub volatility: f64,
    pub regime: f64,
    pub conviction: f64,
}

/// Fear & greed index with its drivers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FearGreedModel {
    pub score: u8,
    pub label: FearGreedLabel,
    pub drivers: DriverBreakdown,
}

/// Compute the fear & greed index
pub fn fear_greed(calls: &[DirectionalCall], vix: f64, regime: Regime) -> FearGreedModel {
    let drivers = DriverBreakdown {
        bias: bias_component(calls),
        volatility: volatility_component(vix),
        regime: regime_component(regime),
        conviction: conviction_component(calls),
    };

    let raw = WEIGHT_BIAS * drivers.bias
        + WEIGHT_VOLATILITY * drivers.volatility
        + WEIGHT_REGIME * drivers.regime
        + WEIGHT_CONVICTION * drivers.conviction;
    let score = to_score(raw);

    FearGreedModel {
        score,
        label: FearGreedLabel::from_score(score),
        drivers,
    }
}

/// Confidence-weighted balance of bullish vs bearish calls
fn bias_component(calls: &[DirectionalCall]) -> f64 {
    let total: f64 = calls.iter().map(DirectionalCall::weight).sum();
    if total <= 0.0 {
        return 50.0;
    }
    let balance: f64 = calls.iter().map(DirectionalCall::signed_weight).sum();
    (50.0 + 50.0 * balance / total).clamp(0.0, 100.0)
}

/// Low VIX reads as greed, high VIX as fear
fn volatility_component(vix: f64) -> f64 {
    let vix = if vix.is_nan() {
        (VIX_FLOOR + VIX_CEILING) / 2.0
    } else {
        vix.clamp(VIX_FLOOR, VIX_CEILING)
    };
    (VIX_CEILING - vix) / (VIX_CEILING - VIX_FLOOR) * 100.0
}

fn regime_component(regime: Regime) -> f64 {
    match regime {
        Regime::RiskOn => 74.0,
        Regime::RiskOff => 28.0,
        Regime::Neutral => 50.0,
    }
}

/// Mean signed confidence mapped from [-100, 100] onto [0, 100]
fn conviction_component(calls: &[DirectionalCall]) -> f64 {
    if calls.is_empty() {
        return 50.0;
    }
    let mean = calls.iter().map(DirectionalCall::signed_weight).sum::<f64>() / calls.len() as f64;
    (50.0 + mean / 2.0).clamp(0.0, 100.0)
}
