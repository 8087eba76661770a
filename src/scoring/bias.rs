//! On-chain bias score
//!
//! Baseline 50, nudged by exchange netflow, holder composition, MVRV band
//! and whale alert activity. Any input may be missing; a missing input
//! contributes nothing.

use super::to_score;
use crate::synth::{FlowPoint, HolderDistribution, MvrvSeries, MvrvSignal, WhaleTransaction};
use serde::{Deserialize, Serialize};

const BASELINE: f64 = 50.0;
const NETFLOW_WINDOW_DAYS: usize = 7;
/// Netflow magnitude (USD millions) for the strong adjustment
const NETFLOW_STRONG: f64 = 100.0;
const WHALE_ALERT_LIMIT: usize = 3;
const BULLISH_AT: u8 = 65;
const BEARISH_AT: u8 = 35;

/// Directional reading of a bias score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BiasSignal {
    Bullish,
    Neutral,
    Bearish,
}

impl BiasSignal {
    /// Classify a clamped score
    pub fn from_score(score: u8) -> Self {
        if score >= BULLISH_AT {
            Self::Bullish
        } else if score <= BEARISH_AT {
            Self::Bearish
        } else {
            Self::Neutral
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactorTone {
    Positive,
    Negative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowDirection {
    Outflow,
    Inflow,
    Neutral,
}

/// What drove the score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiasFactors {
    pub whale_accumulation: FactorTone,
    pub exchange_flow: FlowDirection,
    pub mvrv_signal: Option<MvrvSignal>,
    /// Sum of the trailing seven days of netflow, when available
    pub trailing_netflow: Option<f64>,
    pub whale_alerts: usize,
}

/// Composite on-chain bias for one asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiasScore {
    pub score: u8,
    pub signal: BiasSignal,
    pub factors: BiasFactors,
}

/// Inputs to [`bias_score`]
#[derive(Debug, Clone, Copy, Default)]
pub struct BiasInputs<'a> {
    pub whales: Option<&'a [WhaleTransaction]>,
    pub netflow: Option<&'a [FlowPoint]>,
    pub holders: Option<&'a HolderDistribution>,
    pub mvrv: Option<&'a MvrvSeries>,
}

/// Compute the on-chain bias score
pub fn bias_score(inputs: BiasInputs<'_>) -> BiasScore {
    let mut score = BASELINE;

    let trailing_netflow = inputs
        .netflow
        .filter(|flows| !flows.is_empty())
        .map(|flows| {
            let start = flows.len().saturating_sub(NETFLOW_WINDOW_DAYS);
            flows[start..].iter().map(|p| p.net).sum::<f64>()
        });

    if let Some(net) = trailing_netflow {
        score += netflow_adjustment(net);
    }

    if let Some(holders) = inputs.holders {
        score += holder_adjustment(holders.long_term);
    }

    if let Some(mvrv) = inputs.mvrv {
        score += mvrv_adjustment(mvrv.current_value);
    }

    let whale_alerts = inputs
        .whales
        .map(|txs| txs.iter().filter(|tx| tx.is_alert).count())
        .unwrap_or(0);
    if whale_alerts > WHALE_ALERT_LIMIT {
        score -= 5.0;
    }

    let clamped = to_score(score);

    BiasScore {
        score: clamped,
        signal: BiasSignal::from_score(clamped),
        factors: BiasFactors {
            whale_accumulation: if score > BASELINE {
                FactorTone::Positive
            } else {
                FactorTone::Negative
            },
            exchange_flow: match trailing_netflow {
                Some(net) if net < 0.0 => FlowDirection::Outflow,
                Some(_) => FlowDirection::Inflow,
                None => FlowDirection::Neutral,
            },
            mvrv_signal: inputs.mvrv.map(|m| m.signal),
            trailing_netflow,
            whale_alerts,
        },
    }
}

/// Negative netflow (accumulation) is bullish
fn netflow_adjustment(net: f64) -> f64 {
    if net < -NETFLOW_STRONG {
        15.0
    } else if net < 0.0 {
        8.0
    } else if net > NETFLOW_STRONG {
        -15.0
    } else if net > 0.0 {
        -5.0
    } else {
        0.0
    }
}

fn holder_adjustment(long_term_pct: u8) -> f64 {
    if long_term_pct > 50 {
        10.0
    } else if long_term_pct > 40 {
        5.0
    } else {
        0.0
    }
}

fn mvrv_adjustment(value: f64) -> f64 {
    if value < 1.0 {
        15.0
    } else if value < 1.5 {
        8.0
    } else if value > 3.5 {
        -20.0
    } else if value > 2.5 {
        -10.0
    } else {
        0.0
    }
}
