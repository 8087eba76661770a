//! Composite scoring models
//!
//! Pure functions turning synthesized and live metrics into bounded
//! scores. No I/O, no retained state.

mod bias;
mod fear_greed;
mod institutional;

pub use bias::{bias_score, BiasFactors, BiasInputs, BiasScore, BiasSignal, FactorTone, FlowDirection};
pub use fear_greed::{
    fear_greed, Direction, DirectionalCall, DriverBreakdown, FearGreedLabel, FearGreedModel,
    Regime,
};
pub use institutional::{institutional_metrics, InstitutionalMetrics, PositioningBias};

/// Clamp to [0, 100] and round to a whole score
pub(crate) fn to_score(value: f64) -> u8 {
    if value.is_nan() {
        return 50;
    }
    value.clamp(0.0, 100.0).round() as u8
}
