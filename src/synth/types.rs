//! Synthesis errors

use thiserror::Error;

/// Domain errors raised while deriving synthetic metrics
///
/// Never propagated out of a synthesizer: callers substitute a neutral
/// default and log.
#[derive(Debug, Error, PartialEq)]
pub enum SynthesisError {
    /// Ratio requested against a zero or negative total supply
    #[error("Total supply is not positive: {0}")]
    NonPositiveSupply(f64),
    /// A derived input was NaN or infinite
    #[error("Non-finite input for {0}")]
    NonFinite(&'static str),
}
