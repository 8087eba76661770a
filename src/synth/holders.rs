//! Holder distribution synthesis

use crate::generator::SeededRng;
use serde::{Deserialize, Serialize};

/// Share of supply by holding period, in whole percent summing to 100
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolderDistribution {
    /// Held for more than a year
    pub long_term: u8,
    /// Held for 3-12 months
    pub medium_term: u8,
    /// Held for less than 3 months
    pub short_term: u8,
}

impl HolderDistribution {
    /// Build from raw long/medium shares
    ///
    /// Long and medium are rounded first and short-term takes the
    /// remainder. When long + medium would exceed 100 the medium bucket is
    /// cut so short-term lands on 0 rather than going negative.
    pub fn from_shares(long_term: f64, medium_term: f64) -> Self {
        let long = sanitize(long_term).round().clamp(0.0, 100.0) as u8;
        let medium = sanitize(medium_term)
            .round()
            .clamp(0.0, f64::from(100 - long)) as u8;
        Self {
            long_term: long,
            medium_term: medium,
            short_term: 100 - long - medium,
        }
    }

    /// Sum of all buckets (always 100)
    pub fn total(&self) -> u16 {
        u16::from(self.long_term) + u16::from(self.medium_term) + u16::from(self.short_term)
    }
}

fn sanitize(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Synthesize a holder distribution
///
/// Long-term in [35, 60], medium in [15, 30].
pub fn holder_distribution(rng: &mut SeededRng) -> HolderDistribution {
    let long_term = rng.range(35.0, 60.0);
    let medium_term = rng.range(15.0, 30.0);
    HolderDistribution::from_shares(long_term, medium_term)
}
