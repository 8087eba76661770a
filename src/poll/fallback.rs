//! Synthetic continuation of a feed when a fetch fails

use crate::feed::{
    CoinCharts, CoinMarket, CotReport, GlobalStats, MarketSnapshot, MultiSourceAnalysis, Quote,
};
use crate::generator::SeededRng;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Cap on the elapsed time fed into one walk step
///
/// Keeps a single step within +/-15% for the most volatile symbol, so a
/// long outage cannot push a price through zero.
pub const MAX_WALK_SECS: f64 = 600.0;

/// How a snapshot evolves without upstream data
pub trait FallbackWalk: Clone + Send + Sync + 'static {
    /// Next snapshot after `elapsed_secs` with no live data
    fn walk(&self, elapsed_secs: f64, rng: &mut SeededRng) -> Self;

    /// Fold a freshly fetched snapshot into the current one
    fn absorb(&self, fresh: Self) -> Self {
        fresh
    }
}

/// Percent volatility per elapsed second
fn volatility(symbol: &str) -> f64 {
    match symbol {
        "VIX" => 0.05,
        "NDX" => 0.02,
        _ => 0.01,
    }
}

fn walk_elapsed(elapsed_secs: f64) -> f64 {
    if elapsed_secs.is_finite() && elapsed_secs > 0.0 {
        elapsed_secs.min(MAX_WALK_SECS)
    } else {
        1.0
    }
}

impl FallbackWalk for MarketSnapshot {
    fn walk(&self, elapsed_secs: f64, rng: &mut SeededRng) -> Self {
        let elapsed = walk_elapsed(elapsed_secs);
        self.map_quotes(|symbol, quote| {
            let step = (rng.next_f64() - 0.5) * volatility(symbol) * elapsed;
            let step = Decimal::from_f64(step).unwrap_or(Decimal::ZERO);
            // FX-style quotes keep their pip precision
            let dp = if quote.price.abs() < dec!(10) { 5 } else { 2 };
            Quote {
                price: (quote.price * (Decimal::ONE + step / dec!(100))).round_dp(dp),
                change_pct: (quote.change_pct + step * dec!(10)).round_dp(2),
                name: quote.name.clone(),
            }
        })
    }

    fn absorb(&self, fresh: Self) -> Self {
        self.overlay(fresh)
    }
}

impl FallbackWalk for MultiSourceAnalysis {
    fn walk(&self, _elapsed_secs: f64, _rng: &mut SeededRng) -> Self {
        self.clone()
    }
}

impl FallbackWalk for CotReport {
    fn walk(&self, _elapsed_secs: f64, _rng: &mut SeededRng) -> Self {
        self.clone()
    }
}

impl FallbackWalk for Option<GlobalStats> {
    fn walk(&self, _elapsed_secs: f64, _rng: &mut SeededRng) -> Self {
        self.clone()
    }
}

impl FallbackWalk for Vec<CoinMarket> {
    fn walk(&self, _elapsed_secs: f64, _rng: &mut SeededRng) -> Self {
        self.clone()
    }
}

impl FallbackWalk for CoinCharts {
    fn walk(&self, _elapsed_secs: f64, _rng: &mut SeededRng) -> Self {
        self.clone()
    }

    /// Coins missing from a partial fetch keep their previous chart
    fn absorb(&self, fresh: Self) -> Self {
        let mut charts = self.clone();
        charts.extend(fresh);
        charts
    }
}
