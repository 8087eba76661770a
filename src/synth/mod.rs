//! Metric synthesizers
//!
//! Pure functions producing one on-chain or derivatives metric family each.
//! Randomness comes only from [`SeededRng`](crate::generator::SeededRng);
//! timestamps are anchored to the caller-supplied instant, never the wall
//! clock.

mod defi;
mod flows;
mod fundamentals;
mod holders;
mod types;
mod valuation;
mod whale;

pub use defi::{defi_snapshot, DefiSnapshot, HourlyLiquidations, ProtocolShare, TvlPoint};
pub use flows::{exchange_flows, exchange_netflow, top_wallets, FlowPoint, WalletRank};
pub use fundamentals::{
    circulating_ratio, known_total_supply, project_fundamentals, DevActivity,
    ProjectFundamentals, SocialSentiment,
};
pub use holders::{holder_distribution, HolderDistribution};
pub use types::SynthesisError;
pub use valuation::{
    mvrv_series, sopr_series, Granularity, MvrvPoint, MvrvSeries, MvrvSignal, SoprPoint,
    Timeframe,
};
pub use whale::{whale_transactions, TxKind, WhaleTransaction, WHALE_ALERT_THRESHOLD_USD};

/// Per-metric seed salts, so each family draws from its own stream
pub mod salt {
    pub const WHALES: u64 = 0;
    pub const NETFLOW: u64 = 42;
    pub const HOLDERS: u64 = 55;
    pub const FLOWS: u64 = 77;
    pub const DEFI: u64 = 88;
    pub const TOP_WALLETS: u64 = 99;
    pub const FUNDAMENTALS: u64 = 111;
    /// Offset far from the whale salt so the two bucket-rolling streams
    /// never meet within one bucket
    pub const MVRV: u64 = 10_000;
}

/// Round to a fixed number of decimal places
pub(crate) fn round_dp(value: f64, dp: i32) -> f64 {
    let factor = 10f64.powi(dp);
    (value * factor).round() / factor
}
