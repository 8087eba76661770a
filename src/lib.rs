//! market-pulse: Market sentiment synthesis and live-feed polling
//!
//! This library provides the core components for:
//! - Deterministic, symbol-seeded random generation
//! - Synthetic on-chain and derivatives metrics
//! - Bias, fear & greed and institutional positioning scores
//! - Live feed clients for the dashboard backend and CoinGecko
//! - Cached, deduplicated polling with random-walk fallback
//! - Full observability stack

pub mod cli;
pub mod clock;
pub mod config;
pub mod feed;
pub mod generator;
pub mod onchain;
pub mod poll;
pub mod scheduler;
pub mod scoring;
pub mod synth;
pub mod telemetry;
