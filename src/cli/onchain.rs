//! On-chain report command

use crate::clock::SystemClock;
use crate::config::Config;
use crate::onchain::OnChainSynthesizer;
use crate::synth::Timeframe;
use clap::Args;
use std::sync::Arc;

#[derive(Args, Debug)]
pub struct OnChainArgs {
    /// Asset symbol
    #[arg(short, long, default_value = "BTC")]
    pub symbol: String,

    /// MVRV history window: 1D, 1W, 1M, 1Y or ALL
    #[arg(short, long, default_value = "1M")]
    pub timeframe: Timeframe,

    /// Single-line JSON
    #[arg(long)]
    pub compact: bool,
}

impl OnChainArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let synthesizer = OnChainSynthesizer::new(&config.synth, Arc::new(SystemClock));
        let symbol = self.symbol.to_uppercase();
        let report = synthesizer.report(&symbol, self.timeframe);

        tracing::info!(
            symbol = %symbol,
            score = report.bias.score,
            signal = ?report.bias.signal,
            "On-chain report ready"
        );

        let rendered = if self.compact {
            serde_json::to_string(&report)?
        } else {
            serde_json::to_string_pretty(&report)?
        };
        println!("{}", rendered);
        Ok(())
    }
}
