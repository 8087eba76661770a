//! Run command implementation

use crate::clock::SystemClock;
use crate::config::Config;
use crate::poll::Activity;
use crate::scheduler::Scheduler;
use clap::Args;
use std::sync::Arc;
use std::time::Duration;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Start in background mode (slower polling)
    #[arg(long)]
    pub background: bool,

    /// Seconds between score reports
    #[arg(long, default_value = "30")]
    pub report_interval: u64,
}

impl RunArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let mut scheduler = Scheduler::from_config(config, Arc::new(SystemClock))?;
        if self.background {
            scheduler.set_activity(Activity::Background);
        }
        scheduler.start();

        let mut ticker = tokio::time::interval(Duration::from_secs(self.report_interval.max(1)));
        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Received Ctrl-C, shutting down");
                    break;
                }
                _ = ticker.tick() => report(&scheduler),
            }
        }

        scheduler.shutdown().await;
        Ok(())
    }
}

fn report(scheduler: &Scheduler) {
    let prices = scheduler.latest_prices();
    for (symbol, quote) in prices.iter() {
        tracing::info!(
            symbol = %symbol,
            price = %quote.price,
            change_pct = %quote.change_pct,
            "Quote"
        );
    }

    let model = scheduler.fear_greed();
    tracing::info!(
        score = model.score,
        label = %model.label,
        bias = model.drivers.bias,
        volatility = model.drivers.volatility,
        "Fear & greed"
    );

    for (symbol, metrics) in scheduler.institutional_all() {
        tracing::info!(
            symbol = %symbol,
            net = metrics.net_position,
            long_ratio = metrics.long_ratio,
            squeeze_risk = metrics.squeeze_risk,
            "Institutional positioning"
        );
    }

    if let Some(global) = scheduler.global_stats() {
        tracing::info!(
            market_cap = global.total_market_cap_usd,
            btc_dominance = global.btc_dominance_pct,
            change_24h = global.market_cap_change_24h_pct,
            "Crypto market"
        );
    }

    for coin in scheduler.top_coins().iter().take(5) {
        tracing::info!(
            coin = %coin.id,
            price = ?coin.current_price,
            change_24h = ?coin.price_change_percentage_24h,
            "Top coin"
        );
    }

    for (coin_id, chart) in scheduler.coin_charts() {
        tracing::info!(
            coin = %coin_id,
            points = chart.prices.len(),
            last_price = ?chart.last_price(),
            "Chart"
        );
    }
}
