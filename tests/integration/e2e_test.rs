//! End-to-end integration tests

use clap::Parser;
use market_pulse::cli::{Cli, Commands};
use market_pulse::clock::SystemClock;
use market_pulse::config::{Config, PollSettings};
use market_pulse::onchain::OnChainSynthesizer;
use market_pulse::scheduler::Scheduler;
use market_pulse::synth::Timeframe;
use market_pulse::telemetry::LogFormat;
use std::sync::Arc;
use std::time::Duration;

#[test]
fn test_config_example_loads() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config.toml.example");
    let config = tokio_test::assert_ok!(Config::load(path));

    assert_eq!(config.backend.base_url, "http://localhost:8000/api");
    assert_eq!(config.poll, PollSettings::default());
    assert_eq!(config.synth.whale_count, 15);
    assert_eq!(config.telemetry.log_format, LogFormat::Pretty);
    assert!(config.telemetry.metrics_port.is_none());

    let prices = config.poll.prices.poll_config();
    assert_eq!(prices.foreground_interval, Duration::from_secs(12));
    assert_eq!(prices.cache_ttl, Duration::from_secs(15));
    assert_eq!(config.coingecko.chart_coins, ["bitcoin", "ethereum"]);
    assert_eq!(
        config.poll.charts.poll_config().background_interval,
        Duration::from_secs(1_800)
    );
}

#[test]
fn test_config_command_renders_loadable_toml() {
    let config = Config::default();
    let rendered = toml::to_string_pretty(&config).unwrap();
    let reparsed: Config = toml::from_str(&rendered).unwrap();
    assert_eq!(reparsed.poll, config.poll);
    assert_eq!(reparsed.synth, config.synth);
}

#[tokio::test]
async fn test_scheduler_builds_from_config_without_network() {
    let config = Config::default();
    let scheduler = tokio_test::assert_ok!(Scheduler::from_config(&config, Arc::new(SystemClock)));

    // Seeded snapshots are in place before any fetch
    assert!(!scheduler.is_running());
    assert_eq!(scheduler.prices().snapshot().len(), 5);
    assert_eq!(scheduler.cot().snapshot().positions.len(), 3);
    assert!(scheduler.global().snapshot().is_none());
    assert!(scheduler.coins().snapshot().is_empty());
    assert!(scheduler.charts().snapshot().is_empty());
    assert_eq!(scheduler.prices().config().cache_ttl, Duration::from_secs(15));
    scheduler.shutdown().await;
}

#[test]
fn test_onchain_command_output_is_json() {
    let cli = Cli::try_parse_from(["market-pulse", "onchain", "--symbol", "sol"]).unwrap();
    let Commands::Onchain(args) = cli.command else {
        panic!("expected onchain command");
    };

    let synth = OnChainSynthesizer::with_system_clock();
    let report = synth.report(&args.symbol.to_uppercase(), args.timeframe);
    assert_eq!(args.timeframe, Timeframe::Month);

    let json: serde_json::Value = serde_json::to_value(&report).unwrap();
    assert_eq!(json["symbol"], "SOL");
    assert_eq!(json["timeframe"], "1M");
    assert!(json["bias"]["score"].as_u64().unwrap() <= 100);
    assert_eq!(json["whales"].as_array().unwrap().len(), 15);
}
