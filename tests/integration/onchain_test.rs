//! Integration tests for on-chain synthesis and scoring

use chrono::{Duration, TimeZone, Utc};
use market_pulse::clock::ManualClock;
use market_pulse::config::SynthConfig;
use market_pulse::generator::{SeededRng, TimeBucket};
use market_pulse::onchain::OnChainSynthesizer;
use market_pulse::scoring::{
    bias_score, fear_greed, BiasInputs, BiasSignal, Direction, DirectionalCall, FearGreedLabel,
    Regime,
};
use market_pulse::synth::{salt, whale_transactions, MvrvSignal, Timeframe};
use std::sync::Arc;

fn bucket() -> TimeBucket {
    TimeBucket::containing(Utc.with_ymd_and_hms(2026, 2, 11, 14, 20, 0).unwrap(), 3600)
}

#[test]
fn test_btc_whales_identical_within_bucket() {
    let bucket = bucket();
    let draw = || {
        let mut rng = SeededRng::for_symbol("BTC", salt::WHALES + bucket.salt());
        whale_transactions("BTC", 15, bucket.start(), &mut rng)
    };

    let first = draw();
    let second = draw();
    assert_eq!(first.len(), 15);
    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a.amount_usd, b.amount_usd);
        assert_eq!(a.kind, b.kind);
        assert_eq!(a.timestamp, b.timestamp);
    }
    assert_eq!(first, second);
    assert!(first.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
}

#[test]
fn test_report_deterministic_across_synthesizers() {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 2, 11, 14, 0, 0).unwrap());
    let a = OnChainSynthesizer::new(&SynthConfig::default(), Arc::new(clock.clone()));
    let b = OnChainSynthesizer::new(&SynthConfig::default(), Arc::new(clock.clone()));

    let first = a.report("BTC", Timeframe::Year);
    clock.advance(Duration::minutes(59));
    let second = b.report("BTC", Timeframe::Year);

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_report_invariants_over_many_symbols() {
    let synth = OnChainSynthesizer::new(
        &SynthConfig::default(),
        Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2026, 2, 11, 0, 0, 0).unwrap())),
    );

    for symbol in ["BTC", "ETH", "SOL", "XRP", "ADA", "DOGE", "LINK", "AVAX"] {
        let report = synth.report_at(symbol, bucket(), Timeframe::Month);

        assert_eq!(report.holders.total(), 100, "{symbol}");
        assert_eq!(
            report.defi.protocols.iter().map(|p| p.share).sum::<u32>(),
            100,
            "{symbol}"
        );
        assert_eq!(
            report.mvrv.signal,
            MvrvSignal::from_value(report.mvrv.current_value),
            "{symbol}"
        );
        assert!(report
            .whales
            .iter()
            .all(|tx| tx.is_alert == (tx.amount_usd > 10_000_000.0)));
        assert!(report.sopr.iter().all(|p| (0.85..=1.2).contains(&p.value)));
        assert_eq!(report.bias.signal, BiasSignal::from_score(report.bias.score));
    }
}

#[test]
fn test_report_bias_matches_recomputed_score() {
    let synth = OnChainSynthesizer::with_system_clock();
    let report = synth.report_at("ETH", bucket(), Timeframe::Month);

    let recomputed = bias_score(BiasInputs {
        whales: Some(&report.whales),
        netflow: Some(&report.netflow),
        holders: Some(&report.holders),
        mvrv: Some(&report.mvrv),
    });
    assert_eq!(report.bias, recomputed);
}

#[test]
fn test_all_bearish_assets_read_as_fear() {
    let calls: Vec<_> = (0..4)
        .map(|_| DirectionalCall {
            direction: Direction::Down,
            confidence: 70.0,
        })
        .collect();

    let model = fear_greed(&calls, 30.0, Regime::RiskOff);
    assert!(model.score <= 42);
    assert!(matches!(
        model.label,
        FearGreedLabel::Fear | FearGreedLabel::ExtremeFear
    ));
}
