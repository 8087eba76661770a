//! Integration tests for feed polling and the scheduler

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use futures_util::future::join_all;
use market_pulse::clock::{Clock, ManualClock, SystemClock};
use market_pulse::config::PollSettings;
use market_pulse::feed::{
    ChartSeries, CoinCharts, CoinMarket, CotReport, FeedError, FeedSource, GlobalStats,
    MarketSnapshot, MultiSourceAnalysis, Quote,
};
use market_pulse::poll::{Activity, FeedPoller, FetchOutcome, PollConfig, PollPhase};
use market_pulse::scheduler::{FeedSources, Scheduler};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

/// Prices source that counts calls and can be told to fail, stall or block
#[derive(Clone, Default)]
struct ScriptedPrices {
    calls: Arc<AtomicUsize>,
    fail: Arc<AtomicBool>,
    delay: Duration,
    gate: Option<Arc<Notify>>,
}

impl ScriptedPrices {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn test_quote(price: Decimal) -> MarketSnapshot {
    let mut quotes = BTreeMap::new();
    quotes.insert(
        "TEST".to_string(),
        Quote {
            price,
            change_pct: Decimal::ZERO,
            name: None,
        },
    );
    MarketSnapshot::new(quotes)
}

#[async_trait]
impl FeedSource for ScriptedPrices {
    type Snapshot = MarketSnapshot;

    fn name(&self) -> &str {
        "prices"
    }

    async fn fetch(&self) -> Result<MarketSnapshot, FeedError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(FeedError::Status {
                status: 500,
                body: "internal error".to_string(),
            });
        }
        Ok(test_quote(Decimal::from(n as u64)))
    }
}

struct Static<T>(T, &'static str);

#[async_trait]
impl<T: Clone + Send + Sync + 'static> FeedSource for Static<T> {
    type Snapshot = T;

    fn name(&self) -> &str {
        self.1
    }

    async fn fetch(&self) -> Result<T, FeedError> {
        Ok(self.0.clone())
    }
}

type StaticSources<P> = FeedSources<
    P,
    Static<MultiSourceAnalysis>,
    Static<CotReport>,
    Static<Option<GlobalStats>>,
    Static<Vec<CoinMarket>>,
    Static<CoinCharts>,
>;

fn static_sources<P>(prices: P) -> StaticSources<P> {
    FeedSources {
        prices,
        analysis: Static(MultiSourceAnalysis::default(), "analysis"),
        cot: Static(CotReport::weekly_defaults(), "cot"),
        global: Static(None, "global"),
        coins: Static(Vec::new(), "coins"),
        charts: Static(CoinCharts::new(), "charts"),
    }
}

fn coin(id: &str, symbol: &str, price: f64) -> CoinMarket {
    CoinMarket {
        id: id.to_string(),
        symbol: symbol.to_string(),
        name: id.to_string(),
        current_price: Some(price),
        market_cap: None,
        total_volume: None,
        price_change_percentage_24h: None,
    }
}

fn chart(price: f64) -> ChartSeries {
    ChartSeries {
        prices: vec![[1_770_786_400_000.0, price]],
        ..Default::default()
    }
}

/// Chart source that returns its scripted responses in order, repeating the last
struct ScriptedCharts {
    responses: Vec<Result<CoinCharts, u16>>,
    calls: AtomicUsize,
}

#[async_trait]
impl FeedSource for ScriptedCharts {
    type Snapshot = CoinCharts;

    fn name(&self) -> &str {
        "charts"
    }

    async fn fetch(&self) -> Result<CoinCharts, FeedError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        let response = &self.responses[n.min(self.responses.len() - 1)];
        response.clone().map_err(|status| FeedError::Status {
            status,
            body: String::new(),
        })
    }
}

fn start_time() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 11, 9, 30, 0).unwrap()
}

fn poller_with(
    source: ScriptedPrices,
    config: PollConfig,
    clock: Arc<dyn Clock>,
) -> FeedPoller<ScriptedPrices> {
    FeedPoller::new(source, MarketSnapshot::macro_defaults(), config, clock)
}

async fn wait_for_calls(source: &ScriptedPrices, expected: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while source.calls() < expected {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("fetch did not happen in time");
}

#[tokio::test]
async fn test_concurrent_refreshes_share_one_fetch() {
    let source = ScriptedPrices {
        delay: Duration::from_millis(50),
        ..Default::default()
    };
    let poller = poller_with(
        source.clone(),
        PollConfig::default(),
        Arc::new(ManualClock::new(start_time())),
    );

    let results = join_all((0..10).map(|_| poller.refresh())).await;

    assert_eq!(source.calls(), 1);
    assert!(results.iter().all(|snapshot| snapshot == &results[0]));
    assert_eq!(results[0].get("TEST").unwrap().price, dec!(1));
    let state = poller.state();
    assert_eq!(state.generation, 1);
    assert!(!state.in_flight);
    assert_eq!(state.phase, PollPhase::Cached);
}

#[tokio::test]
async fn test_read_during_fetch_does_not_start_another() {
    let gate = Arc::new(Notify::new());
    let clock = ManualClock::new(start_time());
    let source = ScriptedPrices {
        gate: Some(Arc::clone(&gate)),
        ..Default::default()
    };
    let poller = poller_with(source.clone(), PollConfig::default(), Arc::new(clock));

    let background = {
        let poller = poller.clone();
        tokio::spawn(async move { poller.refresh().await })
    };
    wait_for_calls(&source, 1).await;
    assert!(poller.state().in_flight);
    assert_eq!(poller.state().phase, PollPhase::Fetching);

    // Never fetched, so stale, but a fetch is already running
    for _ in 0..5 {
        assert_eq!(poller.read(), MarketSnapshot::macro_defaults());
    }
    tokio::task::yield_now().await;

    gate.notify_one();
    background.await.unwrap();
    assert_eq!(source.calls(), 1);
    assert!(!poller.state().in_flight);
}

#[tokio::test]
async fn test_stale_while_revalidate() {
    let clock = ManualClock::new(start_time());
    let source = ScriptedPrices::default();
    let poller = poller_with(source.clone(), PollConfig::default(), Arc::new(clock.clone()));

    poller.refresh().await;
    assert_eq!(source.calls(), 1);

    // Within TTL: served from cache, nothing fetched
    clock.advance(chrono::Duration::seconds(10));
    let cached = poller.read();
    tokio::task::yield_now().await;
    assert_eq!(source.calls(), 1);
    assert_eq!(cached.get("TEST").unwrap().price, dec!(1));

    // Past TTL: stale value returned at once, exactly one refresh spawned
    clock.advance(chrono::Duration::seconds(10));
    let stale: Vec<_> = (0..5).map(|_| poller.read()).collect();
    assert!(stale
        .iter()
        .all(|s| s.get("TEST").unwrap().price == dec!(1)));

    wait_for_calls(&source, 2).await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(source.calls(), 2);
    assert_eq!(poller.read().get("TEST").unwrap().price, dec!(2));
    assert_eq!(poller.state().last_fetch, Some(clock.now()));
}

#[tokio::test]
async fn test_failure_falls_back_near_last_fresh_value() {
    let clock = ManualClock::new(start_time());
    let source = ScriptedPrices::default();
    let poller = poller_with(source.clone(), PollConfig::default(), Arc::new(clock.clone()));

    poller.refresh().await;
    let fresh = poller.snapshot();

    source.fail.store(true, Ordering::SeqCst);
    clock.advance(chrono::Duration::seconds(12));
    let walked = poller.refresh().await;

    let state = poller.state();
    assert_eq!(
        state.last_outcome,
        Some(FetchOutcome::Fallback { reason: "status" })
    );
    assert_eq!(state.consecutive_failures, 1);
    assert_eq!(state.generation, 2);
    assert_eq!(state.last_fetch, Some(clock.now()));
    assert_eq!(walked.len(), fresh.len());

    // 12s at 1% per second moves SPX by at most 6%
    let before = fresh.get("SPX").unwrap().price;
    let after = walked.get("SPX").unwrap().price;
    assert!((after - before).abs() <= before * dec!(0.06));

    // Recovery resets the streak
    source.fail.store(false, Ordering::SeqCst);
    poller.refresh().await;
    assert_eq!(poller.state().consecutive_failures, 0);
    assert_eq!(poller.state().last_outcome, Some(FetchOutcome::Fresh));
}

#[tokio::test(start_paused = true)]
async fn test_timeout_counts_as_failure() {
    let source = ScriptedPrices {
        delay: Duration::from_secs(60),
        ..Default::default()
    };
    let config = PollConfig {
        request_timeout: Duration::from_millis(100),
        ..Default::default()
    };
    let poller = poller_with(source.clone(), config, Arc::new(SystemClock));

    let snapshot = poller.refresh().await;

    let state = poller.state();
    assert_eq!(
        state.last_outcome,
        Some(FetchOutcome::Fallback { reason: "timeout" })
    );
    assert!(!state.in_flight);
    assert_eq!(snapshot.len(), 5);
    assert!(snapshot.get("TEST").is_none());
}

#[tokio::test]
async fn test_fallback_is_deterministic_for_a_seed() {
    let run = || async {
        let source = ScriptedPrices::default();
        source.fail.store(true, Ordering::SeqCst);
        let clock = ManualClock::new(start_time());
        let poller = poller_with(source, PollConfig::default(), Arc::new(clock.clone()));
        let mut out = Vec::new();
        for _ in 0..3 {
            out.push(poller.refresh().await);
            clock.advance(chrono::Duration::seconds(12));
        }
        out
    };

    assert_eq!(run().await, run().await);
}

#[tokio::test(start_paused = true)]
async fn test_timer_follows_activity_and_stops_on_cancel() {
    let source = ScriptedPrices::default();
    let config = PollConfig {
        foreground_interval: Duration::from_secs(1),
        background_interval: Duration::from_secs(10),
        ..Default::default()
    };
    let poller = poller_with(source.clone(), config, Arc::new(SystemClock));

    let (tx, rx) = tokio::sync::watch::channel(Activity::Background);
    let handle = poller.spawn(rx, CancellationToken::new());

    // Initial fetch, then a 10s background wait
    tokio::time::sleep(Duration::from_millis(5_500)).await;
    assert_eq!(source.calls(), 1);
    assert_eq!(poller.state().current_interval, Duration::from_secs(10));

    // The pending wait is not re-armed; foreground applies after the next fetch
    tx.send_replace(Activity::Foreground);
    tokio::time::sleep(Duration::from_millis(3_000)).await;
    assert_eq!(source.calls(), 1);

    tokio::time::sleep(Duration::from_millis(4_000)).await;
    assert!(source.calls() >= 3);
    assert_eq!(poller.state().current_interval, Duration::from_secs(1));

    handle.shutdown().await;
    let after_shutdown = source.calls();
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(source.calls(), after_shutdown);
}

#[tokio::test(start_paused = true)]
async fn test_scheduler_teardown_stops_all_feeds() {
    let prices = ScriptedPrices::default();
    let mut settings = PollSettings::default();
    settings.prices.foreground_interval_ms = 1_000;

    let mut scheduler =
        Scheduler::with_sources(static_sources(prices.clone()), &settings, Arc::new(SystemClock));
    scheduler.start();
    assert!(scheduler.is_running());

    tokio::time::sleep(Duration::from_millis(2_500)).await;
    assert!(prices.calls() >= 2);
    assert!(scheduler.latest_prices().get("TEST").is_some());

    scheduler.shutdown().await;
    let after_shutdown = prices.calls();
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(prices.calls(), after_shutdown);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_scheduler_cancels_timers() {
    let prices = ScriptedPrices::default();
    let mut settings = PollSettings::default();
    settings.prices.foreground_interval_ms = 1_000;

    {
        let mut scheduler = Scheduler::with_sources(
            static_sources(prices.clone()),
            &settings,
            Arc::new(SystemClock),
        );
        scheduler.start();
        tokio::time::sleep(Duration::from_millis(1_500)).await;
    }

    // Let the cancelled tasks observe the token
    tokio::time::sleep(Duration::from_millis(10)).await;
    let after_drop = prices.calls();
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(prices.calls(), after_drop);
}

#[tokio::test(start_paused = true)]
async fn test_stale_read_before_shutdown_does_not_fetch_after() {
    let prices = ScriptedPrices::default();
    let clock = ManualClock::new(start_time());
    let mut scheduler = Scheduler::with_sources(
        static_sources(prices.clone()),
        &PollSettings::default(),
        Arc::new(clock.clone()),
    );
    scheduler.start();
    wait_for_calls(&prices, 1).await;

    // Past the 15s TTL on the scheduler clock; the read queues a refresh
    clock.advance(chrono::Duration::seconds(20));
    let poller = scheduler.prices().clone();
    assert!(scheduler.latest_prices().get("TEST").is_some());
    scheduler.shutdown().await;

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(prices.calls(), 1);
    assert!(poller.is_cancelled());
    assert!(!poller.state().in_flight);

    // Reads keep serving the cache without fetching
    assert!(poller.read().get("TEST").is_some());
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(prices.calls(), 1);
}

#[tokio::test]
async fn test_top_coins_served_from_coins_feed() {
    let mut sources = static_sources(ScriptedPrices::default());
    sources.coins = Static(
        vec![coin("bitcoin", "btc", 67_230.0), coin("ethereum", "eth", 3_810.5)],
        "coins",
    );
    let scheduler = Scheduler::with_sources(
        sources,
        &PollSettings::default(),
        Arc::new(ManualClock::new(start_time())),
    );

    assert!(scheduler.top_coins().is_empty());
    scheduler.refresh_all().await;

    let coins = scheduler.top_coins();
    assert_eq!(coins.len(), 2);
    assert_eq!(coins[0].id, "bitcoin");
    assert_eq!(coins[1].current_price, Some(3_810.5));
    assert_eq!(scheduler.coins().state().generation, 1);
}

#[tokio::test]
async fn test_coin_charts_survive_partial_and_failed_fetches() {
    let mut both = CoinCharts::new();
    both.insert("bitcoin".to_string(), chart(67_000.0));
    both.insert("ethereum".to_string(), chart(3_800.0));
    let mut bitcoin_only = CoinCharts::new();
    bitcoin_only.insert("bitcoin".to_string(), chart(68_000.0));

    let charts = ScriptedCharts {
        responses: vec![Ok(both), Ok(bitcoin_only), Err(502)],
        calls: AtomicUsize::new(0),
    };
    let sources = FeedSources {
        prices: ScriptedPrices::default(),
        analysis: Static(MultiSourceAnalysis::default(), "analysis"),
        cot: Static(CotReport::weekly_defaults(), "cot"),
        global: Static(None::<GlobalStats>, "global"),
        coins: Static(Vec::<CoinMarket>::new(), "coins"),
        charts,
    };
    let scheduler = Scheduler::with_sources(
        sources,
        &PollSettings::default(),
        Arc::new(ManualClock::new(start_time())),
    );
    assert!(scheduler.coin_chart("bitcoin").is_none());

    scheduler.refresh_all().await;
    assert_eq!(scheduler.coin_charts().len(), 2);

    // Ethereum missing from the second fetch keeps its previous series
    scheduler.charts().refresh().await;
    let bitcoin = scheduler.coin_chart("bitcoin").unwrap();
    assert_eq!(bitcoin.last_price(), Some(68_000.0));
    assert_eq!(
        scheduler.coin_chart("ethereum").unwrap().last_price(),
        Some(3_800.0)
    );

    // A failed fetch holds every chart
    scheduler.charts().refresh().await;
    assert_eq!(scheduler.charts().state().consecutive_failures, 1);
    assert_eq!(scheduler.coin_chart("bitcoin"), Some(bitcoin));
    assert_eq!(scheduler.coin_charts().len(), 2);
    assert!(scheduler.coin_chart("solana").is_none());
}
