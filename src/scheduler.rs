//! Dashboard feed scheduler
//!
//! Owns one [`FeedPoller`] per live feed, the shared activity signal and the
//! root cancellation token. All read methods are synchronous and serve the
//! cached snapshot, revalidating in the background when it is stale.

use crate::clock::Clock;
use crate::config::{Config, PollSettings};
use crate::feed::{
    AnalysisFeed, BackendClient, ChartFeed, ChartSeries, CoinCharts, CoinGeckoClient, CoinMarket,
    CoinsFeed, CotFeed, CotReport, FeedError, FeedSource, GlobalFeed, GlobalStats, MarketSnapshot,
    MultiSourceAnalysis, PricesFeed, Quote,
};
use crate::poll::{Activity, ActivitySignal, FeedPoller, PollHandle};
use crate::scoring::{fear_greed, institutional_metrics, FearGreedModel, InstitutionalMetrics};
use crate::telemetry::{set_gauge, GaugeMetric};
use rust_decimal::prelude::ToPrimitive;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// One source per live feed, handed to [`Scheduler::with_sources`]
pub struct FeedSources<P, A, C, G, K, H> {
    pub prices: P,
    pub analysis: A,
    pub cot: C,
    pub global: G,
    pub coins: K,
    pub charts: H,
}

/// Polls every dashboard feed and derives scores from the latest snapshots
pub struct Scheduler<
    P = PricesFeed,
    A = AnalysisFeed,
    C = CotFeed,
    G = GlobalFeed,
    K = CoinsFeed,
    H = ChartFeed,
> where
    P: FeedSource<Snapshot = MarketSnapshot>,
    A: FeedSource<Snapshot = MultiSourceAnalysis>,
    C: FeedSource<Snapshot = CotReport>,
    G: FeedSource<Snapshot = Option<GlobalStats>>,
    K: FeedSource<Snapshot = Vec<CoinMarket>>,
    H: FeedSource<Snapshot = CoinCharts>,
{
    prices: FeedPoller<P>,
    analysis: FeedPoller<A>,
    cot: FeedPoller<C>,
    global: FeedPoller<G>,
    coins: FeedPoller<K>,
    charts: FeedPoller<H>,
    activity: ActivitySignal,
    token: CancellationToken,
    handles: Vec<PollHandle>,
}

impl Scheduler {
    /// Build HTTP clients and pollers from configuration
    ///
    /// Timers are not started until [`Scheduler::start`].
    pub fn from_config(config: &Config, clock: Arc<dyn Clock>) -> Result<Self, FeedError> {
        let backend = BackendClient::new(config.backend.client_config())?;
        let coingecko = CoinGeckoClient::new(config.coingecko.client_config())?;

        let sources = FeedSources {
            prices: PricesFeed::new(backend.clone()),
            analysis: AnalysisFeed::new(backend.clone()),
            cot: CotFeed::new(backend),
            global: GlobalFeed::new(coingecko.clone()),
            coins: CoinsFeed::new(coingecko.clone()),
            charts: ChartFeed::new(
                coingecko,
                config.coingecko.chart_coins.clone(),
                config.coingecko.chart_days,
            ),
        };
        Ok(Self::with_sources(sources, &config.poll, clock))
    }
}

impl<P, A, C, G, K, H> Scheduler<P, A, C, G, K, H>
where
    P: FeedSource<Snapshot = MarketSnapshot>,
    A: FeedSource<Snapshot = MultiSourceAnalysis>,
    C: FeedSource<Snapshot = CotReport>,
    G: FeedSource<Snapshot = Option<GlobalStats>>,
    K: FeedSource<Snapshot = Vec<CoinMarket>>,
    H: FeedSource<Snapshot = CoinCharts>,
{
    /// Build a scheduler over arbitrary sources
    ///
    /// Every poller holds a child of the root token, so read-triggered
    /// refreshes stop with the timers.
    pub fn with_sources(
        sources: FeedSources<P, A, C, G, K, H>,
        settings: &PollSettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let token = CancellationToken::new();
        Self {
            prices: FeedPoller::with_token(
                sources.prices,
                MarketSnapshot::macro_defaults(),
                settings.prices.poll_config(),
                Arc::clone(&clock),
                token.child_token(),
            ),
            analysis: FeedPoller::with_token(
                sources.analysis,
                MultiSourceAnalysis::default(),
                settings.analysis.poll_config(),
                Arc::clone(&clock),
                token.child_token(),
            ),
            cot: FeedPoller::with_token(
                sources.cot,
                CotReport::weekly_defaults(),
                settings.cot.poll_config(),
                Arc::clone(&clock),
                token.child_token(),
            ),
            global: FeedPoller::with_token(
                sources.global,
                None,
                settings.global.poll_config(),
                Arc::clone(&clock),
                token.child_token(),
            ),
            coins: FeedPoller::with_token(
                sources.coins,
                Vec::new(),
                settings.coins.poll_config(),
                Arc::clone(&clock),
                token.child_token(),
            ),
            charts: FeedPoller::with_token(
                sources.charts,
                CoinCharts::new(),
                settings.charts.poll_config(),
                clock,
                token.child_token(),
            ),
            activity: ActivitySignal::default(),
            token,
            handles: Vec::new(),
        }
    }

    /// Start every feed timer; a second call is a no-op
    pub fn start(&mut self) {
        if !self.handles.is_empty() {
            return;
        }

        self.handles = vec![
            self.prices
                .spawn(self.activity.subscribe(), self.token.child_token()),
            self.analysis
                .spawn(self.activity.subscribe(), self.token.child_token()),
            self.cot
                .spawn(self.activity.subscribe(), self.token.child_token()),
            self.global
                .spawn(self.activity.subscribe(), self.token.child_token()),
            self.coins
                .spawn(self.activity.subscribe(), self.token.child_token()),
            self.charts
                .spawn(self.activity.subscribe(), self.token.child_token()),
        ];
        tracing::info!(
            feeds = self.handles.len(),
            activity = ?self.activity.current(),
            "Scheduler started"
        );
    }

    pub fn is_running(&self) -> bool {
        !self.handles.is_empty() && !self.token.is_cancelled()
    }

    /// Switch between foreground and background polling
    ///
    /// Takes effect when each feed next schedules a fetch.
    pub fn set_activity(&self, activity: Activity) {
        self.activity.set(activity);
    }

    pub fn activity(&self) -> Activity {
        self.activity.current()
    }

    pub fn prices(&self) -> &FeedPoller<P> {
        &self.prices
    }

    pub fn analysis(&self) -> &FeedPoller<A> {
        &self.analysis
    }

    pub fn cot(&self) -> &FeedPoller<C> {
        &self.cot
    }

    pub fn global(&self) -> &FeedPoller<G> {
        &self.global
    }

    pub fn coins(&self) -> &FeedPoller<K> {
        &self.coins
    }

    pub fn charts(&self) -> &FeedPoller<H> {
        &self.charts
    }

    /// Fetch every feed now, joining any fetch already in flight
    pub async fn refresh_all(&self) {
        tokio::join!(
            self.prices.refresh(),
            self.analysis.refresh(),
            self.cot.refresh(),
            self.global.refresh(),
            self.coins.refresh(),
            self.charts.refresh(),
        );
    }

    /// Latest quotes for every tracked instrument
    pub fn latest_prices(&self) -> MarketSnapshot {
        self.prices.read()
    }

    pub fn quote(&self, symbol: &str) -> Option<Quote> {
        self.prices.read().get(symbol).cloned()
    }

    /// Fear & greed from the latest analysis
    ///
    /// VIX comes from the analysis payload, then the prices feed; with
    /// neither the volatility driver sits at its midpoint.
    pub fn fear_greed(&self) -> FearGreedModel {
        let analysis = self.analysis.read();
        let vix = analysis
            .vix
            .map(|v| v.current)
            .or_else(|| {
                self.prices
                    .read()
                    .get("VIX")
                    .and_then(|quote| quote.price.to_f64())
            })
            .unwrap_or(f64::NAN);

        let model = fear_greed(&analysis.directional_calls(), vix, analysis.regime);
        set_gauge(GaugeMetric::FearGreedScore, None, f64::from(model.score));
        model
    }

    /// Institutional positioning for one asset
    pub fn institutional(&self, symbol: &str) -> Option<InstitutionalMetrics> {
        self.cot
            .read()
            .get(symbol)
            .map(|p| institutional_metrics(p.long, p.short, p.bias))
    }

    /// Institutional positioning for every reported asset
    pub fn institutional_all(&self) -> BTreeMap<String, InstitutionalMetrics> {
        self.cot
            .read()
            .positions
            .iter()
            .map(|(symbol, p)| {
                (
                    symbol.clone(),
                    institutional_metrics(p.long, p.short, p.bias),
                )
            })
            .collect()
    }

    /// Aggregate crypto market statistics, once fetched
    pub fn global_stats(&self) -> Option<GlobalStats> {
        self.global.read()
    }

    /// Top coins by market cap; empty until the first successful fetch
    pub fn top_coins(&self) -> Vec<CoinMarket> {
        self.coins.read()
    }

    /// Historical chart for one configured coin id
    pub fn coin_chart(&self, coin_id: &str) -> Option<ChartSeries> {
        self.charts.read().get(coin_id).cloned()
    }

    /// Every chart fetched so far, keyed by coin id
    pub fn coin_charts(&self) -> CoinCharts {
        self.charts.read()
    }

    /// Cancel every timer and wait for the tasks to exit
    pub async fn shutdown(mut self) {
        self.token.cancel();
        for handle in self.handles.drain(..) {
            handle.shutdown().await;
        }
        tracing::info!("Scheduler stopped");
    }
}

impl<P, A, C, G, K, H> Drop for Scheduler<P, A, C, G, K, H>
where
    P: FeedSource<Snapshot = MarketSnapshot>,
    A: FeedSource<Snapshot = MultiSourceAnalysis>,
    C: FeedSource<Snapshot = CotReport>,
    G: FeedSource<Snapshot = Option<GlobalStats>>,
    K: FeedSource<Snapshot = Vec<CoinMarket>>,
    H: FeedSource<Snapshot = CoinCharts>,
{
    fn drop(&mut self) {
        self.token.cancel();
    }
}
