//! Per-feed poller
//!
//! One poller owns one feed's [`PollState`]. Fetches are serialized by an
//! async gate; concurrent `refresh()` callers that queue behind a running
//! fetch take its result instead of issuing their own. Readers never touch
//! the gate.

use super::activity::Activity;
use super::fallback::FallbackWalk;
use super::state::{FetchOutcome, PollState};
use super::PollConfig;
use crate::clock::Clock;
use crate::feed::{FeedError, FeedSource};
use crate::telemetry::{record_fetch, record_fetch_latency, set_gauge, GaugeMetric};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

struct Inner<S: FeedSource> {
    source: S,
    config: PollConfig,
    clock: Arc<dyn Clock>,
    state: RwLock<PollState<S::Snapshot>>,
    fetch_gate: Mutex<()>,
    /// Set while a read-triggered background refresh is queued or running
    revalidating: AtomicBool,
    /// Cancels read-triggered refreshes; timers carry their own tokens
    token: CancellationToken,
}

impl<S: FeedSource> Inner<S> {
    fn read_state(&self) -> RwLockReadGuard<'_, PollState<S::Snapshot>> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, PollState<S::Snapshot>> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}

/// Clears the in-flight flag on every exit from a fetch, including when the
/// fetching future is dropped
struct InFlightGuard<'a, T> {
    state: &'a RwLock<PollState<T>>,
}

impl<T> Drop for InFlightGuard<'_, T> {
    fn drop(&mut self) {
        self.state
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .end_fetch();
    }
}

/// Releases the revalidation slot however the background task ends
struct RevalidatingGuard<'a>(&'a AtomicBool);

impl Drop for RevalidatingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Polls one [`FeedSource`] with caching and fallback
pub struct FeedPoller<S: FeedSource> {
    inner: Arc<Inner<S>>,
}

impl<S: FeedSource> Clone for FeedPoller<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> FeedPoller<S>
where
    S: FeedSource,
    S::Snapshot: FallbackWalk,
{
    /// Create a poller serving `initial` until the first fetch completes
    pub fn new(source: S, initial: S::Snapshot, config: PollConfig, clock: Arc<dyn Clock>) -> Self {
        Self::with_token(source, initial, config, clock, CancellationToken::new())
    }

    /// Create a poller whose read-triggered refreshes stop when `token` is
    /// cancelled
    pub fn with_token(
        source: S,
        initial: S::Snapshot,
        config: PollConfig,
        clock: Arc<dyn Clock>,
        token: CancellationToken,
    ) -> Self {
        let state = PollState::new(initial, config.foreground_interval, config.fallback_seed);
        Self {
            inner: Arc::new(Inner {
                source,
                config,
                clock,
                state: RwLock::new(state),
                fetch_gate: Mutex::new(()),
                revalidating: AtomicBool::new(false),
                token,
            }),
        }
    }

    /// Stop read-triggered refreshes, including one already queued
    pub fn cancel(&self) {
        self.inner.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.token.is_cancelled()
    }

    pub fn name(&self) -> &str {
        self.inner.source.name()
    }

    pub fn config(&self) -> &PollConfig {
        &self.inner.config
    }

    /// Current snapshot without any freshness check
    pub fn snapshot(&self) -> S::Snapshot {
        self.inner.read_state().snapshot.clone()
    }

    /// Copy of the full polling state
    pub fn state(&self) -> PollState<S::Snapshot> {
        self.inner.read_state().clone()
    }

    /// Stale-while-revalidate read
    ///
    /// Returns the cached snapshot immediately. When it is older than the
    /// cache TTL (or was never fetched) a single background refresh is
    /// started, unless a fetch is already in flight.
    pub fn read(&self) -> S::Snapshot {
        let now = self.inner.clock.now();
        let (snapshot, stale, in_flight) = {
            let state = self.inner.read_state();
            (
                state.snapshot.clone(),
                state.is_stale(now, self.inner.config.cache_ttl),
                state.in_flight,
            )
        };

        if stale && !in_flight {
            self.revalidate();
        }
        snapshot
    }

    fn revalidate(&self) {
        if self.inner.token.is_cancelled() {
            return;
        }
        if self
            .inner
            .revalidating
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(feed = self.name(), "No runtime available, skipping revalidation");
            self.inner.revalidating.store(false, Ordering::Release);
            return;
        };

        let poller = self.clone();
        runtime.spawn(async move {
            let _slot = RevalidatingGuard(&poller.inner.revalidating);
            tokio::select! {
                biased;
                _ = poller.inner.token.cancelled() => {
                    tracing::debug!(feed = poller.name(), "Revalidation cancelled");
                }
                _ = poller.refresh() => {}
            }
        });
    }

    /// Fetch now, or join a fetch that is already running
    ///
    /// Never fails: on any fetch error the fallback walk produces the
    /// returned snapshot.
    pub async fn refresh(&self) -> S::Snapshot {
        let observed = self.inner.read_state().generation;
        let _gate = self.inner.fetch_gate.lock().await;

        {
            let state = self.inner.read_state();
            if state.generation != observed {
                // A fetch completed while we queued on the gate
                return state.snapshot.clone();
            }
        }

        self.fetch_locked().await
    }

    /// Run one fetch attempt; caller holds the fetch gate
    async fn fetch_locked(&self) -> S::Snapshot {
        let inner = &self.inner;
        let feed = inner.source.name();
        let fetch_id = Uuid::new_v4();

        inner.write_state().begin_fetch();
        let _in_flight = InFlightGuard {
            state: &inner.state,
        };

        tracing::debug!(%fetch_id, feed, "Fetch started");
        let started = Instant::now();
        let result =
            match tokio::time::timeout(inner.config.request_timeout, inner.source.fetch()).await {
                Ok(result) => result,
                Err(_) => Err(FeedError::Timeout(inner.config.request_timeout)),
            };
        record_fetch_latency(feed, started.elapsed());

        let now = inner.clock.now();
        let mut state = inner.write_state();
        let outcome = match result {
            Ok(fresh) => {
                let next = state.snapshot.absorb(fresh);
                state.complete(next, now, FetchOutcome::Fresh);
                tracing::debug!(%fetch_id, feed, generation = state.generation, "Feed refreshed");
                FetchOutcome::Fresh
            }
            Err(e) => {
                let elapsed = state
                    .age(now)
                    .map(|age| age.num_milliseconds() as f64 / 1000.0)
                    .unwrap_or(0.0);
                let state = &mut *state;
                let next = state.snapshot.walk(elapsed, &mut state.rng);
                let outcome = FetchOutcome::Fallback { reason: e.kind() };
                state.complete(next, now, outcome.clone());
                tracing::warn!(
                    %fetch_id,
                    feed,
                    error = %e,
                    failures = state.consecutive_failures,
                    "Feed fetch failed, serving fallback"
                );
                outcome
            }
        };

        record_fetch(feed, outcome.label());
        set_gauge(
            GaugeMetric::FailureStreak,
            Some(feed),
            f64::from(state.consecutive_failures),
        );
        state.snapshot.clone()
    }

    /// Start the polling timer
    ///
    /// Fetches immediately, then after every attempt sleeps for the
    /// interval matching the current activity. The loop exits when `token`
    /// is cancelled; a fetch already running is left to finish within its
    /// timeout.
    pub fn spawn(&self, activity: watch::Receiver<Activity>, token: CancellationToken) -> PollHandle {
        let poller = self.clone();
        let task_token = token.clone();

        let task = tokio::spawn(async move {
            let feed = poller.name().to_string();
            tracing::info!(feed = %feed, "Poller started");

            loop {
                if task_token.is_cancelled() {
                    break;
                }
                poller.refresh().await;

                let interval = poller.inner.config.interval_for(*activity.borrow());
                poller.inner.write_state().current_interval = interval;

                tokio::select! {
                    _ = task_token.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
            }

            tracing::info!(feed = %feed, "Poller stopped");
        });

        PollHandle {
            feed: self.name().to_string(),
            token,
            task: Some(task),
        }
    }
}

/// Running poller timer
///
/// Dropping the handle cancels the timer without waiting for it.
pub struct PollHandle {
    feed: String,
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl PollHandle {
    pub fn feed(&self) -> &str {
        &self.feed
    }

    /// Request cancellation without waiting
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Cancel the timer and wait for the task to exit
    pub async fn shutdown(mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(feed = %self.feed, error = %e, "Poller task ended abnormally");
            }
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
