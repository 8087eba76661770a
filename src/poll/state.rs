//! Per-feed polling state

use crate::generator::SeededRng;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

/// Lifecycle of a polled feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PollPhase {
    /// Never fetched
    Idle,
    Fetching,
    /// Holding a live or fallback snapshot
    Cached,
}

/// How the current snapshot was produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FetchOutcome {
    Fresh,
    Fallback { reason: &'static str },
}

impl FetchOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Fresh => "fresh",
            Self::Fallback { .. } => "fallback",
        }
    }
}

/// Snapshot and bookkeeping owned by one poller
#[derive(Debug, Clone, Serialize)]
pub struct PollState<T> {
    pub snapshot: T,
    pub last_fetch: Option<DateTime<Utc>>,
    pub in_flight: bool,
    pub current_interval: Duration,
    pub phase: PollPhase,
    /// Bumped on every completed fetch attempt
    pub generation: u64,
    pub consecutive_failures: u32,
    pub last_outcome: Option<FetchOutcome>,
    #[serde(skip)]
    pub rng: SeededRng,
}

impl<T> PollState<T> {
    pub fn new(initial: T, interval: Duration, seed: u64) -> Self {
        Self {
            snapshot: initial,
            last_fetch: None,
            in_flight: false,
            current_interval: interval,
            phase: PollPhase::Idle,
            generation: 0,
            consecutive_failures: 0,
            last_outcome: None,
            rng: SeededRng::new(seed),
        }
    }

    /// Time since the last completed fetch, if any
    pub fn age(&self, now: DateTime<Utc>) -> Option<chrono::Duration> {
        self.last_fetch.map(|at| now - at)
    }

    /// Never fetched, or older than `ttl`
    pub fn is_stale(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        match self.age(now) {
            None => true,
            Some(age) => age.to_std().map_or(false, |age| age >= ttl),
        }
    }

    pub(crate) fn begin_fetch(&mut self) {
        self.in_flight = true;
        self.phase = PollPhase::Fetching;
    }

    pub(crate) fn complete(&mut self, snapshot: T, now: DateTime<Utc>, outcome: FetchOutcome) {
        match outcome {
            FetchOutcome::Fresh => self.consecutive_failures = 0,
            FetchOutcome::Fallback { .. } => {
                self.consecutive_failures = self.consecutive_failures.saturating_add(1)
            }
        }
        self.snapshot = snapshot;
        self.last_fetch = Some(now);
        self.generation = self.generation.wrapping_add(1);
        self.last_outcome = Some(outcome);
    }

    /// Clear the in-flight flag; runs on every exit path of a fetch
    pub(crate) fn end_fetch(&mut self) {
        self.in_flight = false;
        self.phase = if self.last_fetch.is_some() {
            PollPhase::Cached
        } else {
            PollPhase::Idle
        };
    }
}
