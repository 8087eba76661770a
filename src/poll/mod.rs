//! Live feed polling
//!
//! Caching, in-flight deduplication, activity-driven intervals and
//! random-walk fallback for one feed at a time. The [`crate::scheduler`]
//! composes one poller per feed.

mod activity;
mod fallback;
mod poller;
mod state;

pub use activity::{Activity, ActivitySignal};
pub use fallback::{FallbackWalk, MAX_WALK_SECS};
pub use poller::{FeedPoller, PollHandle};
pub use state::{FetchOutcome, PollPhase, PollState};

use std::time::Duration;

/// Timing and fallback parameters for one poller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    pub foreground_interval: Duration,
    pub background_interval: Duration,
    /// Age after which a read triggers a background refresh
    pub cache_ttl: Duration,
    /// Deadline for one fetch; expiry counts as a failure
    pub request_timeout: Duration,
    /// Seed of the fallback walk
    pub fallback_seed: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            foreground_interval: Duration::from_secs(12),
            background_interval: Duration::from_secs(30),
            cache_ttl: Duration::from_secs(15),
            request_timeout: Duration::from_secs(6),
            fallback_seed: 42,
        }
    }
}

impl PollConfig {
    pub fn interval_for(&self, activity: Activity) -> Duration {
        match activity {
            Activity::Foreground => self.foreground_interval,
            Activity::Background => self.background_interval,
        }
    }
}
