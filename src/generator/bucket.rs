//! Coarse time buckets for seeding

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// A fixed-width window of wall-clock time
///
/// Two instants in the same bucket seed identical synthetic output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimeBucket {
    index: i64,
    width_secs: i64,
}

impl TimeBucket {
    /// Bucket of width `width_secs` containing `ts` (width floors at 1s)
    pub fn containing(ts: DateTime<Utc>, width_secs: u64) -> Self {
        let width_secs = i64::try_from(width_secs).unwrap_or(i64::MAX).max(1);
        Self {
            index: ts.timestamp().div_euclid(width_secs),
            width_secs,
        }
    }

    /// Bucket index since the Unix epoch
    pub fn index(&self) -> i64 {
        self.index
    }

    /// Bucket width in seconds
    pub fn width_secs(&self) -> i64 {
        self.width_secs
    }

    /// First instant of the bucket
    pub fn start(&self) -> DateTime<Utc> {
        self.index
            .checked_mul(self.width_secs)
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
            .unwrap_or(DateTime::UNIX_EPOCH)
    }

    /// Seed salt contributed by this bucket
    pub fn salt(&self) -> u64 {
        self.index.unsigned_abs()
    }
}
