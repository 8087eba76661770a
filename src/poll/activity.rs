//! Foreground/background activity signal
//!
//! Timers read the current activity after every fetch to choose the next
//! interval.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;

/// Whether the dashboard is being looked at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activity {
    #[default]
    Foreground,
    Background,
}

/// Broadcast of the current [`Activity`]
#[derive(Debug, Clone)]
pub struct ActivitySignal {
    tx: Arc<watch::Sender<Activity>>,
}

impl ActivitySignal {
    pub fn new(initial: Activity) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    pub fn set(&self, activity: Activity) {
        let previous = self.tx.send_replace(activity);
        if previous != activity {
            tracing::debug!(?previous, current = ?activity, "Activity changed");
        }
    }

    pub fn current(&self) -> Activity {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Activity> {
        self.tx.subscribe()
    }
}

impl Default for ActivitySignal {
    fn default() -> Self {
        Self::new(Activity::Foreground)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_survives_without_receivers() {
        let signal = ActivitySignal::default();
        signal.set(Activity::Background);
        assert_eq!(signal.current(), Activity::Background);
    }

    #[test]
    fn test_subscribers_see_latest() {
        let signal = ActivitySignal::new(Activity::Background);
        let rx = signal.subscribe();
        assert_eq!(*rx.borrow(), Activity::Background);
        signal.clone().set(Activity::Foreground);
        assert_eq!(*rx.borrow(), Activity::Foreground);
    }
}
