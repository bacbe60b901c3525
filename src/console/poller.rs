//! Periodic refresh of the log feed, bound to the lifetime of the view that
//! shows it.
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::api::Backend;
use crate::ui::UIEvent;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Handle to the recurring fetch task.
///
/// The first fetch is issued immediately. Dropping the handle aborts the
/// timer together with any fetch still in flight, on every exit path.
pub struct LogFeedPoller {
    handle: JoinHandle<()>,
    generation: u64,
}

impl LogFeedPoller {
    /// Spawns the poll loop. Each tick emits `LogFetchStarted` and later one
    /// `LogFetchSettled`, both tagged with `generation`. Fetches are not
    /// deduplicated: a slow one may overlap the next tick.
    pub fn start(
        backend: Arc<dyn Backend>,
        period: Duration,
        generation: u64,
        events: mpsc::UnboundedSender<UIEvent>,
    ) -> Self {
        info!("Log polling started every {:?} (view #{})", period, generation);

        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut fetches = JoinSet::new();

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if events.send(UIEvent::LogFetchStarted { generation }).is_err() {
                            break;
                        }
                        let backend = backend.clone();
                        let events = events.clone();
                        fetches.spawn(async move {
                            let outcome = backend.fetch_logs().await;
                            let _ = events.send(UIEvent::LogFetchSettled { generation, outcome });
                        });
                    }
                    Some(_) = fetches.join_next(), if !fetches.is_empty() => {}
                }
            }

            debug!("Log polling loop for view #{} exited", generation);
        });

        Self { handle, generation }
    }
}

impl Drop for LogFeedPoller {
    fn drop(&mut self) {
        self.handle.abort();
        info!("Log polling stopped (view #{})", self.generation);
    }
}
