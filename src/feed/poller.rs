use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Data set refreshed by a poll timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PollTarget {
    Posts,
    Stats,
    Trending,
}

impl PollTarget {
    pub const ALL: [PollTarget; 3] = [PollTarget::Posts, PollTarget::Stats, PollTarget::Trending];
}

/// Period of each poll timer. A zero period disables that timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    pub posts: Duration,
    pub stats: Duration,
    pub trending: Duration,
}

impl Default for PollSchedule {
    fn default() -> Self {
        Self {
            posts: Duration::from_secs(30),
            stats: Duration::from_secs(60),
            trending: Duration::from_secs(60),
        }
    }
}

impl PollSchedule {
    pub fn period(&self, target: PollTarget) -> Duration {
        match target {
            PollTarget::Posts => self.posts,
            PollTarget::Stats => self.stats,
            PollTarget::Trending => self.trending,
        }
    }
}

/// Independent repeating timers, one task per [`PollTarget`].
///
/// Each timer only sends its target into the channel; the receiving loop
/// does the actual fetch. Timers are not coordinated with each other or
/// with user actions. All of them are aborted on [`Poller::shutdown`] or
/// when the poller is dropped.
pub struct Poller {
    schedule: PollSchedule,
    tx: mpsc::Sender<PollTarget>,
    handles: HashMap<PollTarget, JoinHandle<()>>,
}

impl Poller {
    /// Starts every timer with a non-zero period. The first tick of each
    /// comes one full period after start.
    pub fn start(schedule: PollSchedule, tx: mpsc::Sender<PollTarget>) -> Self {
        let mut poller = Self {
            schedule,
            tx,
            handles: HashMap::new(),
        };
        for target in PollTarget::ALL {
            poller.restart(target);
        }
        poller
    }

    /// (Re)starts one timer from now, replacing any running one.
    pub fn restart(&mut self, target: PollTarget) {
        self.cancel(target);

        let period = self.schedule.period(target);
        if period.is_zero() {
            tracing::debug!(?target, "Polling disabled");
            return;
        }

        tracing::debug!(?target, period_secs = period.as_secs(), "Starting poll timer");
        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if tx.send(target).await.is_err() {
                    tracing::debug!(?target, "Poll receiver dropped, stopping timer");
                    break;
                }
            }
        });
        self.handles.insert(target, handle);
    }

    pub fn cancel(&mut self, target: PollTarget) {
        if let Some(handle) = self.handles.remove(&target) {
            handle.abort();
        }
    }

    pub fn is_running(&self, target: PollTarget) -> bool {
        self.handles.get(&target).is_some_and(|h| !h.is_finished())
    }

    /// Aborts every timer.
    pub fn shutdown(&mut self) {
        for (target, handle) in self.handles.drain() {
            tracing::debug!(?target, "Stopping poll timer");
            handle.abort();
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.shutdown();
    }
}
