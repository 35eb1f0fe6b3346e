use crate::types::ReplicationState;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;

/// How long a monitor waits before its next poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollPolicy {
    /// Same interval whatever the state.
    Fixed(Duration),
    /// Poll faster while a replication is running.
    Tiered { running: Duration, idle: Duration },
}

impl Default for PollPolicy {
    fn default() -> Self {
        PollPolicy::Tiered {
            running: Duration::from_secs(1),
            idle: Duration::from_secs(5),
        }
    }
}

impl PollPolicy {
    pub fn interval(&self, running: bool) -> Duration {
        match *self {
            PollPolicy::Fixed(interval) => interval,
            PollPolicy::Tiered { running: fast, idle } => {
                if running {
                    fast
                } else {
                    idle
                }
            }
        }
    }

    /// Interval used after a failed poll.
    pub fn idle_interval(&self) -> Duration {
        self.interval(false)
    }

    /// `None` once the state is terminal.
    pub fn next_poll(&self, state: &ReplicationState) -> Option<Duration> {
        if state.is_terminal() {
            None
        } else {
            Some(self.interval(state.running))
        }
    }
}

/// A widget kept in sync with the server by periodic polling.
#[async_trait]
pub trait PolledMonitor: Send + Sync + 'static {
    fn scheduler(&self) -> &PollScheduler;

    /// Weak handle the timer task upgrades when it fires.
    fn handle(&self) -> Weak<Self>
    where
        Self: Sized;

    /// Delay until the next poll, or `None` when polling should stop.
    fn next_poll(&self) -> Option<Duration>;

    async fn refresh(&self);

    fn stop_refresh(&self) {
        self.scheduler().stop();
    }

    /// Schedule one future `refresh()` unless a timer is already pending or
    /// the current state is terminal.
    fn resume_refresh(&self) -> bool
    where
        Self: Sized,
    {
        match self.next_poll() {
            Some(interval) => self.scheduler().schedule(self.handle(), interval),
            None => false,
        }
    }
}

struct PendingPoll {
    id: u64,
    handle: JoinHandle<()>,
}

/// Owns the single pending poll timer of one monitor.
pub struct PollScheduler {
    policy: PollPolicy,
    pending: Mutex<Option<PendingPoll>>,
    next_id: AtomicU64,
}

impl PollScheduler {
    pub fn new(policy: PollPolicy) -> Self {
        Self {
            policy,
            pending: Mutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    pub fn is_pending(&self) -> bool {
        self.pending.lock().unwrap().is_some()
    }

    /// Spawn a timer that refreshes `monitor` after `interval`.
    ///
    /// Returns false (and spawns nothing) when a timer is already pending.
    pub fn schedule<M: PolledMonitor>(&self, monitor: Weak<M>, interval: Duration) -> bool {
        let mut pending = self.pending.lock().unwrap();
        if pending.is_some() {
            return false;
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(interval).await;
            let Some(monitor) = monitor.upgrade() else {
                return;
            };
            if monitor.scheduler().fire(id) {
                monitor.refresh().await;
            }
        });

        *pending = Some(PendingPoll { id, handle });
        true
    }

    /// Cancel the pending timer, if any. Idempotent.
    pub fn stop(&self) -> bool {
        match self.pending.lock().unwrap().take() {
            Some(poll) => {
                poll.handle.abort();
                true
            }
            None => false,
        }
    }

    /// Called by a timer as it fires: clears the pending marker if it still
    /// belongs to that timer. The running task is detached, not aborted, so
    /// the refresh it drives may call `stop()` safely.
    fn fire(&self, id: u64) -> bool {
        let mut pending = self.pending.lock().unwrap();
        match pending.as_ref() {
            Some(poll) if poll.id == id => {
                *pending = None;
                true
            }
            _ => false,
        }
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        if let Ok(pending) = self.pending.get_mut() {
            if let Some(poll) = pending.take() {
                poll.handle.abort();
            }
        }
    }
}
