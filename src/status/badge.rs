use super::poll::{PollPolicy, PollScheduler, PolledMonitor};
use crate::api::ReplicationApi;
use crate::codec::decode_embedded;
use crate::error::Result;
use crate::types::ReplicationState;
use crate::view::{BadgeView, Labels};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

pub const BADGE_CLASS: &str = "composum-platform-replication-status_badge widget badge badge-pill";

/// Summary-only monitor, e.g. for a navigation bar. No process rows, no
/// listeners.
pub struct StatusBadge {
    this: Weak<StatusBadge>,
    api: Arc<dyn ReplicationApi>,
    view: Arc<dyn BadgeView>,
    labels: Arc<dyn Labels>,
    release_path: String,
    scheduler: PollScheduler,
    state: Mutex<ReplicationState>,
}

impl StatusBadge {
    pub fn new(
        api: Arc<dyn ReplicationApi>,
        view: Arc<dyn BadgeView>,
        labels: Arc<dyn Labels>,
        release_path: impl Into<String>,
        initial: ReplicationState,
        policy: PollPolicy,
    ) -> Arc<Self> {
        let badge = Arc::new_cyclic(|this| StatusBadge {
            this: this.clone(),
            api,
            view,
            labels,
            release_path: release_path.into(),
            scheduler: PollScheduler::new(policy),
            state: Mutex::new(initial),
        });
        badge.resume_refresh();
        badge
    }

    /// Build from the base64 state embedded in the badge element.
    pub fn from_embedded(
        api: Arc<dyn ReplicationApi>,
        view: Arc<dyn BadgeView>,
        labels: Arc<dyn Labels>,
        release_path: impl Into<String>,
        encoded: &str,
        policy: PollPolicy,
    ) -> Result<Arc<Self>> {
        let initial: ReplicationState = decode_embedded(encoded)?;
        Ok(Self::new(api, view, labels, release_path, initial, policy))
    }

    pub fn state(&self) -> ReplicationState {
        self.state.lock().unwrap().clone()
    }

    pub fn stage(&self) -> String {
        self.state.lock().unwrap().stage.clone()
    }

    pub fn release_path(&self) -> &str {
        &self.release_path
    }

    pub fn is_polling(&self) -> bool {
        self.scheduler.is_pending()
    }

    fn render(&self, state: &ReplicationState) {
        self.view
            .set_class(&format!("{} {}", BADGE_CLASS, state.state));
        self.view.set_tooltip(&format!(
            "{}: {}",
            state.stage,
            self.labels.label(state.state.as_str())
        ));
    }
}

#[async_trait]
impl PolledMonitor for StatusBadge {
    fn scheduler(&self) -> &PollScheduler {
        &self.scheduler
    }

    fn handle(&self) -> Weak<Self> {
        self.this.clone()
    }

    fn next_poll(&self) -> Option<Duration> {
        let state = self.state.lock().unwrap();
        self.scheduler.policy().next_poll(&state)
    }

    async fn refresh(&self) {
        self.scheduler.stop();
        let stage = self.stage();

        match self.api.summary(&stage, &self.release_path).await {
            Ok(mut next) => {
                if next.stage.is_empty() {
                    next.stage = stage;
                }
                self.render(&next);
                *self.state.lock().unwrap() = next;
                self.resume_refresh();
            }
            Err(e) => {
                tracing::warn!(
                    "[BADGE {}:{}] summary poll failed: {}",
                    stage,
                    self.release_path,
                    e
                );
                if !self.state.lock().unwrap().is_terminal() {
                    self.scheduler
                        .schedule(self.this.clone(), self.scheduler.policy().idle_interval());
                }
            }
        }
    }
}
