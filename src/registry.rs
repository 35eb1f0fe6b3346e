use crate::status::{PolledMonitor, ReplicationStatus, StatusBadge};
use crate::types::monitor_key;
use dashmap::DashMap;
use std::sync::Arc;

/// Live monitors of one page or session, keyed by `"<stage>:<releasePath>"`.
///
/// Handed around by reference; there is no process-wide instance.
#[derive(Default)]
pub struct WidgetRegistry {
    statuses: DashMap<String, Arc<ReplicationStatus>>,
    badges: DashMap<String, Arc<StatusBadge>>,
}

impl WidgetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a status monitor. A monitor already registered for the same
    /// release/stage is disposed and returned.
    pub fn register_status(&self, status: Arc<ReplicationStatus>) -> Option<Arc<ReplicationStatus>> {
        let key = status.identity().key();
        let previous = self.statuses.insert(key.clone(), status);
        if let Some(old) = &previous {
            tracing::debug!("[REGISTRY] replacing status monitor {}", key);
            old.dispose();
        }
        previous
    }

    pub fn status(&self, stage: &str, release_path: &str) -> Option<Arc<ReplicationStatus>> {
        self.statuses
            .get(&monitor_key(stage, release_path))
            .map(|entry| Arc::clone(entry.value()))
    }

    pub fn remove_status(&self, stage: &str, release_path: &str) -> Option<Arc<ReplicationStatus>> {
        let (_, status) = self.statuses.remove(&monitor_key(stage, release_path))?;
        status.dispose();
        Some(status)
    }

    /// Register a badge, stopping any badge it replaces.
    pub fn register_badge(&self, badge: Arc<StatusBadge>) -> Option<Arc<StatusBadge>> {
        let key = monitor_key(&badge.stage(), badge.release_path());
        let previous = self.badges.insert(key, badge);
        if let Some(old) = &previous {
            old.stop_refresh();
        }
        previous
    }

    pub fn badge(&self, stage: &str, release_path: &str) -> Option<Arc<StatusBadge>> {
        self.badges
            .get(&monitor_key(stage, release_path))
            .map(|entry| Arc::clone(entry.value()))
    }

    pub fn remove_badge(&self, stage: &str, release_path: &str) -> Option<Arc<StatusBadge>> {
        let (_, badge) = self.badges.remove(&monitor_key(stage, release_path))?;
        badge.stop_refresh();
        Some(badge)
    }

    pub fn len(&self) -> usize {
        self.statuses.len() + self.badges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stop every monitor and forget them.
    pub fn shutdown(&self) {
        for entry in self.statuses.iter() {
            entry.value().dispose();
        }
        for entry in self.badges.iter() {
            entry.value().stop_refresh();
        }
        self.statuses.clear();
        self.badges.clear();
        tracing::debug!("[REGISTRY] all monitors stopped");
    }
}
