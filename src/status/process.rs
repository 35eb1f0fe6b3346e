use crate::codec::decode_embedded;
use crate::error::Result;
use crate::types::{ProcessState, SyncState};
use crate::view::{Labels, ProcessMarkup, ProcessView};
use std::sync::{Arc, Mutex};

const FINISHED_CAPTION: &str = "finished at";

struct ProcessInner {
    state: ProcessState,
    finished_at: Option<String>,
}

/// Displayed state of one replication sub-process.
pub struct ProcessSubStatus {
    id: String,
    inner: Mutex<ProcessInner>,
    view: Arc<dyn ProcessView>,
    labels: Arc<dyn Labels>,
}

impl ProcessSubStatus {
    pub fn new(initial: ProcessState, view: Arc<dyn ProcessView>, labels: Arc<dyn Labels>) -> Self {
        Self {
            id: initial.id.clone(),
            inner: Mutex::new(ProcessInner {
                finished_at: None,
                state: initial,
            }),
            view,
            labels,
        }
    }

    /// Build from a process row found in the panel markup.
    pub fn from_markup(markup: &ProcessMarkup, labels: Arc<dyn Labels>) -> Result<Self> {
        let initial: ProcessState = decode_embedded(&markup.state)?;
        Ok(Self::new(initial, Arc::clone(&markup.view), labels))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> ProcessState {
        self.inner.lock().unwrap().state.clone()
    }

    /// Finish timestamp captured on the last transition into `synchron`.
    pub fn finished_at(&self) -> Option<String> {
        self.inner.lock().unwrap().finished_at.clone()
    }

    /// Apply a new snapshot. Returns true when this snapshot completed the
    /// process, i.e. moved it into `synchron` from any other state.
    pub fn refresh(&self, next: &ProcessState) -> bool {
        let finished = {
            let mut inner = self.inner.lock().unwrap();
            let finished =
                next.state == SyncState::Synchron && inner.state.state != SyncState::Synchron;
            if finished {
                inner.finished_at = next.finished_at.clone();
            }
            inner.state = next.clone();
            finished
        };

        self.view
            .show_state(next.state, &self.labels.label(next.state.as_str()));
        self.view.show_progress(next.progress);
        if finished {
            let timestamp = next.finished_at.as_deref().unwrap_or_default();
            self.view
                .show_finished(&self.labels.label(FINISHED_CAPTION), timestamp);
            tracing::debug!("[PROCESS {}] finished at {}", self.id, timestamp);
        }
        finished
    }
}
