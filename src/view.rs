//! Rendering seams.
//!
//! Monitors never draw. They push state into these traits, which a host
//! (browser bridge, terminal, test recorder) implements. Markup reading and
//! HTML injection live here too, so the monitors stay free of any document
//! model.

use crate::error::Result;
use crate::types::SyncState;
use std::collections::HashMap;
use std::sync::Arc;

/// Localized label lookup. Unknown keys should come back unchanged.
pub trait Labels: Send + Sync {
    fn label(&self, key: &str) -> String;
}

/// Labels that echo their key.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyLabels;

impl Labels for KeyLabels {
    fn label(&self, key: &str) -> String {
        key.to_string()
    }
}

/// Fixed translation table, falling back to the key.
#[derive(Debug, Default, Clone)]
pub struct StaticLabels {
    entries: HashMap<String, String>,
}

impl StaticLabels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }
}

impl Labels for StaticLabels {
    fn label(&self, key: &str) -> String {
        self.entries
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}

/// Compact badge shown outside the status panel.
pub trait BadgeView: Send + Sync {
    fn set_class(&self, class: &str);
    fn set_tooltip(&self, text: &str);
}

/// One row of the process list inside a status panel.
pub trait ProcessView: Send + Sync {
    fn show_state(&self, state: SyncState, label: &str);
    fn show_progress(&self, progress: u8);
    fn show_finished(&self, caption: &str, timestamp: &str);
}

/// Which command button the panel offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelCommand {
    Abort,
    Synchronize,
}

/// Data attributes of a rendered status panel.
#[derive(Clone)]
pub struct PanelMarkup {
    pub release_path: String,
    /// Stage attribute; when empty the stage from the embedded state is used.
    pub stage: String,
    pub release_key: String,
    pub release_label: String,
    /// Base64 JSON [`crate::ReplicationState`].
    pub state: String,
    pub processes: Vec<ProcessMarkup>,
}

/// One process row found in the panel markup.
#[derive(Clone)]
pub struct ProcessMarkup {
    /// Base64 JSON [`crate::ProcessState`].
    pub state: String,
    pub view: Arc<dyn ProcessView>,
}

/// The container a [`crate::ReplicationStatus`] is attached to.
pub trait StatusPanel: Send + Sync {
    /// Read the data attributes of the currently rendered subtree.
    fn markup(&self) -> Result<PanelMarkup>;

    /// Replace the rendered subtree with a server fragment.
    fn replace_content(&self, html: &str) -> Result<()>;

    fn show_state(&self, state: SyncState, label: &str);
    fn show_progress(&self, progress: u8);
    fn show_command(&self, command: PanelCommand);
    fn show_release_label(&self, label: &str);

    /// Degraded-connectivity hint while polling fails.
    fn show_offline(&self, _offline: bool) {}
}

/// Data attributes of a loaded publish dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogMarkup {
    pub target_key: String,
    pub target_label: String,
    pub current_key: Option<String>,
    pub current_label: Option<String>,
}

/// Modal publish/abort dialog.
pub trait DialogView: Send + Sync {
    fn set_action_label(&self, label: &str);
    fn set_abort_visible(&self, visible: bool);
    fn set_abort_enabled(&self, enabled: bool);
    fn set_publish_enabled(&self, enabled: bool);
    /// Swap the footer to a single close button.
    fn show_close_only(&self);
    fn show_error(&self, message: &str);
    fn clear_error(&self);
    fn close(&self);
}

/// Opens modal dialogs from server fragments.
pub trait DialogHost: Send + Sync {
    fn open(&self, html: &str) -> Result<(DialogMarkup, Arc<dyn DialogView>)>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_labels_fall_back_to_key() {
        let labels = StaticLabels::new().with("synchron", "synchronized");
        assert_eq!(labels.label("synchron"), "synchronized");
        assert_eq!(labels.label("running"), "running");
        assert_eq!(KeyLabels.label("finished at"), "finished at");
    }
}
