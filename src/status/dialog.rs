use super::listeners::StatusListener;
use super::monitor::ReplicationStatus;
use super::poll::PolledMonitor;
use crate::api::ReplicationApi;
use crate::error::{Result, StageWatchError};
use crate::types::StageCommand;
use crate::view::{DialogMarkup, DialogView, Labels};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, Weak};

/// What the dialog does after a successful publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishPolicy {
    /// Close right away.
    #[default]
    Normal,
    /// Stay open read-only and follow the replication through the status.
    Observe,
}

/// Release the dialog publishes, and the release currently on the stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishTarget {
    pub target_key: String,
    pub target_label: String,
    pub current_key: Option<String>,
    pub current_label: Option<String>,
}

impl PublishTarget {
    /// Re-publishing the release already on the stage only synchronizes it.
    pub fn is_synchronize(&self) -> bool {
        self.current_key.as_deref() == Some(self.target_key.as_str())
    }
}

impl From<DialogMarkup> for PublishTarget {
    fn from(markup: DialogMarkup) -> Self {
        Self {
            target_key: markup.target_key,
            target_label: markup.target_label,
            current_key: markup.current_key.filter(|k| !k.is_empty()),
            current_label: markup.current_label.filter(|l| !l.is_empty()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DialogOptions {
    pub policy: PublishPolicy,
    /// Reload the bound status when the dialog closes.
    pub reload_on_close: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DialogPhase {
    Open,
    Observing,
    Closed,
}

/// Modal publish/abort dialog bound to one [`ReplicationStatus`].
///
/// Registers itself as a status listener while open and unregisters on
/// [`PublishDialog::close`]. The status only holds the registration weakly,
/// so dropping the last handle to an open dialog also ends it.
pub struct PublishDialog {
    this: Weak<PublishDialog>,
    status: Arc<ReplicationStatus>,
    api: Arc<dyn ReplicationApi>,
    labels: Arc<dyn Labels>,
    view: Arc<dyn DialogView>,
    target: PublishTarget,
    options: DialogOptions,
    phase: Mutex<DialogPhase>,
}

impl PublishDialog {
    pub fn open(
        status: Arc<ReplicationStatus>,
        target: PublishTarget,
        view: Arc<dyn DialogView>,
        options: DialogOptions,
    ) -> Arc<Self> {
        let dialog = Arc::new_cyclic(|this| PublishDialog {
            this: this.clone(),
            api: status.api(),
            labels: status.labels(),
            status,
            view,
            target,
            options,
            phase: Mutex::new(DialogPhase::Open),
        });

        dialog.view.set_action_label(&dialog.action_label());
        dialog.apply(&dialog.status);
        let listener: Arc<dyn StatusListener> = dialog.clone();
        dialog.status.add_listener(listener);
        dialog
    }

    /// "Synchronize" when the target is already the current release,
    /// "Publish" otherwise.
    pub fn action_label(&self) -> String {
        let key = if self.target.is_synchronize() {
            "Synchronize"
        } else {
            "Publish"
        };
        self.labels.label(key)
    }

    pub fn target(&self) -> &PublishTarget {
        &self.target
    }

    pub fn status(&self) -> &Arc<ReplicationStatus> {
        &self.status
    }

    pub fn is_open(&self) -> bool {
        *self.phase.lock().unwrap() != DialogPhase::Closed
    }

    pub fn is_observing(&self) -> bool {
        *self.phase.lock().unwrap() == DialogPhase::Observing
    }

    /// Post the abort command; on success refresh the bound status.
    pub async fn abort(&self) -> Result<()> {
        self.ensure_accepting(StageCommand::Abort)?;
        self.view.clear_error();
        self.view.set_abort_enabled(false);

        match self.send(StageCommand::Abort).await {
            Ok(()) => {
                self.status.refresh().await;
                // The refresh may fail or come back stale without notifying.
                self.apply(&self.status);
                Ok(())
            }
            Err(e) => {
                self.view.show_error(&e.user_message());
                self.view.set_abort_enabled(true);
                Err(e)
            }
        }
    }

    /// Post the publish command and continue per [`PublishPolicy`].
    pub async fn publish(&self) -> Result<()> {
        self.ensure_accepting(StageCommand::Publish)?;
        self.view.clear_error();
        self.view.set_publish_enabled(false);

        if let Err(e) = self.send(StageCommand::Publish).await {
            self.view.show_error(&e.user_message());
            self.view.set_publish_enabled(true);
            return Err(e);
        }

        match self.options.policy {
            PublishPolicy::Normal => self.close().await,
            PublishPolicy::Observe => {
                *self.phase.lock().unwrap() = DialogPhase::Observing;
                self.view.set_abort_visible(false);
                self.view.show_close_only();
                if let Err(e) = self.status.reload().await {
                    tracing::warn!(
                        "[DIALOG {}] reload after publish failed: {}",
                        self.target.target_key,
                        e
                    );
                    self.view.show_error(&e.user_message());
                }
            }
        }
        Ok(())
    }

    /// Close the dialog and unregister from the status. Idempotent.
    pub async fn close(&self) {
        {
            let mut phase = self.phase.lock().unwrap();
            if *phase == DialogPhase::Closed {
                return;
            }
            *phase = DialogPhase::Closed;
        }

        if let Some(this) = self.this.upgrade() {
            let listener: Arc<dyn StatusListener> = this;
            self.status.remove_listener(&listener);
        }
        self.view.close();
        tracing::debug!("[DIALOG {}] closed", self.target.target_key);

        if self.options.reload_on_close {
            if let Err(e) = self.status.reload().await {
                tracing::warn!(
                    "[DIALOG {}] reload on close failed: {}",
                    self.target.target_key,
                    e
                );
            }
        }
    }

    /// Commands are only posted from an open dialog; an observing dialog
    /// is read-only.
    fn ensure_accepting(&self, command: StageCommand) -> Result<()> {
        if *self.phase.lock().unwrap() == DialogPhase::Open {
            Ok(())
        } else {
            Err(StageWatchError::Command {
                command: command.to_string(),
                message: "dialog is not accepting commands".to_string(),
            })
        }
    }

    async fn send(&self, command: StageCommand) -> Result<()> {
        let identity = self.status.identity();
        let result = self
            .api
            .command(
                command,
                &identity.stage,
                &identity.release_path,
                &self.target.target_key,
            )
            .await;
        match &result {
            Ok(()) => tracing::info!(
                "[DIALOG {}] {} accepted for {}",
                self.target.target_key,
                command,
                identity.key()
            ),
            Err(e) => tracing::warn!(
                "[DIALOG {}] {} failed for {}: {}",
                self.target.target_key,
                command,
                identity.key(),
                e
            ),
        }
        result
    }

    fn apply(&self, status: &ReplicationStatus) {
        let phase = *self.phase.lock().unwrap();
        if phase == DialogPhase::Closed {
            return;
        }
        if let Some(label) = &self.target.current_label {
            status.show_release_label(label);
        }

        if phase == DialogPhase::Observing {
            self.view.set_abort_visible(false);
            self.view.set_publish_enabled(false);
            return;
        }
        let running = status.state().running;
        self.view.set_abort_visible(running);
        self.view.set_abort_enabled(running);
        self.view.set_publish_enabled(!running);
    }
}

impl StatusListener for PublishDialog {
    fn status_changed(&self, status: &ReplicationStatus) {
        self.apply(status);
    }
}
