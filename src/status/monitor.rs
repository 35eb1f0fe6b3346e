use super::dialog::{DialogOptions, PublishDialog, PublishPolicy, PublishTarget};
use super::listeners::{ListenerSet, StatusListener};
use super::poll::{PollPolicy, PollScheduler, PolledMonitor};
use super::process::ProcessSubStatus;
use crate::api::ReplicationApi;
use crate::codec::decode_embedded;
use crate::error::{Result, StageWatchError};
use crate::types::{MonitorIdentity, ReplicationState, StatusSnapshot};
use crate::view::{DialogHost, Labels, PanelCommand, StatusPanel};
use async_trait::async_trait;
use indexmap::IndexMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

/// Construction options for a [`ReplicationStatus`].
#[derive(Clone, Default)]
pub struct StatusOptions {
    pub poll: PollPolicy,
    /// Policy handed to dialogs opened from the panel's command buttons.
    pub publish: PublishPolicy,
    /// Without a dialog host the command buttons fall back to a reload.
    pub dialogs: Option<Arc<dyn DialogHost>>,
}

/// Everything read from one rendering of the panel. Replaced wholesale by
/// `init_content`.
struct StatusContent {
    identity: MonitorIdentity,
    state: ReplicationState,
    processes: IndexMap<String, Arc<ProcessSubStatus>>,
}

enum Reconciliation {
    Applied,
    Stale,
    UnknownProcess(String),
}

/// Status monitor for one release/stage pair.
///
/// Polls the full status resource, reconciles each snapshot against the
/// process rows it knows, and notifies listeners (an open
/// [`PublishDialog`], typically) after every accepted snapshot.
///
/// Every `init_content` bumps an epoch, and so does a reload whose fragment
/// could not be read. A response that comes back after the epoch moved on was issued against a subtree that no longer exists and
/// is dropped.
pub struct ReplicationStatus {
    this: Weak<ReplicationStatus>,
    api: Arc<dyn ReplicationApi>,
    panel: Arc<dyn StatusPanel>,
    labels: Arc<dyn Labels>,
    options: StatusOptions,
    scheduler: PollScheduler,
    listeners: ListenerSet,
    epoch: AtomicU64,
    content: Mutex<StatusContent>,
}

impl ReplicationStatus {
    /// Attach a monitor to a rendered panel and start polling.
    pub fn new(
        api: Arc<dyn ReplicationApi>,
        panel: Arc<dyn StatusPanel>,
        labels: Arc<dyn Labels>,
        options: StatusOptions,
    ) -> Result<Arc<Self>> {
        let content = read_content(panel.as_ref(), &labels)?;
        tracing::info!(
            "[STATUS {}] attached: state={} processes={}",
            content.identity.key(),
            content.state.state,
            content.processes.len()
        );

        let status = Arc::new_cyclic(|this| ReplicationStatus {
            this: this.clone(),
            api,
            panel,
            labels,
            scheduler: PollScheduler::new(options.poll),
            options,
            listeners: ListenerSet::new(),
            epoch: AtomicU64::new(1),
            content: Mutex::new(content),
        });

        status.propagate_refresh();
        status.resume_refresh();
        Ok(status)
    }

    /// Re-read identity, state and process rows from the panel, replacing
    /// everything held before. The single resynchronization point after a
    /// reload.
    ///
    /// On a markup error the previous content is kept and polling resumes
    /// on it.
    pub fn init_content(&self) -> Result<()> {
        self.stop_refresh();

        let content = match read_content(self.panel.as_ref(), &self.labels) {
            Ok(content) => content,
            Err(e) => {
                tracing::error!("[STATUS {}] unreadable panel markup: {}", self.key(), e);
                self.resume_refresh();
                return Err(e);
            }
        };

        let epoch = {
            let mut current = self.content.lock().unwrap();
            *current = content;
            self.epoch.fetch_add(1, Ordering::SeqCst) + 1
        };
        tracing::debug!("[STATUS {}] content initialized, epoch {}", self.key(), epoch);

        self.propagate_refresh();
        self.resume_refresh();
        Ok(())
    }

    /// Fetch a fresh panel fragment, inject it and rebuild from it.
    ///
    /// If the injected markup is unreadable the process rows are dropped,
    /// so the next poll reloads again instead of updating detached rows.
    pub async fn reload(&self) -> Result<()> {
        let identity = self.identity();
        let html = self
            .api
            .reload_fragment(&identity.stage, &identity.release_path)
            .await?;
        self.panel.replace_content(&html)?;
        tracing::info!("[STATUS {}] reloaded", identity.key());
        if let Err(e) = self.init_content() {
            // The old rows went out with the replaced subtree.
            self.detach_rows();
            return Err(e);
        }
        Ok(())
    }

    /// Forget every process row and invalidate in-flight responses. The
    /// next snapshot naming a process then finds it unknown and reloads.
    fn detach_rows(&self) {
        let epoch = {
            let mut content = self.content.lock().unwrap();
            content.processes.clear();
            self.epoch.fetch_add(1, Ordering::SeqCst) + 1
        };
        tracing::debug!("[STATUS {}] process rows detached, epoch {}", self.key(), epoch);
    }

    /// Returns false if the listener was already registered.
    pub fn add_listener(&self, listener: Arc<dyn StatusListener>) -> bool {
        self.listeners.add(listener)
    }

    /// Returns false if the listener was not registered.
    pub fn remove_listener(&self, listener: &Arc<dyn StatusListener>) -> bool {
        self.listeners.remove(listener)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Invoke every listener in registration order.
    pub fn propagate_refresh(&self) {
        for listener in self.listeners.snapshot() {
            listener.status_changed(self);
        }
    }

    /// Abort button. Opens the publish dialog, which owns the command.
    pub async fn abort(&self) -> Result<Option<Arc<PublishDialog>>> {
        self.open_dialog("abort").await
    }

    /// Synchronize button. Opens the publish dialog, which owns the command.
    pub async fn synchronize(&self) -> Result<Option<Arc<PublishDialog>>> {
        self.open_dialog("synchronize").await
    }

    async fn open_dialog(&self, trigger: &str) -> Result<Option<Arc<PublishDialog>>> {
        let Some(host) = self.options.dialogs.clone() else {
            tracing::debug!("[STATUS {}] {} without dialog host, reloading", self.key(), trigger);
            self.reload().await?;
            return Ok(None);
        };
        let Some(status) = self.this.upgrade() else {
            return Ok(None);
        };

        let identity = self.identity();
        let html = self
            .api
            .dialog_fragment(&identity.stage, &identity.release_path)
            .await?;
        let (markup, view) = host.open(&html)?;
        tracing::info!(
            "[STATUS {}] {} dialog opened for release {}",
            identity.key(),
            trigger,
            markup.target_key
        );

        let dialog = PublishDialog::open(
            status,
            PublishTarget::from(markup),
            view,
            DialogOptions {
                policy: self.options.publish,
                reload_on_close: true,
            },
        );
        Ok(Some(dialog))
    }

    /// Display a release label on the panel without touching identity.
    pub fn show_release_label(&self, label: &str) {
        self.panel.show_release_label(label);
    }

    pub fn identity(&self) -> MonitorIdentity {
        self.content.lock().unwrap().identity.clone()
    }

    /// Last accepted aggregate state.
    pub fn state(&self) -> ReplicationState {
        self.content.lock().unwrap().state.clone()
    }

    pub fn process_ids(&self) -> Vec<String> {
        self.content.lock().unwrap().processes.keys().cloned().collect()
    }

    pub fn process(&self, id: &str) -> Option<Arc<ProcessSubStatus>> {
        self.content.lock().unwrap().processes.get(id).cloned()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    pub fn is_polling(&self) -> bool {
        self.scheduler.is_pending()
    }

    pub(crate) fn api(&self) -> Arc<dyn ReplicationApi> {
        Arc::clone(&self.api)
    }

    pub(crate) fn labels(&self) -> Arc<dyn Labels> {
        Arc::clone(&self.labels)
    }

    /// Stop polling and drop all listeners.
    pub fn dispose(&self) {
        self.stop_refresh();
        self.listeners.clear();
    }

    fn key(&self) -> String {
        self.content.lock().unwrap().identity.key()
    }

    fn render_summary(&self, state: &ReplicationState) {
        self.panel
            .show_state(state.state, &self.labels.label(state.state.as_str()));
        self.panel.show_progress(state.progress);
        self.panel.show_command(if state.running {
            PanelCommand::Abort
        } else {
            PanelCommand::Synchronize
        });
    }

    fn reconcile(&self, epoch: u64, snapshot: StatusSnapshot) -> Reconciliation {
        let rows = {
            let mut content = self.content.lock().unwrap();
            if self.epoch.load(Ordering::SeqCst) != epoch {
                return Reconciliation::Stale;
            }

            // Check the whole list first: a reload must find the old rows untouched.
            let mut rows = Vec::with_capacity(snapshot.processes.len());
            for process in &snapshot.processes {
                match content.processes.get(&process.id) {
                    Some(sub) => rows.push(Arc::clone(sub)),
                    None => return Reconciliation::UnknownProcess(process.id.clone()),
                }
            }
            content.state = snapshot.summary.clone();
            rows
        };

        // Views run without the lock; they may read the monitor.
        self.panel.show_offline(false);
        self.render_summary(&snapshot.summary);
        for (sub, process) in rows.iter().zip(&snapshot.processes) {
            sub.refresh(process);
        }
        Reconciliation::Applied
    }

    fn poll_failed(&self, epoch: u64, error: StageWatchError) {
        if self.epoch.load(Ordering::SeqCst) != epoch {
            tracing::debug!("[STATUS {}] ignoring failure of stale poll: {}", self.key(), error);
            return;
        }
        tracing::warn!("[STATUS {}] status poll failed: {}", self.key(), error);
        self.panel.show_offline(true);

        if !self.state().is_terminal() {
            self.scheduler
                .schedule(self.this.clone(), self.scheduler.policy().idle_interval());
        }
    }
}

#[async_trait]
impl PolledMonitor for ReplicationStatus {
    fn scheduler(&self) -> &PollScheduler {
        &self.scheduler
    }

    fn handle(&self) -> Weak<Self> {
        self.this.clone()
    }

    fn next_poll(&self) -> Option<Duration> {
        let state = self.state();
        self.scheduler.policy().next_poll(&state)
    }

    async fn refresh(&self) {
        // A manual refresh replaces whatever timer is pending.
        self.scheduler.stop();

        let epoch = self.epoch();
        let identity = self.identity();
        let snapshot = match self
            .api
            .status(&identity.stage, &identity.release_path)
            .await
        {
            Ok(snapshot) => snapshot,
            Err(e) => {
                self.poll_failed(epoch, e);
                return;
            }
        };

        match self.reconcile(epoch, snapshot) {
            Reconciliation::Applied => {
                self.propagate_refresh();
                self.resume_refresh();
            }
            Reconciliation::Stale => {
                tracing::debug!(
                    "[STATUS {}] discarding response from epoch {}",
                    identity.key(),
                    epoch
                );
            }
            Reconciliation::UnknownProcess(id) => {
                tracing::info!(
                    "[STATUS {}] unknown process {}, reloading panel",
                    identity.key(),
                    id
                );
                if let Err(e) = self.reload().await {
                    self.poll_failed(self.epoch(), e);
                }
            }
        }
    }
}

fn read_content(panel: &dyn StatusPanel, labels: &Arc<dyn Labels>) -> Result<StatusContent> {
    let markup = panel.markup()?;
    if markup.release_path.is_empty() {
        return Err(StageWatchError::Markup("missing release path".to_string()));
    }

    let state: ReplicationState = decode_embedded(&markup.state)?;
    let stage = if markup.stage.is_empty() {
        state.stage.clone()
    } else {
        markup.stage.clone()
    };
    if stage.is_empty() {
        return Err(StageWatchError::Markup(format!(
            "no stage for {}",
            markup.release_path
        )));
    }

    let mut processes = IndexMap::with_capacity(markup.processes.len());
    for row in &markup.processes {
        let process = ProcessSubStatus::from_markup(row, Arc::clone(labels))?;
        processes.insert(process.id().to_string(), Arc::new(process));
    }

    Ok(StatusContent {
        identity: MonitorIdentity {
            release_path: markup.release_path,
            stage,
            release_key: markup.release_key,
            release_label: markup.release_label,
        },
        state,
        processes,
    })
}
