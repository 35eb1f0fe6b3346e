#![allow(dead_code)]

use async_trait::async_trait;
use stagewatch::codec::encode_embedded;
use stagewatch::view::{
    BadgeView, DialogHost, DialogMarkup, DialogView, PanelCommand, PanelMarkup, ProcessMarkup,
    ProcessView, StatusPanel,
};
use stagewatch::{
    ProcessState, ReplicationApi, ReplicationState, ReplicationStatus, Result, StageCommand,
    StageWatchError, StatusListener, StatusSnapshot, SyncState,
};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::oneshot;

pub const STAGE: &str = "public";
pub const RELEASE_PATH: &str = "/content/sites/demo";

/// Scripted transport. Responses are consumed in order; an empty queue
/// answers with a transport error.
#[derive(Default)]
pub struct FakeApi {
    pub summaries: Mutex<VecDeque<Result<ReplicationState>>>,
    pub statuses: Mutex<VecDeque<Result<StatusSnapshot>>>,
    pub reloads: Mutex<VecDeque<Result<String>>>,
    pub dialog_html: Mutex<String>,
    pub command_results: Mutex<VecDeque<Result<()>>>,
    pub commands: Mutex<Vec<(StageCommand, String, String, String)>>,
    pub calls: Mutex<Vec<String>>,
    /// When set, the next `status` call waits for this signal after taking
    /// its scripted response.
    pub status_gate: Mutex<Option<oneshot::Receiver<()>>>,
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_summary(&self, state: ReplicationState) {
        self.summaries.lock().unwrap().push_back(Ok(state));
    }

    pub fn push_status(&self, snapshot: StatusSnapshot) {
        self.statuses.lock().unwrap().push_back(Ok(snapshot));
    }

    pub fn push_status_error(&self, error: StageWatchError) {
        self.statuses.lock().unwrap().push_back(Err(error));
    }

    pub fn push_reload(&self, html: &str) {
        self.reloads.lock().unwrap().push_back(Ok(html.to_string()));
    }

    pub fn push_command_result(&self, result: Result<()>) {
        self.command_results.lock().unwrap().push_back(result);
    }

    pub fn gate_next_status(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.status_gate.lock().unwrap() = Some(rx);
        tx
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == call).count()
    }

    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }
}

fn unscripted(call: &str) -> StageWatchError {
    StageWatchError::Transport(format!("no scripted {} response", call))
}

#[async_trait]
impl ReplicationApi for FakeApi {
    async fn summary(&self, _stage: &str, _release_path: &str) -> Result<ReplicationState> {
        self.record("summary");
        let next = self.summaries.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Err(unscripted("summary")))
    }

    async fn status(&self, _stage: &str, _release_path: &str) -> Result<StatusSnapshot> {
        self.record("status");
        let next = self.statuses.lock().unwrap().pop_front();
        let gate = self.status_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        next.unwrap_or_else(|| Err(unscripted("status")))
    }

    async fn reload_fragment(&self, _stage: &str, _release_path: &str) -> Result<String> {
        self.record("reload");
        let next = self.reloads.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Err(unscripted("reload")))
    }

    async fn dialog_fragment(&self, _stage: &str, _release_path: &str) -> Result<String> {
        self.record("dialog");
        Ok(self.dialog_html.lock().unwrap().clone())
    }

    async fn command(
        &self,
        command: StageCommand,
        stage: &str,
        release_path: &str,
        release_key: &str,
    ) -> Result<()> {
        self.record(command.as_str());
        self.commands.lock().unwrap().push((
            command,
            stage.to_string(),
            release_path.to_string(),
            release_key.to_string(),
        ));
        let next = self.command_results.lock().unwrap().pop_front();
        next.unwrap_or(Ok(()))
    }
}

#[derive(Default)]
pub struct RecordingProcess {
    pub states: Mutex<Vec<SyncState>>,
    pub progress: Mutex<Vec<u8>>,
    pub finished: Mutex<Vec<String>>,
}

impl ProcessView for RecordingProcess {
    fn show_state(&self, state: SyncState, _label: &str) {
        self.states.lock().unwrap().push(state);
    }

    fn show_progress(&self, progress: u8) {
        self.progress.lock().unwrap().push(progress);
    }

    fn show_finished(&self, _caption: &str, timestamp: &str) {
        self.finished.lock().unwrap().push(timestamp.to_string());
    }
}

/// A rendered panel plus the process views it contains.
pub struct PanelFixture {
    pub markup: PanelMarkup,
    pub processes: HashMap<String, Arc<RecordingProcess>>,
}

pub fn panel_fixture(state: &ReplicationState, processes: &[ProcessState]) -> PanelFixture {
    let mut rows = Vec::new();
    let mut views = HashMap::new();
    for process in processes {
        let view = Arc::new(RecordingProcess::default());
        views.insert(process.id.clone(), Arc::clone(&view));
        rows.push(ProcessMarkup {
            state: encode_embedded(process).unwrap(),
            view: view as Arc<dyn ProcessView>,
        });
    }
    PanelFixture {
        markup: PanelMarkup {
            release_path: RELEASE_PATH.to_string(),
            stage: STAGE.to_string(),
            release_key: "r1".to_string(),
            release_label: "Release 1".to_string(),
            state: encode_embedded(state).unwrap(),
            processes: rows,
        },
        processes: views,
    }
}

pub struct RecordingPanel {
    pub markup: Mutex<PanelMarkup>,
    /// HTML fragment → markup it renders to after injection.
    pub fragments: Mutex<HashMap<String, PanelMarkup>>,
    pub states: Mutex<Vec<SyncState>>,
    pub progress: Mutex<Vec<u8>>,
    pub commands: Mutex<Vec<PanelCommand>>,
    pub release_labels: Mutex<Vec<String>>,
    pub offline: Mutex<Vec<bool>>,
    pub replaced: Mutex<Vec<String>>,
}

impl RecordingPanel {
    pub fn new(markup: PanelMarkup) -> Arc<Self> {
        Arc::new(Self {
            markup: Mutex::new(markup),
            fragments: Mutex::new(HashMap::new()),
            states: Mutex::new(Vec::new()),
            progress: Mutex::new(Vec::new()),
            commands: Mutex::new(Vec::new()),
            release_labels: Mutex::new(Vec::new()),
            offline: Mutex::new(Vec::new()),
            replaced: Mutex::new(Vec::new()),
        })
    }

    pub fn add_fragment(&self, html: &str, markup: PanelMarkup) {
        self.fragments
            .lock()
            .unwrap()
            .insert(html.to_string(), markup);
    }

    pub fn last_progress(&self) -> Option<u8> {
        self.progress.lock().unwrap().last().copied()
    }

    pub fn last_command(&self) -> Option<PanelCommand> {
        self.commands.lock().unwrap().last().copied()
    }
}

impl StatusPanel for RecordingPanel {
    fn markup(&self) -> Result<PanelMarkup> {
        Ok(self.markup.lock().unwrap().clone())
    }

    fn replace_content(&self, html: &str) -> Result<()> {
        let next = self
            .fragments
            .lock()
            .unwrap()
            .get(html)
            .cloned()
            .ok_or_else(|| StageWatchError::Markup(format!("unknown fragment {}", html)))?;
        *self.markup.lock().unwrap() = next;
        self.replaced.lock().unwrap().push(html.to_string());
        Ok(())
    }

    fn show_state(&self, state: SyncState, _label: &str) {
        self.states.lock().unwrap().push(state);
    }

    fn show_progress(&self, progress: u8) {
        self.progress.lock().unwrap().push(progress);
    }

    fn show_command(&self, command: PanelCommand) {
        self.commands.lock().unwrap().push(command);
    }

    fn show_release_label(&self, label: &str) {
        self.release_labels.lock().unwrap().push(label.to_string());
    }

    fn show_offline(&self, offline: bool) {
        self.offline.lock().unwrap().push(offline);
    }
}

/// Panel that reads its monitor back while rendering, the way a host
/// view refreshing a caption from the monitor would.
pub struct ReadingPanel {
    pub inner: Arc<RecordingPanel>,
    pub status: Mutex<Weak<ReplicationStatus>>,
    /// (release path, state) seen from inside `show_progress`.
    pub seen: Mutex<Vec<(String, SyncState)>>,
}

impl ReadingPanel {
    pub fn new(markup: PanelMarkup) -> Arc<Self> {
        Arc::new(Self {
            inner: RecordingPanel::new(markup),
            status: Mutex::new(Weak::new()),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn bind(&self, status: &Arc<ReplicationStatus>) {
        *self.status.lock().unwrap() = Arc::downgrade(status);
    }
}

impl StatusPanel for ReadingPanel {
    fn markup(&self) -> Result<PanelMarkup> {
        self.inner.markup()
    }

    fn replace_content(&self, html: &str) -> Result<()> {
        self.inner.replace_content(html)
    }

    fn show_state(&self, state: SyncState, label: &str) {
        self.inner.show_state(state, label);
    }

    fn show_progress(&self, progress: u8) {
        let status = self.status.lock().unwrap().upgrade();
        if let Some(status) = status {
            let identity = status.identity();
            self.seen
                .lock()
                .unwrap()
                .push((identity.release_path, status.state().state));
        }
        self.inner.show_progress(progress);
    }

    fn show_command(&self, command: PanelCommand) {
        self.inner.show_command(command);
    }

    fn show_release_label(&self, label: &str) {
        self.inner.show_release_label(label);
    }

    fn show_offline(&self, offline: bool) {
        self.inner.show_offline(offline);
    }
}

pub struct RecordingDialog {
    pub action_label: Mutex<String>,
    pub abort_visible: Mutex<bool>,
    pub abort_enabled: Mutex<bool>,
    pub publish_enabled: Mutex<bool>,
    pub close_only: Mutex<bool>,
    pub errors: Mutex<Vec<String>>,
    pub closed: Mutex<bool>,
}

impl RecordingDialog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            action_label: Mutex::new(String::new()),
            abort_visible: Mutex::new(true),
            abort_enabled: Mutex::new(true),
            publish_enabled: Mutex::new(true),
            close_only: Mutex::new(false),
            errors: Mutex::new(Vec::new()),
            closed: Mutex::new(false),
        })
    }

    pub fn publish_enabled(&self) -> bool {
        *self.publish_enabled.lock().unwrap()
    }

    pub fn abort_visible(&self) -> bool {
        *self.abort_visible.lock().unwrap()
    }

    pub fn abort_enabled(&self) -> bool {
        *self.abort_enabled.lock().unwrap()
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.lock().unwrap()
    }
}

impl DialogView for RecordingDialog {
    fn set_action_label(&self, label: &str) {
        *self.action_label.lock().unwrap() = label.to_string();
    }

    fn set_abort_visible(&self, visible: bool) {
        *self.abort_visible.lock().unwrap() = visible;
    }

    fn set_abort_enabled(&self, enabled: bool) {
        *self.abort_enabled.lock().unwrap() = enabled;
    }

    fn set_publish_enabled(&self, enabled: bool) {
        *self.publish_enabled.lock().unwrap() = enabled;
    }

    fn show_close_only(&self) {
        *self.close_only.lock().unwrap() = true;
    }

    fn show_error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }

    fn clear_error(&self) {}

    fn close(&self) {
        *self.closed.lock().unwrap() = true;
    }
}

pub struct FakeDialogHost {
    pub markup: DialogMarkup,
    pub view: Arc<RecordingDialog>,
    pub opened: Mutex<Vec<String>>,
}

impl FakeDialogHost {
    pub fn new(target_key: &str, current_key: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            markup: DialogMarkup {
                target_key: target_key.to_string(),
                target_label: format!("Release {}", target_key),
                current_key: current_key.map(str::to_string),
                current_label: current_key.map(|k| format!("Release {}", k)),
            },
            view: RecordingDialog::new(),
            opened: Mutex::new(Vec::new()),
        })
    }
}

impl DialogHost for FakeDialogHost {
    fn open(&self, html: &str) -> Result<(DialogMarkup, Arc<dyn DialogView>)> {
        self.opened.lock().unwrap().push(html.to_string());
        let view: Arc<dyn DialogView> = self.view.clone();
        Ok((self.markup.clone(), view))
    }
}

#[derive(Default)]
pub struct RecordingBadge {
    pub classes: Mutex<Vec<String>>,
    pub tooltips: Mutex<Vec<String>>,
}

impl BadgeView for RecordingBadge {
    fn set_class(&self, class: &str) {
        self.classes.lock().unwrap().push(class.to_string());
    }

    fn set_tooltip(&self, text: &str) {
        self.tooltips.lock().unwrap().push(text.to_string());
    }
}

/// Listener that appends its name to a shared log on every notification.
pub struct NamedListener {
    pub name: String,
    pub log: Arc<Mutex<Vec<String>>>,
}

impl StatusListener for NamedListener {
    fn status_changed(&self, status: &ReplicationStatus) {
        self.log
            .lock()
            .unwrap()
            .push(format!("{}:{}", self.name, status.state().progress));
    }
}

pub fn summary(state: SyncState, progress: u8) -> ReplicationState {
    ReplicationState::new(STAGE, state, progress)
}

pub fn snapshot(state: SyncState, progress: u8, processes: Vec<ProcessState>) -> StatusSnapshot {
    StatusSnapshot {
        summary: summary(state, progress),
        processes,
    }
}
