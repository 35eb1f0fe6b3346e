use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Format the server uses for every timestamp it renders.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Replication state reported for a release/stage pair or a single process.
///
/// The server also emits `undefined` and `faulty`; they decode as
/// [`SyncState::Idle`] and [`SyncState::Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncState {
    #[serde(alias = "undefined")]
    Idle,
    Running,
    Synchron,
    #[serde(alias = "faulty")]
    Error,
    Aborted,
    /// No release carries the mark for this stage.
    NoRelease,
    /// Replication is switched off in the server configuration.
    SwitchedOff,
}

impl SyncState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncState::Idle => "idle",
            SyncState::Running => "running",
            SyncState::Synchron => "synchron",
            SyncState::Error => "error",
            SyncState::Aborted => "aborted",
            SyncState::NoRelease => "norelease",
            SyncState::SwitchedOff => "switchedoff",
        }
    }

    /// Only a synchronized stage stops polling.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SyncState::Synchron)
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate replication snapshot for one release/stage pair.
///
/// Server-authoritative: the client never derives `progress` itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplicationState {
    pub state: SyncState,
    #[serde(default)]
    pub stage: String,
    #[serde(default, deserialize_with = "clamped_progress")]
    pub progress: u8,
    #[serde(default)]
    pub running: bool,
    #[serde(
        default,
        deserialize_with = "optional_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub finished_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synchronized: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faulty: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub processes: Vec<ProcessState>,
}

impl ReplicationState {
    pub fn new(stage: impl Into<String>, state: SyncState, progress: u8) -> Self {
        Self {
            state,
            stage: stage.into(),
            progress: progress.min(100),
            running: state == SyncState::Running,
            finished_at: None,
            synchronized: None,
            faulty: None,
            processes: Vec::new(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

/// Snapshot of one server-side replication sub-process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessState {
    pub id: String,
    pub state: SyncState,
    #[serde(default, deserialize_with = "clamped_progress")]
    pub progress: u8,
    #[serde(
        default,
        deserialize_with = "optional_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub finished_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(
        default,
        deserialize_with = "optional_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub started_at: Option<String>,
    #[serde(
        default,
        deserialize_with = "optional_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_replication: Option<String>,
}

impl ProcessState {
    pub fn new(id: impl Into<String>, state: SyncState, progress: u8) -> Self {
        Self {
            id: id.into(),
            state,
            progress: progress.min(100),
            finished_at: None,
            title: None,
            enabled: true,
            started_at: None,
            last_replication: None,
        }
    }

    pub fn finished_at(mut self, timestamp: impl Into<String>) -> Self {
        self.finished_at = Some(timestamp.into());
        self
    }

    /// Title shown in the process list; falls back to the id.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.id)
    }

    pub fn finished_time(&self) -> Option<NaiveDateTime> {
        parse_timestamp(self.finished_at.as_deref()?)
    }
}

/// Full status response: aggregate summary plus the per-process breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub summary: ReplicationState,
    #[serde(default)]
    pub processes: Vec<ProcessState>,
}

/// Which release/stage a monitor displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorIdentity {
    pub release_path: String,
    pub stage: String,
    pub release_key: String,
    pub release_label: String,
}

impl MonitorIdentity {
    /// Registry key, `"<stage>:<releasePath>"`.
    pub fn key(&self) -> String {
        monitor_key(&self.stage, &self.release_path)
    }
}

pub fn monitor_key(stage: &str, release_path: &str) -> String {
    format!("{}:{}", stage, release_path)
}

/// Status envelope returned by the staging servlet for commands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandAck {
    #[serde(default = "enabled_by_default")]
    pub success: bool,
    #[serde(default)]
    pub messages: Vec<AckMessage>,
}

impl Default for CommandAck {
    fn default() -> Self {
        Self {
            success: true,
            messages: Vec::new(),
        }
    }
}

impl CommandAck {
    /// Joined text of all messages, or `None` when the server sent none.
    pub fn summary(&self) -> Option<String> {
        let texts: Vec<&str> = self
            .messages
            .iter()
            .map(|m| m.text.as_str())
            .filter(|t| !t.is_empty())
            .collect();
        if texts.is_empty() {
            None
        } else {
            Some(texts.join("; "))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AckMessage {
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub text: String,
}

/// Command posted to the staging servlet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageCommand {
    Abort,
    Publish,
}

impl StageCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageCommand::Abort => "abort",
            StageCommand::Publish => "publish",
        }
    }
}

impl fmt::Display for StageCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).ok()
}

fn enabled_by_default() -> bool {
    true
}

fn clamped_progress<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = i64::deserialize(deserializer)?;
    Ok(raw.clamp(0, 100) as u8)
}

// The server renders a missing timestamp as "".
fn optional_timestamp<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.trim().is_empty()))
}
