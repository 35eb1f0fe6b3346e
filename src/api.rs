use crate::error::Result;
use crate::types::{ReplicationState, StageCommand, StatusSnapshot};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_PATH: &str = "/libs/composum/platform/services/replication";
pub const DEFAULT_SERVLET_PATH: &str = "/bin/cpm/platform/staging";

/// Path templates for the replication status resources and the staging
/// servlet. Release paths are appended as Sling suffixes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    pub base: String,
    pub servlet: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            base: DEFAULT_BASE_PATH.to_string(),
            servlet: DEFAULT_SERVLET_PATH.to_string(),
        }
    }
}

impl Endpoints {
    pub fn new(base: impl Into<String>, servlet: impl Into<String>) -> Self {
        Self {
            base: trim_trailing_slash(base.into()),
            servlet: trim_trailing_slash(servlet.into()),
        }
    }

    pub fn summary(&self, stage: &str, release_path: &str) -> String {
        format!("{}/status.summary.{}.json{}", self.base, stage, release_path)
    }

    pub fn status(&self, stage: &str, release_path: &str) -> String {
        format!("{}/status.{}.json{}", self.base, stage, release_path)
    }

    pub fn reload(&self, stage: &str, release_path: &str) -> String {
        format!("{}/status.reload.{}.html{}", self.base, stage, release_path)
    }

    pub fn dialog(&self, stage: &str, release_path: &str) -> String {
        format!("{}/dialog.{}.html{}", self.base, stage, release_path)
    }

    pub fn command(&self, command: StageCommand, stage: &str, release_path: &str) -> String {
        let operation = match command {
            StageCommand::Abort => "abortReplication",
            StageCommand::Publish => "stageRelease",
        };
        format!(
            "{}/{}.{}.json{}",
            self.servlet, operation, stage, release_path
        )
    }
}

fn trim_trailing_slash(mut path: String) -> String {
    while path.ends_with('/') {
        path.pop();
    }
    path
}

/// Transport capability the monitors poll and post through.
///
/// Implementations map non-2xx responses to
/// [`crate::StageWatchError::HttpStatus`] and negative command acks to
/// [`crate::StageWatchError::Command`].
#[async_trait]
pub trait ReplicationApi: Send + Sync {
    /// Compact summary, no process breakdown.
    async fn summary(&self, stage: &str, release_path: &str) -> Result<ReplicationState>;

    /// Full status: summary plus every process.
    async fn status(&self, stage: &str, release_path: &str) -> Result<StatusSnapshot>;

    /// HTML fragment that replaces a status panel.
    async fn reload_fragment(&self, stage: &str, release_path: &str) -> Result<String>;

    /// HTML fragment for the publish dialog.
    async fn dialog_fragment(&self, stage: &str, release_path: &str) -> Result<String>;

    async fn command(
        &self,
        command: StageCommand,
        stage: &str,
        release_path: &str,
        release_key: &str,
    ) -> Result<()>;
}
