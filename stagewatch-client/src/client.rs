use crate::config::ClientConfig;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use stagewatch::{
    CommandAck, Endpoints, ReplicationApi, ReplicationState, Result, StageCommand,
    StageWatchError, StatusSnapshot,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// reqwest transport for one author/publish host.
pub struct HttpReplicationClient {
    host: String,
    endpoints: Endpoints,
    http_client: reqwest::Client,
    last_success: Arc<AtomicU64>, // Unix timestamp in seconds
}

impl HttpReplicationClient {
    pub fn new(host: impl Into<String>, endpoints: Endpoints, timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        let mut host = host.into();
        while host.ends_with('/') {
            host.pop();
        }

        Self {
            host,
            endpoints,
            http_client,
            last_success: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.host.clone(), config.endpoints(), config.timeout())
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// 0 until the first successful request.
    pub fn last_success_timestamp(&self) -> u64 {
        self.last_success.load(Ordering::Relaxed)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.host, path)
    }

    fn mark_success(&self) {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        self.last_success.store(now, Ordering::Relaxed);
    }

    async fn checked(
        &self,
        url: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response> {
        let response = request
            .send()
            .await
            .map_err(|e| StageWatchError::Transport(format!("Request to {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            tracing::debug!("[CLIENT] {} returned {}", url, response.status());
            return Err(StageWatchError::HttpStatus {
                status: response.status(),
                url: url.to_string(),
            });
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        let response = self.checked(&url, self.http_client.get(&url)).await?;
        let value = response
            .json()
            .await
            .map_err(|e| StageWatchError::Json(format!("Failed to parse {}: {}", url, e)))?;
        self.mark_success();
        Ok(value)
    }

    async fn get_text(&self, path: &str) -> Result<String> {
        let url = self.url(path);
        let response = self.checked(&url, self.http_client.get(&url)).await?;
        let text = response
            .text()
            .await
            .map_err(|e| StageWatchError::Transport(format!("Failed to read {}: {}", url, e)))?;
        self.mark_success();
        Ok(text)
    }
}

#[async_trait]
impl ReplicationApi for HttpReplicationClient {
    async fn summary(&self, stage: &str, release_path: &str) -> Result<ReplicationState> {
        self.get_json(&self.endpoints.summary(stage, release_path))
            .await
    }

    async fn status(&self, stage: &str, release_path: &str) -> Result<StatusSnapshot> {
        self.get_json(&self.endpoints.status(stage, release_path))
            .await
    }

    async fn reload_fragment(&self, stage: &str, release_path: &str) -> Result<String> {
        self.get_text(&self.endpoints.reload(stage, release_path))
            .await
    }

    async fn dialog_fragment(&self, stage: &str, release_path: &str) -> Result<String> {
        self.get_text(&self.endpoints.dialog(stage, release_path))
            .await
    }

    async fn command(
        &self,
        command: StageCommand,
        stage: &str,
        release_path: &str,
        release_key: &str,
    ) -> Result<()> {
        let url = self.url(&self.endpoints.command(command, stage, release_path));
        let request = self
            .http_client
            .post(&url)
            .form(&[("releaseKey", release_key)]);
        let response = self.checked(&url, request).await?;

        let body = response
            .text()
            .await
            .map_err(|e| StageWatchError::Transport(format!("Failed to read {}: {}", url, e)))?;
        self.mark_success();

        // The servlet may answer with an empty body on success.
        let ack = if body.trim().is_empty() {
            CommandAck::default()
        } else {
            serde_json::from_str::<CommandAck>(&body)?
        };

        if ack.success {
            tracing::info!("[CLIENT] {} {} {} accepted", command, stage, release_path);
            Ok(())
        } else {
            Err(StageWatchError::Command {
                command: command.to_string(),
                message: ack
                    .summary()
                    .unwrap_or_else(|| "rejected by server".to_string()),
            })
        }
    }
}
