use serde::{Deserialize, Serialize};
use stagewatch::api::{DEFAULT_BASE_PATH, DEFAULT_SERVLET_PATH};
use stagewatch::{Endpoints, PollPolicy, PublishPolicy};
use std::path::Path;
use std::time::Duration;

pub const CONFIG_FILE: &str = "stagewatch.json";
pub const DEFAULT_HOST: &str = "http://localhost:4502";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub host: String,
    pub base_path: String,
    pub servlet_path: String,
    pub timeout_secs: u64,
    pub poll: PollConfig,
    pub publish_policy: PublishPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    pub running_ms: u64,
    pub idle_ms: u64,
    /// Overrides the tiered intervals when set.
    pub fixed_ms: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            base_path: DEFAULT_BASE_PATH.to_string(),
            servlet_path: DEFAULT_SERVLET_PATH.to_string(),
            timeout_secs: 10,
            poll: PollConfig::default(),
            publish_policy: PublishPolicy::Normal,
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            running_ms: 1000,
            idle_ms: 5000,
            fixed_ms: None,
        }
    }
}

impl ClientConfig {
    /// Load from {dir}/stagewatch.json, or from the environment when the file
    /// is missing or unreadable.
    pub fn load_or_default(dir: &Path) -> Self {
        let config_json = dir.join(CONFIG_FILE);

        if config_json.exists() {
            match std::fs::read_to_string(&config_json) {
                Ok(content) => match serde_json::from_str::<ClientConfig>(&content) {
                    Ok(config) => {
                        tracing::info!(
                            "Loaded client config: host={}, timeout={}s",
                            config.host,
                            config.timeout_secs
                        );
                        return config;
                    }
                    Err(e) => {
                        tracing::error!("Failed to parse {}: {}, using defaults", CONFIG_FILE, e);
                    }
                },
                Err(e) => {
                    tracing::error!("Failed to read {}: {}, using defaults", CONFIG_FILE, e);
                }
            }
        }

        Self::from_env()
    }

    /// Environment variables over built-in defaults. Unparseable numbers fall
    /// back to the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let poll = PollConfig {
            running_ms: env_number("STAGEWATCH_POLL_RUNNING_MS").unwrap_or(defaults.poll.running_ms),
            idle_ms: env_number("STAGEWATCH_POLL_IDLE_MS").unwrap_or(defaults.poll.idle_ms),
            fixed_ms: env_number("STAGEWATCH_POLL_FIXED_MS"),
        };
        let publish_policy = match std::env::var("STAGEWATCH_PUBLISH_POLICY") {
            Ok(value) => match value.to_ascii_lowercase().as_str() {
                "observe" => PublishPolicy::Observe,
                "normal" => PublishPolicy::Normal,
                other => {
                    tracing::warn!("Unknown STAGEWATCH_PUBLISH_POLICY {:?}, using normal", other);
                    PublishPolicy::Normal
                }
            },
            Err(_) => defaults.publish_policy,
        };

        Self {
            host: std::env::var("STAGEWATCH_HOST").unwrap_or(defaults.host),
            base_path: std::env::var("STAGEWATCH_BASE_PATH").unwrap_or(defaults.base_path),
            servlet_path: std::env::var("STAGEWATCH_SERVLET_PATH")
                .unwrap_or(defaults.servlet_path),
            timeout_secs: env_number("STAGEWATCH_TIMEOUT_SECS").unwrap_or(defaults.timeout_secs),
            poll,
            publish_policy,
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn endpoints(&self) -> Endpoints {
        Endpoints::new(self.base_path.clone(), self.servlet_path.clone())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn poll_policy(&self) -> PollPolicy {
        match self.poll.fixed_ms {
            Some(ms) => PollPolicy::Fixed(Duration::from_millis(ms.max(1))),
            None => PollPolicy::Tiered {
                running: Duration::from_millis(self.poll.running_ms.max(1)),
                idle: Duration::from_millis(self.poll.idle_ms.max(1)),
            },
        }
    }
}

fn env_number(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
