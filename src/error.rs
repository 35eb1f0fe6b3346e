use http::StatusCode;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum StageWatchError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Server returned {status} for {url}")]
    HttpStatus { status: StatusCode, url: String },

    #[error("JSON error: {0}")]
    Json(String),

    #[error("Embedded state decode error: {0}")]
    Decode(String),

    #[error("Invalid panel markup: {0}")]
    Markup(String),

    #[error("{command} failed: {message}")]
    Command { command: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(String),
}

pub type Result<T> = std::result::Result<T, StageWatchError>;

impl From<std::io::Error> for StageWatchError {
    fn from(e: std::io::Error) -> Self {
        StageWatchError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for StageWatchError {
    fn from(e: serde_json::Error) -> Self {
        StageWatchError::Json(e.to_string())
    }
}

impl From<base64::DecodeError> for StageWatchError {
    fn from(e: base64::DecodeError) -> Self {
        StageWatchError::Decode(e.to_string())
    }
}

impl StageWatchError {
    /// Polling failures worth retrying on the next tick. Everything else is
    /// a local defect (bad markup, bad payload) that a retry will not fix.
    pub fn is_transient(&self) -> bool {
        match self {
            StageWatchError::Transport(_) => true,
            StageWatchError::HttpStatus { status, .. } => {
                status.is_server_error()
                    || *status == StatusCode::TOO_MANY_REQUESTS
                    || *status == StatusCode::REQUEST_TIMEOUT
            }
            StageWatchError::Json(_) => false,
            StageWatchError::Decode(_) => false,
            StageWatchError::Markup(_) => false,
            StageWatchError::Command { .. } => false,
            StageWatchError::Config(_) => false,
            StageWatchError::Io(_) => true,
        }
    }

    /// Short text suitable for an inline alert in a dialog footer.
    pub fn user_message(&self) -> String {
        match self {
            StageWatchError::Command { message, .. } => message.clone(),
            StageWatchError::HttpStatus { status, .. } => format!(
                "The server rejected the request ({})",
                status.canonical_reason().unwrap_or("error")
            ),
            StageWatchError::Transport(_) => "The server could not be reached".to_string(),
            other => other.to_string(),
        }
    }
}
