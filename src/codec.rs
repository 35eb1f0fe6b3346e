//! Embedded initial state.
//!
//! Panels, processes and badges carry their first snapshot as base64-encoded
//! JSON in a data attribute, which saves one round trip on first paint. This
//! module is the only place that handles the encoded form.

use crate::error::{Result, StageWatchError};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Decode a base64 JSON payload into a typed value.
pub fn decode_embedded<T: DeserializeOwned>(encoded: &str) -> Result<T> {
    let trimmed = encoded.trim();
    if trimmed.is_empty() {
        return Err(StageWatchError::Decode("empty state payload".to_string()));
    }
    let bytes = BASE64.decode(trimmed)?;
    let value = serde_json::from_slice(&bytes)
        .map_err(|e| StageWatchError::Decode(format!("invalid state JSON: {}", e)))?;
    Ok(value)
}

/// Encode a value the way the server embeds it.
pub fn encode_embedded<T: Serialize>(value: &T) -> Result<String> {
    let json = serde_json::to_vec(value)?;
    Ok(BASE64.encode(json))
}
