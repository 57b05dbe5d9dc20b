//! Callback authentication and payload decoding.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use hn_types::{AlgorithmConfiguration, CallbackError, RuntimeConfiguration};

use crate::secret::IntegrationSecret;

/// Body of a `POST /execute` callback.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteRequest {
    pub key: String,
    /// Base64 of `<candidate> <instance> <seed> <path> [key=value ...]`.
    pub config: String,
}

impl ExecuteRequest {
    /// Build a request the way the target runner does.
    pub fn encode(key: impl Into<String>, payload: &str) -> Self {
        Self {
            key: key.into(),
            config: STANDARD.encode(payload),
        }
    }
}

impl fmt::Debug for ExecuteRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecuteRequest")
            .field("key", &"<redacted>")
            .field("config", &self.config)
            .finish()
    }
}

pub fn authenticate(request: &ExecuteRequest, secret: &IntegrationSecret) -> Result<(), CallbackError> {
    if secret.matches(&request.key) {
        Ok(())
    } else {
        Err(CallbackError::AuthError)
    }
}

/// Decode a base64 payload into a runtime configuration.
pub fn decode(payload: &str) -> Result<RuntimeConfiguration, CallbackError> {
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| malformed(format!("invalid base64: {e}")))?;
    let text = String::from_utf8(bytes).map_err(|e| malformed(format!("invalid UTF-8: {e}")))?;

    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() < 4 {
        return Err(malformed(format!(
            "expected candidate, instance, seed and path, got {} tokens",
            tokens.len()
        )));
    }
    let seed = tokens[2]
        .parse::<u64>()
        .map_err(|e| malformed(format!("invalid seed {:?}: {e}", tokens[2])))?;
    let algorithm =
        AlgorithmConfiguration::parse(&tokens[4..]).map_err(|e| malformed(e.to_string()))?;

    Ok(RuntimeConfiguration::new(
        tokens[0], tokens[1], seed, tokens[3], algorithm,
    ))
}

/// Authenticate, then decode. Nothing is decoded for an unauthenticated request.
pub fn decode_request(
    request: &ExecuteRequest,
    secret: &IntegrationSecret,
) -> Result<RuntimeConfiguration, CallbackError> {
    authenticate(request, secret)?;
    decode(&request.config)
}

fn malformed(message: String) -> CallbackError {
    CallbackError::MalformedCallback { message }
}
