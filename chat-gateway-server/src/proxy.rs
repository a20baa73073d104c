use axum::body::Bytes;
use chat_gateway_shared::{Messages, UpstreamPayload};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::GatewayError;

/// Forwards chat requests to the upstream completion API with the server-held key.
pub struct ChatProxy {
    client: reqwest::Client,
    upstream_url: String,
    api_key: Option<String>,
    model: String,
}

impl ChatProxy {
    pub fn new(config: &Config) -> Self {
        // No request timeout: a hung upstream keeps the client request open.
        Self {
            client: reqwest::Client::new(),
            upstream_url: config.upstream_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }

    /// Sends one completion request upstream and returns its body untouched on success.
    pub async fn forward(&self, messages: Messages) -> Result<Bytes, GatewayError> {
        let api_key = self.api_key.as_deref().ok_or(GatewayError::MissingApiKey)?;

        let payload = UpstreamPayload::new(&self.model, messages);
        debug!(
            "Forwarding {} message(s) to {} using model {}",
            payload.messages.len(),
            self.upstream_url,
            payload.model
        );

        let response = self
            .client
            .post(&self.upstream_url)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        let data: Value = serde_json::from_slice(&body).map_err(GatewayError::MalformedUpstream)?;

        if !status.is_success() {
            let message = upstream_error_message(&data, &body);
            warn!("Upstream rejected request with {}: {}", status, message);
            return Err(GatewayError::Upstream { status, message });
        }

        Ok(body)
    }
}

/// Extracts `messages` from an inbound body.
///
/// An empty body reads as `{}`. Missing, `null`, `false`, `0` and `""` all count as absent.
/// Arrays pass through as they are; other scalars become a prompt in their text form.
pub fn parse_messages(body: &[u8]) -> Result<Messages, GatewayError> {
    let mut value: Value = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Object(Default::default())
    } else {
        serde_json::from_slice(body).map_err(GatewayError::InvalidJson)?
    };

    let messages = match value.get_mut("messages").map(Value::take) {
        Some(messages) if !is_absent(&messages) => messages,
        _ => return Err(GatewayError::MissingMessages),
    };

    match messages {
        Value::Array(items) => Ok(Messages::Conversation(items)),
        Value::String(prompt) => Ok(Messages::Prompt(prompt)),
        Value::Number(n) => Ok(Messages::Prompt(n.to_string())),
        Value::Bool(flag) => Ok(Messages::Prompt(flag.to_string())),
        Value::Object(_) => Err(GatewayError::InvalidMessages),
        Value::Null => Err(GatewayError::MissingMessages),
    }
}

fn is_absent(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Uses the provider's `error.message` when present, otherwise the raw body as text.
fn upstream_error_message(data: &Value, raw: &[u8]) -> String {
    match data.pointer("/error/message").and_then(Value::as_str) {
        Some(message) if !message.is_empty() => message.to_string(),
        _ => String::from_utf8_lossy(raw).into_owned(),
    }
}
