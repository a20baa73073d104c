use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const MAX_TOKENS: u32 = 512;
pub const TEMPERATURE: f64 = 0.7;

/// The `messages` field of an inbound request: either a full conversation
/// or a bare prompt string.
///
/// Conversation entries are kept as raw JSON and reach the upstream untouched,
/// whatever shape the client gave them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Messages {
    Conversation(Vec<Value>),
    Prompt(String),
}

impl Messages {
    /// Normalizes into the sequence form the upstream expects.
    pub fn into_conversation(self) -> Vec<Value> {
        match self {
            Messages::Conversation(messages) => messages,
            Messages::Prompt(prompt) => vec![json!({ "role": "user", "content": prompt })],
        }
    }
}

/// Request from gateway to the upstream chat-completion API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamPayload {
    pub model: String,
    pub messages: Vec<Value>,
    pub max_tokens: u32,
    pub temperature: f64,
}

impl UpstreamPayload {
    pub fn new(model: impl Into<String>, messages: Messages) -> Self {
        Self {
            model: model.into(),
            messages: messages.into_conversation(),
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
}
