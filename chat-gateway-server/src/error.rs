use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chat_gateway_shared::ErrorBody;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid JSON body")]
    InvalidJson(#[source] serde_json::Error),

    #[error("messages required in body")]
    MissingMessages,

    #[error("messages must be an array, a string, a number or a boolean")]
    InvalidMessages,

    #[error("Server configuration error: API key missing")]
    MissingApiKey,

    /// The upstream answered with a non-success status.
    #[error("{message}")]
    Upstream { status: StatusCode, message: String },

    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("upstream returned malformed JSON: {0}")]
    MalformedUpstream(#[source] serde_json::Error),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::InvalidJson(_)
            | GatewayError::MissingMessages
            | GatewayError::InvalidMessages => StatusCode::BAD_REQUEST,
            GatewayError::MissingApiKey => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::Upstream { status, .. } => *status,
            GatewayError::Transport(_) | GatewayError::MalformedUpstream(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message shown to the client. Transport and parse faults stay server-side.
    fn public_message(&self) -> String {
        match self {
            GatewayError::Transport(_) | GatewayError::MalformedUpstream(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        match &self {
            GatewayError::Transport(_) | GatewayError::MalformedUpstream(_) => {
                error!("Server error: {}", self);
            }
            GatewayError::MissingApiKey => {
                error!("OPENAI_API_KEY not set; rejecting chat request");
            }
            _ => {}
        }

        (self.status(), Json(ErrorBody::new(self.public_message()))).into_response()
    }
}
