//! Gateway configuration, read from the environment once at startup.
//!
//! **Environment variables:**
//! - `PORT`: listen port (default: 3000)
//! - `CORS_ORIGIN`: the single origin allowed to call the gateway (default: http://localhost:3000)
//! - `OPENAI_API_KEY`: upstream credential; when unset the chat route answers 500
//! - `OPENAI_MODEL`: upstream model (default: gpt-4o-mini)

use anyhow::{Context, Result};
use axum::http::HeaderValue;
use chat_gateway_shared::DEFAULT_MODEL;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";
pub const UPSTREAM_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const STATIC_DIR: &str = "public";
pub const RATE_LIMIT_MAX: u32 = 60;
pub const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub cors_origin: HeaderValue,
    pub api_key: Option<String>,
    pub model: String,
    pub upstream_url: String,
    pub static_dir: PathBuf,
    pub rate_limit_max: u32,
    pub rate_limit_window: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let port = match lookup("PORT").filter(|raw| !raw.is_empty()) {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("PORT must be a valid port number, got {:?}", raw))?,
            None => DEFAULT_PORT,
        };

        let origin = lookup("CORS_ORIGIN")
            .filter(|origin| !origin.is_empty())
            .unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string());
        let cors_origin = HeaderValue::from_str(&origin)
            .with_context(|| format!("CORS_ORIGIN is not a valid header value: {:?}", origin))?;

        let api_key = lookup("OPENAI_API_KEY").filter(|key| !key.is_empty());
        let model = lookup("OPENAI_MODEL")
            .filter(|model| !model.is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        Ok(Self {
            port,
            cors_origin,
            api_key,
            model,
            ..Self::default()
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            cors_origin: HeaderValue::from_static(DEFAULT_CORS_ORIGIN),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            upstream_url: UPSTREAM_URL.to_string(),
            static_dir: PathBuf::from(STATIC_DIR),
            rate_limit_max: RATE_LIMIT_MAX,
            rate_limit_window: RATE_LIMIT_WINDOW,
        }
    }
}
