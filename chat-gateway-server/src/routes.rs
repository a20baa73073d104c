use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{header, Method, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chat_gateway_shared::HealthResponse;
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::error::GatewayError;
use crate::proxy::{self, ChatProxy};
use crate::rate_limit::{self, RateLimiter};

#[derive(Clone)]
pub struct AppState {
    pub proxy: Arc<ChatProxy>,
}

/// Inbound JSON bodies are capped at 100 kB.
const MAX_BODY_BYTES: usize = 100 * 1024;

/// Layers run outermost first: CORS, tracing, rate limiting, then static files or routes.
pub fn router(config: &Config, limiter: Arc<RateLimiter>) -> Router {
    let state = AppState {
        proxy: Arc::new(ChatProxy::new(config)),
    };

    let cors = CorsLayer::new()
        .allow_origin(config.cors_origin.clone())
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::PATCH,
            Method::POST,
            Method::DELETE,
        ])
        .allow_headers(AllowHeaders::mirror_request());

    let api = Router::new()
        .route("/health", get(health).fallback(not_found))
        .route("/api/chat", post(chat).fallback(not_found))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state);

    // Files in the static directory win; anything else falls through to the routes.
    let static_files = ServeDir::new(&config.static_dir)
        .call_fallback_on_method_not_allowed(true)
        .fallback(api);

    Router::new()
        .fallback_service(static_files)
        .layer(middleware::from_fn_with_state(limiter, rate_limit::enforce))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { ok: true })
}

async fn chat(State(state): State<AppState>, body: Bytes) -> Result<Response, GatewayError> {
    let messages = proxy::parse_messages(&body)?;
    let completion = state.proxy.forward(messages).await?;

    Ok(([(header::CONTENT_TYPE, "application/json")], completion).into_response())
}
