//! HTTP surface forwarding platform events and commands to the kernel.

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::{HeaderName, HeaderValue};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use contracts::{
    ApiError, CharacterRecord, CommandOutcome, CommandPayload, ErrorCode, PlatformEvent, Settings,
    TokenRecord, TurnEntry, SCHEMA_VERSION_V1,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use crate::{CampaignApi, PersistenceError};

include!("error.rs");
include!("state.rs");
include!("routes.rs");

pub async fn serve(
    addr: SocketAddr,
    sqlite_path: PathBuf,
    seed: u64,
) -> Result<(), ServerError> {
    let api = CampaignApi::open(&sqlite_path, seed)?;
    let state = AppState::new(api);
    let app = router(state);

    tracing::info!(%addr, sqlite = %sqlite_path.display(), "initiative api listening");
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/events", post(submit_event))
        .route("/api/v1/commands", post(submit_command))
        .route("/api/v1/turnorder", get(get_turn_order))
        .route("/api/v1/settings", get(get_settings))
        .route("/api/v1/chat", get(get_chat_log))
        .route("/api/v1/tokens", post(upsert_token))
        .route("/api/v1/characters", post(upsert_character))
        .route("/api/v1/page", post(set_active_page))
        .layer(middleware::from_fn(cors_middleware))
        .with_state(state)
}

async fn cors_middleware(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        let mut response = Response::new(axum::body::Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;
        apply_cors_headers(response.headers_mut());
        return response;
    }

    let mut response = next.run(request).await;
    apply_cors_headers(response.headers_mut());
    response
}

fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert(
        HeaderName::from_static("access-control-allow-origin"),
        HeaderValue::from_static("*"),
    );
    headers.insert(
        HeaderName::from_static("access-control-allow-methods"),
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        HeaderName::from_static("access-control-allow-headers"),
        HeaderValue::from_static("content-type"),
    );
}
