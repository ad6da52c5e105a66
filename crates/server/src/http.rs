//! Boundary Server: route table, auth-gated control endpoints, and router
//! assembly. Ingress-dialect routes live in `ingress::sip_bridge` /
//! `ingress::webhook_stream`; this module owns the routes with no dialect
//! of their own plus the top-level `create_router`.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use telegate_core::ControlPatch;

use crate::auth::check_shared_secret;
use crate::error::ServerError;
use crate::ingress::{now_ms, sip_bridge, webhook_stream};
use crate::state::AppState;

/// Permissive: every route that matters is gated by a shared secret or
/// webhook signature, not by browser same-origin policy.
fn build_cors_layer() -> CorsLayer {
    CorsLayer::permissive()
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn sessions(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.sessions.all())
}

async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.metrics.all())
}

fn authenticate_control(state: &AppState, headers: &HeaderMap) -> Result<(), ServerError> {
    let provided = headers.get("x-control-secret").and_then(|v| v.to_str().ok());
    if check_shared_secret(state.settings.control_api_secret.as_deref(), provided) {
        Ok(())
    } else {
        Err(ServerError::Forbidden)
    }
}

#[derive(Debug, Deserialize)]
struct ControlRequest {
    #[serde(rename = "sessionId")]
    session_id: String,
    #[serde(flatten)]
    patch: ControlPatch,
}

async fn sessions_control(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ControlRequest>,
) -> Result<impl IntoResponse, ServerError> {
    authenticate_control(&state, &headers)?;

    let session = state
        .orchestrator
        .update_session_control(&body.session_id, body.patch, now_ms())
        .ok_or_else(|| ServerError::NotFound(format!("no session {}", body.session_id)))?;

    Ok(Json(session))
}

#[derive(Debug, Deserialize)]
struct CommandRequest {
    text: String,
    #[serde(default)]
    context: serde_json::Value,
}

async fn openclaw_command(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CommandRequest>,
) -> Result<impl IntoResponse, ServerError> {
    authenticate_control(&state, &headers)?;

    let Some(bridge) = &state.bridge else {
        return Err(ServerError::InvalidRequest(
            "no external event bridge configured".to_string(),
        ));
    };
    bridge.send_command(body.text, body.context, crate::ingress::now_ms());

    Ok(Json(serde_json::json!({ "accepted": true })))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", axum::routing::get(health))
        .route("/sessions", axum::routing::get(sessions))
        .route("/metrics", axum::routing::get(metrics))
        .route("/sessions/control", axum::routing::post(sessions_control))
        .route("/openclaw/command", axum::routing::post(openclaw_command))
        .merge(sip_bridge::router())
        .merge(webhook_stream::router())
        .layer(build_cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
