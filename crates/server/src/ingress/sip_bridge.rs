//! SIP-bridge dialect: JSON over HTTP, as spoken by an Asterisk-class PBX.

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::{Json, Router};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};

use telegate_core::{AudioEncoding, IncomingCallEvent, IngressSource};
use telegate_pipeline::AudioFrame;

use crate::auth::check_shared_secret;
use crate::error::ServerError;
use crate::ingress::now_ms;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/asterisk/inbound", axum::routing::post(inbound))
        .route("/asterisk/media", axum::routing::post(media))
        .route("/asterisk/end", axum::routing::post(end))
        .route("/asterisk/egress/next", axum::routing::get(egress_next))
}

fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<(), ServerError> {
    let provided = headers
        .get("x-asterisk-secret")
        .and_then(|v| v.to_str().ok());
    if check_shared_secret(state.settings.asterisk_shared_secret.as_deref(), provided) {
        Ok(())
    } else {
        Err(ServerError::Forbidden)
    }
}

#[derive(Debug, Deserialize)]
struct InboundRequest {
    #[serde(rename = "callId")]
    call_id: String,
    from: String,
    to: String,
}

#[derive(Debug, Serialize)]
struct InboundResponse {
    #[serde(rename = "sessionId")]
    session_id: String,
    #[serde(rename = "dialTarget")]
    dial_target: String,
}

async fn inbound(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<InboundRequest>,
) -> Result<impl IntoResponse, ServerError> {
    authenticate(&state, &headers)?;

    let event = IncomingCallEvent {
        source: IngressSource::SipBridge,
        external_call_id: body.call_id,
        from: body.from,
        to: body.to,
        received_at_ms: now_ms(),
    };
    let session = state.orchestrator.on_incoming_call(event);

    Ok(Json(InboundResponse {
        session_id: session.id,
        dial_target: session.outbound_target,
    }))
}

#[derive(Debug, Deserialize)]
struct MediaRequest {
    #[serde(rename = "callId")]
    call_id: String,
    #[serde(rename = "sampleRateHz")]
    sample_rate_hz: u32,
    encoding: AudioEncoding,
    #[serde(rename = "payloadBase64")]
    payload_base64: String,
    #[serde(rename = "timestampMs")]
    timestamp_ms: Option<u64>,
}

#[derive(Debug, Serialize)]
struct MediaResponse {
    accepted: bool,
    #[serde(rename = "sessionId")]
    session_id: String,
}

async fn media(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<MediaRequest>,
) -> Result<impl IntoResponse, ServerError> {
    authenticate(&state, &headers)?;

    let session = state
        .sessions
        .get_by_external(IngressSource::SipBridge, &body.call_id)
        .ok_or_else(|| ServerError::NotFound(format!("no session for call {}", body.call_id)))?;

    let payload = BASE64
        .decode(&body.payload_base64)
        .map_err(|_| ServerError::InvalidRequest("payloadBase64 is not valid base64".to_string()))?;

    let frame = AudioFrame {
        session_id: session.id.clone(),
        source: IngressSource::SipBridge,
        sample_rate_hz: body.sample_rate_hz,
        encoding: body.encoding,
        timestamp_ms: body.timestamp_ms.unwrap_or_else(now_ms),
        payload,
    };
    state.orchestrator.on_audio_frame(frame).await;

    Ok((
        axum::http::StatusCode::ACCEPTED,
        Json(MediaResponse {
            accepted: true,
            session_id: session.id,
        }),
    ))
}

#[derive(Debug, Deserialize)]
struct EndRequest {
    #[serde(rename = "callId")]
    call_id: Option<String>,
    #[serde(rename = "sessionId")]
    session_id: Option<String>,
}

async fn end(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<EndRequest>,
) -> Result<impl IntoResponse, ServerError> {
    authenticate(&state, &headers)?;

    let session_id = resolve_session_id(&state, body.session_id, body.call_id)?;

    state.orchestrator.end_session(&session_id, now_ms());
    state.egress.clear(&session_id);

    Ok(Json(serde_json::json!({ "sessionId": session_id })))
}

fn resolve_session_id(
    state: &AppState,
    session_id: Option<String>,
    call_id: Option<String>,
) -> Result<String, ServerError> {
    if let Some(id) = session_id {
        return Ok(id);
    }
    let call_id = call_id
        .ok_or_else(|| ServerError::InvalidRequest("either sessionId or callId is required".to_string()))?;
    state
        .sessions
        .get_by_external(IngressSource::SipBridge, &call_id)
        .map(|s| s.id)
        .ok_or_else(|| ServerError::NotFound(format!("no session for call {call_id}")))
}

#[derive(Debug, Deserialize)]
struct EgressQuery {
    #[serde(rename = "callId")]
    call_id: String,
}

#[derive(Debug, Serialize)]
struct EgressResponse {
    #[serde(rename = "sessionId")]
    session_id: String,
    encoding: AudioEncoding,
    #[serde(rename = "sampleRateHz")]
    sample_rate_hz: u32,
    #[serde(rename = "timestampMs")]
    timestamp_ms: u64,
    #[serde(rename = "payloadBase64")]
    payload_base64: String,
    #[serde(rename = "remainingQueue")]
    remaining_queue: usize,
}

async fn egress_next(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<EgressQuery>,
) -> Result<impl IntoResponse, ServerError> {
    authenticate(&state, &headers)?;

    let session = state
        .sessions
        .get_by_external(IngressSource::SipBridge, &query.call_id)
        .ok_or_else(|| ServerError::NotFound(format!("no session for call {}", query.call_id)))?;

    let response = match state.egress.dequeue(&session.id) {
        Some(chunk) => {
            let body = EgressResponse {
                session_id: session.id.clone(),
                encoding: chunk.encoding,
                sample_rate_hz: chunk.sample_rate_hz,
                timestamp_ms: chunk.timestamp_ms,
                payload_base64: BASE64.encode(&chunk.payload),
                remaining_queue: state.egress.size(&session.id),
            };
            (axum::http::StatusCode::OK, Json(body)).into_response()
        }
        None => axum::http::StatusCode::NO_CONTENT.into_response(),
    };

    Ok(response)
}
