//! Webhook-stream dialect: form-encoded voice webhook plus a JSON-over-
//! WebSocket media stream, as spoken by a cloud telephony provider.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{OriginalUri, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Router;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;

use telegate_core::{AudioEncoding, IncomingCallEvent, IngressSource};
use telegate_pipeline::AudioFrame;

use crate::auth::validate_twilio_signature;
use crate::error::ServerError;
use crate::ingress::now_ms;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/twilio/voice", axum::routing::post(voice))
        .route("/twilio/stream", axum::routing::get(stream))
}

#[derive(Debug, Deserialize)]
struct VoiceForm {
    #[serde(rename = "CallSid")]
    call_sid: String,
    #[serde(rename = "From")]
    from: String,
    #[serde(rename = "To")]
    to: String,
}

async fn voice(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Result<impl IntoResponse, ServerError> {
    if let Some(auth_token) = &state.settings.twilio_auth_token {
        let signature = headers
            .get("x-twilio-signature")
            .and_then(|v| v.to_str().ok())
            .ok_or(ServerError::Forbidden)?;

        let form_params: Vec<(String, String)> = serde_urlencoded::from_bytes(&body)
            .map_err(|_| ServerError::InvalidRequest("invalid_payload".to_string()))?;

        let url = match &state.settings.public_base_url {
            Some(base) => format!("{}{}", base.trim_end_matches('/'), uri.path()),
            None => format!("http://{}{}", headers.get("host").and_then(|h| h.to_str().ok()).unwrap_or(""), uri.path()),
        };

        if !validate_twilio_signature(auth_token, &url, &form_params, signature) {
            return Err(ServerError::Forbidden);
        }
    }

    let form: VoiceForm = serde_urlencoded::from_bytes(&body)
        .map_err(|_| ServerError::InvalidRequest("invalid_payload".to_string()))?;

    let event = IncomingCallEvent {
        source: IngressSource::WebhookStream,
        external_call_id: form.call_sid,
        from: form.from,
        to: form.to,
        received_at_ms: now_ms(),
    };
    let session = state.orchestrator.on_incoming_call(event);

    let xml = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response><Dial>{}</Dial></Response>",
        session.outbound_target
    );

    Ok(([("content-type", "text/xml")], xml))
}

#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
enum StreamMessage {
    Connected,
    Start { start: StartInfo },
    Media { media: MediaInfo },
    Stop,
}

#[derive(Debug, Deserialize)]
struct StartInfo {
    #[serde(rename = "callSid")]
    call_sid: String,
}

#[derive(Debug, Deserialize)]
struct MediaInfo {
    payload: String,
    timestamp: String,
}

async fn stream(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sink, mut receiver) = socket.split();
    let mut session_id: Option<String> = None;

    while let Some(Ok(message)) = receiver.next().await {
        let Message::Text(text) = message else {
            continue;
        };

        let parsed: StreamMessage = match serde_json::from_str(&text) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(error = %e, "dropping malformed media-stream message");
                continue;
            }
        };

        match parsed {
            StreamMessage::Connected => {}
            StreamMessage::Start { start } => {
                let resolved = state
                    .sessions
                    .get_by_external(IngressSource::WebhookStream, &start.call_sid);
                match resolved {
                    Some(session) => session_id = Some(session.id),
                    None => tracing::warn!(
                        call_sid = %start.call_sid,
                        "media stream started for unknown session"
                    ),
                }
            }
            StreamMessage::Media { media } => {
                let Some(session_id) = &session_id else {
                    continue;
                };
                let Ok(payload) = BASE64.decode(&media.payload) else {
                    tracing::warn!("dropping media frame with invalid base64 payload");
                    continue;
                };
                let timestamp_ms = media.timestamp.parse().unwrap_or_else(|_| now_ms());

                let frame = AudioFrame {
                    session_id: session_id.clone(),
                    source: IngressSource::WebhookStream,
                    sample_rate_hz: 8000,
                    encoding: AudioEncoding::Mulaw,
                    timestamp_ms,
                    payload,
                };
                state.orchestrator.on_audio_frame(frame).await;
            }
            StreamMessage::Stop => {
                if let Some(session_id) = &session_id {
                    state.orchestrator.end_session(session_id, now_ms());
                    state.egress.clear(session_id);
                }
                break;
            }
        }
    }

    let _ = sink.send(Message::Close(None)).await;
}
