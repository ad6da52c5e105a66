//! Boundary-level scenarios (S1-S5 from the design notes) driven directly
//! against the axum `Router` with `tower::ServiceExt::oneshot` — no real
//! TCP socket needed. The media-stream WebSocket scenario is exercised
//! separately in `websocket_test.rs`, which `oneshot` cannot drive.

use std::sync::Mutex;

use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use telegate_config::Settings;
use telegate_server::{create_router, AppState};

// Settings::from_env reads process-global state; serialize every test that
// touches it so parallel test threads don't interleave env mutations.
static ENV_LOCK: Mutex<()> = Mutex::new(());

fn build_app(min_frame_interval_ms: Option<&str>) -> axum::Router {
    std::env::set_var("OUTBOUND_TARGET_E164", "+15555550100");
    if let Some(ms) = min_frame_interval_ms {
        std::env::set_var("PIPELINE_MIN_FRAME_INTERVAL_MS", ms);
    }
    std::env::set_var("STUB_STT_TEXT", "hola");

    let settings = Settings::from_env().unwrap();

    std::env::remove_var("OUTBOUND_TARGET_E164");
    std::env::remove_var("PIPELINE_MIN_FRAME_INTERVAL_MS");
    std::env::remove_var("STUB_STT_TEXT");

    let state = AppState::new(settings).unwrap();
    create_router(state)
}

async fn request(
    app: &axum::Router,
    method: &str,
    uri: &str,
    content_type: &str,
    body: impl Into<axum::body::Body>,
) -> (axum::http::StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            axum::http::Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", content_type)
                .body(body.into())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value: Value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

#[tokio::test]
async fn s1_sip_bridge_happy_path() {
    let _guard = ENV_LOCK.lock().unwrap();
    let app = build_app(None);

    let (status, body) = request(
        &app,
        "POST",
        "/asterisk/inbound",
        "application/json",
        r#"{"callId":"sip-1","from":"+15550000001","to":"+18005550199"}"#.to_string(),
    )
    .await;
    assert_eq!(status, axum::http::StatusCode::OK);
    let session_id = body["sessionId"].as_str().unwrap().to_string();
    assert_eq!(body["dialTarget"], "+15555550100");

    let (status, body) = request(
        &app,
        "POST",
        "/asterisk/media",
        "application/json",
        r#"{"callId":"sip-1","sampleRateHz":8000,"encoding":"mulaw","payloadBase64":"AQI="}"#
            .to_string(),
    )
    .await;
    assert_eq!(status, axum::http::StatusCode::ACCEPTED);
    assert_eq!(body["sessionId"], session_id);

    let (status, body) = request(
        &app,
        "GET",
        "/asterisk/egress/next?callId=sip-1",
        "application/json",
        axum::body::Body::empty(),
    )
    .await;
    assert_eq!(status, axum::http::StatusCode::OK);
    assert_eq!(body["encoding"], "pcm_s16le");
    assert_eq!(body["sampleRateHz"], 16000);
    assert!(!body["payloadBase64"].as_str().unwrap().is_empty());

    let (status, _) = request(
        &app,
        "POST",
        "/asterisk/end",
        "application/json",
        r#"{"callId":"sip-1"}"#.to_string(),
    )
    .await;
    assert_eq!(status, axum::http::StatusCode::OK);

    let (_, sessions) = request(
        &app,
        "GET",
        "/sessions",
        "application/json",
        axum::body::Body::empty(),
    )
    .await;
    let sessions = sessions.as_array().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0]["state"], "ended");
}

#[tokio::test]
async fn s2_webhook_dial_returns_dial_xml() {
    let _guard = ENV_LOCK.lock().unwrap();
    let app = build_app(None);

    let response = app
        .oneshot(
            axum::http::Request::builder()
                .method("POST")
                .uri("/twilio/voice")
                .header("content-type", "application/x-www-form-urlencoded")
                .body(axum::body::Body::from(
                    "CallSid=CA_TEST&From=%2B15551234567&To=%2B18005550199",
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), axum::http::StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("<Dial>+15555550100</Dial>"));
}

#[tokio::test]
async fn s3_passthrough_mode_skips_pipeline() {
    let _guard = ENV_LOCK.lock().unwrap();
    let app = build_app(None);

    let (_, body) = request(
        &app,
        "POST",
        "/asterisk/inbound",
        "application/json",
        r#"{"callId":"sip-3","from":"+15550000001","to":"+18005550199"}"#.to_string(),
    )
    .await;
    let session_id = body["sessionId"].as_str().unwrap().to_string();

    let (status, _) = request(
        &app,
        "POST",
        "/sessions/control",
        "application/json",
        format!(r#"{{"sessionId":"{session_id}","mode":"passthrough"}}"#),
    )
    .await;
    assert_eq!(status, axum::http::StatusCode::OK);

    request(
        &app,
        "POST",
        "/asterisk/media",
        "application/json",
        r#"{"callId":"sip-3","sampleRateHz":8000,"encoding":"mulaw","payloadBase64":"AQI="}"#
            .to_string(),
    )
    .await;

    let (status, _) = request(
        &app,
        "GET",
        "/asterisk/egress/next?callId=sip-3",
        "application/json",
        axum::body::Body::empty(),
    )
    .await;
    assert_eq!(status, axum::http::StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn s4_duplicate_handshake_is_idempotent() {
    let _guard = ENV_LOCK.lock().unwrap();
    let app = build_app(None);

    let body = r#"{"callId":"sip-4","from":"+15550000001","to":"+18005550199"}"#.to_string();
    let (_, first) = request(&app, "POST", "/asterisk/inbound", "application/json", body.clone()).await;
    let (_, second) = request(&app, "POST", "/asterisk/inbound", "application/json", body).await;

    assert_eq!(first["sessionId"], second["sessionId"]);

    let (_, sessions) = request(
        &app,
        "GET",
        "/sessions",
        "application/json",
        axum::body::Body::empty(),
    )
    .await;
    assert_eq!(sessions.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn s5_rate_limit_drops_frames_that_arrive_too_soon() {
    let _guard = ENV_LOCK.lock().unwrap();
    let app = build_app(Some("100"));

    let (_, body) = request(
        &app,
        "POST",
        "/asterisk/inbound",
        "application/json",
        r#"{"callId":"sip-5","from":"+15550000001","to":"+18005550199"}"#.to_string(),
    )
    .await;
    let session_id = body["sessionId"].as_str().unwrap().to_string();

    for timestamp_ms in [0u64, 50, 150] {
        request(
            &app,
            "POST",
            "/asterisk/media",
            "application/json",
            format!(
                r#"{{"callId":"sip-5","sampleRateHz":8000,"encoding":"mulaw","payloadBase64":"AQI=","timestampMs":{timestamp_ms}}}"#
            ),
        )
        .await;
    }

    let (_, metrics) = request(
        &app,
        "GET",
        "/metrics",
        "application/json",
        axum::body::Body::empty(),
    )
    .await;
    let session_metrics = &metrics[&session_id];
    assert!(session_metrics["dropped_frames"].as_u64().unwrap_or(0) >= 1);
}

#[tokio::test]
async fn unauthenticated_asterisk_request_is_rejected_when_secret_configured() {
    let _guard = ENV_LOCK.lock().unwrap();
    std::env::set_var("OUTBOUND_TARGET_E164", "+15555550100");
    std::env::set_var("ASTERISK_SHARED_SECRET", "s3cr3t");
    let settings = Settings::from_env().unwrap();
    std::env::remove_var("OUTBOUND_TARGET_E164");
    std::env::remove_var("ASTERISK_SHARED_SECRET");

    let state = AppState::new(settings).unwrap();
    let app = create_router(state);

    let (status, _) = request(
        &app,
        "POST",
        "/asterisk/inbound",
        "application/json",
        r#"{"callId":"sip-6","from":"+15550000001","to":"+18005550199"}"#.to_string(),
    )
    .await;
    assert_eq!(status, axum::http::StatusCode::FORBIDDEN);
}
