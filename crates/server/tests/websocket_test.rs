//! The media-stream WebSocket scenario needs a real TCP socket —
//! `tower::ServiceExt::oneshot` can't drive a WS upgrade — so this test
//! binds a real `TcpListener` and drives it with `tokio-tungstenite`.

use std::sync::Mutex;

use futures::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;

use telegate_config::Settings;
use telegate_server::{create_router, AppState};

static ENV_LOCK: Mutex<()> = Mutex::new(());

#[tokio::test]
async fn webhook_media_stream_ends_session_on_stop() {
    let _guard = ENV_LOCK.lock().unwrap();

    std::env::set_var("OUTBOUND_TARGET_E164", "+15555550100");
    std::env::set_var("STUB_STT_TEXT", "hola");
    let settings = Settings::from_env().unwrap();
    std::env::remove_var("OUTBOUND_TARGET_E164");
    std::env::remove_var("STUB_STT_TEXT");

    let state = AppState::new(settings).unwrap();
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = reqwest::Client::new();
    let voice_response = client
        .post(format!("http://{addr}/twilio/voice"))
        .header("content-type", "application/x-www-form-urlencoded")
        .body("CallSid=CA_WS_TEST&From=%2B15551234567&To=%2B18005550199")
        .send()
        .await
        .unwrap();
    assert!(voice_response.status().is_success());

    let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/twilio/stream"))
        .await
        .unwrap();

    ws.send(Message::Text(r#"{"event":"connected"}"#.to_string()))
        .await
        .unwrap();
    ws.send(Message::Text(
        r#"{"event":"start","start":{"callSid":"CA_WS_TEST"}}"#.to_string(),
    ))
    .await
    .unwrap();
    ws.send(Message::Text(
        r#"{"event":"media","media":{"payload":"AQI=","timestamp":"10"}}"#.to_string(),
    ))
    .await
    .unwrap();
    ws.send(Message::Text(r#"{"event":"stop"}"#.to_string()))
        .await
        .unwrap();

    // The server closes the socket once it processes `stop`.
    while ws.next().await.is_some() {}

    let sessions: serde_json::Value = client
        .get(format!("http://{addr}/sessions"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let sessions = sessions.as_array().unwrap();
    let session = sessions
        .iter()
        .find(|s| s["external_call_id"] == "CA_WS_TEST")
        .expect("session created by the voice webhook should be present");
    assert_eq!(session["state"], "ended");
}
