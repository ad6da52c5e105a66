//! The drain loop: a single FIFO queue of envelopes, delivered sequentially
//! with exponential-backoff retry. Publishing never blocks on delivery —
//! `publish_session_event` and `send_command` return as soon as the
//! envelope is enqueued.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};

use telegate_core::SessionEvent;

use crate::envelope::{Command, Envelope};
use crate::error::BridgeError;

const INITIAL_BACKOFF_MS: u64 = 250;
const MAX_BACKOFF_MS: u64 = 2000;
const DEFAULT_MAX_ATTEMPTS: u32 = 4;

#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub endpoint_url: String,
    pub api_key: Option<String>,
    pub timeout_ms: u64,
}

/// Handle to a running bridge. Cloning shares the same underlying queue and
/// shutdown signal.
#[derive(Clone)]
pub struct Bridge {
    tx: mpsc::UnboundedSender<Envelope>,
    shutdown_tx: Arc<watch::Sender<bool>>,
    client: reqwest::Client,
    config: BridgeConfig,
}

impl Bridge {
    /// Builds the shared HTTP client, spawns the drain task, and returns a
    /// handle. The drain task runs for the lifetime of the process unless
    /// `shutdown` is called.
    pub fn spawn(config: BridgeConfig) -> Result<Self, BridgeError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| BridgeError::ClientBuild(e.to_string()))?;

        let (tx, rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        tokio::spawn(drain_loop(client.clone(), config.clone(), rx, shutdown_rx));

        Ok(Self {
            tx,
            shutdown_tx: Arc::new(shutdown_tx),
            client,
            config,
        })
    }

    pub fn publish_session_event(&self, event: SessionEvent) {
        let envelope = Envelope::for_session_event(event);
        if self.tx.send(envelope).is_err() {
            tracing::warn!("event bridge drain task is gone, dropping session event");
        }
    }

    pub fn send_command(&self, text: impl Into<String>, context: serde_json::Value, at_ms: u64) {
        let envelope = Envelope::for_command(
            Command {
                text: text.into(),
                context,
            },
            at_ms,
        );
        if self.tx.send(envelope).is_err() {
            tracing::warn!("event bridge drain task is gone, dropping command");
        }
    }

    pub async fn health_check(&self) -> bool {
        let mut url = match reqwest::Url::parse(&self.config.endpoint_url) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(error = %e, "event bridge endpoint url is not parseable");
                return false;
            }
        };
        url.set_path("/health");
        url.set_query(None);
        match self.client.get(url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                tracing::warn!(error = %e, "event bridge health check failed");
                false
            }
        }
    }

    /// Signals the drain task to stop accepting new drain cycles once the
    /// in-flight delivery attempt (if any) completes.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

async fn drain_loop(
    client: reqwest::Client,
    config: BridgeConfig,
    mut rx: mpsc::UnboundedReceiver<Envelope>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            biased;
            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    tracing::info!("event bridge drain loop shutting down");
                    break;
                }
            }
            envelope = rx.recv() => {
                match envelope {
                    Some(envelope) => deliver_with_retry(&client, &config, envelope).await,
                    None => break,
                }
            }
        }
    }
}

async fn deliver_with_retry(client: &reqwest::Client, config: &BridgeConfig, envelope: Envelope) {
    let mut backoff_ms = INITIAL_BACKOFF_MS;

    for attempt in 1..=DEFAULT_MAX_ATTEMPTS {
        let mut request = client
            .post(&config.endpoint_url)
            .header("idempotency-key", envelope.idempotency_key())
            .json(&envelope);
        if let Some(api_key) = &config.api_key {
            request = request.bearer_auth(api_key);
        }

        match request.send().await {
            Ok(resp) if resp.status().is_success() => {
                return;
            }
            Ok(resp) => {
                tracing::warn!(
                    attempt,
                    status = %resp.status(),
                    idempotency_key = envelope.idempotency_key(),
                    "event bridge delivery rejected"
                );
            }
            Err(e) => {
                tracing::warn!(
                    attempt,
                    error = %e,
                    idempotency_key = envelope.idempotency_key(),
                    "event bridge delivery attempt failed"
                );
            }
        }

        if attempt < DEFAULT_MAX_ATTEMPTS {
            tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
            backoff_ms = (backoff_ms * 2).min(MAX_BACKOFF_MS);
        }
    }

    tracing::warn!(
        idempotency_key = envelope.idempotency_key(),
        "event bridge exhausted retries, dropping envelope"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use telegate_core::SessionEventType;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn event() -> SessionEvent {
        SessionEvent {
            event_type: SessionEventType::SessionStarted,
            session_id: "s1".to_string(),
            at_ms: 0,
            payload: serde_json::json!({}),
        }
    }

    #[tokio::test]
    async fn delivers_successfully_on_first_attempt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/events"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let bridge = Bridge::spawn(BridgeConfig {
            endpoint_url: format!("{}/events", server.uri()),
            api_key: None,
            timeout_ms: 500,
        })
        .unwrap();

        bridge.publish_session_event(event());
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    #[tokio::test]
    async fn retries_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/events"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/events"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let bridge = Bridge::spawn(BridgeConfig {
            endpoint_url: format!("{}/events", server.uri()),
            api_key: None,
            timeout_ms: 500,
        })
        .unwrap();

        bridge.publish_session_event(event());
        tokio::time::sleep(Duration::from_millis(1000)).await;
    }

    #[tokio::test]
    async fn health_check_reflects_endpoint_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let bridge = Bridge::spawn(BridgeConfig {
            endpoint_url: server.uri(),
            api_key: None,
            timeout_ms: 500,
        })
        .unwrap();

        assert!(bridge.health_check().await);
    }

    #[tokio::test]
    async fn health_check_probes_the_origin_not_the_event_path() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let bridge = Bridge::spawn(BridgeConfig {
            endpoint_url: format!("{}/events", server.uri()),
            api_key: None,
            timeout_ms: 500,
        })
        .unwrap();

        assert!(bridge.health_check().await);
    }
}
