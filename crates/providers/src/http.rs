//! HTTP-backed providers. Each builds one shared `reqwest::Client` at
//! construction time with an explicit timeout — mirrors the reference
//! codebase's `HttpSttBackend`, which treats a slow or failed call as a
//! transcription miss, never a panic, and only fails construction itself
//! when the client can't be built at all.

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};

use telegate_core::{
    AudioEncoding, AudioFrame, LanguageCode, TranscriptionChunk, TranslationChunk, TtsChunk,
};

use crate::error::ProviderError;
use crate::traits::{StreamingSttProvider, TranslationProvider, TtsProvider};

fn build_client(timeout_ms: u64) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(Duration::from_millis(timeout_ms))
        .build()
        .map_err(|e| ProviderError::ClientBuild(e.to_string()))
}

#[derive(Serialize)]
struct SttRequest {
    sample_rate_hz: u32,
    encoding: AudioEncoding,
    language: LanguageCode,
    payload_base64: String,
}

#[derive(Deserialize)]
struct SttResponse {
    text: String,
    #[serde(default)]
    is_final: bool,
}

pub struct HttpSttProvider {
    client: reqwest::Client,
    endpoint_url: String,
}

impl HttpSttProvider {
    pub fn new(endpoint_url: impl Into<String>, timeout_ms: u64) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_client(timeout_ms)?,
            endpoint_url: endpoint_url.into(),
        })
    }
}

#[async_trait]
impl StreamingSttProvider for HttpSttProvider {
    async fn transcribe(
        &self,
        frame: &AudioFrame,
        expected_language: LanguageCode,
    ) -> Option<TranscriptionChunk> {
        let body = SttRequest {
            sample_rate_hz: frame.sample_rate_hz,
            encoding: frame.encoding,
            language: expected_language,
            payload_base64: BASE64.encode(&frame.payload),
        };

        let response = match self.client.post(&self.endpoint_url).json(&body).send().await {
            Ok(resp) if resp.status().is_success() => resp,
            Ok(resp) => {
                tracing::warn!(status = %resp.status(), "stt provider returned non-success");
                return None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "stt provider request failed");
                return None;
            }
        };

        let parsed: SttResponse = match response.json().await {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(error = %e, "stt provider returned unparseable response");
                return None;
            }
        };

        if parsed.text.trim().is_empty() {
            return None;
        }

        Some(TranscriptionChunk {
            session_id: frame.session_id.clone(),
            text: parsed.text,
            is_final: parsed.is_final,
            language: expected_language,
            timestamp_ms: frame.timestamp_ms,
        })
    }

    fn name(&self) -> &str {
        "http-stt"
    }
}

#[derive(Serialize)]
struct TranslationRequest<'a> {
    text: &'a str,
    source_language: LanguageCode,
    target_language: LanguageCode,
}

#[derive(Deserialize)]
struct TranslationResponse {
    text: String,
}

pub struct HttpTranslationProvider {
    client: reqwest::Client,
    endpoint_url: String,
}

impl HttpTranslationProvider {
    pub fn new(endpoint_url: impl Into<String>, timeout_ms: u64) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_client(timeout_ms)?,
            endpoint_url: endpoint_url.into(),
        })
    }
}

#[async_trait]
impl TranslationProvider for HttpTranslationProvider {
    async fn translate(&self, transcript: &TranscriptionChunk) -> Option<TranslationChunk> {
        if transcript.text.trim().is_empty() {
            return None;
        }
        let target_language = transcript.language.other();
        let body = TranslationRequest {
            text: &transcript.text,
            source_language: transcript.language,
            target_language,
        };

        let response = match self.client.post(&self.endpoint_url).json(&body).send().await {
            Ok(resp) if resp.status().is_success() => resp,
            Ok(resp) => {
                tracing::warn!(status = %resp.status(), "translation provider returned non-success");
                return None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "translation provider request failed");
                return None;
            }
        };

        let parsed: TranslationResponse = match response.json().await {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(error = %e, "translation provider returned unparseable response");
                return None;
            }
        };

        Some(TranslationChunk {
            session_id: transcript.session_id.clone(),
            text: parsed.text,
            source_language: transcript.language,
            target_language,
            timestamp_ms: transcript.timestamp_ms,
        })
    }

    fn name(&self) -> &str {
        "http-translation"
    }
}

#[derive(Serialize)]
struct TtsRequest<'a> {
    text: &'a str,
    language: LanguageCode,
}

#[derive(Deserialize)]
struct TtsResponse {
    payload_base64: String,
    sample_rate_hz: u32,
}

pub struct HttpTtsProvider {
    client: reqwest::Client,
    endpoint_url: String,
}

impl HttpTtsProvider {
    pub fn new(endpoint_url: impl Into<String>, timeout_ms: u64) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_client(timeout_ms)?,
            endpoint_url: endpoint_url.into(),
        })
    }
}

#[async_trait]
impl TtsProvider for HttpTtsProvider {
    async fn synthesize(&self, translation: &TranslationChunk) -> Option<TtsChunk> {
        if translation.text.trim().is_empty() {
            return None;
        }
        let body = TtsRequest {
            text: &translation.text,
            language: translation.target_language,
        };

        let response = match self.client.post(&self.endpoint_url).json(&body).send().await {
            Ok(resp) if resp.status().is_success() => resp,
            Ok(resp) => {
                tracing::warn!(status = %resp.status(), "tts provider returned non-success");
                return None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "tts provider request failed");
                return None;
            }
        };

        let parsed: TtsResponse = match response.json().await {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(error = %e, "tts provider returned unparseable response");
                return None;
            }
        };

        let payload = match BASE64.decode(&parsed.payload_base64) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(error = %e, "tts provider returned invalid base64 payload");
                return None;
            }
        };

        Some(TtsChunk {
            session_id: translation.session_id.clone(),
            encoding: AudioEncoding::PcmS16le,
            sample_rate_hz: parsed.sample_rate_hz,
            payload,
            timestamp_ms: translation.timestamp_ms,
        })
    }

    fn name(&self) -> &str {
        "http-tts"
    }
}
