//! Canonical data model shared by every component of the gateway.

use serde::{Deserialize, Serialize};

/// Namespaces external call IDs so the two ingress dialects never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IngressSource {
    SipBridge,
    WebhookStream,
}

impl IngressSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            IngressSource::SipBridge => "sip-bridge",
            IngressSource::WebhookStream => "webhook-stream",
        }
    }
}

impl std::fmt::Display for IngressSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two configured languages. Closed by design — see Non-goals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageCode {
    En,
    Es,
}

impl LanguageCode {
    /// The other configured language — cross-language translation policy (§4.3).
    pub fn other(&self) -> LanguageCode {
        match self {
            LanguageCode::En => LanguageCode::Es,
            LanguageCode::Es => LanguageCode::En,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageCode::En => "en",
            LanguageCode::Es => "es",
        }
    }
}

impl std::fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operator-selected session mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionMode {
    /// Run the full STT -> MT -> TTS pipeline (default).
    PrivateTranslation,
    /// Skip the pipeline entirely; frames are only counted.
    Passthrough,
}

impl Default for SessionMode {
    fn default() -> Self {
        SessionMode::PrivateTranslation
    }
}

/// Call lifecycle. Transitions are monotonic: pending -> active -> (ended | failed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Pending,
    Active,
    Ended,
    Failed,
}

impl SessionState {
    /// Terminal states never transition further.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Ended | SessionState::Failed)
    }
}

/// A single logical telephone call handled by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallSession {
    pub id: String,
    pub source: IngressSource,
    pub external_call_id: String,
    pub inbound_caller: String,
    pub outbound_target: String,
    pub started_at_ms: u64,
    pub mode: SessionMode,
    pub source_language: LanguageCode,
    pub target_language: LanguageCode,
    pub state: SessionState,
}

/// Encoding of an audio payload on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioEncoding {
    PcmS16le,
    Mulaw,
}

/// Inbound audio unit produced by an Ingress Adapter, consumed by the Orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioFrame {
    pub session_id: String,
    pub source: IngressSource,
    pub sample_rate_hz: u32,
    pub encoding: AudioEncoding,
    pub timestamp_ms: u64,
    pub payload: Vec<u8>,
}

/// STT provider output for a single frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionChunk {
    pub session_id: String,
    pub text: String,
    pub is_final: bool,
    pub language: LanguageCode,
    pub timestamp_ms: u64,
}

/// MT provider output for a single transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationChunk {
    pub session_id: String,
    pub text: String,
    pub source_language: LanguageCode,
    pub target_language: LanguageCode,
    pub timestamp_ms: u64,
}

/// Outbound audio unit enqueued in the Egress Store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsChunk {
    pub session_id: String,
    pub encoding: AudioEncoding,
    pub sample_rate_hz: u32,
    pub payload: Vec<u8>,
    pub timestamp_ms: u64,
}

/// Discriminator for `SessionEvent`, mirrored 1:1 with the envelope `type` field
/// the External Event Bridge forwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEventType {
    #[serde(rename = "session.started")]
    SessionStarted,
    #[serde(rename = "session.ended")]
    SessionEnded,
    #[serde(rename = "session.control.updated")]
    SessionControlUpdated,
    #[serde(rename = "session.transcript")]
    SessionTranscript,
    #[serde(rename = "session.translation")]
    SessionTranslation,
}

impl SessionEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionEventType::SessionStarted => "session.started",
            SessionEventType::SessionEnded => "session.ended",
            SessionEventType::SessionControlUpdated => "session.control.updated",
            SessionEventType::SessionTranscript => "session.transcript",
            SessionEventType::SessionTranslation => "session.translation",
        }
    }
}

/// Envelope produced by the Orchestrator and consumed by the External Event Bridge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEvent {
    #[serde(rename = "type")]
    pub event_type: SessionEventType,
    pub session_id: String,
    pub at_ms: u64,
    pub payload: serde_json::Value,
}

/// A patch applied to a session's mutable control fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ControlPatch {
    #[serde(default)]
    pub mode: Option<SessionMode>,
    #[serde(default)]
    pub source_language: Option<LanguageCode>,
    #[serde(default)]
    pub target_language: Option<LanguageCode>,
}

/// Canonical event produced by an Ingress Adapter when a call starts.
#[derive(Debug, Clone)]
pub struct IncomingCallEvent {
    pub source: IngressSource,
    pub external_call_id: String,
    pub from: String,
    pub to: String,
    pub received_at_ms: u64,
}
