//! Shared data model and in-memory state for the gateway: the canonical
//! types, the Session Store, the Egress Store, and per-session metrics.

pub mod e164;
pub mod egress;
pub mod error;
pub mod metrics;
pub mod model;
pub mod session_store;

pub use e164::validate_e164;
pub use egress::{EgressStore, EnqueueOutcome};
pub use error::GatewayError;
pub use metrics::{MetricsStore, SessionMetrics};
pub use model::{
    AudioEncoding, AudioFrame, CallSession, ControlPatch, IncomingCallEvent, IngressSource,
    LanguageCode, SessionEvent, SessionEventType, SessionMode, SessionState, TranscriptionChunk,
    TranslationChunk, TtsChunk,
};
pub use session_store::SessionStore;
