//! Envelope types and idempotency-key derivation.

use sha2::{Digest, Sha256};

use telegate_core::SessionEvent;

#[derive(Debug, Clone, serde::Serialize)]
pub struct Command {
    pub text: String,
    pub context: serde_json::Value,
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(tag = "type")]
pub enum Envelope {
    #[serde(rename = "session_event")]
    SessionEvent {
        idempotency_key: String,
        at_ms: u64,
        session_event: SessionEvent,
    },
    #[serde(rename = "command")]
    Command {
        idempotency_key: String,
        at_ms: u64,
        command: Command,
    },
}

impl Envelope {
    /// Deterministic for session events: the same event retried after a
    /// transient failure reuses the same key, enabling server-side
    /// de-duplication. Built from the event type, session id, timestamp and
    /// a stable hash of the payload — never from wall-clock or randomness.
    pub fn for_session_event(event: SessionEvent) -> Self {
        let payload_hash = stable_hash(&event.payload);
        let idempotency_key = format!(
            "{}:{}:{}:{}",
            event.event_type.as_str(),
            event.session_id,
            event.at_ms,
            payload_hash
        );
        let at_ms = event.at_ms;
        Envelope::SessionEvent {
            idempotency_key,
            at_ms,
            session_event: event,
        }
    }

    /// Random per invocation — retries of the same command are treated as
    /// distinct operator actions, not duplicates to suppress.
    pub fn for_command(command: Command, at_ms: u64) -> Self {
        let idempotency_key = format!("cmd-{:016x}", rand::random::<u64>());
        Envelope::Command {
            idempotency_key,
            at_ms,
            command,
        }
    }

    pub fn idempotency_key(&self) -> &str {
        match self {
            Envelope::SessionEvent { idempotency_key, .. } => idempotency_key,
            Envelope::Command { idempotency_key, .. } => idempotency_key,
        }
    }
}

fn stable_hash(payload: &serde_json::Value) -> String {
    // serde_json::Value serializes maps in a consistent (not necessarily
    // sorted) key order for a given construction path, but to guarantee
    // stability across retries we re-serialize via the canonical string form
    // rather than hashing the in-memory representation directly.
    let canonical = payload.to_string();
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    format!("{:x}", hasher.finalize())[..16].to_string()
}
