//! Session Store: owns `CallSession` records and the `(source, external id)`
//! index that lets ingress adapters resolve repeated handshakes.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::model::{
    CallSession, ControlPatch, IncomingCallEvent, IngressSource, LanguageCode, SessionMode,
    SessionState,
};

fn external_key(source: IngressSource, external_id: &str) -> String {
    format!("{}:{}", source.as_str(), external_id)
}

/// Coarse-grained, `parking_lot`-guarded session map. Mutation volume is low
/// (one write per call-lifecycle event) so a single `RwLock` over both
/// indices is preferred over per-key locking here — see the Egress Store for
/// the opposite tradeoff, where per-key locking matters.
#[derive(Default)]
pub struct SessionStore {
    by_id: RwLock<HashMap<String, CallSession>>,
    by_external: RwLock<HashMap<String, String>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a brand new session from an incoming-call event. Not idempotent:
    /// callers (the Orchestrator) are responsible for checking
    /// `get_by_external` first so that repeated handshakes resolve to the
    /// same session instead of minting duplicates.
    pub fn create_from_incoming(
        &self,
        event: &IncomingCallEvent,
        outbound_target: &str,
    ) -> CallSession {
        let id = uuid::Uuid::new_v4().to_string();
        let session = CallSession {
            id: id.clone(),
            source: event.source,
            external_call_id: event.external_call_id.clone(),
            inbound_caller: event.from.clone(),
            outbound_target: outbound_target.to_string(),
            started_at_ms: event.received_at_ms,
            mode: SessionMode::default(),
            source_language: LanguageCode::Es,
            target_language: LanguageCode::En,
            state: SessionState::Pending,
        };

        self.by_external
            .write()
            .insert(external_key(event.source, &event.external_call_id), id.clone());
        self.by_id.write().insert(id.clone(), session.clone());

        tracing::info!(session_id = %id, source = %event.source, external_call_id = %event.external_call_id, "created session");
        session
    }

    pub fn get_by_external(&self, source: IngressSource, external_id: &str) -> Option<CallSession> {
        let key = external_key(source, external_id);
        let id = self.by_external.read().get(&key).cloned()?;
        self.by_id.read().get(&id).cloned()
    }

    pub fn get(&self, internal_id: &str) -> Option<CallSession> {
        self.by_id.read().get(internal_id).cloned()
    }

    pub fn update_state(&self, id: &str, state: SessionState) -> Option<CallSession> {
        let mut sessions = self.by_id.write();
        let session = sessions.get_mut(id)?;
        session.state = state;
        Some(session.clone())
    }

    /// Apply a control patch. No-op (returns `None`) while the session is
    /// `ended` or `failed` — terminal states never accept further mutation.
    pub fn update_control(&self, id: &str, patch: &ControlPatch) -> Option<CallSession> {
        let mut sessions = self.by_id.write();
        let session = sessions.get_mut(id)?;
        if session.state.is_terminal() {
            return None;
        }
        if let Some(mode) = patch.mode {
            session.mode = mode;
        }
        if let Some(lang) = patch.source_language {
            session.source_language = lang;
        }
        if let Some(lang) = patch.target_language {
            session.target_language = lang;
        }
        Some(session.clone())
    }

    pub fn all(&self) -> Vec<CallSession> {
        self.by_id.read().values().cloned().collect()
    }

    pub fn count(&self) -> usize {
        self.by_id.read().len()
    }
}
