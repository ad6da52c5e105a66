//! Voice Orchestrator: the single owner of the STT -> translation -> TTS
//! pipeline. One instance serves every session; dependencies (providers,
//! Session Store, metrics) are injected once at construction.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use telegate_core::{
    CallSession, ControlPatch, IncomingCallEvent, MetricsStore, SessionEvent, SessionEventType,
    SessionMode, SessionState, SessionStore, TtsChunk,
};
use telegate_providers::{StreamingSttProvider, TranslationProvider, TtsProvider};

use crate::error::PipelineError;

/// Delivered audio. Mirrors `telegate_core::AudioFrame` at the pipeline
/// boundary so ingress adapters don't need to depend on the providers crate.
pub use telegate_core::AudioFrame;

type TtsSink = Arc<dyn Fn(TtsChunk) + Send + Sync>;
type EventSink = Arc<dyn Fn(SessionEvent) + Send + Sync>;

pub struct OrchestratorConfig {
    pub outbound_target: String,
    pub min_frame_interval_ms: u64,
}

pub struct Orchestrator {
    session_store: Arc<SessionStore>,
    metrics: Arc<MetricsStore>,
    stt: Box<dyn StreamingSttProvider>,
    translation: Box<dyn TranslationProvider>,
    tts: Box<dyn TtsProvider>,
    outbound_target: String,
    min_frame_interval_ms: u64,
    last_frame_ts: RwLock<HashMap<String, u64>>,
    on_tts_chunk: Option<TtsSink>,
    on_session_event: Option<EventSink>,
}

impl Orchestrator {
    pub fn new(
        session_store: Arc<SessionStore>,
        metrics: Arc<MetricsStore>,
        stt: Box<dyn StreamingSttProvider>,
        translation: Box<dyn TranslationProvider>,
        tts: Box<dyn TtsProvider>,
        config: OrchestratorConfig,
    ) -> Self {
        tracing::info!(
            stt = stt.name(),
            translation = translation.name(),
            tts = tts.name(),
            "orchestrator constructed"
        );
        Self {
            session_store,
            metrics,
            stt,
            translation,
            tts,
            outbound_target: config.outbound_target,
            min_frame_interval_ms: config.min_frame_interval_ms,
            last_frame_ts: RwLock::new(HashMap::new()),
            on_tts_chunk: None,
            on_session_event: None,
        }
    }

    pub fn on_tts_chunk(mut self, sink: impl Fn(TtsChunk) + Send + Sync + 'static) -> Self {
        self.on_tts_chunk = Some(Arc::new(sink));
        self
    }

    pub fn on_session_event(mut self, sink: impl Fn(SessionEvent) + Send + Sync + 'static) -> Self {
        self.on_session_event = Some(Arc::new(sink));
        self
    }

    fn emit_event(&self, event_type: SessionEventType, session_id: &str, at_ms: u64, payload: serde_json::Value) {
        let Some(sink) = &self.on_session_event else {
            return;
        };
        sink(SessionEvent {
            event_type,
            session_id: session_id.to_string(),
            at_ms,
            payload,
        });
    }

    fn resolve_session(&self, session_id: &str) -> Result<CallSession, PipelineError> {
        self.session_store
            .get(session_id)
            .ok_or_else(|| PipelineError::UnknownSession(session_id.to_string()))
    }

    /// Repeated handshakes for the same `(source, externalId)` are
    /// idempotent: the existing session is returned unchanged rather than
    /// minting a duplicate.
    pub fn on_incoming_call(&self, event: IncomingCallEvent) -> CallSession {
        if let Some(existing) = self
            .session_store
            .get_by_external(event.source, &event.external_call_id)
        {
            tracing::info!(
                session_id = %existing.id,
                external_call_id = %event.external_call_id,
                "duplicate incoming-call handshake, returning existing session"
            );
            return existing;
        }

        let session = self
            .session_store
            .create_from_incoming(&event, &self.outbound_target);
        self.session_store
            .update_state(&session.id, SessionState::Active);

        self.emit_event(
            SessionEventType::SessionStarted,
            &session.id,
            event.received_at_ms,
            serde_json::json!({
                "source": session.source.as_str(),
                "externalCallId": session.external_call_id,
            }),
        );

        self.session_store.get(&session.id).unwrap_or(session)
    }

    pub async fn on_audio_frame(&self, frame: AudioFrame) {
        let session = match self.resolve_session(&frame.session_id) {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(error = %e, "dropping frame for unknown session");
                return;
            }
        };

        if session.mode == SessionMode::Passthrough {
            self.metrics
                .update(&session.id, |m| m.passthrough_frames += 1);
            return;
        }

        if self.min_frame_interval_ms > 0 {
            let mut last_ts = self.last_frame_ts.write();
            let too_soon = last_ts
                .get(&session.id)
                .is_some_and(|last| frame.timestamp_ms.saturating_sub(*last) < self.min_frame_interval_ms);
            if too_soon {
                drop(last_ts);
                self.metrics.update(&session.id, |m| m.dropped_frames += 1);
                return;
            }
            last_ts.insert(session.id.clone(), frame.timestamp_ms);
        }

        let stt_start = std::time::Instant::now();
        let transcript = self.stt.transcribe(&frame, session.source_language).await;
        let stt_latency_ms = stt_start.elapsed().as_millis() as u64;
        self.metrics
            .update(&session.id, |m| m.stt_latency_ms = Some(stt_latency_ms));

        let Some(transcript) = transcript else {
            return;
        };
        if transcript.text.trim().is_empty() {
            return;
        }

        self.emit_event(
            SessionEventType::SessionTranscript,
            &session.id,
            transcript.timestamp_ms,
            serde_json::json!({
                "text": transcript.text,
                "isFinal": transcript.is_final,
                "language": transcript.language.as_str(),
            }),
        );

        let mt_start = std::time::Instant::now();
        let translation = self.translation.translate(&transcript).await;
        let translation_latency_ms = mt_start.elapsed().as_millis() as u64;
        self.metrics
            .update(&session.id, |m| m.translation_latency_ms = Some(translation_latency_ms));

        let Some(translation) = translation else {
            return;
        };

        self.emit_event(
            SessionEventType::SessionTranslation,
            &session.id,
            translation.timestamp_ms,
            serde_json::json!({
                "text": translation.text,
                "sourceLanguage": translation.source_language.as_str(),
                "targetLanguage": translation.target_language.as_str(),
            }),
        );

        let tts_start = std::time::Instant::now();
        let tts_chunk = self.tts.synthesize(&translation).await;
        let tts_latency_ms = tts_start.elapsed().as_millis() as u64;
        self.metrics
            .update(&session.id, |m| m.tts_latency_ms = Some(tts_latency_ms));

        if let Some(chunk) = tts_chunk {
            if let Some(sink) = &self.on_tts_chunk {
                sink(chunk);
            }
        }

        self.metrics.update(&session.id, |m| {
            m.pipeline_latency_ms = Some(stt_latency_ms + translation_latency_ms + tts_latency_ms);
            m.translated_chunks += 1;
        });
    }

    /// Applies only while the session is not yet `ended`/`failed`; a no-op
    /// on a terminal session is reported as `None`, matching the Session
    /// Store's own contract.
    pub fn update_session_control(
        &self,
        session_id: &str,
        patch: ControlPatch,
        at_ms: u64,
    ) -> Option<CallSession> {
        let updated = self.session_store.update_control(session_id, &patch)?;
        self.emit_event(
            SessionEventType::SessionControlUpdated,
            session_id,
            at_ms,
            serde_json::to_value(&patch).unwrap_or(serde_json::Value::Null),
        );
        Some(updated)
    }

    /// Idempotent: ending an already-ended session is a no-op that still
    /// returns the session's current (terminal) state.
    pub fn end_session(&self, session_id: &str, at_ms: u64) -> Option<CallSession> {
        let session = self.session_store.get(session_id)?;
        let was_already_ended = session.state.is_terminal();
        let updated = self
            .session_store
            .update_state(session_id, SessionState::Ended)?;

        if !was_already_ended {
            let metrics_snapshot = self
                .metrics
                .get(session_id)
                .map(|m| serde_json::to_value(&m).unwrap_or(serde_json::Value::Null))
                .unwrap_or(serde_json::Value::Null);
            self.emit_event(SessionEventType::SessionEnded, session_id, at_ms, metrics_snapshot);
        }

        Some(updated)
    }

    pub fn report_egress_stats(&self, session_id: &str, queue_size: usize, dropped_oldest: bool) {
        self.metrics.update(session_id, |m| {
            m.egress_queue_peak = m.egress_queue_peak.max(queue_size);
            if dropped_oldest {
                m.egress_drop_count += 1;
            }
        });
    }
}
