//! Per-session metrics: last-sample gauges plus monotonic counters.
//!
//! Gauges are overwritten on every update; counters only ever increase.
//! An implementer may add percentile accumulation on top of this, but the
//! `/metrics` snapshot is defined purely in terms of these scalars.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::Serialize;

/// Snapshot of one session's metrics, suitable for JSON serialization.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionMetrics {
    pub stt_latency_ms: Option<u64>,
    pub translation_latency_ms: Option<u64>,
    pub tts_latency_ms: Option<u64>,
    pub pipeline_latency_ms: Option<u64>,
    pub dropped_frames: u64,
    pub passthrough_frames: u64,
    pub translated_chunks: u64,
    pub egress_drop_count: u64,
    pub egress_queue_peak: usize,
}

/// Owns the per-session metrics map. Single-writer from the Orchestrator's
/// perspective; readers take a snapshot under the same coarse lock.
#[derive(Default)]
pub struct MetricsStore {
    sessions: RwLock<HashMap<String, SessionMetrics>>,
}

impl MetricsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` against the session's metrics, creating them lazily on first
    /// touch. Metrics are never removed while the session exists.
    pub fn update(&self, session_id: &str, f: impl FnOnce(&mut SessionMetrics)) {
        let mut sessions = self.sessions.write();
        let entry = sessions.entry(session_id.to_string()).or_default();
        f(entry);
    }

    pub fn get(&self, session_id: &str) -> Option<SessionMetrics> {
        self.sessions.read().get(session_id).cloned()
    }

    pub fn all(&self) -> HashMap<String, SessionMetrics> {
        self.sessions.read().clone()
    }
}
