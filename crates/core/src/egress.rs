//! Egress Store: per-session, bounded FIFO of `TtsChunk`s waiting to be
//! pulled by an Ingress Adapter (e.g. Asterisk's egress-poll dialect).
//!
//! Uses `DashMap` instead of a single `RwLock<HashMap<_>>` so that sessions
//! under heavy egress traffic don't serialize behind sessions that are idle —
//! unlike the Session Store, where writes are rare enough that a single lock
//! is simpler and cheap enough.

use std::collections::VecDeque;

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::model::TtsChunk;

/// Result of an `enqueue` call, reported up so the Orchestrator can update
/// `egress_drop_count` / `egress_queue_peak` metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnqueueOutcome {
    pub queue_len: usize,
    pub dropped_oldest: bool,
}

pub struct EgressStore {
    queues: DashMap<String, Mutex<VecDeque<TtsChunk>>>,
    max_per_session: usize,
}

impl EgressStore {
    pub fn new(max_per_session: usize) -> Self {
        Self {
            queues: DashMap::new(),
            max_per_session: max_per_session.max(1),
        }
    }

    /// Push a chunk onto the session's queue. When the queue is already at
    /// capacity, the oldest chunk is dropped to make room — the gateway
    /// favors fresh audio over backlog.
    pub fn enqueue(&self, session_id: &str, chunk: TtsChunk) -> EnqueueOutcome {
        let entry = self
            .queues
            .entry(session_id.to_string())
            .or_insert_with(|| Mutex::new(VecDeque::new()));
        let mut queue = entry.lock();

        let mut dropped_oldest = false;
        if queue.len() >= self.max_per_session {
            queue.pop_front();
            dropped_oldest = true;
        }
        queue.push_back(chunk);

        EnqueueOutcome {
            queue_len: queue.len(),
            dropped_oldest,
        }
    }

    /// Pop the oldest chunk. Once a session's queue drains to empty its entry
    /// is removed from the map so idle sessions don't accumulate empty queues.
    pub fn dequeue(&self, session_id: &str) -> Option<TtsChunk> {
        let chunk = {
            let entry = self.queues.get(session_id)?;
            let mut queue = entry.lock();
            queue.pop_front()
        }?;

        if let Some(entry) = self.queues.get(session_id) {
            if entry.lock().is_empty() {
                drop(entry);
                self.queues.remove(session_id);
            }
        }

        Some(chunk)
    }

    pub fn size(&self, session_id: &str) -> usize {
        self.queues
            .get(session_id)
            .map(|entry| entry.lock().len())
            .unwrap_or(0)
    }

    /// Drop a session's entire queue, e.g. when the session ends.
    pub fn clear(&self, session_id: &str) {
        self.queues.remove(session_id);
    }
}
