//! Ingress Adapters: the two telephony dialects, each mapped to the same
//! canonical events/frames the Orchestrator understands.

pub mod sip_bridge;
pub mod webhook_stream;

pub(crate) fn now_ms() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}
