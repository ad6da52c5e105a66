use thiserror::Error;

/// Construction-time failures only. Delivery failures never propagate past
/// the bridge's internal retry loop — see `Bridge::publish_session_event`.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(String),
}
