//! Core error type.

use thiserror::Error;

/// Errors raised by the data model and shared-state components.
///
/// This is a library-level error type, not a wire error — the server crate
/// maps it (and its own `ServerError`) to HTTP status codes at the boundary.
/// Session lookups (unknown id, terminal-state rejection) are modeled as
/// `Option` at the Session Store boundary instead of this enum — see
/// `SessionStore::get`/`update_control` — so this only covers the one
/// fallible parse this crate actually performs.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("invalid E.164 number: {0}")]
    InvalidE164(String),
}
