//! External Event Bridge: forwards `SessionEvent`s and operator commands to
//! an external orchestrator over HTTP with at-least-once, order-preserving
//! delivery.

mod bridge;
mod envelope;
mod error;

pub use bridge::{Bridge, BridgeConfig};
pub use envelope::{Command, Envelope};
pub use error::BridgeError;
