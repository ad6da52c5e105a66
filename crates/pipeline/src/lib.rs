//! The Voice Orchestrator: single pipeline owner coordinating the Session
//! Store, the three provider capabilities, and event emission.

mod error;
mod orchestrator;

pub use error::PipelineError;
pub use orchestrator::{AudioFrame, Orchestrator, OrchestratorConfig};
