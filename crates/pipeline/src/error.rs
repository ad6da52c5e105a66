use thiserror::Error;

/// Only misconfiguration — never a pipeline-stage failure, which always
/// collapses to a logged `None` and a dropped frame.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("unknown session: {0}")]
    UnknownSession(String),
}
