use thiserror::Error;

/// Construction-time failures only. Per-request provider failures are never
/// an `Err` — they collapse to `Ok(None)` per the provider contract.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(String),
}
