//! Error types for the generation collaborator

use thiserror::Error;

/// Generation error type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// Service is temporarily overloaded
    #[error("service overloaded")]
    Overloaded,

    /// API error
    #[error("api error: {0}")]
    Api(String),

    /// Response did not contain the expected content
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Network error
    #[error("network error: {0}")]
    Network(String),

    /// Request rejected before it was sent
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The worker runtime is gone
    #[error("generation worker unavailable")]
    WorkerUnavailable,
}

impl GenerationError {
    /// Whether the call may succeed if repeated after a delay.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Overloaded)
    }
}

/// Result type alias
pub type GenerationResult<T> = std::result::Result<T, GenerationError>;
