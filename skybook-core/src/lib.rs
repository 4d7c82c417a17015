pub mod cache;
pub mod collaborators;
pub mod effects;
pub mod itinerary;
pub mod model;
pub mod repository;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Unknown airport: {0}")]
    UnknownAirport(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Concurrency conflict: {0}")]
    ConcurrencyConflict(String),
    #[error("Dependency unavailable: {0}")]
    DependencyUnavailable(String),
    #[error("Internal service error: {0}")]
    InternalError(String),
}

impl CoreError {
    /// Whether the caller can safely repeat the whole operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::ConcurrencyConflict(_))
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
