use thiserror::Error;

/// Errors surfaced by the polling and grading pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Network or parse failure at the score feed; retried next cycle
    #[error("Score feed unavailable: {0}")]
    FeedUnavailable(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// Business-rule violation by the caller (limits, mandatory props, bad answers)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Operation not allowed in the entity's current state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PipelineError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        PipelineError::NotFound { entity, id }
    }
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
