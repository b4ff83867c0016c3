//! Error types for the folio sync pipeline.

use thiserror::Error;

use crate::models::JobStatus;

/// Result type alias using folio's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for folio operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Job not found in the registry
    #[error("Job not found: {0}")]
    JobNotFound(String),

    /// Embedding generation failed
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Vector index operation failed
    #[error("Vector store error: {0}")]
    VectorStore(String),

    /// Content enumeration failed
    #[error("Content store error: {0}")]
    ContentStore(String),

    /// Job bookkeeping error
    #[error("Job error: {0}")]
    Job(String),

    /// Illegal job state transition
    #[error("Invalid transition for job {job_id}: {from} -> {to}")]
    InvalidTransition {
        job_id: String,
        from: JobStatus,
        to: JobStatus,
    },

    /// A whole-index job is already active
    #[error("A whole-index job is already active: {active_job_id}")]
    ScopeBusy { active_job_id: String },

    /// Cooperative cancellation was observed
    #[error("Cancelled by user")]
    Cancelled,

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_job_not_found() {
        let err = Error::JobNotFound("full_regen_1".to_string());
        assert_eq!(err.to_string(), "Job not found: full_regen_1");
    }

    #[test]
    fn test_error_display_cancelled() {
        assert_eq!(Error::Cancelled.to_string(), "Cancelled by user");
    }

    #[test]
    fn test_error_display_invalid_transition() {
        let err = Error::InvalidTransition {
            job_id: "cleanup_1".to_string(),
            from: JobStatus::Completed,
            to: JobStatus::Running,
        };
        assert_eq!(
            err.to_string(),
            "Invalid transition for job cleanup_1: completed -> running"
        );
    }

    #[test]
    fn test_error_display_scope_busy() {
        let err = Error::ScopeBusy {
            active_job_id: "full_regen_1".to_string(),
        };
        assert!(err.to_string().contains("full_regen_1"));
    }

    #[test]
    fn test_error_display_embedding() {
        let err = Error::Embedding("empty input".to_string());
        assert_eq!(err.to_string(), "Embedding error: empty input");
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn test_error_debug() {
        let err = Error::VectorStore("reset refused".to_string());
        let debug_str = format!("{:?}", err);
        assert!(debug_str.contains("VectorStore"));
        assert!(debug_str.contains("reset refused"));
    }
}
