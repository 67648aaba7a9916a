//! # Service Error Type
//!
//! The single failure type every operation returns. Domain failures pass
//! through untouched so their kind survives to the envelope; storage
//! failures are translated here, and anything unexpected is logged in
//! full but surfaces only as a generic message.
//!
//! ```text
//! CoreError ──────────────────────┐
//!                                 ├──▶ ServiceError ──▶ Envelope
//! DbError ──(translate + log)─────┘
//! ```

use campus_core::{CoreError, ErrorKind, ValidationError};
use campus_db::DbError;
use thiserror::Error;

/// Convenience alias for service results
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Failures surfaced by the operation layer.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A business rule rejected the call. Carries the precise domain error.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Storage collided with existing state in a way no domain variant names.
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// Storage is temporarily unreachable; the caller may retry.
    #[error("Service unavailable: {message}")]
    Unavailable { message: String },

    /// The admission write kept losing its version race within the retry
    /// budget while seats still looked free. Transient; the caller should
    /// simply try again.
    #[error("Enrollment for course {course_id} is contended, try again")]
    Contention { course_id: String },

    /// Unexpected failure. Details go to the log, never to the caller.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ServiceError {
    pub fn internal(message: impl Into<String>) -> Self {
        ServiceError::Internal {
            message: message.into(),
        }
    }

    /// Machine-readable classification carried on the envelope.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Core(e) => e.kind(),
            ServiceError::Conflict { .. } => ErrorKind::Conflict,
            ServiceError::Unavailable { .. } | ServiceError::Contention { .. } => {
                ErrorKind::ServiceUnavailable
            }
            ServiceError::Internal { .. } => ErrorKind::Internal,
        }
    }
}

// Validators return the bare ValidationError; lift it through CoreError so
// `?` works directly in service methods.
impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        ServiceError::Core(CoreError::Validation(err))
    }
}

impl From<DbError> for ServiceError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ServiceError::Core(CoreError::NotFound { entity, id }),
            DbError::UniqueViolation { field, value } => ServiceError::Conflict {
                message: format!("{field} '{value}' already exists"),
            },
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ServiceError::Core(CoreError::Validation(ValidationError::InvalidFormat {
                    field: "reference".to_string(),
                    reason: "refers to a record that does not exist".to_string(),
                }))
            }
            DbError::ConnectionFailed(message) => ServiceError::Unavailable { message },
            DbError::PoolExhausted => ServiceError::Unavailable {
                message: "connection pool exhausted".to_string(),
            },
            DbError::QueryFailed(e) => {
                tracing::error!("Query failed: {}", e);
                ServiceError::internal("Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                ServiceError::internal("Database operation failed")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Migration failed: {}", e);
                ServiceError::internal("Database schema is not ready")
            }
            DbError::Serialization(e) => {
                tracing::error!("Stored payload corrupt: {}", e);
                ServiceError::internal("Database operation failed")
            }
            DbError::Internal(message) => {
                tracing::error!("Database internal error: {}", message);
                ServiceError::internal("Database operation failed")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_error_kind_passes_through() {
        let err = ServiceError::from(CoreError::CourseFull {
            course_id: "c-1".to_string(),
            capacity: 30,
        });
        assert_eq!(err.kind(), ErrorKind::CapacityExceeded);

        let err = ServiceError::from(CoreError::not_found("Course", "c-404"));
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "Course not found: c-404");
    }

    #[test]
    fn test_validation_error_lifts_through_core() {
        let err = ServiceError::from(ValidationError::Required {
            field: "title".to_string(),
        });
        assert_eq!(err.kind(), ErrorKind::ValidationError);
        assert!(matches!(
            err,
            ServiceError::Core(CoreError::Validation(ValidationError::Required { .. }))
        ));
    }

    #[test]
    fn test_db_not_found_becomes_domain_not_found() {
        let err = ServiceError::from(DbError::not_found("Enrollment", "c-1/s-1"));
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_db_unique_violation_becomes_conflict() {
        let err = ServiceError::from(DbError::duplicate("code", "CS-101"));
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(err.to_string(), "Conflict: code 'CS-101' already exists");
    }

    #[test]
    fn test_transient_storage_errors_map_to_unavailable() {
        assert_eq!(
            ServiceError::from(DbError::PoolExhausted).kind(),
            ErrorKind::ServiceUnavailable
        );
        assert_eq!(
            ServiceError::from(DbError::ConnectionFailed("refused".to_string())).kind(),
            ErrorKind::ServiceUnavailable
        );
    }

    #[test]
    fn test_contention_is_retryable() {
        let err = ServiceError::Contention {
            course_id: "c-1".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::ServiceUnavailable);
        assert!(err.to_string().contains("try again"));
    }
}
