//! # Error Types
//!
//! Domain-specific error types for campus-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  campus-core errors (this file)                                        │
//! │  ├── CoreError        - Business rule violations                       │
//! │  ├── ValidationError  - Input validation failures                      │
//! │  └── ErrorKind        - Stable machine-readable category               │
//! │                                                                         │
//! │  campus-db errors (separate crate)                                     │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  campus-service errors (separate crate)                                │
//! │  └── ServiceError     - What callers see (serialized in envelopes)     │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ServiceError → Envelope → Caller  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (course id, student id, etc.)
//! 3. Errors are enum variants, never String
//! 4. Every variant maps to exactly one [`ErrorKind`] category

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

// =============================================================================
// Error Kind
// =============================================================================

/// Stable machine-readable error category.
///
/// Clients branch on the kind, never on the human-readable message.
/// Serialized as SCREAMING_SNAKE_CASE in response envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Input is malformed or out of bounds.
    ValidationError,
    /// The caller's role or ownership does not permit the operation.
    AuthorizationError,
    /// The referenced entity does not exist (or is deleted).
    NotFound,
    /// The operation collides with existing state (duplicate, outstanding
    /// enrollments, capacity below enrolled count).
    Conflict,
    /// All seats are taken; distinct from generic conflict so clients can
    /// offer "notify me" style flows.
    CapacityExceeded,
    /// The entity is not in a state that allows the operation.
    StateError,
    /// Storage is temporarily unreachable; the call may be retried.
    ServiceUnavailable,
    /// Unexpected failure; nothing the caller can do.
    Internal,
}

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations or domain logic failures.
/// They should be caught and translated to user-facing envelopes.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The caller is not allowed to perform the operation.
    ///
    /// ## When This Occurs
    /// - Role is not in the permission table for the action
    /// - A teacher operates on a course they do not own
    /// - A student operates on another student's records
    /// - Progress or feedback is written without an enrollment
    #[error("not permitted: {detail}")]
    NotPermitted { detail: String },

    /// Entity cannot be found (or was soft-deleted).
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Enrollment requires a published course.
    ///
    /// ## When This Occurs
    /// - Enrolling into a draft course
    /// - Enrolling into an archived course
    #[error("course {course_id} is {status}, not open for enrollment")]
    NotPublished { course_id: String, status: String },

    /// The requested lifecycle edge does not exist.
    ///
    /// ## Lifecycle
    /// ```text
    /// draft ──► published ──► archived
    ///   ▲                        │
    ///   └── (no edge back; archived can be re-published)
    /// ```
    /// Valid edges: draft→published, published→archived, archived→published.
    /// Everything else (including published→published) lands here.
    #[error("course {course_id} cannot move from {from} to {to}")]
    InvalidTransition {
        course_id: String,
        from: String,
        to: String,
    },

    /// The student already holds an active enrollment for the course.
    #[error("student {student_id} is already enrolled in course {course_id}")]
    AlreadyEnrolled {
        course_id: String,
        student_id: String,
    },

    /// Every seat is taken.
    ///
    /// ## When This Occurs
    /// - Enrolling when active enrollments == capacity
    /// - Losing the final seat to a concurrent enrollment
    #[error("course {course_id} is full: capacity {capacity}")]
    CourseFull { course_id: String, capacity: i64 },

    /// The student has not completed one or more prerequisite courses.
    #[error("student {student_id} is missing prerequisites for course {course_id}: {missing:?}")]
    MissingPrerequisites {
        course_id: String,
        student_id: String,
        missing: Vec<String>,
    },

    /// The enrollment exists but is not active.
    ///
    /// ## When This Occurs
    /// - Completing a dropped enrollment
    #[error("enrollment for student {student_id} in course {course_id} is {status}, expected active")]
    EnrollmentNotActive {
        course_id: String,
        student_id: String,
        status: String,
    },

    /// Archiving or deleting is blocked by active enrollments.
    #[error("course {course_id} still has {active} active enrollments")]
    EnrollmentsOutstanding { course_id: String, active: i64 },

    /// A capacity update may never evict already-enrolled students.
    #[error("capacity {requested} is below the current enrolled count {enrolled}")]
    CapacityBelowEnrolled { requested: i64, enrolled: i64 },

    /// Course codes are unique among live courses.
    #[error("course code '{code}' already exists")]
    DuplicateCode { code: String },

    /// Feedback is submit-once per (student, course) pair.
    #[error("student {student_id} already submitted feedback for course {course_id}")]
    FeedbackAlreadySubmitted {
        course_id: String,
        student_id: String,
    },
}

impl CoreError {
    /// Returns the stable category for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::Validation(_) => ErrorKind::ValidationError,
            CoreError::NotPermitted { .. } => ErrorKind::AuthorizationError,
            CoreError::NotFound { .. } => ErrorKind::NotFound,
            CoreError::NotPublished { .. }
            | CoreError::InvalidTransition { .. }
            | CoreError::MissingPrerequisites { .. }
            | CoreError::EnrollmentNotActive { .. } => ErrorKind::StateError,
            CoreError::AlreadyEnrolled { .. }
            | CoreError::EnrollmentsOutstanding { .. }
            | CoreError::CapacityBelowEnrolled { .. }
            | CoreError::DuplicateCode { .. }
            | CoreError::FeedbackAlreadySubmitted { .. } => ErrorKind::Conflict,
            CoreError::CourseFull { .. } => ErrorKind::CapacityExceeded,
        }
    }

    /// Shorthand for [`CoreError::NotFound`].
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Shorthand for [`CoreError::NotPermitted`].
    pub fn not_permitted(detail: impl Into<String>) -> Self {
        CoreError::NotPermitted {
            detail: detail.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, non-finite number).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
