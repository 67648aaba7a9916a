//! # campus-service: Guarded Operation Surface
//!
//! Every externally callable operation of the Campus platform, wrapped with
//! the access policy, input validation, and uniform response envelopes.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      campus-service                                     │
//! │                                                                         │
//! │  Transports (HTTP gateway, analytics poller - external)                 │
//! │       │  verified Principal + request DTO                               │
//! │       ▼                                                                 │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                         Campus                                   │  │
//! │  │                                                                  │  │
//! │  │  .courses()      CourseService      lifecycle, catalogue         │  │
//! │  │  .enrollments()  EnrollmentService  admission loop, roster       │  │
//! │  │  .progress()     ProgressService    per-student %, aggregates    │  │
//! │  │  .feedback()     FeedbackService    one-shot ratings             │  │
//! │  │  .analytics()    AnalyticsService   read-only rollups            │  │
//! │  │                                                                  │  │
//! │  │  every method: authorize ──► validate ──► campus-core rules      │  │
//! │  │                ──► campus-db ──► Result<T, ServiceError>         │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Envelope<T> { success, data | error { kind, message } }                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,ignore
//! let campus = Campus::connect(ServiceConfig::load()?).await?;
//!
//! let caller = Principal::new("s-42", Role::Student);
//! let enrollment = campus
//!     .enrollments()
//!     .enroll(&caller, &course_id, &caller.id)
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod envelope;
pub mod error;
pub mod services;

// Re-export commonly used types
pub use config::{ConfigError, ServiceConfig};
pub use envelope::{Envelope, ErrorBody};
pub use error::{ServiceError, ServiceResult};
pub use services::analytics_service::{
    AnalyticsService, CourseAnalytics, EnrollmentBreakdown, FeedbackRollup, ProgressRollup,
};
pub use services::course_service::{
    CoursePage, CourseService, CreateCourseRequest, ListCoursesRequest, UpdateCourseRequest,
};
pub use services::enrollment_service::EnrollmentService;
pub use services::feedback_service::{CourseFeedback, FeedbackService, SubmitFeedbackRequest};
pub use services::progress_service::{ProgressAggregate, ProgressService, UpdateProgressRequest};

use std::sync::Arc;

use campus_db::Database;

// =============================================================================
// Application State
// =============================================================================

/// Shared application state.
///
/// One instance per process, shared across all services via `Arc`.
pub struct AppState {
    /// Database connection pool and repositories.
    pub db: Database,

    /// Runtime configuration.
    pub config: ServiceConfig,
}

// =============================================================================
// Campus Facade
// =============================================================================

/// Root handle over the whole operation surface.
///
/// Cloning is cheap (shared `Arc` state), so transports can hold one copy
/// per connection or task.
#[derive(Clone)]
pub struct Campus {
    state: Arc<AppState>,
}

impl Campus {
    /// Opens the database described by `config` and builds the surface.
    pub async fn connect(config: ServiceConfig) -> ServiceResult<Self> {
        let db = Database::new(config.db_config()).await?;
        Ok(Campus::with_database(db, config))
    }

    /// Builds the surface over an already-open database.
    ///
    /// Used by tests (in-memory databases) and by embedders that manage the
    /// pool themselves.
    pub fn with_database(db: Database, config: ServiceConfig) -> Self {
        Campus {
            state: Arc::new(AppState { db, config }),
        }
    }

    /// Course lifecycle and catalogue operations.
    pub fn courses(&self) -> CourseService {
        CourseService::new(self.state.clone())
    }

    /// Enrollment, unenrollment and roster operations.
    pub fn enrollments(&self) -> EnrollmentService {
        EnrollmentService::new(self.state.clone())
    }

    /// Progress tracking operations.
    pub fn progress(&self) -> ProgressService {
        ProgressService::new(self.state.clone())
    }

    /// Feedback operations.
    pub fn feedback(&self) -> FeedbackService {
        FeedbackService::new(self.state.clone())
    }

    /// Read-only analytics rollups.
    pub fn analytics(&self) -> AnalyticsService {
        AnalyticsService::new(self.state.clone())
    }

    /// Whether the underlying storage answers queries.
    pub async fn health_check(&self) -> bool {
        self.state.db.health_check().await
    }

    /// Closes the connection pool. Every call after this fails.
    pub async fn close(&self) {
        self.state.db.close().await;
    }
}
