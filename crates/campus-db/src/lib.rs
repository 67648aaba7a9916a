//! # campus-db: Database Layer for Campus
//!
//! This crate provides database access for the Campus platform.
//! It uses SQLite for durable storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Campus Data Flow                                 │
//! │                                                                         │
//! │  Service call (enrollment.enroll)                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     campus-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ (course.rs,    │    │  (embedded)  │  │   │
//! │  │   │               │    │  enrollment.rs,│    │              │  │   │
//! │  │   │ SqlitePool    │◄───│  progress.rs,  │    │ 001_init.sql │  │   │
//! │  │   │ Connection    │    │  feedback.rs)  │    │              │  │   │
//! │  │   │ Management    │    │                │    │              │  │   │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (WAL)                       │   │
//! │  │   courses · enrollments · progress · feedback                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (course, enrollment, ...)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use campus_db::{Database, DbConfig};
//!
//! // Create database with default config
//! let config = DbConfig::new("path/to/campus.db");
//! let db = Database::new(config).await?;
//!
//! // Use repositories
//! let page = db.courses().list(&CourseFilter::default()).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::course::{CourseFilter, CourseRepository, CourseSort, SortField, SortOrder};
pub use repository::enrollment::{AdmitOutcome, EnrollmentRepository, EnrollmentTotals};
pub use repository::feedback::{FeedbackRepository, FeedbackSummary};
pub use repository::progress::{ProgressRepository, ProgressSummary};
