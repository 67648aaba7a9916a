//! # campus-core: Pure Business Logic for the Campus Platform
//!
//! This crate is the **heart** of the enrollment engine. It contains all
//! business rules as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Campus Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Transports (external collaborators)                │   │
//! │  │    HTTP gateway ──► identity provider ──► analytics poller      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ request/response envelopes             │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    campus-service                               │   │
//! │  │    courses, enrollments, progress, feedback, analytics          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ campus-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │  policy   │  │eligibility│  │ validation│  │   │
//! │  │   │  Course   │  │  Action   │  │ Snapshot  │  │   rules   │  │   │
//! │  │   │Enrollment │  │  table    │  │  reasons  │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    campus-db (Database Layer)                   │   │
//! │  │         SQLite queries, migrations, the enrollment ledger       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Course, Enrollment, Progress, Feedback)
//! - [`error`] - Error taxonomy with stable machine-readable kinds
//! - [`validation`] - Input validation rules
//! - [`policy`] - The role→capability table guarding every operation
//! - [`eligibility`] - Pure "may this student enroll" evaluation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Explicit Errors**: All errors are typed, never strings or panics
//! 4. **One Policy Table**: role checks live in [`policy`], nowhere else
//!
//! ## Example Usage
//!
//! ```rust
//! use campus_core::eligibility::{evaluate, EligibilitySnapshot};
//! use campus_core::types::CourseStatus;
//!
//! let snapshot = EligibilitySnapshot {
//!     course_id: "c-1".to_string(),
//!     course_status: CourseStatus::Published,
//!     capacity: 30,
//!     active_count: 30,
//!     prerequisites: vec![],
//!     existing_status: None,
//!     completed_courses: vec![],
//! };
//!
//! let result = evaluate(&snapshot);
//! assert!(!result.eligible); // full course: reason "course-full"
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod eligibility;
pub mod error;
pub mod policy;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use campus_core::Course` instead of
// `use campus_core::types::Course`

pub use eligibility::{Eligibility, EligibilitySnapshot, IneligibilityReason};
pub use error::{CoreError, CoreResult, ErrorKind, ValidationError};
pub use policy::{authorize, is_unrestricted, Action, Scope};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Bounded retry budget for the enrollment conditional-write loop.
///
/// ## Why a constant?
/// The seat-admission write is optimistic: losing a race means re-reading
/// and retrying. The budget keeps worst-case latency bounded; exhausting it
/// surfaces as a business error, never a hang.
pub const MAX_ENROLL_ATTEMPTS: u32 = 4;

/// Maximum page size for list/search operations
///
/// ## Business Reason
/// Keeps roster and catalogue queries bounded so one caller cannot drag the
/// store through an unbounded scan.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Default page size when the caller does not specify one
pub const DEFAULT_PAGE_SIZE: i64 = 25;

/// Maximum entries in a completed-modules list
///
/// ## Business Reason
/// Progress payloads come from client apps; the cap keeps a single record
/// from growing without bound.
pub const MAX_COMPLETED_MODULES: usize = 500;

/// Maximum per-category ratings in one feedback submission
pub const MAX_FEEDBACK_CATEGORIES: usize = 20;
