//! # Domain Types
//!
//! Core domain types used throughout the Campus platform.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Course      │   │   Enrollment    │   │    Progress     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  code (business)│   │  course_id (FK) │   │  course_id (FK) │       │
//! │  │  status         │   │  student_id     │   │  student_id     │       │
//! │  │  capacity       │   │  status         │   │  percentage     │       │
//! │  │  enrolled_count │   │  enrolled_at    │   │  modules        │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Feedback     │   │  CourseStatus   │   │EnrollmentStatus │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  rating (1-5)   │   │  Draft          │   │  Active         │       │
//! │  │  comment        │   │  Published      │   │  Dropped        │       │
//! │  │  categories     │   │  Archived       │   │  Completed      │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business key: (code, or the (course_id, student_id) pair) - what humans
//!   and callers actually reference

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

// =============================================================================
// Course Status
// =============================================================================

/// The lifecycle state of a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CourseStatus {
    /// Being authored; invisible to students, not enrollable.
    Draft,
    /// Open: visible in the catalogue and accepting enrollments.
    Published,
    /// Closed to new enrollments; kept for history.
    Archived,
}

impl CourseStatus {
    /// Whether the lifecycle edge `self -> next` exists.
    ///
    /// ## Lifecycle
    /// ```text
    /// draft ──► published ──► archived
    ///               ▲             │
    ///               └─────────────┘  (archived courses can be re-opened)
    /// ```
    /// Re-publishing a published course is NOT an edge; callers get an
    /// explicit rejection instead of a silent no-op.
    pub fn can_transition_to(self, next: CourseStatus) -> bool {
        matches!(
            (self, next),
            (CourseStatus::Draft, CourseStatus::Published)
                | (CourseStatus::Published, CourseStatus::Archived)
                | (CourseStatus::Archived, CourseStatus::Published)
        )
    }

    /// Lowercase storage/display form.
    pub fn as_str(&self) -> &'static str {
        match self {
            CourseStatus::Draft => "draft",
            CourseStatus::Published => "published",
            CourseStatus::Archived => "archived",
        }
    }
}

impl Default for CourseStatus {
    fn default() -> Self {
        CourseStatus::Draft
    }
}

// =============================================================================
// Course Level
// =============================================================================

/// Difficulty tier used for catalogue filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CourseLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl CourseLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            CourseLevel::Beginner => "beginner",
            CourseLevel::Intermediate => "intermediate",
            CourseLevel::Advanced => "advanced",
        }
    }
}

// =============================================================================
// Course
// =============================================================================

/// A course offering with a lifecycle state and a fixed seat capacity.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Course {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Course code - business identifier (e.g. "CS-101").
    pub code: String,

    /// Display title shown in the catalogue.
    pub title: String,

    /// Optional long description; required before publishing.
    pub description: Option<String>,

    /// Lifecycle state.
    pub status: CourseStatus,

    /// Maximum number of simultaneously active enrollments.
    pub capacity: i64,

    /// Denormalised count of active enrollments.
    ///
    /// Maintained by the enrollment ledger's conditional writes; the
    /// invariant `0 <= enrolled_count <= capacity` holds at all times,
    /// including under concurrent enrollment attempts.
    pub enrolled_count: i64,

    /// Principal id of the owning instructor.
    pub instructor_id: String,

    /// Course ids that must be completed before enrolling.
    pub prerequisites: Vec<String>,

    /// Credit value of the course.
    pub credits: i64,

    /// Free-form schedule description ("Mon/Wed 10:00", etc.).
    pub schedule: Option<String>,

    /// Catalogue category (e.g. "mathematics").
    pub category: Option<String>,

    /// Difficulty tier.
    pub level: Option<CourseLevel>,

    /// Whether the course is soft-deleted.
    pub is_deleted: bool,

    /// Optimistic-concurrency counter, bumped on every write.
    pub version: i64,

    /// When the course was created.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    /// When the course was last updated.
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Course {
    /// Whether at least one seat is free.
    #[inline]
    pub fn has_seat(&self) -> bool {
        self.enrolled_count < self.capacity
    }

    /// Free seats remaining (never negative).
    #[inline]
    pub fn seats_remaining(&self) -> i64 {
        (self.capacity - self.enrolled_count).max(0)
    }

    /// Fields that must be non-empty before the course can be published.
    ///
    /// Returns the offending field names, empty when the course is ready.
    pub fn missing_publish_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.title.trim().is_empty() {
            missing.push("title");
        }
        if self.code.trim().is_empty() {
            missing.push("code");
        }
        if self
            .description
            .as_deref()
            .map_or(true, |d| d.trim().is_empty())
        {
            missing.push("description");
        }
        missing
    }
}

// =============================================================================
// Enrollment Status
// =============================================================================

/// The status of a student's enrollment in a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    /// Holding a seat; counts against capacity.
    Active,
    /// Student left via unenroll; seat released, record retained.
    Dropped,
    /// Finished via the completion workflow; seat released, counts towards
    /// prerequisite satisfaction.
    Completed,
}

impl EnrollmentStatus {
    /// Terminal states release their seat but keep the record for history.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, EnrollmentStatus::Dropped | EnrollmentStatus::Completed)
    }

    /// Lowercase storage/display form.
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollmentStatus::Active => "active",
            EnrollmentStatus::Dropped => "dropped",
            EnrollmentStatus::Completed => "completed",
        }
    }
}

impl Default for EnrollmentStatus {
    fn default() -> Self {
        EnrollmentStatus::Active
    }
}

// =============================================================================
// Enrollment
// =============================================================================

/// The relationship between a student and a course.
///
/// Exactly one record exists per (course, student) pair across the pair's
/// whole history: drops and completions flip the status, and a later
/// re-enrollment reactivates the same record. Records are never deleted so
/// Progress and Feedback always have something to hang off.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Enrollment {
    pub id: String,
    pub course_id: String,
    pub student_id: String,
    pub status: EnrollmentStatus,
    #[ts(as = "String")]
    pub enrolled_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Enrollment {
    /// Whether this record currently occupies a seat.
    #[inline]
    pub fn counts_against_capacity(&self) -> bool {
        self.status == EnrollmentStatus::Active
    }
}

// =============================================================================
// Progress
// =============================================================================

/// Per-student completion state for one course.
///
/// Last write wins; there is no enforced monotonic increase, so a re-taken
/// quiz can legitimately lower the percentage.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Progress {
    pub id: String,
    pub course_id: String,
    pub student_id: String,
    /// Completion in percent, within [0, 100].
    pub completion_percentage: f64,
    /// Module ids the student has finished.
    pub completed_modules: Vec<String>,
    #[ts(as = "String")]
    pub last_accessed_at: DateTime<Utc>,
}

// =============================================================================
// Feedback
// =============================================================================

/// A student's one-time rating of a course.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Feedback {
    pub id: String,
    pub course_id: String,
    pub student_id: String,
    /// Overall rating, 1 (worst) to 5 (best).
    pub rating: i64,
    pub comment: Option<String>,
    /// Per-category ratings (e.g. "materials" -> 4), each 1 to 5.
    pub categories: BTreeMap<String, i64>,
    #[ts(as = "String")]
    pub submitted_at: DateTime<Utc>,
}

// =============================================================================
// Principal & Role
// =============================================================================

/// Role attached to an authenticated principal.
///
/// Roles come from the external identity collaborator and are trusted
/// as-is; this core never verifies credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Teacher,
    Admin,
    Staff,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
            Role::Admin => "admin",
            Role::Staff => "staff",
        }
    }
}

/// An authenticated caller: a verified (id, role) pair per request.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Principal {
    pub id: String,
    pub role: Role,
}

impl Principal {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Principal {
            id: id.into(),
            role,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_course_status_transitions() {
        use CourseStatus::*;

        assert!(Draft.can_transition_to(Published));
        assert!(Published.can_transition_to(Archived));
        assert!(Archived.can_transition_to(Published));

        // No other edge exists, including self-loops.
        assert!(!Published.can_transition_to(Published));
        assert!(!Draft.can_transition_to(Archived));
        assert!(!Archived.can_transition_to(Draft));
        assert!(!Published.can_transition_to(Draft));
    }

    #[test]
    fn test_course_status_default() {
        assert_eq!(CourseStatus::default(), CourseStatus::Draft);
    }

    #[test]
    fn test_enrollment_status_terminal() {
        assert!(!EnrollmentStatus::Active.is_terminal());
        assert!(EnrollmentStatus::Dropped.is_terminal());
        assert!(EnrollmentStatus::Completed.is_terminal());
    }

    #[test]
    fn test_course_seats() {
        let mut course = sample_course();
        course.capacity = 3;
        course.enrolled_count = 2;
        assert!(course.has_seat());
        assert_eq!(course.seats_remaining(), 1);

        course.enrolled_count = 3;
        assert!(!course.has_seat());
        assert_eq!(course.seats_remaining(), 0);
    }

    #[test]
    fn test_missing_publish_fields() {
        let mut course = sample_course();
        assert!(course.missing_publish_fields().is_empty());

        course.title = "   ".to_string();
        course.description = None;
        assert_eq!(course.missing_publish_fields(), vec!["title", "description"]);
    }

    #[test]
    fn test_status_serde_snake_case() {
        let json = serde_json::to_string(&CourseStatus::Published).unwrap();
        assert_eq!(json, "\"published\"");
        let json = serde_json::to_string(&EnrollmentStatus::Dropped).unwrap();
        assert_eq!(json, "\"dropped\"");
    }

    fn sample_course() -> Course {
        Course {
            id: "c-1".to_string(),
            code: "CS-101".to_string(),
            title: "Intro to Computer Science".to_string(),
            description: Some("Fundamentals".to_string()),
            status: CourseStatus::Draft,
            capacity: 30,
            enrolled_count: 0,
            instructor_id: "t-1".to_string(),
            prerequisites: vec![],
            credits: 5,
            schedule: None,
            category: Some("computing".to_string()),
            level: Some(CourseLevel::Beginner),
            is_deleted: false,
            version: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}
