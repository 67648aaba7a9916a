//! # Eligibility Evaluator
//!
//! Pure, read-only answer to "may this student enroll in this course now".
//!
//! ## Evaluation Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Eligibility Evaluation                               │
//! │                                                                         │
//! │  storage reads ──► EligibilitySnapshot (one consistent view)           │
//! │                          │                                              │
//! │                          ▼                                              │
//! │                    evaluate(&snapshot)     ← pure, no I/O              │
//! │                          │                                              │
//! │        ┌─────────────────┼─────────────────┬─────────────────┐         │
//! │        ▼                 ▼                 ▼                 ▼         │
//! │   published?      not already        seat free?        prerequisites   │
//! │                   enrolled?                             completed?     │
//! │        │                 │                 │                 │         │
//! │        └────────────── ALL rules run, no short-circuit ─────┘         │
//! │                          │                                              │
//! │                          ▼                                              │
//! │        Eligibility { eligible, reasons: [every failure] }              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The same evaluation backs the UI-facing "can I enroll" query and the
//! pre-check inside `enroll`, so a failed enrollment always carries the
//! error matching the reason the student was already shown.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, ErrorKind};
use crate::types::{CourseStatus, EnrollmentStatus};

// =============================================================================
// Snapshot
// =============================================================================

/// One consistent view of everything the rules need.
///
/// The storage layer assembles this from a single point-in-time read; the
/// evaluator itself never touches storage.
#[derive(Debug, Clone)]
pub struct EligibilitySnapshot {
    pub course_id: String,
    pub course_status: CourseStatus,
    pub capacity: i64,
    /// Number of currently active enrollments for the course.
    pub active_count: i64,
    /// Course ids required before enrolling.
    pub prerequisites: Vec<String>,
    /// The student's existing enrollment record for this course, if any.
    pub existing_status: Option<EnrollmentStatus>,
    /// Course ids the student has completed (across all their enrollments).
    pub completed_courses: Vec<String>,
}

// =============================================================================
// Reasons
// =============================================================================

/// A single failed eligibility rule.
///
/// Serialized with a machine-readable `kind` tag so clients can branch
/// without parsing prose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum IneligibilityReason {
    /// The course is not currently published.
    NotPublished,
    /// The student already holds an active enrollment.
    AlreadyEnrolled,
    /// Active enrollments have reached capacity.
    CourseFull,
    /// One or more prerequisite courses are not completed.
    MissingPrerequisite { missing: Vec<String> },
}

impl IneligibilityReason {
    /// The error category `enroll` raises for this reason.
    ///
    /// Keeping the mapping here (single source of truth) guarantees the
    /// enrollment failure kind always matches the reported reason.
    pub fn error_kind(&self) -> ErrorKind {
        match self {
            IneligibilityReason::NotPublished => ErrorKind::StateError,
            IneligibilityReason::AlreadyEnrolled => ErrorKind::Conflict,
            IneligibilityReason::CourseFull => ErrorKind::CapacityExceeded,
            IneligibilityReason::MissingPrerequisite { .. } => ErrorKind::StateError,
        }
    }

    /// The concrete error `enroll` raises for this reason.
    pub fn to_error(&self, snapshot: &EligibilitySnapshot, student_id: &str) -> CoreError {
        match self {
            IneligibilityReason::NotPublished => CoreError::NotPublished {
                course_id: snapshot.course_id.clone(),
                status: snapshot.course_status.as_str().to_string(),
            },
            IneligibilityReason::AlreadyEnrolled => CoreError::AlreadyEnrolled {
                course_id: snapshot.course_id.clone(),
                student_id: student_id.to_string(),
            },
            IneligibilityReason::CourseFull => CoreError::CourseFull {
                course_id: snapshot.course_id.clone(),
                capacity: snapshot.capacity,
            },
            IneligibilityReason::MissingPrerequisite { missing } => {
                CoreError::MissingPrerequisites {
                    course_id: snapshot.course_id.clone(),
                    student_id: student_id.to_string(),
                    missing: missing.clone(),
                }
            }
        }
    }
}

// =============================================================================
// Result
// =============================================================================

/// The computed boolean-plus-reasons eligibility answer.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Eligibility {
    pub eligible: bool,
    /// Every failed rule, in rule order. Empty iff `eligible`.
    pub reasons: Vec<IneligibilityReason>,
}

impl Eligibility {
    /// The error a mutation should raise, taken from the first failed rule.
    ///
    /// Rule order is fixed (published, pair, capacity, prerequisites), so
    /// the blocking error is deterministic when several rules fail at once.
    pub fn blocking_error(
        &self,
        snapshot: &EligibilitySnapshot,
        student_id: &str,
    ) -> Option<CoreError> {
        self.reasons
            .first()
            .map(|reason| reason.to_error(snapshot, student_id))
    }
}

// =============================================================================
// Evaluation
// =============================================================================

/// Runs every eligibility rule against the snapshot.
///
/// All rules are evaluated (no short-circuit) so the caller sees every
/// failing reason at once, not just the first.
pub fn evaluate(snapshot: &EligibilitySnapshot) -> Eligibility {
    let mut reasons = Vec::new();

    if snapshot.course_status != CourseStatus::Published {
        reasons.push(IneligibilityReason::NotPublished);
    }

    if snapshot.existing_status == Some(EnrollmentStatus::Active) {
        reasons.push(IneligibilityReason::AlreadyEnrolled);
    }

    if snapshot.active_count >= snapshot.capacity {
        reasons.push(IneligibilityReason::CourseFull);
    }

    let missing: Vec<String> = snapshot
        .prerequisites
        .iter()
        .filter(|p| !snapshot.completed_courses.contains(p))
        .cloned()
        .collect();
    if !missing.is_empty() {
        reasons.push(IneligibilityReason::MissingPrerequisite { missing });
    }

    Eligibility {
        eligible: reasons.is_empty(),
        reasons,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn open_course() -> EligibilitySnapshot {
        EligibilitySnapshot {
            course_id: "c-1".to_string(),
            course_status: CourseStatus::Published,
            capacity: 30,
            active_count: 10,
            prerequisites: vec![],
            existing_status: None,
            completed_courses: vec![],
        }
    }

    #[test]
    fn test_eligible_when_all_rules_pass() {
        let result = evaluate(&open_course());
        assert!(result.eligible);
        assert!(result.reasons.is_empty());
    }

    #[test]
    fn test_draft_course_not_eligible() {
        let mut snapshot = open_course();
        snapshot.course_status = CourseStatus::Draft;

        let result = evaluate(&snapshot);
        assert!(!result.eligible);
        assert_eq!(result.reasons, vec![IneligibilityReason::NotPublished]);
    }

    #[test]
    fn test_active_enrollment_blocks_but_terminal_does_not() {
        let mut snapshot = open_course();

        snapshot.existing_status = Some(EnrollmentStatus::Active);
        assert!(!evaluate(&snapshot).eligible);

        // Dropped and completed records do not block re-enrollment.
        snapshot.existing_status = Some(EnrollmentStatus::Dropped);
        assert!(evaluate(&snapshot).eligible);
        snapshot.existing_status = Some(EnrollmentStatus::Completed);
        assert!(evaluate(&snapshot).eligible);
    }

    #[test]
    fn test_full_course() {
        let mut snapshot = open_course();
        snapshot.active_count = 30;

        let result = evaluate(&snapshot);
        assert_eq!(result.reasons, vec![IneligibilityReason::CourseFull]);

        // Zero-capacity courses are always full.
        snapshot.capacity = 0;
        snapshot.active_count = 0;
        assert!(!evaluate(&snapshot).eligible);
    }

    #[test]
    fn test_missing_prerequisites_lists_unmet_ids() {
        let mut snapshot = open_course();
        snapshot.prerequisites = vec!["p-1".to_string(), "p-2".to_string(), "p-3".to_string()];
        snapshot.completed_courses = vec!["p-2".to_string()];

        let result = evaluate(&snapshot);
        assert!(!result.eligible);
        assert_eq!(
            result.reasons,
            vec![IneligibilityReason::MissingPrerequisite {
                missing: vec!["p-1".to_string(), "p-3".to_string()],
            }]
        );
    }

    #[test]
    fn test_all_failing_reasons_reported_together() {
        let snapshot = EligibilitySnapshot {
            course_id: "c-1".to_string(),
            course_status: CourseStatus::Draft,
            capacity: 1,
            active_count: 1,
            prerequisites: vec!["p-1".to_string()],
            existing_status: Some(EnrollmentStatus::Active),
            completed_courses: vec![],
        };

        let result = evaluate(&snapshot);
        assert!(!result.eligible);
        assert_eq!(result.reasons.len(), 4);
        assert_eq!(result.reasons[0], IneligibilityReason::NotPublished);
        assert_eq!(result.reasons[1], IneligibilityReason::AlreadyEnrolled);
        assert_eq!(result.reasons[2], IneligibilityReason::CourseFull);
        assert!(matches!(
            result.reasons[3],
            IneligibilityReason::MissingPrerequisite { .. }
        ));
    }

    #[test]
    fn test_reason_kinds_serialize_kebab_case() {
        let json = serde_json::to_string(&IneligibilityReason::NotPublished).unwrap();
        assert_eq!(json, r#"{"kind":"not-published"}"#);

        let json = serde_json::to_string(&IneligibilityReason::MissingPrerequisite {
            missing: vec!["p-1".to_string()],
        })
        .unwrap();
        assert_eq!(json, r#"{"kind":"missing-prerequisite","missing":["p-1"]}"#);
    }

    #[test]
    fn test_blocking_error_matches_reason_kind() {
        let mut snapshot = open_course();
        snapshot.course_status = CourseStatus::Archived;
        snapshot.active_count = 30;

        let result = evaluate(&snapshot);
        let error = result.blocking_error(&snapshot, "s-1").unwrap();

        // First failed rule wins, and its error kind matches the mapping.
        assert_eq!(error.kind(), result.reasons[0].error_kind());
        assert_eq!(error.kind(), ErrorKind::StateError);
    }

    #[test]
    fn test_to_error_kind_agrees_with_error_kind() {
        let snapshot = open_course();
        let reasons = [
            IneligibilityReason::NotPublished,
            IneligibilityReason::AlreadyEnrolled,
            IneligibilityReason::CourseFull,
            IneligibilityReason::MissingPrerequisite {
                missing: vec!["p-1".to_string()],
            },
        ];
        for reason in reasons {
            assert_eq!(reason.to_error(&snapshot, "s-1").kind(), reason.error_kind());
        }
    }
}
