//! # Access Policy Guard
//!
//! The single role→capability table consulted before every operation.
//!
//! ## Design
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Access Policy Guard                                │
//! │                                                                         │
//! │  caller (Principal) ──► authorize(principal, action, scope)            │
//! │                              │                                          │
//! │                              ├── 1. table lookup: is the role allowed  │
//! │                              │      to perform the action at all?      │
//! │                              │                                          │
//! │                              ├── 2. scope check: does the caller own   │
//! │                              │      the course / the student record?   │
//! │                              │                                          │
//! │                              └── Ok(()) or CoreError::NotPermitted     │
//! │                                                                         │
//! │  One table, one function. No per-handler role comparisons anywhere     │
//! │  else in the codebase.                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Capability Summary
//! - **student**: enroll/unenroll self, own progress and feedback, browse
//!   the published catalogue
//! - **teacher**: manage courses they own, see roster/aggregates for owned
//!   courses
//! - **admin / staff**: unrestricted

use crate::error::{CoreError, CoreResult};
use crate::types::{Principal, Role};

// =============================================================================
// Actions
// =============================================================================

/// Every guarded operation in the system.
///
/// One variant per externally callable operation; service methods map
/// 1:1 onto these before doing anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CreateCourse,
    UpdateCourse,
    PublishCourse,
    ArchiveCourse,
    DeleteCourse,
    ViewCourse,
    ListCourses,
    CheckEligibility,
    Enroll,
    Unenroll,
    CompleteEnrollment,
    ViewEnrollment,
    ListCourseEnrollments,
    ListStudentEnrollments,
    UpdateProgress,
    ViewProgress,
    ViewProgressSummary,
    SubmitFeedback,
    ViewFeedback,
    ViewAnalytics,
}

impl Action {
    /// Human phrase used in rejection messages.
    pub fn describe(&self) -> &'static str {
        match self {
            Action::CreateCourse => "create courses",
            Action::UpdateCourse => "update courses",
            Action::PublishCourse => "publish courses",
            Action::ArchiveCourse => "archive courses",
            Action::DeleteCourse => "delete courses",
            Action::ViewCourse => "view courses",
            Action::ListCourses => "list courses",
            Action::CheckEligibility => "check enrollment eligibility",
            Action::Enroll => "enroll",
            Action::Unenroll => "unenroll",
            Action::CompleteEnrollment => "complete enrollments",
            Action::ViewEnrollment => "view enrollments",
            Action::ListCourseEnrollments => "list course rosters",
            Action::ListStudentEnrollments => "list student enrollments",
            Action::UpdateProgress => "update progress",
            Action::ViewProgress => "view progress",
            Action::ViewProgressSummary => "view progress summaries",
            Action::SubmitFeedback => "submit feedback",
            Action::ViewFeedback => "view feedback",
            Action::ViewAnalytics => "view analytics",
        }
    }
}

// =============================================================================
// Ownership Scope
// =============================================================================

/// Ownership context of the resource an action touches.
///
/// The table says whether a role may perform an action *at all*; the scope
/// says whether *this* caller owns the resource. Admin and staff pass any
/// scope.
#[derive(Debug, Clone, Copy)]
pub enum Scope<'a> {
    /// No ownership constraint beyond the role table.
    Any,
    /// A course owned by an instructor.
    Course { instructor_id: &'a str },
    /// A student-owned record (enrollment, progress, feedback).
    Student { student_id: &'a str },
    /// A (course, student) pair record: visible to the owning student and
    /// the course's instructor.
    CourseStudent {
        instructor_id: &'a str,
        student_id: &'a str,
    },
}

// =============================================================================
// Permission Table
// =============================================================================

/// The role→capability table. Scope narrowing happens in [`authorize`];
/// this table answers only "can this role ever do this".
const PERMISSIONS: &[(Action, &[Role])] = &[
    (
        Action::CreateCourse,
        &[Role::Teacher, Role::Admin, Role::Staff],
    ),
    (
        Action::UpdateCourse,
        &[Role::Teacher, Role::Admin, Role::Staff],
    ),
    (
        Action::PublishCourse,
        &[Role::Teacher, Role::Admin, Role::Staff],
    ),
    (
        Action::ArchiveCourse,
        &[Role::Teacher, Role::Admin, Role::Staff],
    ),
    (
        Action::DeleteCourse,
        &[Role::Teacher, Role::Admin, Role::Staff],
    ),
    (
        Action::ViewCourse,
        &[Role::Student, Role::Teacher, Role::Admin, Role::Staff],
    ),
    (
        Action::ListCourses,
        &[Role::Student, Role::Teacher, Role::Admin, Role::Staff],
    ),
    (
        Action::CheckEligibility,
        &[Role::Student, Role::Admin, Role::Staff],
    ),
    (Action::Enroll, &[Role::Student, Role::Admin, Role::Staff]),
    (Action::Unenroll, &[Role::Student, Role::Admin, Role::Staff]),
    (Action::CompleteEnrollment, &[Role::Admin, Role::Staff]),
    (
        Action::ViewEnrollment,
        &[Role::Student, Role::Teacher, Role::Admin, Role::Staff],
    ),
    (
        Action::ListCourseEnrollments,
        &[Role::Teacher, Role::Admin, Role::Staff],
    ),
    (
        Action::ListStudentEnrollments,
        &[Role::Student, Role::Admin, Role::Staff],
    ),
    (Action::UpdateProgress, &[Role::Student]),
    (
        Action::ViewProgress,
        &[Role::Student, Role::Teacher, Role::Admin, Role::Staff],
    ),
    (
        Action::ViewProgressSummary,
        &[Role::Teacher, Role::Admin, Role::Staff],
    ),
    (Action::SubmitFeedback, &[Role::Student]),
    (
        Action::ViewFeedback,
        &[Role::Student, Role::Teacher, Role::Admin, Role::Staff],
    ),
    (
        Action::ViewAnalytics,
        &[Role::Teacher, Role::Admin, Role::Staff],
    ),
];

fn allowed_roles(action: Action) -> &'static [Role] {
    PERMISSIONS
        .iter()
        .find(|(a, _)| *a == action)
        .map(|(_, roles)| *roles)
        .unwrap_or(&[])
}

// =============================================================================
// Authorization Check
// =============================================================================

/// Evaluates the policy for one operation, before any mutation.
///
/// Rejected calls have zero side effects: this function touches no storage
/// and the services call it first.
///
/// ## Errors
/// Returns [`CoreError::NotPermitted`] when the role is not in the table
/// for the action, or when the ownership scope does not match the caller.
pub fn authorize(principal: &Principal, action: Action, scope: Scope<'_>) -> CoreResult<()> {
    if !allowed_roles(action).contains(&principal.role) {
        return Err(CoreError::not_permitted(format!(
            "{} may not {}",
            principal.role.as_str(),
            action.describe()
        )));
    }

    match principal.role {
        // Unrestricted roles pass every scope.
        Role::Admin | Role::Staff => Ok(()),

        Role::Teacher => match scope {
            Scope::Any => Ok(()),
            Scope::Course { instructor_id }
            | Scope::CourseStudent { instructor_id, .. } => {
                if principal.id == instructor_id {
                    Ok(())
                } else {
                    Err(CoreError::not_permitted(format!(
                        "teacher {} does not own this course",
                        principal.id
                    )))
                }
            }
            Scope::Student { .. } => Err(CoreError::not_permitted(
                "teachers may not act on student-owned records",
            )),
        },

        Role::Student => match scope {
            Scope::Any => Ok(()),
            Scope::Student { student_id }
            | Scope::CourseStudent { student_id, .. } => {
                if principal.id == student_id {
                    Ok(())
                } else {
                    Err(CoreError::not_permitted(
                        "students may only act on their own records",
                    ))
                }
            }
            Scope::Course { .. } => Err(CoreError::not_permitted(
                "students may not manage courses",
            )),
        },
    }
}

/// Whether this principal's role bypasses ownership scopes entirely.
///
/// Content gating (draft visibility, full-catalogue listings) needs the
/// plain "back office or not" question, independent of any one action.
/// Keeping it here preserves the no-role-comparisons-outside-this-module
/// rule.
pub fn is_unrestricted(principal: &Principal) -> bool {
    matches!(principal.role, Role::Admin | Role::Staff)
}

// =============================================================================
// Unit Tests
// =============================================================================
