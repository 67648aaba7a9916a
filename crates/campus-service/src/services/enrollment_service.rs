//! # Enrollment Service
//!
//! Seat admission, drops, completions and roster reads.
//!
//! ## Admission Loop
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  enroll(principal, course, student)                                     │
//! │                                                                         │
//! │  authorize ──► read course ──► evaluate eligibility rules               │
//! │                     ▲                  │                                │
//! │                     │           ineligible? ──► precise domain error    │
//! │                     │                  │                                │
//! │                     │                  ▼                                │
//! │                     │        try_admit(course, version, student)        │
//! │                     │                  │                                │
//! │                     │        ┌─────────┼──────────────┐                 │
//! │                     │        ▼         ▼              ▼                 │
//! │                     │    Admitted  AlreadyActive  SeatUnavailable       │
//! │                     │        │         │              │                 │
//! │                     │        ▼         ▼              │ lost the        │
//! │                     │      Ok(e)   Conflict           │ version race    │
//! │                     │                                 │                 │
//! │                     └───────── fresh read, ≤ retry budget ──────────────┘
//! │                                                                         │
//! │  budget exhausted while seats still looked free ──► Contention          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The version only advances when an admission commits, so under pure
//! enrollment traffic the loop cannot exhaust its budget before the course
//! is genuinely full: a lost race means someone else took a seat, and the
//! next read either finds a seat or reports the course full.

use std::sync::Arc;

use tracing::{debug, info, warn};

use campus_core::eligibility::{evaluate, Eligibility, EligibilitySnapshot};
use campus_core::{
    authorize, Action, CoreError, Course, Enrollment, EnrollmentStatus, Principal, Scope,
};
use campus_db::AdmitOutcome;

use crate::error::{ServiceError, ServiceResult};
use crate::AppState;

/// Enrollment ledger service.
pub struct EnrollmentService {
    state: Arc<AppState>,
}

impl EnrollmentService {
    pub fn new(state: Arc<AppState>) -> Self {
        EnrollmentService { state }
    }

    /// Read-only "may this student enroll right now" answer.
    ///
    /// Runs the same rules as [`enroll`](Self::enroll), so a subsequent
    /// enrollment failure always matches a reason reported here.
    pub async fn check_eligibility(
        &self,
        principal: &Principal,
        course_id: &str,
        student_id: &str,
    ) -> ServiceResult<Eligibility> {
        authorize(principal, Action::CheckEligibility, Scope::Student { student_id })?;

        let course = self.require_course(course_id).await?;
        let snapshot = self.snapshot(&course, student_id).await?;
        Ok(evaluate(&snapshot))
    }

    /// Enrolls a student into a course.
    ///
    /// The seat is claimed with a conditional write keyed on the course
    /// version; losing the race costs one attempt from the configured
    /// budget. Rejections carry the first failed eligibility rule's error.
    pub async fn enroll(
        &self,
        principal: &Principal,
        course_id: &str,
        student_id: &str,
    ) -> ServiceResult<Enrollment> {
        authorize(principal, Action::Enroll, Scope::Student { student_id })?;

        let budget = self.state.config.enroll_retry_limit.max(1);
        for attempt in 1..=budget {
            let course = self.require_course(course_id).await?;

            let snapshot = self.snapshot(&course, student_id).await?;
            if let Some(error) = evaluate(&snapshot).blocking_error(&snapshot, student_id) {
                return Err(error.into());
            }

            match self
                .state
                .db
                .enrollments()
                .try_admit(&course.id, course.version, student_id)
                .await?
            {
                AdmitOutcome::Admitted(enrollment) => {
                    info!(
                        course_id = %course_id,
                        student_id = %student_id,
                        enrollment_id = %enrollment.id,
                        attempt = attempt,
                        "Student enrolled"
                    );
                    return Ok(enrollment);
                }
                AdmitOutcome::AlreadyActive(_) => {
                    return Err(CoreError::AlreadyEnrolled {
                        course_id: course_id.to_string(),
                        student_id: student_id.to_string(),
                    }
                    .into());
                }
                AdmitOutcome::SeatUnavailable => {
                    // Version moved under us. Loop back to a fresh read: if
                    // the course filled or left published the eligibility
                    // gate reports it precisely, otherwise we try again.
                    debug!(
                        course_id = %course_id,
                        student_id = %student_id,
                        attempt = attempt,
                        "Admission attempt lost the version race"
                    );
                }
            }
        }

        warn!(
            course_id = %course_id,
            student_id = %student_id,
            budget = budget,
            "Admission retry budget exhausted"
        );
        Err(ServiceError::Contention {
            course_id: course_id.to_string(),
        })
    }

    /// Drops the student's active enrollment and frees the seat.
    ///
    /// A second call on an already-dropped (or never-enrolled) pair reports
    /// NotFound; the seat count is only ever decremented once.
    pub async fn unenroll(
        &self,
        principal: &Principal,
        course_id: &str,
        student_id: &str,
    ) -> ServiceResult<Enrollment> {
        authorize(principal, Action::Unenroll, Scope::Student { student_id })?;

        self.require_course(course_id).await?;

        match self
            .state
            .db
            .enrollments()
            .mark_dropped(course_id, student_id)
            .await?
        {
            Some(enrollment) => {
                info!(course_id = %course_id, student_id = %student_id, "Student unenrolled");
                Ok(enrollment)
            }
            // Never-enrolled and already-dropped look the same here: no
            // active record, nothing released.
            None => Err(CoreError::not_found(
                "Active enrollment",
                format!("{course_id}/{student_id}"),
            )
            .into()),
        }
    }

    /// Marks an active enrollment completed (back office workflow).
    ///
    /// Frees the seat and counts towards prerequisite satisfaction from
    /// then on. Unlike unenroll, a non-active record is reported precisely
    /// so the operator sees what state the workflow actually found.
    pub async fn complete(
        &self,
        principal: &Principal,
        course_id: &str,
        student_id: &str,
    ) -> ServiceResult<Enrollment> {
        authorize(principal, Action::CompleteEnrollment, Scope::Any)?;

        self.require_course(course_id).await?;

        match self
            .state
            .db
            .enrollments()
            .mark_completed(course_id, student_id)
            .await?
        {
            Some(enrollment) => {
                info!(course_id = %course_id, student_id = %student_id, "Enrollment completed");
                Ok(enrollment)
            }
            None => match self
                .state
                .db
                .enrollments()
                .find_pair(course_id, student_id)
                .await?
            {
                Some(existing) => Err(CoreError::EnrollmentNotActive {
                    course_id: course_id.to_string(),
                    student_id: student_id.to_string(),
                    status: existing.status.as_str().to_string(),
                }
                .into()),
                None => Err(CoreError::not_found(
                    "Enrollment",
                    format!("{course_id}/{student_id}"),
                )
                .into()),
            },
        }
    }

    /// One student's standing in one course (the ledger row, any status).
    pub async fn get_status(
        &self,
        principal: &Principal,
        course_id: &str,
        student_id: &str,
    ) -> ServiceResult<Enrollment> {
        let course = self.require_course(course_id).await?;
        authorize(
            principal,
            Action::ViewEnrollment,
            Scope::CourseStudent {
                instructor_id: &course.instructor_id,
                student_id,
            },
        )?;

        self.state
            .db
            .enrollments()
            .find_pair(course_id, student_id)
            .await?
            .ok_or_else(|| {
                CoreError::not_found("Enrollment", format!("{course_id}/{student_id}")).into()
            })
    }

    /// A course's roster, oldest enrollment first.
    ///
    /// Callers with roster rights see every row. An enrolled student sees
    /// exactly their own record and nobody else's; a student with no record
    /// keeps the roster rejection.
    pub async fn list_for_course(
        &self,
        principal: &Principal,
        course_id: &str,
        status: Option<EnrollmentStatus>,
    ) -> ServiceResult<Vec<Enrollment>> {
        let course = self.require_course(course_id).await?;

        match authorize(
            principal,
            Action::ListCourseEnrollments,
            Scope::Course {
                instructor_id: &course.instructor_id,
            },
        ) {
            Ok(()) => Ok(self
                .state
                .db
                .enrollments()
                .list_for_course(course_id, status)
                .await?),
            Err(roster_denied) => {
                // Fall back to the caller's own-record view when they may
                // hold one; otherwise the roster rejection stands.
                if authorize(
                    principal,
                    Action::ViewEnrollment,
                    Scope::CourseStudent {
                        instructor_id: &course.instructor_id,
                        student_id: &principal.id,
                    },
                )
                .is_err()
                {
                    return Err(roster_denied.into());
                }

                let own = self
                    .state
                    .db
                    .enrollments()
                    .find_pair(course_id, &principal.id)
                    .await?;
                Ok(own
                    .into_iter()
                    .filter(|e| status.is_none_or(|s| e.status == s))
                    .collect())
            }
        }
    }

    /// One student's enrollment history across every course, newest first.
    pub async fn list_for_student(
        &self,
        principal: &Principal,
        student_id: &str,
    ) -> ServiceResult<Vec<Enrollment>> {
        authorize(
            principal,
            Action::ListStudentEnrollments,
            Scope::Student { student_id },
        )?;

        Ok(self
            .state
            .db
            .enrollments()
            .list_for_student(student_id)
            .await?)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Fetches a live course or reports NotFound.
    async fn require_course(&self, course_id: &str) -> ServiceResult<Course> {
        self.state
            .db
            .courses()
            .get(course_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Course", course_id).into())
    }

    /// Assembles the one consistent view the eligibility rules run against.
    async fn snapshot(
        &self,
        course: &Course,
        student_id: &str,
    ) -> ServiceResult<EligibilitySnapshot> {
        let enrollments = self.state.db.enrollments();
        let existing = enrollments.find_pair(&course.id, student_id).await?;
        let completed_courses = enrollments.completed_course_ids(student_id).await?;

        Ok(EligibilitySnapshot {
            course_id: course.id.clone(),
            course_status: course.status,
            capacity: course.capacity,
            active_count: course.enrolled_count,
            prerequisites: course.prerequisites.clone(),
            existing_status: existing.map(|e| e.status),
            completed_courses,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::course_service::CreateCourseRequest;
    use crate::{Campus, ServiceConfig};
    use campus_core::{ErrorKind, IneligibilityReason, Role};
    use campus_db::{Database, DbConfig};

    async fn campus() -> Campus {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        Campus::with_database(db, ServiceConfig::default())
    }

    fn teacher(id: &str) -> Principal {
        Principal::new(id, Role::Teacher)
    }

    fn student(id: &str) -> Principal {
        Principal::new(id, Role::Student)
    }

    fn staff() -> Principal {
        Principal::new("op-1", Role::Staff)
    }

    async fn published(campus: &Campus, owner: &Principal, code: &str, capacity: i64) -> Course {
        published_with_prereqs(campus, owner, code, capacity, vec![]).await
    }

    async fn published_with_prereqs(
        campus: &Campus,
        owner: &Principal,
        code: &str,
        capacity: i64,
        prerequisites: Vec<String>,
    ) -> Course {
        let created = campus
            .courses()
            .create(
                owner,
                CreateCourseRequest {
                    code: code.to_string(),
                    title: format!("Course {code}"),
                    description: Some("Full syllabus".to_string()),
                    capacity,
                    credits: 5,
                    prerequisites,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        campus.courses().publish(owner, &created.id).await.unwrap()
    }

    #[tokio::test]
    async fn test_enroll_holds_a_seat() {
        let campus = campus().await;
        let owner = teacher("t-1");
        let course = published(&campus, &owner, "CS-101", 30).await;

        let s = student("s-1");
        let enrollment = campus
            .enrollments()
            .enroll(&s, &course.id, "s-1")
            .await
            .unwrap();
        assert_eq!(enrollment.status, EnrollmentStatus::Active);
        assert_eq!(enrollment.course_id, course.id);

        let refreshed = campus.courses().get(&owner, &course.id).await.unwrap();
        assert_eq!(refreshed.enrolled_count, 1);
    }

    #[tokio::test]
    async fn test_double_enroll_conflicts() {
        let campus = campus().await;
        let owner = teacher("t-1");
        let course = published(&campus, &owner, "CS-101", 30).await;

        let s = student("s-1");
        campus
            .enrollments()
            .enroll(&s, &course.id, "s-1")
            .await
            .unwrap();
        let err = campus
            .enrollments()
            .enroll(&s, &course.id, "s-1")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Conflict);
        // Still exactly one seat held.
        let refreshed = campus.courses().get(&owner, &course.id).await.unwrap();
        assert_eq!(refreshed.enrolled_count, 1);
    }

    #[tokio::test]
    async fn test_unpublished_course_rejects_enrollment() {
        let campus = campus().await;
        let owner = teacher("t-1");
        let draft = campus
            .courses()
            .create(
                &owner,
                CreateCourseRequest {
                    code: "CS-900".to_string(),
                    title: "Unready".to_string(),
                    description: Some("...".to_string()),
                    capacity: 10,
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let err = campus
            .enrollments()
            .enroll(&student("s-1"), &draft.id, "s-1")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StateError);
        assert!(err.to_string().contains("draft"));

        // Archived courses reject the same way.
        let course = published(&campus, &owner, "CS-901", 10).await;
        campus.courses().archive(&owner, &course.id).await.unwrap();
        let err = campus
            .enrollments()
            .enroll(&student("s-1"), &course.id, "s-1")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StateError);
    }

    #[tokio::test]
    async fn test_enroll_unknown_course_not_found() {
        let campus = campus().await;
        let err = campus
            .enrollments()
            .enroll(&student("s-1"), "no-such-course", "s-1")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_student_cannot_enroll_someone_else() {
        let campus = campus().await;
        let owner = teacher("t-1");
        let course = published(&campus, &owner, "CS-101", 30).await;

        let err = campus
            .enrollments()
            .enroll(&student("s-1"), &course.id, "s-2")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AuthorizationError);

        // Back office can enroll on a student's behalf.
        campus
            .enrollments()
            .enroll(&staff(), &course.id, "s-2")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_unenroll_frees_seat_and_second_call_is_not_found() {
        let campus = campus().await;
        let owner = teacher("t-1");
        let course = published(&campus, &owner, "CS-101", 30).await;

        let s = student("s-1");
        campus
            .enrollments()
            .enroll(&s, &course.id, "s-1")
            .await
            .unwrap();
        let dropped = campus
            .enrollments()
            .unenroll(&s, &course.id, "s-1")
            .await
            .unwrap();
        assert_eq!(dropped.status, EnrollmentStatus::Dropped);

        let refreshed = campus.courses().get(&owner, &course.id).await.unwrap();
        assert_eq!(refreshed.enrolled_count, 0);

        // Second drop finds no active record and must not decrement again.
        let err = campus
            .enrollments()
            .unenroll(&s, &course.id, "s-1")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let refreshed = campus.courses().get(&owner, &course.id).await.unwrap();
        assert_eq!(refreshed.enrolled_count, 0);
    }

    #[tokio::test]
    async fn test_reenroll_after_drop_reuses_the_record() {
        let campus = campus().await;
        let owner = teacher("t-1");
        let course = published(&campus, &owner, "CS-101", 30).await;

        let s = student("s-1");
        let first = campus
            .enrollments()
            .enroll(&s, &course.id, "s-1")
            .await
            .unwrap();
        campus
            .enrollments()
            .unenroll(&s, &course.id, "s-1")
            .await
            .unwrap();
        let second = campus
            .enrollments()
            .enroll(&s, &course.id, "s-1")
            .await
            .unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.status, EnrollmentStatus::Active);
    }

    #[tokio::test]
    async fn test_completion_is_back_office_only() {
        let campus = campus().await;
        let owner = teacher("t-1");
        let course = published(&campus, &owner, "CS-101", 30).await;
        let s = student("s-1");
        campus
            .enrollments()
            .enroll(&s, &course.id, "s-1")
            .await
            .unwrap();

        for caller in [&s, &owner] {
            let err = campus
                .enrollments()
                .complete(caller, &course.id, "s-1")
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::AuthorizationError);
        }

        let completed = campus
            .enrollments()
            .complete(&staff(), &course.id, "s-1")
            .await
            .unwrap();
        assert_eq!(completed.status, EnrollmentStatus::Completed);

        // The seat is free again.
        let refreshed = campus.courses().get(&owner, &course.id).await.unwrap();
        assert_eq!(refreshed.enrolled_count, 0);

        // Completing again reports the actual state.
        let err = campus
            .enrollments()
            .complete(&staff(), &course.id, "s-1")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StateError);
        assert!(err.to_string().contains("completed"));
    }

    #[tokio::test]
    async fn test_roster_visibility() {
        let campus = campus().await;
        let owner = teacher("t-1");
        let course = published(&campus, &owner, "CS-101", 30).await;
        for id in ["s-1", "s-2", "s-3"] {
            campus
                .enrollments()
                .enroll(&student(id), &course.id, id)
                .await
                .unwrap();
        }
        campus
            .enrollments()
            .unenroll(&student("s-3"), &course.id, "s-3")
            .await
            .unwrap();

        // Owner sees the full roster, filterable by status.
        let all = campus
            .enrollments()
            .list_for_course(&owner, &course.id, None)
            .await
            .unwrap();
        assert_eq!(all.len(), 3);
        let active = campus
            .enrollments()
            .list_for_course(&owner, &course.id, Some(EnrollmentStatus::Active))
            .await
            .unwrap();
        assert_eq!(active.len(), 2);

        // An enrolled student sees exactly their own record.
        let own = campus
            .enrollments()
            .list_for_course(&student("s-1"), &course.id, None)
            .await
            .unwrap();
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].student_id, "s-1");

        // A student with no record keeps the roster rejection.
        let err = campus
            .enrollments()
            .list_for_course(&student("s-9"), &course.id, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AuthorizationError);

        // Another teacher has no roster rights here either.
        let err = campus
            .enrollments()
            .list_for_course(&teacher("t-2"), &course.id, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AuthorizationError);
    }

    #[tokio::test]
    async fn test_student_history() {
        let campus = campus().await;
        let owner = teacher("t-1");
        let a = published(&campus, &owner, "CS-101", 30).await;
        let b = published(&campus, &owner, "CS-102", 30).await;

        let s = student("s-1");
        campus.enrollments().enroll(&s, &a.id, "s-1").await.unwrap();
        campus.enrollments().enroll(&s, &b.id, "s-1").await.unwrap();
        campus
            .enrollments()
            .unenroll(&s, &a.id, "s-1")
            .await
            .unwrap();

        let history = campus
            .enrollments()
            .list_for_student(&s, "s-1")
            .await
            .unwrap();
        assert_eq!(history.len(), 2);

        // Own records only: a classmate's history is off limits.
        let err = campus
            .enrollments()
            .list_for_student(&student("s-2"), "s-1")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AuthorizationError);

        let standing = campus
            .enrollments()
            .get_status(&s, &a.id, "s-1")
            .await
            .unwrap();
        assert_eq!(standing.status, EnrollmentStatus::Dropped);
    }

    // Full lifecycle at capacity five: fill, reject the sixth, free one
    // seat, admit the sixth on retry.
    #[tokio::test]
    async fn test_capacity_five_fill_and_refill() {
        let campus = campus().await;
        let owner = teacher("t-1");
        let course = published(&campus, &owner, "POP-100", 5).await;

        for i in 0..5 {
            let id = format!("s-{i}");
            campus
                .enrollments()
                .enroll(&student(&id), &course.id, &id)
                .await
                .unwrap();
        }

        let sixth = student("s-5");
        let verdict = campus
            .enrollments()
            .check_eligibility(&sixth, &course.id, "s-5")
            .await
            .unwrap();
        assert!(!verdict.eligible);
        assert_eq!(verdict.reasons, vec![IneligibilityReason::CourseFull]);

        let err = campus
            .enrollments()
            .enroll(&sixth, &course.id, "s-5")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CapacityExceeded);

        // One student leaves; the freed seat goes to the sixth on retry.
        campus
            .enrollments()
            .unenroll(&student("s-0"), &course.id, "s-0")
            .await
            .unwrap();
        let admitted = campus
            .enrollments()
            .enroll(&sixth, &course.id, "s-5")
            .await
            .unwrap();
        assert_eq!(admitted.status, EnrollmentStatus::Active);

        let refreshed = campus.courses().get(&owner, &course.id).await.unwrap();
        assert_eq!(refreshed.enrolled_count, 5);
    }

    // Prerequisite gate end to end: the eligibility answer, the enrollment
    // rejection kind, and the path clearing after completion all agree.
    #[tokio::test]
    async fn test_prerequisite_gate_end_to_end() {
        let campus = campus().await;
        let owner = teacher("t-1");
        let intro = published(&campus, &owner, "CS-101", 30).await;
        let advanced =
            published_with_prereqs(&campus, &owner, "CS-201", 30, vec![intro.id.clone()]).await;

        let s = student("s-1");
        let verdict = campus
            .enrollments()
            .check_eligibility(&s, &advanced.id, "s-1")
            .await
            .unwrap();
        assert!(!verdict.eligible);
        assert_eq!(
            verdict.reasons,
            vec![IneligibilityReason::MissingPrerequisite {
                missing: vec![intro.id.clone()],
            }]
        );

        let err = campus
            .enrollments()
            .enroll(&s, &advanced.id, "s-1")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), verdict.reasons[0].error_kind());
        assert!(err.to_string().contains(&intro.id));

        // Merely enrolling in the prerequisite is not enough.
        campus
            .enrollments()
            .enroll(&s, &intro.id, "s-1")
            .await
            .unwrap();
        let err = campus
            .enrollments()
            .enroll(&s, &advanced.id, "s-1")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StateError);

        // Completion clears the path.
        campus
            .enrollments()
            .complete(&staff(), &intro.id, "s-1")
            .await
            .unwrap();
        let verdict = campus
            .enrollments()
            .check_eligibility(&s, &advanced.id, "s-1")
            .await
            .unwrap();
        assert!(verdict.eligible);
        campus
            .enrollments()
            .enroll(&s, &advanced.id, "s-1")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_eligibility_reports_every_failure() {
        let campus = campus().await;
        let owner = teacher("t-1");
        let intro = published(&campus, &owner, "CS-101", 30).await;
        let narrow =
            published_with_prereqs(&campus, &owner, "CS-210", 1, vec![intro.id.clone()]).await;

        // Fill the single seat legitimately.
        campus
            .enrollments()
            .enroll(&student("s-7"), &intro.id, "s-7")
            .await
            .unwrap();
        campus
            .enrollments()
            .complete(&staff(), &intro.id, "s-7")
            .await
            .unwrap();
        campus
            .enrollments()
            .enroll(&student("s-7"), &narrow.id, "s-7")
            .await
            .unwrap();

        // s-1 now fails on both capacity and prerequisites at once.
        let verdict = campus
            .enrollments()
            .check_eligibility(&student("s-1"), &narrow.id, "s-1")
            .await
            .unwrap();
        assert!(!verdict.eligible);
        assert_eq!(verdict.reasons.len(), 2);
        assert_eq!(verdict.reasons[0], IneligibilityReason::CourseFull);
        assert!(matches!(
            verdict.reasons[1],
            IneligibilityReason::MissingPrerequisite { .. }
        ));
    }

    // Eight students race for three seats on a file-backed database.
    // Exactly three are admitted; the rest get the capacity rejection, and
    // the final enrolled count matches the roster.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_enrollment_fills_exactly_to_capacity() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("race.db");
        let db = Database::new(DbConfig::new(path)).await.unwrap();
        let campus = Campus::with_database(db, ServiceConfig::default());

        let owner = teacher("t-1");
        let course = published(&campus, &owner, "POP-301", 3).await;

        let mut handles = Vec::new();
        for i in 0..8 {
            let campus = campus.clone();
            let course_id = course.id.clone();
            handles.push(tokio::spawn(async move {
                let id = format!("s-{i}");
                campus
                    .enrollments()
                    .enroll(&student(&id), &course_id, &id)
                    .await
            }));
        }

        let mut admitted = 0;
        let mut capacity_rejected = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => admitted += 1,
                Err(e) if e.kind() == ErrorKind::CapacityExceeded => capacity_rejected += 1,
                Err(other) => panic!("unexpected failure: {other}"),
            }
        }

        assert_eq!(admitted, 3);
        assert_eq!(capacity_rejected, 5);

        let refreshed = campus.courses().get(&owner, &course.id).await.unwrap();
        assert_eq!(refreshed.enrolled_count, 3);
        let roster = campus
            .enrollments()
            .list_for_course(&owner, &course.id, Some(EnrollmentStatus::Active))
            .await
            .unwrap();
        assert_eq!(roster.len(), 3);

        campus.close().await;
    }
}
