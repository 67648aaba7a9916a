//! # Progress Service
//!
//! Per-student progress tracking with a participation gate.
//!
//! ## Write Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  update(student, course, { percentage, modules })                       │
//! │                                                                         │
//! │  authorize (students, own id) ──► validate payload                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  participation gate: active OR completed enrollment required           │
//! │  (dropped students lost write access with their seat)                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  last-write-wins upsert ── one row per (course, student), forever      │
//! │                                                                         │
//! │  Percentages may go DOWN (re-taken quiz); no monotonicity rule.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Reads are scoped like enrollment records: the student themself, the
//! course's instructor, and the back office. Course-wide aggregates are
//! instructor/back-office only.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use campus_core::validation::{validate_module_ids, validate_percentage};
use campus_core::{
    authorize, Action, CoreError, Course, EnrollmentStatus, Principal, Progress, Scope,
};

use crate::error::ServiceResult;
use crate::AppState;

// =============================================================================
// Request / Response Types
// =============================================================================

/// Payload for a progress snapshot write.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProgressRequest {
    /// Completion in [0, 100].
    pub completion_percentage: f64,
    /// Module ids the student has finished. Replaces the stored list.
    #[serde(default)]
    pub completed_modules: Vec<String>,
}

/// Course-wide progress rollup for instructors.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressAggregate {
    pub course_id: String,
    /// Students with a progress record.
    pub tracked: i64,
    /// Mean completion percentage across tracked students (0 when none).
    pub average_percentage: f64,
    /// Tracked students per completion quartile:
    /// `[0,25)`, `[25,50)`, `[50,75)`, `[75,100]`.
    pub distribution: [i64; 4],
}

// =============================================================================
// Service
// =============================================================================

/// Progress tracking service.
pub struct ProgressService {
    state: Arc<AppState>,
}

impl ProgressService {
    pub fn new(state: Arc<AppState>) -> Self {
        ProgressService { state }
    }

    /// Writes the student's progress snapshot for a course.
    ///
    /// Students write their own progress only, and only while they hold an
    /// active or completed enrollment. Each write replaces the previous
    /// snapshot wholesale.
    pub async fn update(
        &self,
        principal: &Principal,
        course_id: &str,
        student_id: &str,
        req: UpdateProgressRequest,
    ) -> ServiceResult<Progress> {
        authorize(principal, Action::UpdateProgress, Scope::Student { student_id })?;

        validate_percentage(req.completion_percentage)?;
        validate_module_ids(&req.completed_modules)?;

        self.require_course(course_id).await?;
        self.require_participation(course_id, student_id).await?;

        let progress = self
            .state
            .db
            .progress()
            .upsert(
                course_id,
                student_id,
                req.completion_percentage,
                &req.completed_modules,
            )
            .await?;

        info!(
            course_id = %course_id,
            student_id = %student_id,
            percentage = req.completion_percentage,
            modules = progress.completed_modules.len(),
            "Progress recorded"
        );
        Ok(progress)
    }

    /// Reads one student's progress in one course.
    pub async fn get(
        &self,
        principal: &Principal,
        course_id: &str,
        student_id: &str,
    ) -> ServiceResult<Progress> {
        let course = self.require_course(course_id).await?;
        authorize(
            principal,
            Action::ViewProgress,
            Scope::CourseStudent {
                instructor_id: &course.instructor_id,
                student_id,
            },
        )?;

        self.state
            .db
            .progress()
            .find(course_id, student_id)
            .await?
            .ok_or_else(|| {
                CoreError::not_found("Progress", format!("{course_id}/{student_id}")).into()
            })
    }

    /// Course-wide tracked count, mean completion and quartile spread.
    pub async fn aggregate(
        &self,
        principal: &Principal,
        course_id: &str,
    ) -> ServiceResult<ProgressAggregate> {
        let course = self.require_course(course_id).await?;
        authorize(
            principal,
            Action::ViewProgressSummary,
            Scope::Course {
                instructor_id: &course.instructor_id,
            },
        )?;

        let summary = self.state.db.progress().course_summary(course_id).await?;

        let mut distribution = [0i64; 4];
        for record in self.state.db.progress().list_for_course(course_id).await? {
            distribution[quartile_bucket(record.completion_percentage)] += 1;
        }

        Ok(ProgressAggregate {
            course_id: course_id.to_string(),
            tracked: summary.tracked,
            average_percentage: summary.average_percentage,
            distribution,
        })
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn require_course(&self, course_id: &str) -> ServiceResult<Course> {
        self.state
            .db
            .courses()
            .get(course_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Course", course_id).into())
    }

    /// Progress writes require current participation in the course.
    async fn require_participation(&self, course_id: &str, student_id: &str) -> ServiceResult<()> {
        let enrollment = self
            .state
            .db
            .enrollments()
            .find_pair(course_id, student_id)
            .await?;

        match enrollment {
            Some(e) if matches!(e.status, EnrollmentStatus::Active | EnrollmentStatus::Completed) => {
                Ok(())
            }
            _ => Err(CoreError::not_permitted(format!(
                "progress requires an active or completed enrollment in course {course_id}"
            ))
            .into()),
        }
    }
}

/// Bucket index for the quartile distribution.
fn quartile_bucket(percentage: f64) -> usize {
    if percentage < 25.0 {
        0
    } else if percentage < 50.0 {
        1
    } else if percentage < 75.0 {
        2
    } else {
        3
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
    use campus_core::{ErrorKind, Role};
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

    async fn published(campus: &Campus, owner: &Principal, code: &str) -> Course {
        let created = campus
            .courses()
            .create(
                owner,
                CreateCourseRequest {
                    code: code.to_string(),
                    title: format!("Course {code}"),
                    description: Some("Full syllabus".to_string()),
                    capacity: 30,
                    credits: 5,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        campus.courses().publish(owner, &created.id).await.unwrap()
    }

    fn percent(p: f64) -> UpdateProgressRequest {
        UpdateProgressRequest {
            completion_percentage: p,
            completed_modules: vec![],
        }
    }

    #[tokio::test]
    async fn test_update_requires_participation() {
        let campus = campus().await;
        let owner = teacher("t-1");
        let course = published(&campus, &owner, "CS-101").await;
        let s = student("s-1");

        // Not enrolled: the write is rejected.
        let err = campus
            .progress()
            .update(&s, &course.id, "s-1", percent(10.0))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AuthorizationError);

        campus
            .enrollments()
            .enroll(&s, &course.id, "s-1")
            .await
            .unwrap();
        let progress = campus
            .progress()
            .update(&s, &course.id, "s-1", percent(10.0))
            .await
            .unwrap();
        assert_eq!(progress.completion_percentage, 10.0);
    }

    #[tokio::test]
    async fn test_percentage_and_module_bounds() {
        let campus = campus().await;
        let owner = teacher("t-1");
        let course = published(&campus, &owner, "CS-101").await;
        let s = student("s-1");
        campus
            .enrollments()
            .enroll(&s, &course.id, "s-1")
            .await
            .unwrap();

        for bad in [150.0, -1.0, f64::NAN] {
            let err = campus
                .progress()
                .update(&s, &course.id, "s-1", percent(bad))
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ValidationError);
        }

        // Nothing was stored by the rejected writes.
        let err = campus.progress().get(&s, &course.id, "s-1").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        campus
            .progress()
            .update(&s, &course.id, "s-1", percent(75.0))
            .await
            .unwrap();
        let stored = campus.progress().get(&s, &course.id, "s-1").await.unwrap();
        assert_eq!(stored.completion_percentage, 75.0);
    }

    #[tokio::test]
    async fn test_update_replaces_the_snapshot() {
        let campus = campus().await;
        let owner = teacher("t-1");
        let course = published(&campus, &owner, "CS-101").await;
        let s = student("s-1");
        campus
            .enrollments()
            .enroll(&s, &course.id, "s-1")
            .await
            .unwrap();

        campus
            .progress()
            .update(
                &s,
                &course.id,
                "s-1",
                UpdateProgressRequest {
                    completion_percentage: 75.0,
                    completed_modules: vec!["m1".to_string(), "m2".to_string()],
                },
            )
            .await
            .unwrap();

        // Lower percentage and shorter module list both stick.
        let second = campus
            .progress()
            .update(
                &s,
                &course.id,
                "s-1",
                UpdateProgressRequest {
                    completion_percentage: 40.0,
                    completed_modules: vec!["m1".to_string()],
                },
            )
            .await
            .unwrap();
        assert_eq!(second.completion_percentage, 40.0);
        assert_eq!(second.completed_modules, vec!["m1"]);
    }

    #[tokio::test]
    async fn test_dropped_loses_write_access_completed_keeps_it() {
        let campus = campus().await;
        let owner = teacher("t-1");
        let course = published(&campus, &owner, "CS-101").await;

        let dropper = student("s-1");
        campus
            .enrollments()
            .enroll(&dropper, &course.id, "s-1")
            .await
            .unwrap();
        campus
            .enrollments()
            .unenroll(&dropper, &course.id, "s-1")
            .await
            .unwrap();
        let err = campus
            .progress()
            .update(&dropper, &course.id, "s-1", percent(10.0))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AuthorizationError);

        // A completed student may still record progress.
        let finisher = student("s-2");
        campus
            .enrollments()
            .enroll(&finisher, &course.id, "s-2")
            .await
            .unwrap();
        campus
            .enrollments()
            .complete(&staff(), &course.id, "s-2")
            .await
            .unwrap();
        campus
            .progress()
            .update(&finisher, &course.id, "s-2", percent(100.0))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_read_scoping() {
        let campus = campus().await;
        let owner = teacher("t-1");
        let course = published(&campus, &owner, "CS-101").await;
        let s = student("s-1");
        campus
            .enrollments()
            .enroll(&s, &course.id, "s-1")
            .await
            .unwrap();
        campus
            .progress()
            .update(&s, &course.id, "s-1", percent(55.0))
            .await
            .unwrap();

        // Owner, the student and the back office can read.
        for caller in [&owner, &s, &staff()] {
            let stored = campus
                .progress()
                .get(caller, &course.id, "s-1")
                .await
                .unwrap();
            assert_eq!(stored.completion_percentage, 55.0);
        }

        // Another teacher and another student cannot.
        for caller in [&teacher("t-2"), &student("s-2")] {
            let err = campus
                .progress()
                .get(caller, &course.id, "s-1")
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::AuthorizationError);
        }

        // Students cannot write classmates' progress either.
        let err = campus
            .progress()
            .update(&student("s-2"), &course.id, "s-1", percent(1.0))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AuthorizationError);
    }

    #[tokio::test]
    async fn test_aggregate_mean_and_distribution() {
        let campus = campus().await;
        let owner = teacher("t-1");
        let course = published(&campus, &owner, "CS-101").await;

        for (id, p) in [("s-1", 10.0), ("s-2", 25.0), ("s-3", 80.0)] {
            let s = student(id);
            campus
                .enrollments()
                .enroll(&s, &course.id, id)
                .await
                .unwrap();
            campus
                .progress()
                .update(&s, &course.id, id, percent(p))
                .await
                .unwrap();
        }

        let aggregate = campus.progress().aggregate(&owner, &course.id).await.unwrap();
        assert_eq!(aggregate.tracked, 3);
        assert!((aggregate.average_percentage - 38.333333).abs() < 0.001);
        // 10 → first bucket, 25 → second (boundary), 80 → fourth.
        assert_eq!(aggregate.distribution, [1, 1, 0, 1]);
    }

    #[tokio::test]
    async fn test_aggregate_access_and_empty_course() {
        let campus = campus().await;
        let owner = teacher("t-1");
        let course = published(&campus, &owner, "CS-101").await;

        let empty = campus.progress().aggregate(&owner, &course.id).await.unwrap();
        assert_eq!(empty.tracked, 0);
        assert_eq!(empty.average_percentage, 0.0);
        assert_eq!(empty.distribution, [0, 0, 0, 0]);

        // Staff can pull any course's rollup; students and other
        // instructors cannot.
        campus.progress().aggregate(&staff(), &course.id).await.unwrap();
        for caller in [&student("s-1"), &teacher("t-2")] {
            let err = campus
                .progress()
                .aggregate(caller, &course.id)
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::AuthorizationError);
        }
    }
}
