//! # Course Service
//!
//! Course lifecycle and catalogue operations.
//!
//! ## Lifecycle
//! ```text
//! create ──► draft ──► publish ──► published ──► archive ──► archived
//!                                      ▲                         │
//!                                      └───────── publish ───────┘
//!
//! delete: soft, any state, refused while active enrollments exist
//! ```
//!
//! ## Visibility
//! Students only ever see published courses; drafts and archived courses
//! surface as NotFound for them. Owners see their own courses in any state,
//! back office sees everything.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use campus_core::validation::{
    validate_capacity, validate_course_code, validate_credits, validate_description,
    validate_page, validate_search_query, validate_title, validate_uuid,
};
use campus_core::{
    authorize, is_unrestricted, Action, CoreError, Course, CourseLevel, CourseStatus, Principal,
    Scope, ValidationError, DEFAULT_PAGE_SIZE,
};
use campus_db::{CourseFilter, CourseSort, DbError, SortField, SortOrder};

use crate::error::{ServiceError, ServiceResult};
use crate::AppState;

// =============================================================================
// Request / Response Types
// =============================================================================

/// Payload for creating a course (created in draft state).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourseRequest {
    pub code: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub capacity: i64,
    #[serde(default)]
    pub credits: i64,
    /// Course ids that must be completed before enrolling.
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default)]
    pub schedule: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub level: Option<CourseLevel>,
    /// Owning instructor; defaults to the caller. Only back office passes
    /// the ownership check when naming somebody else.
    #[serde(default)]
    pub instructor_id: Option<String>,
}

/// Patch payload for updating a course. `None` means "leave unchanged".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCourseRequest {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub capacity: Option<i64>,
    #[serde(default)]
    pub credits: Option<i64>,
    #[serde(default)]
    pub prerequisites: Option<Vec<String>>,
    #[serde(default)]
    pub schedule: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub level: Option<CourseLevel>,
}

/// Catalogue query: filters, text search, sort and pagination.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCoursesRequest {
    #[serde(default)]
    pub status: Option<CourseStatus>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub level: Option<CourseLevel>,
    #[serde(default)]
    pub instructor_id: Option<String>,
    /// Case-insensitive substring search over title, code and description.
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub sort_by: Option<SortField>,
    /// Defaults to the sort field's natural direction.
    #[serde(default)]
    pub sort_order: Option<SortOrder>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

/// One catalogue page plus the filtered total for pagination UIs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoursePage {
    pub courses: Vec<Course>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

// =============================================================================
// Service
// =============================================================================

/// Course lifecycle and catalogue service.
pub struct CourseService {
    state: Arc<AppState>,
}

impl CourseService {
    pub fn new(state: Arc<AppState>) -> Self {
        CourseService { state }
    }

    /// Creates a course in draft state.
    ///
    /// ## Arguments
    /// * `principal` - Authenticated caller
    /// * `req` - Course fields; `instructor_id` defaults to the caller
    ///
    /// ## Returns
    /// The stored course, version 1, zero enrollments.
    pub async fn create(
        &self,
        principal: &Principal,
        req: CreateCourseRequest,
    ) -> ServiceResult<Course> {
        let instructor_id = req
            .instructor_id
            .clone()
            .unwrap_or_else(|| principal.id.clone());
        authorize(
            principal,
            Action::CreateCourse,
            Scope::Course {
                instructor_id: &instructor_id,
            },
        )?;

        let code = req.code.trim();
        let title = req.title.trim();
        validate_course_code(code)?;
        validate_title(title)?;
        if let Some(description) = &req.description {
            validate_description(description)?;
        }
        validate_capacity(req.capacity)?;
        validate_credits(req.credits)?;
        self.require_known_prerequisites(&req.prerequisites, None)
            .await?;

        let now = Utc::now();
        let course = Course {
            id: Uuid::new_v4().to_string(),
            code: code.to_string(),
            title: title.to_string(),
            description: req.description,
            status: CourseStatus::Draft,
            capacity: req.capacity,
            enrolled_count: 0,
            instructor_id,
            prerequisites: req.prerequisites,
            credits: req.credits,
            schedule: req.schedule,
            category: req.category,
            level: req.level,
            is_deleted: false,
            version: 1,
            created_at: now,
            updated_at: now,
        };

        let created = self
            .state
            .db
            .courses()
            .insert(&course)
            .await
            .map_err(duplicate_code)?;

        info!(
            course_id = %created.id,
            code = %created.code,
            instructor_id = %created.instructor_id,
            "Course created"
        );
        Ok(created)
    }

    /// Applies a patch to a course. Absent fields stay untouched.
    ///
    /// Capacity can never be lowered below the current enrolled count, and
    /// prerequisite edits go through the same existence check as create.
    pub async fn update(
        &self,
        principal: &Principal,
        course_id: &str,
        req: UpdateCourseRequest,
    ) -> ServiceResult<Course> {
        let mut course = self.require_course(course_id).await?;
        authorize(
            principal,
            Action::UpdateCourse,
            Scope::Course {
                instructor_id: &course.instructor_id,
            },
        )?;

        if let Some(code) = req.code {
            let code = code.trim().to_string();
            validate_course_code(&code)?;
            course.code = code;
        }
        if let Some(title) = req.title {
            let title = title.trim().to_string();
            validate_title(&title)?;
            course.title = title;
        }
        if let Some(description) = req.description {
            validate_description(&description)?;
            course.description = Some(description);
        }
        if let Some(capacity) = req.capacity {
            validate_capacity(capacity)?;
            if capacity < course.enrolled_count {
                return Err(CoreError::CapacityBelowEnrolled {
                    requested: capacity,
                    enrolled: course.enrolled_count,
                }
                .into());
            }
            course.capacity = capacity;
        }
        if let Some(credits) = req.credits {
            validate_credits(credits)?;
            course.credits = credits;
        }
        if let Some(prerequisites) = req.prerequisites {
            self.require_known_prerequisites(&prerequisites, Some(&course.id))
                .await?;
            course.prerequisites = prerequisites;
        }
        if let Some(schedule) = req.schedule {
            course.schedule = Some(schedule);
        }
        if let Some(category) = req.category {
            course.category = Some(category);
        }
        if let Some(level) = req.level {
            course.level = Some(level);
        }

        self.state
            .db
            .courses()
            .update(&course)
            .await
            .map_err(duplicate_code)?;

        let updated = self.require_course(course_id).await?;
        info!(course_id = %updated.id, version = updated.version, "Course updated");
        Ok(updated)
    }

    /// Publishes a draft or re-opens an archived course.
    ///
    /// Requires title, code and description to be present; rejects every
    /// lifecycle edge other than draft→published and archived→published.
    pub async fn publish(&self, principal: &Principal, course_id: &str) -> ServiceResult<Course> {
        let course = self.require_course(course_id).await?;
        authorize(
            principal,
            Action::PublishCourse,
            Scope::Course {
                instructor_id: &course.instructor_id,
            },
        )?;

        let missing = course.missing_publish_fields();
        if !missing.is_empty() {
            return Err(ValidationError::Required {
                field: missing.join(", "),
            }
            .into());
        }

        self.transition(course, CourseStatus::Published).await
    }

    /// Closes a published course to new enrollments.
    ///
    /// Refused while students still hold active seats; they must finish or
    /// drop first.
    pub async fn archive(&self, principal: &Principal, course_id: &str) -> ServiceResult<Course> {
        let course = self.require_course(course_id).await?;
        authorize(
            principal,
            Action::ArchiveCourse,
            Scope::Course {
                instructor_id: &course.instructor_id,
            },
        )?;

        if !course.status.can_transition_to(CourseStatus::Archived) {
            return Err(invalid_transition(&course, CourseStatus::Archived));
        }

        if self.state.db.courses().try_archive(course_id).await? {
            let archived = self.require_course(course_id).await?;
            info!(course_id = %archived.id, "Course archived");
            return Ok(archived);
        }

        // The guarded write refused: students still hold seats, or a
        // concurrent transition moved the course first.
        let current = self.require_course(course_id).await?;
        if current.status == CourseStatus::Published && current.enrolled_count > 0 {
            warn!(
                course_id = %course_id,
                active = current.enrolled_count,
                "Archive blocked by active enrollments"
            );
            return Err(CoreError::EnrollmentsOutstanding {
                course_id: course_id.to_string(),
                active: current.enrolled_count,
            }
            .into());
        }
        Err(invalid_transition(&current, CourseStatus::Archived))
    }

    /// Soft-deletes a course.
    ///
    /// The row stays for history (enrollment records keep their foreign
    /// key), but the course disappears from every read path and its code
    /// becomes reusable.
    pub async fn delete(&self, principal: &Principal, course_id: &str) -> ServiceResult<()> {
        let course = self.require_course(course_id).await?;
        authorize(
            principal,
            Action::DeleteCourse,
            Scope::Course {
                instructor_id: &course.instructor_id,
            },
        )?;

        if self.state.db.courses().try_soft_delete(course_id).await? {
            info!(course_id = %course_id, code = %course.code, "Course deleted");
            return Ok(());
        }

        // NotFound when a concurrent delete got there first.
        let current = self.require_course(course_id).await?;
        warn!(
            course_id = %course_id,
            active = current.enrolled_count,
            "Delete blocked by active enrollments"
        );
        Err(CoreError::EnrollmentsOutstanding {
            course_id: course_id.to_string(),
            active: current.enrolled_count,
        }
        .into())
    }

    /// Fetches one course.
    ///
    /// Unpublished courses are visible to whoever could manage them (owner,
    /// back office); everyone else gets NotFound rather than a peek at
    /// drafts.
    pub async fn get(&self, principal: &Principal, course_id: &str) -> ServiceResult<Course> {
        authorize(principal, Action::ViewCourse, Scope::Any)?;

        let course = self.require_course(course_id).await?;

        if course.status != CourseStatus::Published
            && authorize(
                principal,
                Action::UpdateCourse,
                Scope::Course {
                    instructor_id: &course.instructor_id,
                },
            )
            .is_err()
        {
            return Err(CoreError::not_found("Course", course_id).into());
        }

        Ok(course)
    }

    /// One catalogue page.
    ///
    /// ## Visibility
    /// Unpublished courses appear only when the caller filters down to
    /// courses they manage (or is back office); everyone else is pinned to
    /// the published catalogue regardless of the requested status filter.
    pub async fn list(
        &self,
        principal: &Principal,
        req: ListCoursesRequest,
    ) -> ServiceResult<CoursePage> {
        authorize(principal, Action::ListCourses, Scope::Any)?;

        let limit = req.limit.unwrap_or(DEFAULT_PAGE_SIZE);
        let offset = req.offset.unwrap_or(0);
        validate_page(limit, offset)?;

        let query = match req.query {
            Some(ref q) => {
                let trimmed = validate_search_query(q)?;
                (!trimmed.is_empty()).then_some(trimmed)
            }
            None => None,
        };

        let field = req.sort_by.unwrap_or_default();
        let sort = CourseSort {
            field,
            order: req.sort_order.unwrap_or_else(|| field.natural_order()),
        };

        let mut filter = CourseFilter {
            status: req.status,
            category: req.category,
            level: req.level,
            instructor_id: req.instructor_id,
            query,
            sort,
            limit,
            offset,
        };

        let owner_view = filter.instructor_id.as_deref().is_some_and(|owner| {
            authorize(
                principal,
                Action::UpdateCourse,
                Scope::Course {
                    instructor_id: owner,
                },
            )
            .is_ok()
        });
        if !owner_view && !is_unrestricted(principal) {
            filter.status = Some(CourseStatus::Published);
        }

        let repo = self.state.db.courses();
        let courses = repo.list(&filter).await?;
        let total = repo.count(&filter).await?;

        debug!(count = courses.len(), total = total, "Catalogue page served");
        Ok(CoursePage {
            courses,
            total,
            limit,
            offset,
        })
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

    /// Moves a course along a lifecycle edge via the guarded UPDATE.
    async fn transition(&self, course: Course, to: CourseStatus) -> ServiceResult<Course> {
        if !course.status.can_transition_to(to) {
            return Err(invalid_transition(&course, to));
        }

        let moved = self
            .state
            .db
            .courses()
            .transition_status(&course.id, course.status, to)
            .await?;
        if !moved {
            // Lost to a concurrent lifecycle write; report against fresh state.
            let current = self.require_course(&course.id).await?;
            return Err(invalid_transition(&current, to));
        }

        let current = self.require_course(&course.id).await?;
        info!(
            course_id = %current.id,
            status = current.status.as_str(),
            "Course transitioned"
        );
        Ok(current)
    }

    /// Prerequisite ids must name live courses in this catalogue, and a
    /// course may never require itself.
    async fn require_known_prerequisites(
        &self,
        prerequisites: &[String],
        own_id: Option<&str>,
    ) -> ServiceResult<()> {
        if prerequisites.is_empty() {
            return Ok(());
        }

        for prerequisite in prerequisites {
            validate_uuid(prerequisite).map_err(|_| ValidationError::InvalidFormat {
                field: "prerequisites".to_string(),
                reason: format!("'{prerequisite}' is not a course id"),
            })?;
        }

        if let Some(own_id) = own_id {
            if prerequisites.iter().any(|p| p == own_id) {
                return Err(ValidationError::InvalidFormat {
                    field: "prerequisites".to_string(),
                    reason: "a course cannot be its own prerequisite".to_string(),
                }
                .into());
            }
        }

        let found = self
            .state
            .db
            .courses()
            .existing_ids(prerequisites)
            .await?;
        let missing: Vec<&String> = prerequisites
            .iter()
            .filter(|p| !found.contains(*p))
            .collect();
        if !missing.is_empty() {
            return Err(ValidationError::InvalidFormat {
                field: "prerequisites".to_string(),
                reason: format!("unknown course ids: {missing:?}"),
            }
            .into());
        }
        Ok(())
    }
}

fn invalid_transition(course: &Course, to: CourseStatus) -> ServiceError {
    CoreError::InvalidTransition {
        course_id: course.id.clone(),
        from: course.status.as_str().to_string(),
        to: to.as_str().to_string(),
    }
    .into()
}

/// Remaps a unique-code collision onto the domain error; everything else
/// takes the standard translation.
fn duplicate_code(err: DbError) -> ServiceError {
    match err {
        DbError::UniqueViolation { field, value } if field == "code" => {
            CoreError::DuplicateCode { code: value }.into()
        }
        other => other.into(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
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

    fn request(code: &str, title: &str) -> CreateCourseRequest {
        CreateCourseRequest {
            code: code.to_string(),
            title: title.to_string(),
            description: Some("Full syllabus".to_string()),
            capacity: 30,
            credits: 5,
            ..Default::default()
        }
    }

    async fn published(campus: &Campus, owner: &Principal, code: &str, capacity: i64) -> Course {
        let created = campus
            .courses()
            .create(
                owner,
                CreateCourseRequest {
                    capacity,
                    ..request(code, &format!("Course {code}"))
                },
            )
            .await
            .unwrap();
        campus.courses().publish(owner, &created.id).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get_roundtrip() {
        let campus = campus().await;
        let owner = teacher("t-1");

        let created = campus
            .courses()
            .create(&owner, request("CS-101", "Intro to CS"))
            .await
            .unwrap();

        assert_eq!(created.status, CourseStatus::Draft);
        assert_eq!(created.enrolled_count, 0);
        assert_eq!(created.version, 1);
        assert_eq!(created.instructor_id, "t-1");

        let fetched = campus.courses().get(&owner, &created.id).await.unwrap();
        assert_eq!(fetched.code, "CS-101");
        assert_eq!(fetched.title, "Intro to CS");
    }

    #[tokio::test]
    async fn test_student_cannot_create() {
        let campus = campus().await;

        let err = campus
            .courses()
            .create(&student("s-1"), request("CS-101", "Intro"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AuthorizationError);
    }

    #[tokio::test]
    async fn test_create_rejects_bad_input() {
        let campus = campus().await;
        let owner = teacher("t-1");

        let err = campus
            .courses()
            .create(&owner, request("", "Intro"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationError);

        let err = campus
            .courses()
            .create(
                &owner,
                CreateCourseRequest {
                    capacity: -5,
                    ..request("CS-101", "Intro")
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationError);
    }

    #[tokio::test]
    async fn test_duplicate_code_conflict() {
        let campus = campus().await;
        let owner = teacher("t-1");

        campus
            .courses()
            .create(&owner, request("CS-101", "Intro"))
            .await
            .unwrap();
        let err = campus
            .courses()
            .create(&owner, request("CS-101", "Different title"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(err.to_string().contains("CS-101"));
    }

    #[tokio::test]
    async fn test_unknown_prerequisite_rejected() {
        let campus = campus().await;
        let owner = teacher("t-1");

        // Valid UUID shape, but no such course exists.
        let err = campus
            .courses()
            .create(
                &owner,
                CreateCourseRequest {
                    prerequisites: vec![Uuid::new_v4().to_string()],
                    ..request("CS-201", "Advanced")
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationError);
        assert!(err.to_string().contains("unknown course ids"));

        // Not even a course id shape.
        let err = campus
            .courses()
            .create(
                &owner,
                CreateCourseRequest {
                    prerequisites: vec!["CS-101".to_string()],
                    ..request("CS-202", "Advanced II")
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationError);
    }

    #[tokio::test]
    async fn test_publish_requires_description() {
        let campus = campus().await;
        let owner = teacher("t-1");

        let bare = campus
            .courses()
            .create(
                &owner,
                CreateCourseRequest {
                    description: None,
                    ..request("CS-101", "Intro")
                },
            )
            .await
            .unwrap();

        let err = campus.courses().publish(&owner, &bare.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationError);
        assert!(err.to_string().contains("description"));

        // Fill in the description and publishing goes through.
        campus
            .courses()
            .update(
                &owner,
                &bare.id,
                UpdateCourseRequest {
                    description: Some("Now complete".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let course = campus.courses().publish(&owner, &bare.id).await.unwrap();
        assert_eq!(course.status, CourseStatus::Published);
    }

    #[tokio::test]
    async fn test_lifecycle_edges() {
        let campus = campus().await;
        let owner = teacher("t-1");
        let course = published(&campus, &owner, "CS-101", 30).await;

        // Re-publishing a published course is an explicit rejection.
        let err = campus
            .courses()
            .publish(&owner, &course.id)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StateError);

        // Archived courses can be re-opened.
        let archived = campus.courses().archive(&owner, &course.id).await.unwrap();
        assert_eq!(archived.status, CourseStatus::Archived);
        let reopened = campus.courses().publish(&owner, &course.id).await.unwrap();
        assert_eq!(reopened.status, CourseStatus::Published);

        // Drafts cannot jump straight to archived.
        let draft = campus
            .courses()
            .create(&owner, request("CS-102", "Draft"))
            .await
            .unwrap();
        let err = campus
            .courses()
            .archive(&owner, &draft.id)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StateError);
    }

    #[tokio::test]
    async fn test_update_is_a_patch() {
        let campus = campus().await;
        let owner = teacher("t-1");
        let course = campus
            .courses()
            .create(&owner, request("CS-101", "Intro"))
            .await
            .unwrap();

        let updated = campus
            .courses()
            .update(
                &owner,
                &course.id,
                UpdateCourseRequest {
                    title: Some("Intro, 2nd edition".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "Intro, 2nd edition");
        assert_eq!(updated.code, "CS-101");
        assert_eq!(updated.capacity, 30);
        assert_eq!(updated.version, course.version + 1);
    }

    #[tokio::test]
    async fn test_self_prerequisite_rejected() {
        let campus = campus().await;
        let owner = teacher("t-1");
        let course = campus
            .courses()
            .create(&owner, request("CS-101", "Intro"))
            .await
            .unwrap();

        let err = campus
            .courses()
            .update(
                &owner,
                &course.id,
                UpdateCourseRequest {
                    prerequisites: Some(vec![course.id.clone()]),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationError);
        assert!(err.to_string().contains("own prerequisite"));
    }

    #[tokio::test]
    async fn test_capacity_cannot_drop_below_enrolled() {
        let campus = campus().await;
        let owner = teacher("t-1");
        let course = published(&campus, &owner, "CS-101", 2).await;

        for student_id in ["s-1", "s-2"] {
            campus
                .enrollments()
                .enroll(&student(student_id), &course.id, student_id)
                .await
                .unwrap();
        }

        let err = campus
            .courses()
            .update(
                &owner,
                &course.id,
                UpdateCourseRequest {
                    capacity: Some(1),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        // Equal to the enrolled count is fine.
        let updated = campus
            .courses()
            .update(
                &owner,
                &course.id,
                UpdateCourseRequest {
                    capacity: Some(2),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.capacity, 2);
    }

    #[tokio::test]
    async fn test_drafts_hidden_from_students() {
        let campus = campus().await;
        let owner = teacher("t-1");
        let draft = campus
            .courses()
            .create(&owner, request("CS-101", "Hidden draft"))
            .await
            .unwrap();

        // Existence is hidden, not just content.
        let err = campus
            .courses()
            .get(&student("s-1"), &draft.id)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        // Owner and back office see it.
        assert!(campus.courses().get(&owner, &draft.id).await.is_ok());
        assert!(campus.courses().get(&staff(), &draft.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_list_pins_students_to_published() {
        let campus = campus().await;
        let owner = teacher("t-1");
        published(&campus, &owner, "CS-110", 30).await;
        campus
            .courses()
            .create(&owner, request("CS-111", "Still drafting"))
            .await
            .unwrap();

        // Students see one course even when asking for drafts.
        let page = campus
            .courses()
            .list(
                &student("s-1"),
                ListCoursesRequest {
                    status: Some(CourseStatus::Draft),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.courses[0].code, "CS-110");

        // The owner listing their own courses sees both.
        let page = campus
            .courses()
            .list(
                &owner,
                ListCoursesRequest {
                    instructor_id: Some("t-1".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(page.total, 2);

        // Back office sees everything without a filter.
        let page = campus
            .courses()
            .list(&staff(), ListCoursesRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total, 2);
    }

    #[tokio::test]
    async fn test_list_search_sort_and_pagination() {
        let campus = campus().await;
        let owner = teacher("t-1");
        for (code, title) in [
            ("MATH-201", "Linear Algebra"),
            ("MATH-101", "Calculus I"),
            ("CS-101", "Intro to Computing"),
        ] {
            let created = campus
                .courses()
                .create(&owner, request(code, title))
                .await
                .unwrap();
            campus.courses().publish(&owner, &created.id).await.unwrap();
        }

        let page = campus
            .courses()
            .list(
                &student("s-1"),
                ListCoursesRequest {
                    query: Some("math".to_string()),
                    sort_by: Some(SortField::Code),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.courses[0].code, "MATH-101");

        let page = campus
            .courses()
            .list(
                &student("s-1"),
                ListCoursesRequest {
                    sort_by: Some(SortField::Code),
                    limit: Some(2),
                    offset: Some(2),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.courses.len(), 1);
        assert_eq!(page.courses[0].code, "MATH-201");

        let err = campus
            .courses()
            .list(
                &student("s-1"),
                ListCoursesRequest {
                    limit: Some(500),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationError);
    }

    #[tokio::test]
    async fn test_delete_blocked_while_seats_held() {
        let campus = campus().await;
        let owner = teacher("t-1");
        let course = published(&campus, &owner, "CS-101", 5).await;
        campus
            .enrollments()
            .enroll(&student("s-1"), &course.id, "s-1")
            .await
            .unwrap();

        let err = campus
            .courses()
            .delete(&owner, &course.id)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        campus
            .enrollments()
            .unenroll(&student("s-1"), &course.id, "s-1")
            .await
            .unwrap();
        campus.courses().delete(&owner, &course.id).await.unwrap();

        let err = campus.courses().get(&owner, &course.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        // The code is free for reuse after the soft delete.
        campus
            .courses()
            .create(&owner, request("CS-101", "Second run"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_other_teacher_cannot_touch_course() {
        let campus = campus().await;
        let owner = teacher("t-1");
        let course = campus
            .courses()
            .create(&owner, request("CS-101", "Intro"))
            .await
            .unwrap();

        let rival = teacher("t-2");
        let err = campus
            .courses()
            .update(
                &rival,
                &course.id,
                UpdateCourseRequest {
                    title: Some("Hijacked".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AuthorizationError);

        let err = campus
            .courses()
            .publish(&rival, &course.id)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AuthorizationError);

        // Back office bypasses ownership.
        assert!(campus.courses().publish(&staff(), &course.id).await.is_ok());
    }
}
