//! # Feedback Service
//!
//! One-shot course feedback with rating aggregates.
//!
//! ## Submission Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  submit(student, course, { rating, comment?, categories })              │
//! │                                                                         │
//! │  authorize (students, own id)                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  validate: rating 1..=5, comment length, per-category ratings          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  participation gate: active OR completed enrollment required           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  INSERT ── UNIQUE (course, student) makes "submit once" a DB           │
//! │            guarantee; a duplicate surfaces as a conflict               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Reading feedback is open to every signed-in role. The per-category
//! breakdown rides along only for callers with analytics access to the
//! course (its instructor and the back office).

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use campus_core::validation::{
    validate_category_ratings, validate_comment, validate_page, validate_rating,
};
use campus_core::{
    authorize, Action, CoreError, Course, EnrollmentStatus, Feedback, Principal, Scope,
    DEFAULT_PAGE_SIZE,
};
use campus_db::DbError;

use crate::error::{ServiceError, ServiceResult};
use crate::AppState;

// =============================================================================
// Request / Response Types
// =============================================================================

/// Payload for a feedback submission.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitFeedbackRequest {
    /// Overall rating, 1-5.
    pub rating: i64,
    #[serde(default)]
    pub comment: Option<String>,
    /// Optional per-category ratings (e.g. "materials", "pacing"), each 1-5.
    #[serde(default)]
    pub categories: BTreeMap<String, i64>,
}

/// A page of a course's feedback plus its aggregates.
///
/// `count` and `average_rating` always cover every submission, not just
/// the returned page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseFeedback {
    pub course_id: String,
    pub entries: Vec<Feedback>,
    pub count: i64,
    pub average_rating: f64,
    /// Mean rating per category, present only for analytics-capable callers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_averages: Option<BTreeMap<String, f64>>,
}

// =============================================================================
// Service
// =============================================================================

/// Course feedback service.
pub struct FeedbackService {
    state: Arc<AppState>,
}

impl FeedbackService {
    pub fn new(state: Arc<AppState>) -> Self {
        FeedbackService { state }
    }

    /// Submits a student's one-time feedback for a course.
    pub async fn submit(
        &self,
        principal: &Principal,
        course_id: &str,
        student_id: &str,
        req: SubmitFeedbackRequest,
    ) -> ServiceResult<Feedback> {
        authorize(principal, Action::SubmitFeedback, Scope::Student { student_id })?;

        validate_rating(req.rating)?;
        if let Some(comment) = &req.comment {
            validate_comment(comment)?;
        }
        validate_category_ratings(&req.categories)?;

        self.require_course(course_id).await?;
        self.require_participation(course_id, student_id).await?;

        let feedback = Feedback {
            id: Uuid::new_v4().to_string(),
            course_id: course_id.to_string(),
            student_id: student_id.to_string(),
            rating: req.rating,
            comment: req.comment,
            categories: req.categories,
            submitted_at: Utc::now(),
        };

        let stored = self
            .state
            .db
            .feedback()
            .insert(&feedback)
            .await
            .map_err(|e| already_submitted(e, course_id, student_id))?;

        info!(
            course_id = %course_id,
            student_id = %student_id,
            rating = stored.rating,
            "Feedback submitted"
        );
        Ok(stored)
    }

    /// A page of a course's feedback, newest first, with aggregates.
    ///
    /// ## Arguments
    /// * `limit` / `offset` - Page window; defaults to the first standard page
    pub async fn get(
        &self,
        principal: &Principal,
        course_id: &str,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> ServiceResult<CourseFeedback> {
        authorize(principal, Action::ViewFeedback, Scope::Any)?;

        let course = self.require_course(course_id).await?;

        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE);
        let offset = offset.unwrap_or(0);
        validate_page(limit, offset)?;

        let feedback = self.state.db.feedback();
        let entries = feedback.list_for_course(course_id, limit, offset).await?;
        let summary = feedback.summary(course_id).await?;

        // The per-category breakdown is an analytics surface; probe for it
        // rather than re-deriving "instructor or back office" here.
        let analytics_reader = authorize(
            principal,
            Action::ViewAnalytics,
            Scope::Course {
                instructor_id: &course.instructor_id,
            },
        )
        .is_ok();
        let category_averages = if analytics_reader {
            Some(category_averages(feedback.category_maps(course_id).await?))
        } else {
            None
        };

        Ok(CourseFeedback {
            course_id: course_id.to_string(),
            entries,
            count: summary.count,
            average_rating: summary.average_rating,
            category_averages,
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

    /// Feedback comes from participants only.
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
                "feedback requires an active or completed enrollment in course {course_id}"
            ))
            .into()),
        }
    }
}

/// Maps the feedback unique-index hit to the domain's submit-once error.
fn already_submitted(e: DbError, course_id: &str, student_id: &str) -> ServiceError {
    if e.is_unique_violation_on("feedback") {
        CoreError::FeedbackAlreadySubmitted {
            course_id: course_id.to_string(),
            student_id: student_id.to_string(),
        }
        .into()
    } else {
        e.into()
    }
}

/// Mean rating per category across submissions.
///
/// Submissions choose their own category sets, so each category averages
/// over the submissions that actually rated it.
fn category_averages(maps: Vec<BTreeMap<String, i64>>) -> BTreeMap<String, f64> {
    let mut sums: BTreeMap<String, (i64, i64)> = BTreeMap::new();
    for map in maps {
        for (category, rating) in map {
            let entry = sums.entry(category).or_insert((0, 0));
            entry.0 += rating;
            entry.1 += 1;
        }
    }

    sums.into_iter()
        .map(|(category, (sum, count))| (category, sum as f64 / count as f64))
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
