//! # Analytics Service
//!
//! Read-only per-course aggregates for the external analytics poller.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  course_analytics(course)                                               │
//! │                                                                         │
//! │     enrollment ledger ──► active / dropped / completed tallies          │
//! │     progress rows     ──► tracked count + mean completion               │
//! │     feedback rows     ──► submission count + mean rating                │
//! │                                                                         │
//! │  Three independent reads, no transaction. The poller samples on an     │
//! │  interval; counts taken a write apart may disagree by one until the    │
//! │  next poll.                                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use campus_core::{authorize, Action, CoreError, Course, Principal, Scope};

use crate::error::ServiceResult;
use crate::AppState;

// =============================================================================
// Response Types
// =============================================================================

/// Ledger tallies by enrollment status.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentBreakdown {
    pub active: i64,
    pub dropped: i64,
    pub completed: i64,
}

/// Progress aggregate slice.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRollup {
    /// Students with a progress record.
    pub tracked: i64,
    pub average_percentage: f64,
}

/// Feedback aggregate slice.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRollup {
    pub count: i64,
    pub average_rating: f64,
}

/// One course's full aggregate snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseAnalytics {
    pub course_id: String,
    pub capacity: i64,
    pub enrollment: EnrollmentBreakdown,
    pub progress: ProgressRollup,
    pub feedback: FeedbackRollup,
    pub generated_at: DateTime<Utc>,
}

// =============================================================================
// Service
// =============================================================================

/// Aggregate read surface for instructors and the analytics collaborator.
pub struct AnalyticsService {
    state: Arc<AppState>,
}

impl AnalyticsService {
    pub fn new(state: Arc<AppState>) -> Self {
        AnalyticsService { state }
    }

    /// Assembles the per-course aggregate snapshot.
    ///
    /// Instructors read their own courses; the back office reads any.
    pub async fn course_analytics(
        &self,
        principal: &Principal,
        course_id: &str,
    ) -> ServiceResult<CourseAnalytics> {
        let course = self.require_course(course_id).await?;
        authorize(
            principal,
            Action::ViewAnalytics,
            Scope::Course {
                instructor_id: &course.instructor_id,
            },
        )?;

        let totals = self.state.db.enrollments().status_counts(course_id).await?;
        let progress = self.state.db.progress().course_summary(course_id).await?;
        let feedback = self.state.db.feedback().summary(course_id).await?;

        debug!(
            course_id = %course_id,
            active = totals.active,
            tracked = progress.tracked,
            ratings = feedback.count,
            "Assembled course analytics"
        );

        Ok(CourseAnalytics {
            course_id: course_id.to_string(),
            capacity: course.capacity,
            enrollment: EnrollmentBreakdown {
                active: totals.active,
                dropped: totals.dropped,
                completed: totals.completed,
            },
            progress: ProgressRollup {
                tracked: progress.tracked,
                average_percentage: progress.average_percentage,
            },
            feedback: FeedbackRollup {
                count: feedback.count,
                average_rating: feedback.average_rating,
            },
            generated_at: Utc::now(),
        })
    }

    async fn require_course(&self, course_id: &str) -> ServiceResult<Course> {
        self.state
            .db
            .courses()
            .get(course_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Course", course_id).into())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
