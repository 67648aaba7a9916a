//! # Feedback Repository
//!
//! One-shot course feedback and its rating aggregates.
//!
//! Feedback is insert-only: the UNIQUE (course_id, student_id) index makes
//! the "one submission per student per course" rule a database guarantee,
//! not just a service-layer check.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::collections::BTreeMap;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use campus_core::Feedback;

const FEEDBACK_COLUMNS: &str =
    "id, course_id, student_id, rating, comment, categories, submitted_at";

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Debug, Clone, sqlx::FromRow)]
struct FeedbackRow {
    id: String,
    course_id: String,
    student_id: String,
    rating: i64,
    comment: Option<String>,
    categories: String,
    submitted_at: DateTime<Utc>,
}

impl FeedbackRow {
    fn into_feedback(self) -> DbResult<Feedback> {
        let categories: BTreeMap<String, i64> = serde_json::from_str(&self.categories)?;

        Ok(Feedback {
            id: self.id,
            course_id: self.course_id,
            student_id: self.student_id,
            rating: self.rating,
            comment: self.comment,
            categories,
            submitted_at: self.submitted_at,
        })
    }
}

// =============================================================================
// Aggregates
// =============================================================================

/// Course-wide rating aggregate.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FeedbackSummary {
    /// Submissions received.
    pub count: i64,
    /// Mean overall rating (0 when no submissions).
    pub average_rating: f64,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for feedback records.
#[derive(Debug, Clone)]
pub struct FeedbackRepository {
    pool: SqlitePool,
}

impl FeedbackRepository {
    /// Creates a new FeedbackRepository.
    pub fn new(pool: SqlitePool) -> Self {
        FeedbackRepository { pool }
    }

    /// Inserts a feedback submission.
    ///
    /// ## Returns
    /// * `Ok(Feedback)` - Stored submission
    /// * `Err(DbError::UniqueViolation)` - This student already rated
    ///   this course
    pub async fn insert(&self, feedback: &Feedback) -> DbResult<Feedback> {
        debug!(
            course_id = %feedback.course_id,
            student_id = %feedback.student_id,
            rating = %feedback.rating,
            "Inserting feedback"
        );

        let categories = serde_json::to_string(&feedback.categories)?;

        sqlx::query(
            r#"
            INSERT INTO feedback (
                id, course_id, student_id, rating, comment, categories, submitted_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&feedback.id)
        .bind(&feedback.course_id)
        .bind(&feedback.student_id)
        .bind(feedback.rating)
        .bind(&feedback.comment)
        .bind(&categories)
        .bind(feedback.submitted_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } if field.contains("feedback.") => {
                DbError::duplicate(
                    "feedback",
                    format!("{}/{}", feedback.course_id, feedback.student_id),
                )
            }
            other => other,
        })?;

        Ok(feedback.clone())
    }

    /// Gets the pair's submission, if one exists.
    pub async fn find_pair(
        &self,
        course_id: &str,
        student_id: &str,
    ) -> DbResult<Option<Feedback>> {
        let sql = format!(
            "SELECT {FEEDBACK_COLUMNS} FROM feedback \
             WHERE course_id = ?1 AND student_id = ?2"
        );

        let row = sqlx::query_as::<_, FeedbackRow>(&sql)
            .bind(course_id)
            .bind(student_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(FeedbackRow::into_feedback).transpose()
    }

    /// Lists a course's feedback, newest first.
    pub async fn list_for_course(
        &self,
        course_id: &str,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<Feedback>> {
        let sql = format!(
            "SELECT {FEEDBACK_COLUMNS} FROM feedback \
             WHERE course_id = ?1 \
             ORDER BY submitted_at DESC, id ASC \
             LIMIT ?2 OFFSET ?3"
        );

        let rows = sqlx::query_as::<_, FeedbackRow>(&sql)
            .bind(course_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(FeedbackRow::into_feedback).collect()
    }

    /// Aggregates submission count and mean rating for a course.
    pub async fn summary(&self, course_id: &str) -> DbResult<FeedbackSummary> {
        let (count, average_rating): (i64, f64) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(AVG(rating), 0.0) \
             FROM feedback WHERE course_id = ?1",
        )
        .bind(course_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(FeedbackSummary {
            count,
            average_rating,
        })
    }

    /// Every per-category rating map submitted for a course.
    ///
    /// Category sets are free-form per submission, so the breakdown cannot
    /// be a SQL aggregate; callers decode the JSON maps and average in Rust.
    pub async fn category_maps(&self, course_id: &str) -> DbResult<Vec<BTreeMap<String, i64>>> {
        let raw: Vec<String> =
            sqlx::query_scalar("SELECT categories FROM feedback WHERE course_id = ?1")
                .bind(course_id)
                .fetch_all(&self.pool)
                .await?;

        raw.iter()
            .map(|json| serde_json::from_str(json).map_err(DbError::from))
            .collect()
    }
}

/// Helper to generate a new feedback ID.
pub fn generate_feedback_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
