//! # Progress Repository
//!
//! Per-student course progress, written with last-write-wins upserts.
//!
//! ## Upsert Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 One Row Per (course, student) Pair                      │
//! │                                                                         │
//! │  INSERT INTO progress (...)                                             │
//! │  VALUES (...)                                                           │
//! │  ON CONFLICT (course_id, student_id) DO UPDATE SET                      │
//! │      completion_percentage = excluded.completion_percentage,            │
//! │      completed_modules     = excluded.completed_modules,                │
//! │      last_accessed_at      = excluded.last_accessed_at                  │
//! │                                                                         │
//! │  First write creates the row; every later write replaces the           │
//! │  snapshot. Percentages may go DOWN (a re-taken quiz can lower the      │
//! │  score) - there is deliberately no monotonicity rule here.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use campus_core::Progress;

const PROGRESS_COLUMNS: &str =
    "id, course_id, student_id, completion_percentage, completed_modules, last_accessed_at";

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Debug, Clone, sqlx::FromRow)]
struct ProgressRow {
    id: String,
    course_id: String,
    student_id: String,
    completion_percentage: f64,
    completed_modules: String,
    last_accessed_at: DateTime<Utc>,
}

impl ProgressRow {
    fn into_progress(self) -> DbResult<Progress> {
        let completed_modules: Vec<String> = serde_json::from_str(&self.completed_modules)?;

        Ok(Progress {
            id: self.id,
            course_id: self.course_id,
            student_id: self.student_id,
            completion_percentage: self.completion_percentage,
            completed_modules,
            last_accessed_at: self.last_accessed_at,
        })
    }
}

// =============================================================================
// Aggregates
// =============================================================================

/// Course-wide progress aggregate (for instructors and analytics).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProgressSummary {
    /// Students with a progress record in this course.
    pub tracked: i64,
    /// Mean completion percentage across tracked students (0 when none).
    pub average_percentage: f64,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for progress records.
#[derive(Debug, Clone)]
pub struct ProgressRepository {
    pool: SqlitePool,
}

impl ProgressRepository {
    /// Creates a new ProgressRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProgressRepository { pool }
    }

    /// Writes the pair's progress snapshot, replacing any previous one.
    ///
    /// ## Arguments
    /// * `course_id` / `student_id` - The enrollment pair
    /// * `percentage` - Completion in [0, 100]; validated upstream
    /// * `completed_modules` - Module ids the student has finished
    ///
    /// ## Returns
    /// The stored record. Its `id` is stable across overwrites: the first
    /// write fixes it, later writes only replace the snapshot fields.
    pub async fn upsert(
        &self,
        course_id: &str,
        student_id: &str,
        percentage: f64,
        completed_modules: &[String],
    ) -> DbResult<Progress> {
        let now = Utc::now();
        let modules_json = serde_json::to_string(completed_modules)?;

        debug!(
            course_id = %course_id,
            student_id = %student_id,
            percentage = %percentage,
            "Upserting progress"
        );

        sqlx::query(
            r#"
            INSERT INTO progress (
                id, course_id, student_id,
                completion_percentage, completed_modules, last_accessed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT (course_id, student_id) DO UPDATE SET
                completion_percentage = excluded.completion_percentage,
                completed_modules = excluded.completed_modules,
                last_accessed_at = excluded.last_accessed_at
            "#,
        )
        .bind(generate_progress_id())
        .bind(course_id)
        .bind(student_id)
        .bind(percentage)
        .bind(&modules_json)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let sql = format!(
            "SELECT {PROGRESS_COLUMNS} FROM progress \
             WHERE course_id = ?1 AND student_id = ?2"
        );
        let row = sqlx::query_as::<_, ProgressRow>(&sql)
            .bind(course_id)
            .bind(student_id)
            .fetch_one(&self.pool)
            .await?;

        row.into_progress()
    }

    /// Gets the pair's progress record, if any has been written.
    pub async fn find(&self, course_id: &str, student_id: &str) -> DbResult<Option<Progress>> {
        let sql = format!(
            "SELECT {PROGRESS_COLUMNS} FROM progress \
             WHERE course_id = ?1 AND student_id = ?2"
        );

        let row = sqlx::query_as::<_, ProgressRow>(&sql)
            .bind(course_id)
            .bind(student_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(ProgressRow::into_progress).transpose()
    }

    /// Lists every progress record in a course.
    pub async fn list_for_course(&self, course_id: &str) -> DbResult<Vec<Progress>> {
        let sql = format!(
            "SELECT {PROGRESS_COLUMNS} FROM progress \
             WHERE course_id = ?1 ORDER BY student_id ASC"
        );

        let rows = sqlx::query_as::<_, ProgressRow>(&sql)
            .bind(course_id)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(ProgressRow::into_progress).collect()
    }

    /// Aggregates tracked-student count and mean completion for a course.
    pub async fn course_summary(&self, course_id: &str) -> DbResult<ProgressSummary> {
        let (tracked, average_percentage): (i64, f64) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(AVG(completion_percentage), 0.0) \
             FROM progress WHERE course_id = ?1",
        )
        .bind(course_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(ProgressSummary {
            tracked,
            average_percentage,
        })
    }
}

/// Helper to generate a new progress record ID.
pub fn generate_progress_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    /// Progress rows need a parent course for the foreign key.
    async fn course_id(db: &Database) -> String {
        use crate::repository::course::generate_course_id;
        use campus_core::{Course, CourseStatus};

        let now = Utc::now();
        let course = Course {
            id: generate_course_id(),
            code: "CS-101".to_string(),
            title: "Intro".to_string(),
            description: Some("Syllabus".to_string()),
            status: CourseStatus::Published,
            capacity: 10,
            enrolled_count: 0,
            instructor_id: "teacher-1".to_string(),
            prerequisites: vec![],
            credits: 5,
            schedule: None,
            category: None,
            level: None,
            is_deleted: false,
            version: 1,
            created_at: now,
            updated_at: now,
        };
        db.courses().insert(&course).await.unwrap();
        course.id
    }

    #[tokio::test]
    async fn test_upsert_creates_then_overwrites() {
        let db = test_db().await;
        let course = course_id(&db).await;
        let repo = db.progress();

        let first = repo
            .upsert(&course, "student-1", 40.0, &["m1".to_string()])
            .await
            .unwrap();
        assert_eq!(first.completion_percentage, 40.0);
        assert_eq!(first.completed_modules, vec!["m1"]);

        // Overwrite with a LOWER percentage: last write wins, no floor.
        let second = repo
            .upsert(
                &course,
                "student-1",
                25.0,
                &["m1".to_string(), "m2".to_string()],
            )
            .await
            .unwrap();
        assert_eq!(second.completion_percentage, 25.0);
        assert_eq!(second.completed_modules, vec!["m1", "m2"]);

        // Same row both times.
        assert_eq!(second.id, first.id);
        assert_eq!(repo.list_for_course(&course).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_find_missing_pair() {
        let db = test_db().await;
        let course = course_id(&db).await;

        let found = db.progress().find(&course, "nobody").await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_course_summary_average() {
        let db = test_db().await;
        let course = course_id(&db).await;
        let repo = db.progress();

        repo.upsert(&course, "student-1", 50.0, &[]).await.unwrap();
        repo.upsert(&course, "student-2", 100.0, &[]).await.unwrap();

        let summary = repo.course_summary(&course).await.unwrap();
        assert_eq!(summary.tracked, 2);
        assert!((summary.average_percentage - 75.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_course_summary_empty() {
        let db = test_db().await;
        let course = course_id(&db).await;

        let summary = db.progress().course_summary(&course).await.unwrap();
        assert_eq!(summary.tracked, 0);
        assert_eq!(summary.average_percentage, 0.0);
    }
}
