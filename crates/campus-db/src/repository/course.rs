//! # Course Repository
//!
//! Database operations for the course catalogue.
//!
//! ## Key Operations
//! - CRUD with soft deletes
//! - Catalogue search with composable filters
//! - Guarded lifecycle transitions
//!
//! ## Catalogue Filtering
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    How Catalogue Search Works                           │
//! │                                                                         │
//! │  CourseFilter { status: Published, category: "math", query: "algebra" }│
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  QueryBuilder assembles WHERE clauses (all bound, never interpolated): │
//! │                                                                         │
//! │    SELECT ... FROM courses                                              │
//! │    WHERE is_deleted = 0                                                 │
//! │      AND status = ?        ← only when the filter sets it              │
//! │      AND category = ?                                                   │
//! │      AND (title LIKE ? OR code LIKE ? OR description LIKE ?)           │
//! │    ORDER BY created_at DESC                                             │
//! │    LIMIT ? OFFSET ?                                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Results: [MATH-201 Linear Algebra, MATH-301 Abstract Algebra]         │
//! │                                                                         │
//! │  LIKE is case-insensitive for ASCII in SQLite; wildcards in the user   │
//! │  query are escaped so "100%" matches the literal text.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use campus_core::{Course, CourseLevel, CourseStatus, DEFAULT_PAGE_SIZE};

// =============================================================================
// Filters
// =============================================================================

/// Sortable column for catalogue listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    /// Creation time (catalogue default).
    #[default]
    CreatedAt,
    Title,
    Code,
    Credits,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortField {
    /// The natural direction for this column when the caller names none:
    /// newest first for timestamps, A→Z for text, highest first for credits.
    pub fn natural_order(self) -> SortOrder {
        match self {
            SortField::CreatedAt => SortOrder::Desc,
            SortField::Title | SortField::Code => SortOrder::Asc,
            SortField::Credits => SortOrder::Desc,
        }
    }
}

/// Sort selection for catalogue listings: one column plus a direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseSort {
    pub field: SortField,
    pub order: SortOrder,
}

impl Default for CourseSort {
    /// Newest courses first.
    fn default() -> Self {
        SortField::CreatedAt.into()
    }
}

impl From<SortField> for CourseSort {
    /// A field with its natural direction.
    fn from(field: SortField) -> Self {
        CourseSort {
            field,
            order: field.natural_order(),
        }
    }
}

impl CourseSort {
    /// The ORDER BY clause for this sort. Static strings only; sort order
    /// is never built from user input. A trailing `id` key keeps pages
    /// stable when the sorted column ties.
    fn order_clause(self) -> &'static str {
        match (self.field, self.order) {
            (SortField::CreatedAt, SortOrder::Asc) => "created_at ASC, id ASC",
            (SortField::CreatedAt, SortOrder::Desc) => "created_at DESC, id ASC",
            (SortField::Title, SortOrder::Asc) => "title ASC, id ASC",
            (SortField::Title, SortOrder::Desc) => "title DESC, id ASC",
            (SortField::Code, SortOrder::Asc) => "code ASC, id ASC",
            (SortField::Code, SortOrder::Desc) => "code DESC, id ASC",
            (SortField::Credits, SortOrder::Asc) => "credits ASC, id ASC",
            (SortField::Credits, SortOrder::Desc) => "credits DESC, id ASC",
        }
    }
}

/// Composable filter for catalogue queries.
///
/// All criteria are optional and combine with AND. Soft-deleted courses are
/// always excluded.
///
/// ## Example
/// ```rust,ignore
/// let filter = CourseFilter {
///     status: Some(CourseStatus::Published),
///     category: Some("mathematics".to_string()),
///     ..CourseFilter::default()
/// };
/// let page = repo.list(&filter).await?;
/// ```
#[derive(Debug, Clone)]
pub struct CourseFilter {
    /// Restrict to one lifecycle state (students only ever see Published).
    pub status: Option<CourseStatus>,
    /// Exact category match.
    pub category: Option<String>,
    /// Exact difficulty tier match.
    pub level: Option<CourseLevel>,
    /// Restrict to one instructor's courses.
    pub instructor_id: Option<String>,
    /// Case-insensitive substring search over title, code and description.
    pub query: Option<String>,
    /// Sort order.
    pub sort: CourseSort,
    /// Page size.
    pub limit: i64,
    /// Rows to skip.
    pub offset: i64,
}

impl Default for CourseFilter {
    fn default() -> Self {
        CourseFilter {
            status: None,
            category: None,
            level: None,
            instructor_id: None,
            query: None,
            sort: CourseSort::default(),
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
        }
    }
}

impl CourseFilter {
    /// Appends this filter's WHERE clauses to a query builder.
    ///
    /// The builder must already contain `WHERE is_deleted = 0` so every
    /// clause here can start with ` AND`.
    fn push_clauses(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        if let Some(status) = self.status {
            qb.push(" AND status = ").push_bind(status);
        }
        if let Some(category) = &self.category {
            qb.push(" AND category = ").push_bind(category.clone());
        }
        if let Some(level) = self.level {
            qb.push(" AND level = ").push_bind(level);
        }
        if let Some(instructor_id) = &self.instructor_id {
            qb.push(" AND instructor_id = ").push_bind(instructor_id.clone());
        }
        if let Some(query) = &self.query {
            let pattern = like_pattern(query);
            qb.push(" AND (title LIKE ").push_bind(pattern.clone());
            qb.push(" ESCAPE '\\' OR code LIKE ").push_bind(pattern.clone());
            qb.push(" ESCAPE '\\' OR description LIKE ").push_bind(pattern);
            qb.push(" ESCAPE '\\')");
        }
    }
}

/// Builds a `%...%` LIKE pattern with SQL wildcards in the user text escaped.
fn like_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

// =============================================================================
// Row Mapping
// =============================================================================

/// Raw database row for a course.
///
/// JSON columns come back as TEXT and are decoded in [`CourseRow::into_course`];
/// everything else maps directly via `sqlx::FromRow`.
#[derive(Debug, Clone, sqlx::FromRow)]
struct CourseRow {
    id: String,
    code: String,
    title: String,
    description: Option<String>,
    status: CourseStatus,
    capacity: i64,
    enrolled_count: i64,
    instructor_id: String,
    prerequisites: String,
    credits: i64,
    schedule: Option<String>,
    category: Option<String>,
    level: Option<CourseLevel>,
    is_deleted: bool,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CourseRow {
    fn into_course(self) -> DbResult<Course> {
        let prerequisites: Vec<String> = serde_json::from_str(&self.prerequisites)?;

        Ok(Course {
            id: self.id,
            code: self.code,
            title: self.title,
            description: self.description,
            status: self.status,
            capacity: self.capacity,
            enrolled_count: self.enrolled_count,
            instructor_id: self.instructor_id,
            prerequisites,
            credits: self.credits,
            schedule: self.schedule,
            category: self.category,
            level: self.level,
            is_deleted: self.is_deleted,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Shared column list so every SELECT hydrates the full row.
const COURSE_COLUMNS: &str = "id, code, title, description, status, capacity, \
     enrolled_count, instructor_id, prerequisites, credits, schedule, \
     category, level, is_deleted, version, created_at, updated_at";

// =============================================================================
// Repository
// =============================================================================

/// Repository for course database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = CourseRepository::new(pool);
///
/// // Catalogue page
/// let courses = repo.list(&CourseFilter::default()).await?;
///
/// // Get by ID
/// let course = repo.get("uuid-here").await?;
/// ```
#[derive(Debug, Clone)]
pub struct CourseRepository {
    pool: SqlitePool,
}

impl CourseRepository {
    /// Creates a new CourseRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CourseRepository { pool }
    }

    /// Gets a course by its ID.
    ///
    /// ## Arguments
    /// * `id` - Course UUID
    ///
    /// ## Returns
    /// * `Ok(Some(Course))` - Course found
    /// * `Ok(None)` - No such course, or it was soft-deleted
    pub async fn get(&self, id: &str) -> DbResult<Option<Course>> {
        let sql = format!(
            "SELECT {COURSE_COLUMNS} FROM courses WHERE id = ?1 AND is_deleted = 0"
        );

        let row = sqlx::query_as::<_, CourseRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(CourseRow::into_course).transpose()
    }

    /// Gets a course by its business code (e.g. "CS-101").
    ///
    /// Codes are unique among live courses only, so this never returns a
    /// soft-deleted row.
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Course>> {
        let sql = format!(
            "SELECT {COURSE_COLUMNS} FROM courses WHERE code = ?1 AND is_deleted = 0"
        );

        let row = sqlx::query_as::<_, CourseRow>(&sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;

        row.map(CourseRow::into_course).transpose()
    }

    /// Inserts a new course.
    ///
    /// ## Arguments
    /// * `course` - Course to insert (id should be generated beforehand)
    ///
    /// ## Returns
    /// * `Ok(Course)` - Inserted course
    /// * `Err(DbError::UniqueViolation)` - Code already in use by a live course
    pub async fn insert(&self, course: &Course) -> DbResult<Course> {
        debug!(code = %course.code, "Inserting course");

        let prerequisites = serde_json::to_string(&course.prerequisites)?;

        sqlx::query(
            r#"
            INSERT INTO courses (
                id, code, title, description, status, capacity,
                enrolled_count, instructor_id, prerequisites, credits,
                schedule, category, level, is_deleted, version,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6,
                ?7, ?8, ?9, ?10,
                ?11, ?12, ?13, ?14, ?15,
                ?16, ?17
            )
            "#,
        )
        .bind(&course.id)
        .bind(&course.code)
        .bind(&course.title)
        .bind(&course.description)
        .bind(course.status)
        .bind(course.capacity)
        .bind(course.enrolled_count)
        .bind(&course.instructor_id)
        .bind(&prerequisites)
        .bind(course.credits)
        .bind(&course.schedule)
        .bind(&course.category)
        .bind(course.level)
        .bind(course.is_deleted)
        .bind(course.version)
        .bind(course.created_at)
        .bind(course.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } if field.contains("courses.code") => {
                DbError::duplicate("code", &course.code)
            }
            other => other,
        })?;

        // Return the course as-is (it already has all fields)
        Ok(course.clone())
    }

    /// Updates a course's editable fields.
    ///
    /// Deliberately does NOT touch `enrolled_count` or `status`; the
    /// enrollment ledger owns the count and lifecycle transitions go
    /// through [`transition_status`](Self::transition_status).
    ///
    /// ## Arguments
    /// * `course` - Course with updated fields
    ///
    /// ## Returns
    /// * `Ok(())` - Update successful (version bumped)
    /// * `Err(DbError::NotFound)` - Course doesn't exist or is deleted
    /// * `Err(DbError::UniqueViolation)` - New code collides with a live course
    pub async fn update(&self, course: &Course) -> DbResult<()> {
        debug!(id = %course.id, "Updating course");

        let now = Utc::now();
        let prerequisites = serde_json::to_string(&course.prerequisites)?;

        let result = sqlx::query(
            r#"
            UPDATE courses SET
                code = ?2,
                title = ?3,
                description = ?4,
                capacity = ?5,
                prerequisites = ?6,
                credits = ?7,
                schedule = ?8,
                category = ?9,
                level = ?10,
                updated_at = ?11,
                version = version + 1
            WHERE id = ?1 AND is_deleted = 0
            "#,
        )
        .bind(&course.id)
        .bind(&course.code)
        .bind(&course.title)
        .bind(&course.description)
        .bind(course.capacity)
        .bind(&prerequisites)
        .bind(course.credits)
        .bind(&course.schedule)
        .bind(&course.category)
        .bind(course.level)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } if field.contains("courses.code") => {
                DbError::duplicate("code", &course.code)
            }
            other => other,
        })?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Course", &course.id));
        }

        Ok(())
    }

    /// Moves a course along one lifecycle edge, guarded by the current state.
    ///
    /// ## Guarded Transition Pattern
    /// ```text
    /// UPDATE courses SET status = <to> WHERE id = ? AND status = <from>
    /// ```
    /// If another writer moved the course first, zero rows match and this
    /// returns `false`; the caller re-reads to find out what happened.
    ///
    /// ## Returns
    /// * `Ok(true)` - Transition applied
    /// * `Ok(false)` - Course missing, deleted, or no longer in `from`
    pub async fn transition_status(
        &self,
        id: &str,
        from: CourseStatus,
        to: CourseStatus,
    ) -> DbResult<bool> {
        debug!(id = %id, from = %from.as_str(), to = %to.as_str(), "Transitioning course");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE courses SET
                status = ?3,
                updated_at = ?4,
                version = version + 1
            WHERE id = ?1 AND status = ?2 AND is_deleted = 0
            "#,
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Archives a published course, but only while no student holds a seat.
    ///
    /// The `enrolled_count = 0` guard closes the archive/enroll race: SQLite
    /// serializes the two writes on the same row, so either this archive wins
    /// (and the concurrent enrollment fails its `status = 'published'` check)
    /// or the enrollment wins (and this returns `false`).
    ///
    /// ## Returns
    /// * `Ok(true)` - Course archived
    /// * `Ok(false)` - Not published, has active enrollments, or missing
    pub async fn try_archive(&self, id: &str) -> DbResult<bool> {
        debug!(id = %id, "Archiving course");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE courses SET
                status = 'archived',
                updated_at = ?2,
                version = version + 1
            WHERE id = ?1
              AND status = 'published'
              AND enrolled_count = 0
              AND is_deleted = 0
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Soft-deletes a course, but only while no student holds a seat.
    ///
    /// ## Why Soft Delete?
    /// - Enrollment history still references this course
    /// - Completed prerequisites must keep resolving
    /// - The code becomes reusable (uniqueness covers live rows only)
    ///
    /// ## Returns
    /// * `Ok(true)` - Course marked deleted
    /// * `Ok(false)` - Has active enrollments, already deleted, or missing
    pub async fn try_soft_delete(&self, id: &str) -> DbResult<bool> {
        debug!(id = %id, "Soft-deleting course");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE courses SET
                is_deleted = 1,
                updated_at = ?2,
                version = version + 1
            WHERE id = ?1 AND enrolled_count = 0 AND is_deleted = 0
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Lists courses matching a filter, paginated.
    ///
    /// ## Arguments
    /// * `filter` - Criteria, sort order and page bounds
    ///
    /// ## Example
    /// ```rust,ignore
    /// let filter = CourseFilter {
    ///     query: Some("algebra".to_string()),
    ///     ..CourseFilter::default()
    /// };
    /// let page = repo.list(&filter).await?;
    /// ```
    pub async fn list(&self, filter: &CourseFilter) -> DbResult<Vec<Course>> {
        debug!(?filter, "Listing courses");

        let mut qb: QueryBuilder<'_, Sqlite> = QueryBuilder::new(format!(
            "SELECT {COURSE_COLUMNS} FROM courses WHERE is_deleted = 0"
        ));
        filter.push_clauses(&mut qb);

        qb.push(" ORDER BY ").push(filter.sort.order_clause());
        qb.push(" LIMIT ").push_bind(filter.limit);
        qb.push(" OFFSET ").push_bind(filter.offset);

        let rows = qb
            .build_query_as::<CourseRow>()
            .fetch_all(&self.pool)
            .await?;

        debug!(count = rows.len(), "Catalogue query returned courses");

        rows.into_iter().map(CourseRow::into_course).collect()
    }

    /// Counts courses matching a filter (ignoring page bounds).
    pub async fn count(&self, filter: &CourseFilter) -> DbResult<i64> {
        let mut qb: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM courses WHERE is_deleted = 0");
        filter.push_clauses(&mut qb);

        let count = qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Which of the given course ids exist as live (non-deleted) courses.
    ///
    /// Used to verify prerequisite references against the catalogue itself.
    /// Returns the subset that was found; callers diff against the input to
    /// name the unknown ids.
    pub async fn existing_ids(&self, ids: &[String]) -> DbResult<Vec<String>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new("SELECT id FROM courses WHERE is_deleted = 0 AND id IN (");
        let mut separated = qb.separated(", ");
        for id in ids {
            separated.push_bind(id.clone());
        }
        qb.push(")");

        let found = qb
            .build_query_scalar::<String>()
            .fetch_all(&self.pool)
            .await?;

        Ok(found)
    }
}

/// Helper to generate a new course ID.
///
/// ## Usage
/// ```rust,ignore
/// let id = generate_course_id();
/// let course = Course { id, ... };
/// ```
pub fn generate_course_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
