//! # Enrollment Repository
//!
//! The enrollment ledger: seat admission, drops, completions and roster
//! queries.
//!
//! ## Seat Admission Without Locks
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              Compare-And-Swap Admission Protocol                        │
//! │                                                                         │
//! │  Caller read the course earlier: { version: 7, enrolled: 2, cap: 3 }   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────── SINGLE TRANSACTION ─────────────────────────┐    │
//! │  │                                                                │    │
//! │  │  1. UPDATE courses SET enrolled_count = enrolled_count + 1,    │    │
//! │  │            version = version + 1                               │    │
//! │  │     WHERE id = ? AND version = 7                               │    │
//! │  │       AND status = 'published'                                 │    │
//! │  │       AND enrolled_count < capacity                            │    │
//! │  │                                                                │    │
//! │  │     rows_affected == 0?  → ROLLBACK, return SeatUnavailable    │    │
//! │  │     (stale version, full, unpublished, or deleted - the        │    │
//! │  │      caller re-reads and either retries or reports why)        │    │
//! │  │                                                                │    │
//! │  │  2. INSERT the active ledger row                               │    │
//! │  │     - or reactivate the pair's historical dropped/completed    │    │
//! │  │       row (one row per pair, forever)                          │    │
//! │  │     - or ROLLBACK if the pair is already active (the seat      │    │
//! │  │       goes back untouched)                                     │    │
//! │  │                                                                │    │
//! │  └────────────────────────────────────────────────────────────────┘    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  COMMIT ← Seat count and ledger row change together or not at all     │
//! │                                                                         │
//! │  KEY GUARANTEES:                                                       │
//! │  • enrolled_count never exceeds capacity, under any interleaving       │
//! │  • No process-wide mutex; losers retry with a fresh read               │
//! │  • Releasing a seat (drop/complete) needs no version check:           │
//! │    a decrement cannot violate the capacity invariant                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use campus_core::{Enrollment, EnrollmentStatus};

/// Shared column list for ledger SELECTs.
const ENROLLMENT_COLUMNS: &str = "id, course_id, student_id, status, enrolled_at, updated_at";

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Debug, Clone, sqlx::FromRow)]
struct EnrollmentRow {
    id: String,
    course_id: String,
    student_id: String,
    status: EnrollmentStatus,
    enrolled_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<EnrollmentRow> for Enrollment {
    fn from(row: EnrollmentRow) -> Self {
        Enrollment {
            id: row.id,
            course_id: row.course_id,
            student_id: row.student_id,
            status: row.status,
            enrolled_at: row.enrolled_at,
            updated_at: row.updated_at,
        }
    }
}

// =============================================================================
// Outcomes
// =============================================================================

/// Result of a single admission attempt.
#[derive(Debug, Clone)]
pub enum AdmitOutcome {
    /// Seat claimed and ledger row written in one transaction.
    Admitted(Enrollment),
    /// The guarded seat update matched no row. The course's version moved,
    /// it filled up, it left `published`, or it was deleted; the caller
    /// re-reads to find out which and retries only on a version conflict.
    SeatUnavailable,
    /// The pair already holds an active enrollment; nothing was changed.
    AlreadyActive(Enrollment),
}

/// Per-status roster tallies for one course.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrollmentTotals {
    pub active: i64,
    pub dropped: i64,
    pub completed: i64,
}

impl EnrollmentTotals {
    /// All ledger rows ever written for the course.
    pub fn total(&self) -> i64 {
        self.active + self.dropped + self.completed
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for the enrollment ledger.
///
/// ## Usage
/// ```rust,ignore
/// let repo = EnrollmentRepository::new(pool);
///
/// match repo.try_admit(&course.id, course.version, "student-9").await? {
///     AdmitOutcome::Admitted(e) => { /* seat held */ }
///     AdmitOutcome::SeatUnavailable => { /* re-read, maybe retry */ }
///     AdmitOutcome::AlreadyActive(_) => { /* duplicate enrollment */ }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct EnrollmentRepository {
    pool: SqlitePool,
}

impl EnrollmentRepository {
    /// Creates a new EnrollmentRepository.
    pub fn new(pool: SqlitePool) -> Self {
        EnrollmentRepository { pool }
    }

    /// One compare-and-swap admission attempt.
    ///
    /// ## Arguments
    /// * `course_id` - Target course UUID
    /// * `expected_version` - The course version the caller last read;
    ///   the seat write only applies if it still matches
    /// * `student_id` - The enrolling student
    ///
    /// ## Returns
    /// See [`AdmitOutcome`]. This method never retries by itself; retry
    /// policy (budget, backoff) belongs to the caller.
    pub async fn try_admit(
        &self,
        course_id: &str,
        expected_version: i64,
        student_id: &str,
    ) -> DbResult<AdmitOutcome> {
        let now = Utc::now();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        // Step 1: claim the seat. The write is the first statement in the
        // transaction so SQLite takes the write lock immediately (no
        // deferred-snapshot upgrade under WAL).
        let claimed = sqlx::query(
            r#"
            UPDATE courses SET
                enrolled_count = enrolled_count + 1,
                version = version + 1,
                updated_at = ?3
            WHERE id = ?1
              AND version = ?2
              AND status = 'published'
              AND enrolled_count < capacity
              AND is_deleted = 0
            "#,
        )
        .bind(course_id)
        .bind(expected_version)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if claimed.rows_affected() == 0 {
            tx.rollback()
                .await
                .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
            debug!(course_id = %course_id, student_id = %student_id, "Seat CAS missed");
            return Ok(AdmitOutcome::SeatUnavailable);
        }

        // Step 2: write the ledger row while holding the seat.
        let sql = format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM enrollments \
             WHERE course_id = ?1 AND student_id = ?2"
        );
        let existing = sqlx::query_as::<_, EnrollmentRow>(&sql)
            .bind(course_id)
            .bind(student_id)
            .fetch_optional(&mut *tx)
            .await?;

        let enrollment = match existing {
            None => {
                let enrollment = Enrollment {
                    id: generate_enrollment_id(),
                    course_id: course_id.to_string(),
                    student_id: student_id.to_string(),
                    status: EnrollmentStatus::Active,
                    enrolled_at: now,
                    updated_at: now,
                };

                sqlx::query(
                    r#"
                    INSERT INTO enrollments (
                        id, course_id, student_id, status, enrolled_at, updated_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                    "#,
                )
                .bind(&enrollment.id)
                .bind(&enrollment.course_id)
                .bind(&enrollment.student_id)
                .bind(enrollment.status)
                .bind(enrollment.enrolled_at)
                .bind(enrollment.updated_at)
                .execute(&mut *tx)
                .await?;

                enrollment
            }
            Some(row) if row.status.is_terminal() => {
                // Re-enrollment reactivates the pair's historical row so
                // progress and feedback keep their anchor.
                sqlx::query(
                    r#"
                    UPDATE enrollments SET
                        status = 'active',
                        enrolled_at = ?2,
                        updated_at = ?2
                    WHERE id = ?1
                    "#,
                )
                .bind(&row.id)
                .bind(now)
                .execute(&mut *tx)
                .await?;

                Enrollment {
                    status: EnrollmentStatus::Active,
                    enrolled_at: now,
                    updated_at: now,
                    ..row.into()
                }
            }
            Some(row) => {
                // Already active: hand the seat back by rolling everything back.
                tx.rollback()
                    .await
                    .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
                return Ok(AdmitOutcome::AlreadyActive(row.into()));
            }
        };

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!(
            course_id = %course_id,
            student_id = %student_id,
            enrollment_id = %enrollment.id,
            "Admitted enrollment"
        );

        Ok(AdmitOutcome::Admitted(enrollment))
    }

    /// Drops the pair's active enrollment and releases the seat.
    ///
    /// ## Returns
    /// * `Ok(Some(Enrollment))` - The now-dropped record
    /// * `Ok(None)` - No active enrollment existed (drops are one-shot)
    pub async fn mark_dropped(
        &self,
        course_id: &str,
        student_id: &str,
    ) -> DbResult<Option<Enrollment>> {
        self.close_active(course_id, student_id, EnrollmentStatus::Dropped)
            .await
    }

    /// Completes the pair's active enrollment and releases the seat.
    ///
    /// Completed enrollments satisfy prerequisites from then on.
    ///
    /// ## Returns
    /// * `Ok(Some(Enrollment))` - The now-completed record
    /// * `Ok(None)` - No active enrollment existed
    pub async fn mark_completed(
        &self,
        course_id: &str,
        student_id: &str,
    ) -> DbResult<Option<Enrollment>> {
        self.close_active(course_id, student_id, EnrollmentStatus::Completed)
            .await
    }

    /// Flips an active row to a terminal status and releases its seat,
    /// both in one transaction.
    async fn close_active(
        &self,
        course_id: &str,
        student_id: &str,
        to: EnrollmentStatus,
    ) -> DbResult<Option<Enrollment>> {
        let now = Utc::now();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let result = sqlx::query(
            r#"
            UPDATE enrollments SET
                status = ?3,
                updated_at = ?4
            WHERE course_id = ?1 AND student_id = ?2 AND status = 'active'
            "#,
        )
        .bind(course_id)
        .bind(student_id)
        .bind(to)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback()
                .await
                .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
            return Ok(None);
        }

        // Plain decrement: releasing a seat cannot break the capacity
        // invariant, so no version check. The count guard keeps the
        // CHECK constraint satisfied even if the ledger ever drifted.
        sqlx::query(
            r#"
            UPDATE courses SET
                enrolled_count = enrolled_count - 1,
                version = version + 1,
                updated_at = ?2
            WHERE id = ?1 AND enrolled_count > 0
            "#,
        )
        .bind(course_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let sql = format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM enrollments \
             WHERE course_id = ?1 AND student_id = ?2"
        );
        let row = sqlx::query_as::<_, EnrollmentRow>(&sql)
            .bind(course_id)
            .bind(student_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!(
            course_id = %course_id,
            student_id = %student_id,
            status = %to.as_str(),
            "Closed active enrollment"
        );

        Ok(Some(row.into()))
    }

    /// Gets an enrollment by its ID.
    pub async fn get(&self, id: &str) -> DbResult<Option<Enrollment>> {
        let sql = format!("SELECT {ENROLLMENT_COLUMNS} FROM enrollments WHERE id = ?1");

        let row = sqlx::query_as::<_, EnrollmentRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    /// Gets the ledger row for a (course, student) pair, in any status.
    pub async fn find_pair(
        &self,
        course_id: &str,
        student_id: &str,
    ) -> DbResult<Option<Enrollment>> {
        let sql = format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM enrollments \
             WHERE course_id = ?1 AND student_id = ?2"
        );

        let row = sqlx::query_as::<_, EnrollmentRow>(&sql)
            .bind(course_id)
            .bind(student_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    /// Lists a course's roster, oldest enrollment first.
    ///
    /// ## Arguments
    /// * `course_id` - Course UUID
    /// * `status` - Restrict to one status, or `None` for the full history
    pub async fn list_for_course(
        &self,
        course_id: &str,
        status: Option<EnrollmentStatus>,
    ) -> DbResult<Vec<Enrollment>> {
        let rows = match status {
            Some(status) => {
                let sql = format!(
                    "SELECT {ENROLLMENT_COLUMNS} FROM enrollments \
                     WHERE course_id = ?1 AND status = ?2 \
                     ORDER BY enrolled_at ASC, id ASC"
                );
                sqlx::query_as::<_, EnrollmentRow>(&sql)
                    .bind(course_id)
                    .bind(status)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!(
                    "SELECT {ENROLLMENT_COLUMNS} FROM enrollments \
                     WHERE course_id = ?1 \
                     ORDER BY enrolled_at ASC, id ASC"
                );
                sqlx::query_as::<_, EnrollmentRow>(&sql)
                    .bind(course_id)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Lists one student's enrollments across all courses, newest first.
    pub async fn list_for_student(&self, student_id: &str) -> DbResult<Vec<Enrollment>> {
        let sql = format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM enrollments \
             WHERE student_id = ?1 \
             ORDER BY enrolled_at DESC, id ASC"
        );

        let rows = sqlx::query_as::<_, EnrollmentRow>(&sql)
            .bind(student_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Counts seats currently held in a course.
    ///
    /// Under the admission protocol this always equals the course row's
    /// `enrolled_count`; reading it from the ledger is the cross-check.
    pub async fn active_count(&self, course_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM enrollments WHERE course_id = ?1 AND status = 'active'",
        )
        .bind(course_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Per-status tallies for a course's roster (for analytics).
    pub async fn status_counts(&self, course_id: &str) -> DbResult<EnrollmentTotals> {
        let rows: Vec<(EnrollmentStatus, i64)> = sqlx::query_as(
            "SELECT status, COUNT(*) FROM enrollments WHERE course_id = ?1 GROUP BY status",
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;

        let mut totals = EnrollmentTotals::default();
        for (status, count) in rows {
            match status {
                EnrollmentStatus::Active => totals.active = count,
                EnrollmentStatus::Dropped => totals.dropped = count,
                EnrollmentStatus::Completed => totals.completed = count,
            }
        }

        Ok(totals)
    }

    /// Course ids this student has completed (prerequisite lookups).
    pub async fn completed_course_ids(&self, student_id: &str) -> DbResult<Vec<String>> {
        let ids: Vec<String> = sqlx::query_scalar(
            "SELECT course_id FROM enrollments \
             WHERE student_id = ?1 AND status = 'completed'",
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }
}

/// Helper to generate a new enrollment ID.
pub fn generate_enrollment_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
