use chrono::{NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::db::models::{ApplicationStatus, CreateApplication, JobApplication};
use crate::error::{AppError, AppResult};

// ============================================================================
// Application Repository
// ============================================================================

#[derive(Debug, FromRow)]
struct ApplicationRow {
    id: String,
    job_id: String,
    student_id: String,
    status: String,
    notes: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl From<ApplicationRow> for JobApplication {
    fn from(row: ApplicationRow) -> Self {
        let status = ApplicationStatus::normalize(&row.status);
        if status.is_none() {
            tracing::warn!(
                "Application {} has unmapped status {:?}",
                row.id,
                row.status
            );
        }

        JobApplication {
            id: row.id,
            job_id: row.job_id,
            student_id: row.student_id,
            status,
            raw_status: row.status,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub struct ApplicationRepository;

impl ApplicationRepository {
    /// Create a `pending` application. Fails with `Conflict` when the student
    /// already applied to the job.
    pub async fn create(
        pool: &SqlitePool,
        application: CreateApplication,
    ) -> AppResult<JobApplication> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().naive_utc();

        let row = sqlx::query_as::<_, ApplicationRow>(
            r#"
            INSERT INTO applications (id, job_id, student_id, status, notes, created_at, updated_at)
            VALUES (?, ?, ?, ?, NULL, ?, ?)
            RETURNING id, job_id, student_id, status, notes, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&application.job_id)
        .bind(&application.student_id)
        .bind(ApplicationStatus::Pending.as_str())
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            let duplicate =
                matches!(&e, sqlx::Error::Database(db) if db.is_unique_violation());
            if duplicate {
                AppError::Conflict(crate::i18n::t("conflict.already_applied"))
            } else {
                AppError::Database(e)
            }
        })?;

        Ok(row.into())
    }

    pub async fn find_by_id(pool: &SqlitePool, id: &str) -> AppResult<Option<JobApplication>> {
        let row = sqlx::query_as::<_, ApplicationRow>(
            r#"
            SELECT id, job_id, student_id, status, notes, created_at, updated_at
            FROM applications
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row.map(Into::into))
    }

    pub async fn find_by_student(
        pool: &SqlitePool,
        student_id: &str,
    ) -> AppResult<Vec<JobApplication>> {
        let rows = sqlx::query_as::<_, ApplicationRow>(
            r#"
            SELECT id, job_id, student_id, status, notes, created_at, updated_at
            FROM applications
            WHERE student_id = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(student_id)
        .fetch_all(pool)
        .await
        .map_err(AppError::Database)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Overwrite the status (and notes, when given). Any status may replace
    /// any other.
    pub async fn update_status(
        pool: &SqlitePool,
        id: &str,
        status: ApplicationStatus,
        notes: Option<&str>,
    ) -> AppResult<JobApplication> {
        let now = Utc::now().naive_utc();

        let row = sqlx::query_as::<_, ApplicationRow>(
            r#"
            UPDATE applications
            SET status = ?, notes = COALESCE(?, notes), updated_at = ?
            WHERE id = ?
            RETURNING id, job_id, student_id, status, notes, created_at, updated_at
            "#,
        )
        .bind(status.as_str())
        .bind(notes)
        .bind(now)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)?;

        row.map(Into::into)
            .ok_or_else(|| AppError::NotFound(crate::i18n::t("not_found.application")))
    }
}
