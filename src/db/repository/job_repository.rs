use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::models::{CreateJob, Job};
use crate::error::{AppError, AppResult};

// ============================================================================
// Job Repository
// ============================================================================

pub struct JobRepository;

impl JobRepository {
    pub async fn create(pool: &SqlitePool, job: CreateJob) -> AppResult<Job> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().naive_utc();

        sqlx::query_as::<_, Job>(
            r#"
            INSERT INTO jobs (
                id, company_id, title, company_name, location, job_type, description, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id, company_id, title, company_name, location, job_type, description, created_at
            "#,
        )
        .bind(id)
        .bind(job.company_id)
        .bind(job.title)
        .bind(job.company_name)
        .bind(job.location)
        .bind(job.job_type)
        .bind(job.description)
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn find_by_id(pool: &SqlitePool, id: &str) -> AppResult<Option<Job>> {
        sqlx::query_as::<_, Job>(
            r#"
            SELECT id, company_id, title, company_name, location, job_type, description, created_at
            FROM jobs
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[tokio::test]
    async fn create_and_find() {
        let pool = test_pool().await;
        let job = JobRepository::create(
            &pool,
            CreateJob {
                company_id: "c1".to_string(),
                title: "Junior Developer".to_string(),
                company_name: "Acme".to_string(),
                location: "Durban".to_string(),
                job_type: "full-time".to_string(),
                description: String::new(),
            },
        )
        .await
        .unwrap();

        let found = JobRepository::find_by_id(&pool, &job.id).await.unwrap();
        assert_eq!(found.map(|j| j.title), Some("Junior Developer".to_string()));
        assert!(JobRepository::find_by_id(&pool, "missing")
            .await
            .unwrap()
            .is_none());
    }
}
