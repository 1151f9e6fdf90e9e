use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::db::{CreateJob, CreateNotification, Job, JobRepository, NotificationType, Role, UserRepository};
use crate::error::{AppError, AppResult};
use crate::i18n;
use crate::services::feed::NotificationStore;
use crate::session::Session;

/// Job details as submitted by a company or admin.
#[derive(Debug, Clone, Deserialize)]
pub struct NewJobPosting {
    pub title: String,
    pub company_name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub job_type: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobPosted {
    pub job: Job,
    /// Students that received a job alert
    pub notified: usize,
}

pub struct JobService;

impl JobService {
    pub fn validate(posting: &NewJobPosting) -> AppResult<()> {
        if posting.title.trim().is_empty() {
            return Err(AppError::Validation(i18n::t("validation.job_title_required")));
        }
        if posting.company_name.trim().is_empty() {
            return Err(AppError::Validation(i18n::t(
                "validation.company_name_required",
            )));
        }
        Ok(())
    }

    /// Create a job and send a `new_job` alert to every student.
    ///
    /// Alerts go out one at a time; a failed write is logged and the rest
    /// still go out.
    pub async fn post_job(
        pool: &SqlitePool,
        store: &dyn NotificationStore,
        session: &Session,
        posting: NewJobPosting,
    ) -> AppResult<JobPosted> {
        if !session.role.can_manage_jobs() {
            return Err(AppError::Forbidden);
        }
        Self::validate(&posting)?;

        let job = JobRepository::create(
            pool,
            CreateJob {
                company_id: session.user_id.clone(),
                title: posting.title.trim().to_string(),
                company_name: posting.company_name.trim().to_string(),
                location: posting.location.trim().to_string(),
                job_type: posting.job_type.trim().to_string(),
                description: posting.description,
            },
        )
        .await?;
        info!("Job {} ({}) posted by {}", job.id, job.title, session.user_id);

        let students = UserRepository::find_by_role(pool, Role::Student).await?;
        let mut notified = 0usize;
        for student in &students {
            let alert = Self::job_alert(&job, &student.id, student.lang.as_deref());
            match store.create(alert).await {
                Ok(_) => notified += 1,
                Err(e) => warn!(
                    "Failed to send job alert for {} to student {}: {}",
                    job.id, student.id, e
                ),
            }
        }
        info!(
            "Sent {} of {} job alert(s) for job {}",
            notified,
            students.len(),
            job.id
        );

        Ok(JobPosted { job, notified })
    }

    pub async fn find(pool: &SqlitePool, job_id: &str) -> AppResult<Job> {
        JobRepository::find_by_id(pool, job_id)
            .await?
            .ok_or_else(|| AppError::NotFound(i18n::t("not_found.job")))
    }

    fn job_alert(job: &Job, student_id: &str, lang: Option<&str>) -> CreateNotification {
        let message = if job.location.is_empty() || job.job_type.is_empty() {
            i18n::tr(
                lang,
                "notifications.new_job.message_short",
                Some(&[("company", job.company_name.as_str())]),
            )
        } else {
            i18n::tr(
                lang,
                "notifications.new_job.message",
                Some(&[
                    ("company", job.company_name.as_str()),
                    ("job_type", job.job_type.as_str()),
                    ("location", job.location.as_str()),
                ]),
            )
        };

        CreateNotification {
            user_id: student_id.to_string(),
            title: i18n::tr(
                lang,
                "notifications.new_job.title",
                Some(&[("title", job.title.as_str())]),
            ),
            message,
            notification_type: NotificationType::NewJob,
            job_id: Some(job.id.clone()),
        }
    }
}
