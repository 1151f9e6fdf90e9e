use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::db::{
    ApplicationRepository, ApplicationStatus, CreateApplication, CreateNotification,
    JobApplication, JobRepository, NotificationType, Role, UserRepository,
};
use crate::error::{AppError, AppResult};
use crate::i18n;
use crate::services::feed::NotificationStore;
use crate::session::Session;

pub struct ApplicationService;

impl ApplicationService {
    /// Apply the session's student to a job. The application starts out
    /// `pending`.
    pub async fn apply(
        pool: &SqlitePool,
        session: &Session,
        job_id: &str,
    ) -> AppResult<JobApplication> {
        if session.role != Role::Student {
            return Err(AppError::Forbidden);
        }
        let job_id = job_id.trim();
        if job_id.is_empty() {
            return Err(AppError::Validation("job id is required".to_string()));
        }

        JobRepository::find_by_id(pool, job_id)
            .await?
            .ok_or_else(|| AppError::NotFound(i18n::t("not_found.job")))?;

        let application = ApplicationRepository::create(
            pool,
            CreateApplication {
                job_id: job_id.to_string(),
                student_id: session.user_id.clone(),
            },
        )
        .await?;

        info!(
            "Student {} applied to job {} (application {})",
            session.user_id, job_id, application.id
        );
        Ok(application)
    }

    pub async fn list_own(pool: &SqlitePool, session: &Session) -> AppResult<Vec<JobApplication>> {
        ApplicationRepository::find_by_student(pool, &session.user_id).await
    }

    /// Set an application's status from a raw status string.
    ///
    /// The string is normalized first; unknown values are rejected before
    /// anything is written. Companies may only touch applications to their
    /// own jobs, admins may touch any. The applicant is notified afterwards;
    /// a failed notification does not undo the status change.
    pub async fn update_status(
        pool: &SqlitePool,
        store: &dyn NotificationStore,
        session: &Session,
        application_id: &str,
        raw_status: &str,
        notes: Option<&str>,
    ) -> AppResult<JobApplication> {
        if !session.role.can_manage_jobs() {
            return Err(AppError::Forbidden);
        }

        let status = ApplicationStatus::normalize(raw_status).ok_or_else(|| {
            warn!(
                "Rejected unmapped application status {:?} for application {}",
                raw_status, application_id
            );
            AppError::Validation(i18n::t_with(
                "validation.unknown_status",
                &[("status", raw_status)],
            ))
        })?;
        let notes = notes.map(str::trim).filter(|n| !n.is_empty());

        let existing = ApplicationRepository::find_by_id(pool, application_id)
            .await?
            .ok_or_else(|| AppError::NotFound(i18n::t("not_found.application")))?;
        let job = JobRepository::find_by_id(pool, &existing.job_id)
            .await?
            .ok_or_else(|| AppError::NotFound(i18n::t("not_found.job")))?;
        if session.role == Role::Company && job.company_id != session.user_id {
            return Err(AppError::Forbidden);
        }

        let updated = ApplicationRepository::update_status(pool, application_id, status, notes).await?;
        info!(
            "Application {} moved from {} to {} by {}",
            updated.id, existing.raw_status, status, session.user_id
        );

        let lang = match UserRepository::find_by_id(pool, &updated.student_id).await {
            Ok(user) => user.and_then(|u| u.lang),
            Err(e) => {
                warn!("Could not load applicant {}: {}", updated.student_id, e);
                None
            }
        };
        let lang = lang.as_deref();
        let status_label = i18n::tr(lang, &format!("status.{}", status.as_str()), None);
        let notification = CreateNotification {
            user_id: updated.student_id.clone(),
            title: i18n::tr(lang, "notifications.application_status.title", None),
            message: i18n::tr(
                lang,
                "notifications.application_status.message",
                Some(&[("job", job.title.as_str()), ("status", status_label.as_str())]),
            ),
            notification_type: NotificationType::ApplicationStatus,
            job_id: None,
        };
        if let Err(e) = store.create(notification).await {
            warn!(
                "Failed to notify student {} about application {}: {}",
                updated.student_id, updated.id, e
            );
        }

        Ok(updated)
    }
}
