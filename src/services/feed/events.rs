use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::warn;

use super::NotificationFeed;
use crate::db::{JobApplication, NotificationRecord, NotificationType};
use crate::error::{AppError, AppResult};
use crate::services::applications::ApplicationService;

/// Actions the presentation layer reports for a rendered notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedEvent {
    Click,
    Apply,
    Delete,
}

/// Where a click on a notification should take the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "target", rename_all = "snake_case")]
pub enum ClickTarget {
    JobDetails { job_id: String },
    Applications,
    Messages,
}

impl ClickTarget {
    pub fn for_record(record: &NotificationRecord) -> Option<Self> {
        match record.notification_type {
            NotificationType::NewJob => record
                .job_id
                .clone()
                .map(|job_id| ClickTarget::JobDetails { job_id }),
            NotificationType::ApplicationStatus => Some(ClickTarget::Applications),
            NotificationType::NewMessage => Some(ClickTarget::Messages),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EventOutcome {
    Navigate { route: ClickTarget },
    Applied { application: JobApplication },
    Deleted { items: Vec<NotificationRecord> },
}

impl NotificationFeed {
    /// Route a presentation event for a notification currently in the feed.
    pub async fn handle_event(
        &self,
        pool: &SqlitePool,
        id: &str,
        event: FeedEvent,
    ) -> AppResult<EventOutcome> {
        match event {
            FeedEvent::Delete => {
                let items = self.delete(id).await?;
                Ok(EventOutcome::Deleted { items })
            }
            FeedEvent::Click => {
                let record = self.require_published(id).await?;
                let route = ClickTarget::for_record(&record).ok_or_else(|| {
                    warn!("Job notification {} has no job id, cannot route", record.id);
                    AppError::Validation(crate::i18n::t("validation.apply_requires_job"))
                })?;
                if !record.read {
                    self.mark_read(&record.id);
                }
                Ok(EventOutcome::Navigate { route })
            }
            FeedEvent::Apply => {
                let record = self.require_published(id).await?;
                let job_id = match (record.notification_type, record.job_id) {
                    (NotificationType::NewJob, Some(job_id)) => job_id,
                    _ => {
                        return Err(AppError::Validation(crate::i18n::t(
                            "validation.apply_requires_job",
                        )))
                    }
                };
                let application = ApplicationService::apply(pool, self.session(), &job_id).await?;
                Ok(EventOutcome::Applied { application })
            }
        }
    }

    async fn require_published(&self, id: &str) -> AppResult<NotificationRecord> {
        self.find_published(id)
            .await
            .ok_or_else(|| AppError::NotFound(crate::i18n::t("not_found.notification")))
    }
}
