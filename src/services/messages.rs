use sqlx::SqlitePool;
use tracing::info;

use crate::db::{CreateNotification, NotificationType, UserRepository};
use crate::error::{AppError, AppResult};
use crate::i18n;
use crate::services::feed::NotificationStore;
use crate::session::Session;

pub struct MessageService;

impl MessageService {
    /// Deliver a direct message as a `new_message` notification to the
    /// recipient. Returns the notification id.
    pub async fn send(
        pool: &SqlitePool,
        store: &dyn NotificationStore,
        session: &Session,
        recipient_id: &str,
        text: &str,
    ) -> AppResult<String> {
        let recipient_id = recipient_id.trim();
        if recipient_id.is_empty() {
            return Err(AppError::Validation(i18n::t("validation.recipient_required")));
        }
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::Validation(i18n::t("validation.message_required")));
        }

        let recipient = UserRepository::find_by_id(pool, recipient_id)
            .await?
            .ok_or_else(|| AppError::NotFound(i18n::t("not_found.user")))?;
        let sender_name = UserRepository::find_by_id(pool, &session.user_id)
            .await?
            .map(|u| u.display_name)
            .unwrap_or_else(|| session.user_id.clone());

        let id = store
            .create(CreateNotification {
                user_id: recipient.id.clone(),
                title: i18n::tr(
                    recipient.lang.as_deref(),
                    "notifications.new_message.title",
                    Some(&[("sender", sender_name.as_str())]),
                ),
                message: text.to_string(),
                notification_type: NotificationType::NewMessage,
                job_id: None,
            })
            .await?;

        info!(
            "Message notification {} from {} to {}",
            id, session.user_id, recipient.id
        );
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{test_pool, Role, UpsertUser};
    use crate::services::feed::testing::MemoryStore;

    #[tokio::test]
    async fn message_becomes_notification() {
        let pool = test_pool().await;
        for (id, name, role) in [
            ("s1", "Ayanda", Role::Student),
            ("c1", "Acme HR", Role::Company),
        ] {
            UserRepository::upsert(
                &pool,
                UpsertUser {
                    id: id.to_string(),
                    display_name: name.to_string(),
                    role,
                    lang: None,
                },
            )
            .await
            .unwrap();
        }
        let store = MemoryStore::default();
        let hr = Session::new("c1", Role::Company);

        let id = MessageService::send(&pool, &store, &hr, "s1", " Interview on Monday? ")
            .await
            .unwrap();
        let sent = store.get(&id).unwrap();
        assert_eq!(sent.title, "New message from Acme HR");
        assert_eq!(sent.message, "Interview on Monday?");
        assert_eq!(sent.notification_type, NotificationType::NewMessage);

        assert!(matches!(
            MessageService::send(&pool, &store, &hr, "s1", "   ").await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            MessageService::send(&pool, &store, &hr, "ghost", "hi").await,
            Err(AppError::NotFound(_))
        ));
    }
}
