use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::store::NotificationStore;
use super::NotificationFeed;
use crate::session::Session;

/// Owns one feed controller per signed-in user. A controller lives from the
/// first feed request until the session is ended.
pub struct FeedRegistry {
    store: Arc<dyn NotificationStore>,
    page_size: usize,
    feeds: RwLock<HashMap<String, Arc<NotificationFeed>>>,
}

impl FeedRegistry {
    pub fn new(store: Arc<dyn NotificationStore>, page_size: usize) -> Self {
        Self {
            store,
            page_size,
            feeds: RwLock::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Arc<dyn NotificationStore> {
        &self.store
    }

    /// Return the caller's controller, creating it on first use.
    pub async fn feed_for(&self, session: &Session) -> Arc<NotificationFeed> {
        if let Some(feed) = self.feeds.read().await.get(&session.user_id) {
            return feed.clone();
        }

        let mut feeds = self.feeds.write().await;
        feeds
            .entry(session.user_id.clone())
            .or_insert_with(|| {
                tracing::debug!("Creating notification feed for user {}", session.user_id);
                Arc::new(NotificationFeed::new(
                    self.store.clone(),
                    session.clone(),
                    self.page_size,
                ))
            })
            .clone()
    }

    /// Drop the caller's controller. Fetches still running against it finish
    /// but their results are never observed.
    pub async fn end_session(&self, user_id: &str) -> bool {
        let removed = self.feeds.write().await.remove(user_id).is_some();
        if removed {
            tracing::debug!("Ended notification feed session for user {}", user_id);
        }
        removed
    }

    pub async fn active_sessions(&self) -> usize {
        self.feeds.read().await.len()
    }
}
