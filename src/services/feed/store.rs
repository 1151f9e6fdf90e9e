use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::db::{CreateNotification, NotificationPatch, NotificationRecord};
use crate::error::AppResult;

/// Opaque continuation handle pointing at the last record of a page.
///
/// Pages are ordered by `(timestamp, id)` descending; the next page starts
/// strictly after the position held here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedCursor {
    pub(crate) timestamp: NaiveDateTime,
    pub(crate) id: String,
}

impl FeedCursor {
    pub(crate) fn after(record: &NotificationRecord) -> Self {
        Self {
            timestamp: record.timestamp,
            id: record.id.clone(),
        }
    }

    /// True when `record` sorts strictly after this position in a
    /// recency-descending listing.
    #[cfg(test)]
    pub(crate) fn precedes(&self, record: &NotificationRecord) -> bool {
        (record.timestamp, record.id.as_str()) < (self.timestamp, self.id.as_str())
    }
}

/// One page of a user's notifications, newest first.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub records: Vec<NotificationRecord>,
    /// Cursor for the following page; `None` when `records` is empty
    pub cursor: Option<FeedCursor>,
}

impl Page {
    pub fn new(records: Vec<NotificationRecord>) -> Self {
        let cursor = records.last().map(FeedCursor::after);
        Self { records, cursor }
    }
}

/// Persistence for notification records.
///
/// Mutations are scoped to the owning user: an id that belongs to somebody
/// else behaves exactly like an id that does not exist.
#[async_trait]
pub trait NotificationStore: Send + Sync + 'static {
    /// Fetch up to `page_size` records for `user_id`, newest first, resuming
    /// after `cursor` when one is given.
    async fn fetch_page(
        &self,
        user_id: &str,
        page_size: usize,
        cursor: Option<&FeedCursor>,
    ) -> AppResult<Page>;

    /// Apply a field update. Returns `NotFound` for unknown ids.
    async fn update(&self, user_id: &str, id: &str, patch: NotificationPatch) -> AppResult<()>;

    /// Remove a record. Deleting an unknown id succeeds.
    async fn delete(&self, user_id: &str, id: &str) -> AppResult<()>;

    /// Validate and persist a new record, returning the assigned id.
    async fn create(&self, notification: CreateNotification) -> AppResult<String>;
}
