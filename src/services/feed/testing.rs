//! In-memory `NotificationStore` used by the feed and producer tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use tokio::sync::Notify;

use super::store::{FeedCursor, NotificationStore, Page};
use crate::db::{CreateNotification, NotificationPatch, NotificationRecord, NotificationType};
use crate::error::{AppError, AppResult};

pub(crate) const USER: &str = "student-1";

pub(crate) fn ts(secs: i64) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap()
        + Duration::seconds(secs)
}

pub(crate) fn record(
    id: &str,
    title: &str,
    message: &str,
    job_id: Option<&str>,
    secs: i64,
) -> NotificationRecord {
    NotificationRecord {
        id: id.to_string(),
        user_id: USER.to_string(),
        title: title.to_string(),
        message: message.to_string(),
        notification_type: if job_id.is_some() {
            NotificationType::NewJob
        } else {
            NotificationType::NewMessage
        },
        job_id: job_id.map(str::to_string),
        timestamp: ts(secs),
        read: false,
    }
}

#[derive(Default)]
pub(crate) struct MemoryStore {
    records: Mutex<Vec<NotificationRecord>>,
    pub(crate) fail_fetch: AtomicBool,
    pub(crate) fail_delete: AtomicBool,
    pub(crate) fail_update: AtomicBool,
    pub(crate) fail_create: AtomicBool,
    pub(crate) gate_fetches: AtomicBool,
    /// Like `gate_fetches`, but waits after the records were read
    pub(crate) gate_after_snapshot: AtomicBool,
    pub(crate) gate: Notify,
    pub(crate) fetch_calls: AtomicUsize,
    pub(crate) delete_calls: AtomicUsize,
    next_id: AtomicUsize,
}

impl MemoryStore {
    pub(crate) fn with_records(records: Vec<NotificationRecord>) -> Self {
        let store = Self::default();
        *store.records.lock().unwrap() = records;
        store
    }

    pub(crate) fn insert(&self, record: NotificationRecord) {
        self.records.lock().unwrap().push(record);
    }

    pub(crate) fn all(&self) -> Vec<NotificationRecord> {
        self.records.lock().unwrap().clone()
    }

    pub(crate) fn get(&self, id: &str) -> Option<NotificationRecord> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }

    fn unavailable() -> AppError {
        AppError::Internal(anyhow::anyhow!("store unavailable"))
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn fetch_page(
        &self,
        user_id: &str,
        page_size: usize,
        cursor: Option<&FeedCursor>,
    ) -> AppResult<Page> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if self.gate_fetches.load(Ordering::SeqCst) {
            self.gate.notified().await;
        }
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }

        let mut mine: Vec<NotificationRecord> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.user_id == user_id)
            .filter(|r| cursor.map_or(true, |c| c.precedes(r)))
            .cloned()
            .collect();
        mine.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then_with(|| b.id.cmp(&a.id))
        });
        mine.truncate(page_size);
        if self.gate_after_snapshot.load(Ordering::SeqCst) {
            self.gate.notified().await;
        }
        Ok(Page::new(mine))
    }

    async fn update(&self, user_id: &str, id: &str, patch: NotificationPatch) -> AppResult<()> {
        if self.fail_update.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|r| r.id == id && r.user_id == user_id)
            .ok_or_else(|| AppError::NotFound(id.to_string()))?;
        if let Some(read) = patch.read {
            record.read = read;
        }
        Ok(())
    }

    async fn delete(&self, user_id: &str, id: &str) -> AppResult<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        self.records
            .lock()
            .unwrap()
            .retain(|r| !(r.id == id && r.user_id == user_id));
        Ok(())
    }

    async fn create(&self, notification: CreateNotification) -> AppResult<String> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        notification.validate().map_err(AppError::Validation)?;
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let id = format!("created-{}", n);
        self.insert(NotificationRecord {
            id: id.clone(),
            user_id: notification.user_id,
            title: notification.title,
            message: notification.message,
            notification_type: notification.notification_type,
            job_id: notification.job_id,
            timestamp: ts(10_000 + n as i64),
            read: false,
        });
        Ok(id)
    }
}
