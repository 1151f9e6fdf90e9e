//! Per-session notification feed.
//!
//! A `NotificationFeed` pages through one user's notifications and publishes a
//! single sequence that is deduplicated by content and ordered newest first.
//! Page fetches are single-flight per controller: while one is running,
//! `load_next_page` returns the current sequence untouched.

mod events;
pub mod registry;
pub mod store;
mod working_set;

#[cfg(test)]
pub(crate) mod testing;

pub use events::{EventOutcome, FeedEvent};
pub use registry::FeedRegistry;
pub use store::{FeedCursor, NotificationStore, Page};

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::db::{NotificationPatch, NotificationRecord};
use crate::error::{AppError, AppResult};
use crate::session::Session;
use working_set::WorkingSet;

#[derive(Debug, Default)]
struct FeedState {
    working: WorkingSet,
    published: Vec<NotificationRecord>,
    cursor: Option<FeedCursor>,
    end_of_feed: bool,
    /// Ids removed through this controller since the last first-page load,
    /// with the generation current at removal time
    deleted: HashMap<String, u64>,
    /// Bumped whenever a first-page load starts or lands; fetch results
    /// tagged with an older value are discarded.
    generation: u64,
}

impl FeedState {
    fn apply_page(&mut self, page: Page, page_size: usize) {
        self.end_of_feed = page.records.len() < page_size;
        if page.cursor.is_some() {
            self.cursor = page.cursor;
        }
        let deleted = &self.deleted;
        self.working
            .absorb(page.records, |id| deleted.contains_key(id));
        self.republish();
    }

    fn republish(&mut self) {
        self.published = self.working.ordered();
    }

    fn reset(&mut self) {
        let generation = self.generation;
        *self = FeedState {
            generation,
            ..FeedState::default()
        };
    }
}

/// Releases the in-flight slot on every exit path.
struct InFlightGuard<'a>(&'a AtomicUsize);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Current published sequence plus the pagination flags.
#[derive(Debug, Clone, Serialize)]
pub struct FeedSnapshot {
    pub items: Vec<NotificationRecord>,
    pub end_of_feed: bool,
    pub loading: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkDeleteOutcome {
    pub deleted: usize,
    pub items: Vec<NotificationRecord>,
}

pub struct NotificationFeed {
    store: Arc<dyn NotificationStore>,
    session: Session,
    page_size: usize,
    state: RwLock<FeedState>,
    in_flight: AtomicUsize,
}

impl NotificationFeed {
    pub fn new(store: Arc<dyn NotificationStore>, session: Session, page_size: usize) -> Self {
        Self {
            store,
            session,
            page_size: page_size.max(1),
            state: RwLock::new(FeedState::default()),
            in_flight: AtomicUsize::new(0),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub async fn published(&self) -> Vec<NotificationRecord> {
        self.state.read().await.published.clone()
    }

    pub async fn is_end_of_feed(&self) -> bool {
        self.state.read().await.end_of_feed
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    pub async fn snapshot(&self) -> FeedSnapshot {
        let state = self.state.read().await;
        FeedSnapshot {
            items: state.published.clone(),
            end_of_feed: state.end_of_feed,
            loading: self.is_loading(),
        }
    }

    /// Reset all accumulated state and load page one.
    ///
    /// A fetch already in flight is superseded: its result is dropped when it
    /// lands. On failure the previously published sequence stays in place.
    pub async fn load_first_page(&self) -> AppResult<Vec<NotificationRecord>> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let _guard = InFlightGuard(&self.in_flight);

        let generation = {
            let mut state = self.state.write().await;
            state.generation += 1;
            state.generation
        };

        let page = self
            .store
            .fetch_page(&self.session.user_id, self.page_size, None)
            .await
            .map_err(|e| {
                warn!(
                    "Failed to load notifications for user {}: {}",
                    self.session.user_id, e
                );
                e
            })?;

        let mut state = self.state.write().await;
        if state.generation != generation {
            debug!(
                "Discarding superseded first page for user {}",
                self.session.user_id
            );
            return Ok(state.published.clone());
        }

        // Ids deleted after this fetch started may still be in the page.
        let late_deletes: HashMap<String, u64> = state
            .deleted
            .drain()
            .filter(|(_, deleted_at)| *deleted_at >= generation)
            .collect();
        state.reset();
        state.generation += 1;
        state.deleted = late_deletes;
        state.apply_page(page, self.page_size);
        debug!(
            "Loaded first page for user {}: {} notification(s), end_of_feed={}",
            self.session.user_id,
            state.published.len(),
            state.end_of_feed
        );
        Ok(state.published.clone())
    }

    /// Fetch the page after the current cursor and merge it.
    ///
    /// No-op while another fetch is in flight or once a short page has marked
    /// the end of the feed.
    pub async fn load_next_page(&self) -> AppResult<Vec<NotificationRecord>> {
        if self
            .in_flight
            .compare_exchange(0, 1, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!(
                "Fetch already in flight for user {}, skipping next page",
                self.session.user_id
            );
            return Ok(self.published().await);
        }
        let _guard = InFlightGuard(&self.in_flight);

        let (cursor, generation) = {
            let state = self.state.read().await;
            if state.end_of_feed {
                return Ok(state.published.clone());
            }
            (state.cursor.clone(), state.generation)
        };

        let page = self
            .store
            .fetch_page(&self.session.user_id, self.page_size, cursor.as_ref())
            .await
            .map_err(|e| {
                warn!(
                    "Failed to load more notifications for user {}: {}",
                    self.session.user_id, e
                );
                e
            })?;

        let mut state = self.state.write().await;
        if state.generation != generation {
            debug!(
                "Discarding stale page for user {} after feed reset",
                self.session.user_id
            );
            return Ok(state.published.clone());
        }

        let fetched = page.records.len();
        state.apply_page(page, self.page_size);
        debug!(
            "Loaded next page for user {}: fetched {}, published {}, end_of_feed={}",
            self.session.user_id,
            fetched,
            state.published.len(),
            state.end_of_feed
        );
        Ok(state.published.clone())
    }

    /// Mark a notification as read without waiting for the store. Failures
    /// are logged and otherwise ignored; local state is not touched.
    /// Callers may drop the returned handle.
    pub fn mark_read(&self, id: &str) -> JoinHandle<()> {
        let store = self.store.clone();
        let user_id = self.session.user_id.clone();
        let id = id.to_string();

        tokio::spawn(async move {
            let patch = NotificationPatch { read: Some(true) };
            match store.update(&user_id, &id, patch).await {
                Ok(()) => debug!("Marked notification {} as read", id),
                Err(e) => warn!("Failed to mark notification {} as read: {}", id, e),
            }
        })
    }

    /// Delete one notification from the store and from the feed.
    ///
    /// The id stays suppressed until the next `load_first_page` that starts
    /// after the delete.
    pub async fn delete(&self, id: &str) -> AppResult<Vec<NotificationRecord>> {
        match self.store.delete(&self.session.user_id, id).await {
            Ok(()) => {}
            Err(AppError::NotFound(_)) => {
                debug!("Notification {} already deleted", id);
            }
            Err(e) => {
                warn!("Failed to delete notification {}: {}", id, e);
                return Err(e);
            }
        }

        let mut state = self.state.write().await;
        let generation = state.generation;
        state.deleted.insert(id.to_string(), generation);
        state.working.remove_id(id);
        state.republish();
        Ok(state.published.clone())
    }

    /// Delete every stored notification of this user that matches
    /// `predicate`, one at a time, then reload from page one.
    ///
    /// Matches are found by scanning the store, not the loaded pages.
    pub async fn delete_all_matching<P>(&self, predicate: P) -> AppResult<BulkDeleteOutcome>
    where
        P: Fn(&NotificationRecord) -> bool + Send + Sync,
    {
        let user_id = self.session.user_id.as_str();

        let mut matches: Vec<String> = Vec::new();
        let mut cursor: Option<FeedCursor> = None;
        loop {
            let page = self
                .store
                .fetch_page(user_id, self.page_size, cursor.as_ref())
                .await?;
            let full = page.records.len() >= self.page_size;
            matches.extend(
                page.records
                    .iter()
                    .filter(|record| predicate(*record))
                    .map(|record| record.id.clone()),
            );
            match page.cursor {
                Some(next) if full => cursor = Some(next),
                _ => break,
            }
        }

        let mut deleted = 0usize;
        for id in &matches {
            match self.store.delete(user_id, id).await {
                Ok(()) | Err(AppError::NotFound(_)) => deleted += 1,
                Err(e) => {
                    warn!(
                        "Bulk delete for user {} stopped after {} of {}: {}",
                        user_id,
                        deleted,
                        matches.len(),
                        e
                    );
                    return Err(e);
                }
            }
        }
        info!(
            "Deleted {} notification(s) matching cleanup filter for user {}",
            deleted, user_id
        );

        let items = self.load_first_page().await?;
        Ok(BulkDeleteOutcome { deleted, items })
    }

    pub(crate) async fn find_published(&self, id: &str) -> Option<NotificationRecord> {
        self.state.read().await.working.get(id).cloned()
    }
}
