// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process activity store.
//!
//! Used when no Firestore project is configured and by the test suite. It
//! orders and pages exactly like the Firestore adapter, pushes a fresh
//! realtime window on every write, and can be told to fail or slow down
//! history fetches.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use futures_util::{stream, StreamExt};
use tokio::sync::watch;

use crate::db::cursor::{decode_cursor, encode_cursor, CursorPosition};
use crate::error::{AppError, Result};
use crate::models::{ActivityRecord, Cursor, UserProfile};
use crate::services::directory::UserInfoLoader;
use crate::services::sources::{
    ActivityStream, CursorResolver, Page, PaginatedSource, RealtimeSource,
};

struct Inner {
    activities: DashMap<String, ActivityRecord>,
    users: DashMap<String, UserProfile>,
    version_tx: watch::Sender<u64>,
    failures_pending: AtomicUsize,
    fetch_delay_ms: AtomicU64,
}

/// Activity and user store held in memory.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let (version_tx, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                activities: DashMap::new(),
                users: DashMap::new(),
                version_tx,
                failures_pending: AtomicUsize::new(0),
                fetch_delay_ms: AtomicU64::new(0),
            }),
        }
    }

    pub fn with_activities(activities: impl IntoIterator<Item = ActivityRecord>) -> Self {
        let store = Self::new();
        for activity in activities {
            store.inner.activities.insert(activity.id.clone(), activity);
        }
        store
    }

    /// Insert or replace an activity and notify realtime subscribers.
    pub fn insert_activity(&self, activity: ActivityRecord) {
        self.inner.activities.insert(activity.id.clone(), activity);
        self.bump_version();
    }

    /// Remove an activity. Returns whether it existed.
    pub fn remove_activity(&self, activity_id: &str) -> bool {
        let removed = self.inner.activities.remove(activity_id).is_some();
        if removed {
            self.bump_version();
        }
        removed
    }

    pub fn insert_user(&self, profile: UserProfile) {
        self.inner.users.insert(profile.user_id.clone(), profile);
    }

    pub fn len(&self) -> usize {
        self.inner.activities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.activities.is_empty()
    }

    /// Make the next `count` history fetches fail with a source error.
    pub fn fail_next_fetches(&self, count: usize) {
        self.inner.failures_pending.store(count, Ordering::SeqCst);
    }

    /// Delay every history fetch by `delay`.
    pub fn set_fetch_delay(&self, delay: Duration) {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.inner.fetch_delay_ms.store(millis, Ordering::SeqCst);
    }

    fn bump_version(&self) {
        self.inner.version_tx.send_modify(|version| *version += 1);
    }

    /// All activities in `(created_at, id)` descending order.
    fn sorted_newest_first(&self) -> Vec<ActivityRecord> {
        let mut activities: Vec<ActivityRecord> = self
            .inner
            .activities
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        activities.sort_by(|a, b| {
            (b.created_at.as_str(), b.id.as_str()).cmp(&(a.created_at.as_str(), a.id.as_str()))
        });
        activities
    }

    fn newest(&self, limit: usize) -> Vec<ActivityRecord> {
        let mut activities = self.sorted_newest_first();
        activities.truncate(limit);
        activities
    }

    fn take_injected_failure(&self) -> bool {
        self.inner
            .failures_pending
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl RealtimeSource for MemoryStore {
    async fn subscribe(&self, limit: usize) -> Result<ActivityStream> {
        let version_rx = self.inner.version_tx.subscribe();

        let initial = self.newest(limit);
        let store = self.clone();
        let updates = stream::unfold(version_rx, move |mut version_rx| {
            let store = store.clone();
            async move {
                version_rx.changed().await.ok()?;
                Some((Ok::<_, AppError>(store.newest(limit)), version_rx))
            }
        });

        Ok(stream::once(async move { Ok::<_, AppError>(initial) })
            .chain(updates)
            .boxed())
    }
}

#[async_trait]
impl PaginatedSource for MemoryStore {
    async fn fetch_older_than(&self, cursor: Option<&Cursor>, limit: usize) -> Result<Page> {
        let delay = self.inner.fetch_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        if self.take_injected_failure() {
            return Err(AppError::Source("Injected fetch failure".to_string()));
        }

        let position = cursor.map(decode_cursor).transpose()?;
        let mut older: Vec<ActivityRecord> = self
            .sorted_newest_first()
            .into_iter()
            .filter(|activity| position.as_ref().map_or(true, |p| p.is_before(activity)))
            .collect();

        let is_last_page = older.len() <= limit;
        older.truncate(limit);

        Ok(Page {
            activities: older,
            is_last_page,
        })
    }
}

#[async_trait]
impl CursorResolver for MemoryStore {
    async fn resolve_cursor(&self, activity_id: &str) -> Result<Option<Cursor>> {
        Ok(self
            .inner
            .activities
            .get(activity_id)
            .map(|entry| encode_cursor(&CursorPosition::of(entry.value()))))
    }
}

#[async_trait]
impl UserInfoLoader for MemoryStore {
    async fn load_users(&self) -> Result<Vec<UserProfile>> {
        Ok(self
            .inner
            .users
            .iter()
            .map(|entry| entry.value().clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ActivityKind;

    fn activity(id: &str, created_at: &str) -> ActivityRecord {
        ActivityRecord {
            id: id.to_string(),
            user_id: "u1".to_string(),
            created_at: created_at.to_string(),
            kind: ActivityKind::LevelUp { level: Some(2) },
        }
    }

    fn ids(activities: &[ActivityRecord]) -> Vec<&str> {
        activities.iter().map(|a| a.id.as_str()).collect()
    }

    fn store() -> MemoryStore {
        MemoryStore::with_activities([
            activity("a", "2024-03-01T09:00:00Z"),
            activity("b", "2024-03-01T10:00:00Z"),
            activity("c", "2024-03-01T10:00:00Z"),
            activity("d", "2024-03-01T11:00:00Z"),
            activity("e", "2024-03-01T12:00:00Z"),
        ])
    }

    #[tokio::test]
    async fn test_pages_walk_history_without_overlap() {
        let store = store();

        let first = store.fetch_older_than(None, 2).await.unwrap();
        assert_eq!(ids(&first.activities), vec!["e", "d"]);
        assert!(!first.is_last_page);

        let cursor = store.resolve_cursor("d").await.unwrap().unwrap();
        let second = store.fetch_older_than(Some(&cursor), 2).await.unwrap();
        assert_eq!(ids(&second.activities), vec!["c", "b"]);

        let cursor = store.resolve_cursor("b").await.unwrap().unwrap();
        let third = store.fetch_older_than(Some(&cursor), 2).await.unwrap();
        assert_eq!(ids(&third.activities), vec!["a"]);
        assert!(third.is_last_page);
    }

    #[tokio::test]
    async fn test_resolve_unknown_activity() {
        assert!(store().resolve_cursor("zzz").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_injected_failures_are_consumed() {
        let store = store();
        store.fail_next_fetches(1);

        assert!(matches!(
            store.fetch_older_than(None, 2).await,
            Err(AppError::Source(_))
        ));
        assert!(store.fetch_older_than(None, 2).await.is_ok());
    }

    #[tokio::test]
    async fn test_subscription_emits_on_write() {
        let store = store();
        let mut windows = store.subscribe(2).await.unwrap();

        let initial = windows.next().await.unwrap().unwrap();
        assert_eq!(ids(&initial), vec!["e", "d"]);

        store.insert_activity(activity("f", "2024-03-01T13:00:00Z"));
        let updated = windows.next().await.unwrap().unwrap();
        assert_eq!(ids(&updated), vec!["f", "e"]);
    }
}
