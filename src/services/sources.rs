// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Interfaces to the activity stores that feed the engine.
//!
//! Only adapters in [`crate::db`] know how a store paginates; the engine
//! sees opaque [`Cursor`]s.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::error::Result;
use crate::models::{ActivityRecord, Cursor};
use crate::services::directory::UserDirectory;

/// Stream of realtime windows. Each item is the whole bounded window,
/// newest first. Dropping the stream unsubscribes.
pub type ActivityStream = BoxStream<'static, Result<Vec<ActivityRecord>>>;

/// Live subscription to the newest activities.
#[async_trait]
pub trait RealtimeSource: Send + Sync {
    async fn subscribe(&self, limit: usize) -> Result<ActivityStream>;
}

/// One page of history.
#[derive(Debug, Clone, Default)]
pub struct Page {
    /// Activities strictly older than the cursor, newest first
    pub activities: Vec<ActivityRecord>,
    /// Set when the store knows there is nothing older
    pub is_last_page: bool,
}

/// Paginated access to older activities.
#[async_trait]
pub trait PaginatedSource: Send + Sync {
    /// Fetch up to `limit` activities strictly older than `cursor`, or the
    /// newest activities when `cursor` is `None`.
    async fn fetch_older_than(&self, cursor: Option<&Cursor>, limit: usize) -> Result<Page>;
}

/// Translates a known activity ID into the store's pagination handle.
#[async_trait]
pub trait CursorResolver: Send + Sync {
    /// `Ok(None)` means the anchor activity no longer exists.
    async fn resolve_cursor(&self, activity_id: &str) -> Result<Option<Cursor>>;
}

/// Everything the feed controller reads from.
#[derive(Clone)]
pub struct FeedSources {
    pub realtime: Arc<dyn RealtimeSource>,
    pub paginated: Arc<dyn PaginatedSource>,
    pub cursors: Arc<dyn CursorResolver>,
    pub directory: Arc<dyn UserDirectory>,
}
