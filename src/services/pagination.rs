// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! "Load more" cursor management.
//!
//! Loading history is a two-step lookup: the oldest activity currently shown
//! is resolved to a store cursor, then the page strictly older than that
//! cursor is fetched. Only one load may be in flight; requests made while
//! loading are dropped rather than queued.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::Result;
use crate::models::Cursor;
use crate::services::sources::{CursorResolver, Page, PaginatedSource};

/// What happened to a `load_more` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum LoadMoreOutcome {
    /// A page request was started
    Started,
    /// Another page request is still in flight
    AlreadyLoading,
    /// There are no more pages
    Exhausted,
}

/// Result of the two-step page lookup.
#[derive(Debug, Clone)]
pub enum PageFetch {
    Loaded {
        cursor: Option<Cursor>,
        page: Page,
        requested: usize,
    },
    /// The anchor activity could not be resolved to a cursor.
    AnchorMissing,
}

/// Pagination state for the history half of the feed.
#[derive(Debug, Clone)]
pub struct PaginationState {
    cursor: Option<Cursor>,
    has_more: bool,
    loading: bool,
    page_size: usize,
    max_history: usize,
}

impl PaginationState {
    pub fn new(page_size: usize, max_history: usize) -> Self {
        Self {
            cursor: None,
            has_more: true,
            loading: false,
            page_size: page_size.max(1),
            max_history,
        }
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Cursor of the most recently loaded page.
    pub fn cursor(&self) -> Option<&Cursor> {
        self.cursor.as_ref()
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Claim the single load slot.
    pub fn try_begin(&mut self) -> LoadMoreOutcome {
        if self.loading {
            return LoadMoreOutcome::AlreadyLoading;
        }
        if !self.has_more {
            return LoadMoreOutcome::Exhausted;
        }
        self.loading = true;
        LoadMoreOutcome::Started
    }

    /// Record a finished fetch. `history_len` is the size of the paginated
    /// set after the page was appended.
    pub fn complete(&mut self, fetch: &PageFetch, history_len: usize) {
        self.loading = false;

        match fetch {
            PageFetch::Loaded {
                cursor,
                page,
                requested,
            } => {
                self.cursor = cursor.clone();
                let full_page = page.activities.len() == *requested;
                let under_cap = history_len < self.max_history;
                self.has_more = full_page && !page.is_last_page && under_cap;

                if full_page && !under_cap {
                    tracing::info!(
                        history_len,
                        max_history = self.max_history,
                        "History cap reached, no further pages"
                    );
                }
            }
            PageFetch::AnchorMissing => {
                tracing::info!("Pagination anchor no longer exists, treating history as exhausted");
                self.has_more = false;
            }
        }
    }

    /// Release the load slot after a failed fetch. `has_more` is kept so the
    /// caller may retry.
    pub fn fail(&mut self) {
        self.loading = false;
    }
}

/// Resolve the anchor and fetch the page strictly older than it.
///
/// With no anchor (nothing loaded yet) the newest page is fetched.
pub async fn fetch_next_page(
    cursors: &dyn CursorResolver,
    source: &dyn PaginatedSource,
    anchor_id: Option<&str>,
    limit: usize,
) -> Result<PageFetch> {
    let cursor = match anchor_id {
        Some(id) => match cursors.resolve_cursor(id).await? {
            Some(cursor) => Some(cursor),
            None => {
                tracing::debug!(anchor_id = id, "Cursor resolution found no anchor");
                return Ok(PageFetch::AnchorMissing);
            }
        },
        None => None,
    };

    let page = source.fetch_older_than(cursor.as_ref(), limit).await?;

    tracing::debug!(
        anchor_id = ?anchor_id,
        requested = limit,
        returned = page.activities.len(),
        is_last_page = page.is_last_page,
        "Fetched history page"
    );

    Ok(PageFetch::Loaded {
        cursor,
        page,
        requested: limit,
    })
}
