// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity feed controller.
//!
//! A single task owns the feed state and rebuilds the whole projection
//! (merge → stack → filter → date separators) whenever one of its inputs
//! changes:
//! - a realtime window arrives
//! - a history page is loaded
//! - the viewer or the filter toggles change
//! - the user directory finishes warming up
//!
//! Consumers talk to the task through a cloneable [`FeedHandle`] and read
//! the latest [`FeedSnapshot`] from a watch channel.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::error::{AppError, Result};
use crate::models::{ActivityRecord, FeedItem, FilterOptions};
use crate::services::directory::UserDirectory;
use crate::services::filter::{apply_filters, FilterContext};
use crate::services::merge::merge_activities;
use crate::services::pagination::{fetch_next_page, LoadMoreOutcome, PageFetch, PaginationState};
use crate::services::sources::{ActivityStream, FeedSources};
use crate::services::stacking::build_feed_items;
use crate::services::timeline::insert_date_separators;

const COMMAND_BUFFER: usize = 32;

/// Tunables for a feed controller.
#[derive(Debug, Clone, Copy)]
pub struct FeedConfig {
    /// Size of the realtime window
    pub realtime_limit: usize,
    /// Activities requested per history page
    pub page_size: usize,
    /// Stop paging once this many history activities are held
    pub max_history: usize,
    /// Filters applied until the viewer changes them
    pub filters: FilterOptions,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            realtime_limit: 20,
            page_size: 20,
            max_history: 500,
            filters: FilterOptions::default(),
        }
    }
}

/// Render-ready view of the feed.
#[derive(Debug, Clone, Serialize)]
pub struct FeedSnapshot {
    pub items: Vec<FeedItem>,
    pub has_more: bool,
    pub loading: bool,
    pub filters: FilterOptions,
    pub viewer_id: Option<String>,
    /// Unique activities behind the projection, before filtering
    pub activity_count: usize,
}

impl FeedSnapshot {
    fn empty(filters: FilterOptions) -> Self {
        Self {
            items: Vec::new(),
            has_more: true,
            loading: false,
            filters,
            viewer_id: None,
            activity_count: 0,
        }
    }
}

/// Run the full projection over the realtime window and loaded history.
pub fn build_feed(
    realtime: &[ActivityRecord],
    history: &[ActivityRecord],
    ctx: &FilterContext<'_>,
    now: DateTime<Utc>,
) -> Vec<FeedItem> {
    let merged = merge_activities(realtime, history);
    let stacked = build_feed_items(&merged);
    let filtered = apply_filters(stacked, ctx);
    insert_date_separators(filtered, now)
}

/// Engine state. Never shared; owned by the controller task.
#[derive(Debug, Clone)]
pub struct FeedState {
    realtime: Vec<ActivityRecord>,
    history: Vec<ActivityRecord>,
    pagination: PaginationState,
    filters: FilterOptions,
}

impl FeedState {
    pub fn new(config: &FeedConfig) -> Self {
        Self {
            realtime: Vec::new(),
            history: Vec::new(),
            pagination: PaginationState::new(config.page_size, config.max_history),
            filters: config.filters,
        }
    }

    /// Replace the realtime window wholesale.
    pub fn replace_realtime(&mut self, window: Vec<ActivityRecord>) {
        self.realtime = window;
    }

    pub fn set_filters(&mut self, filters: FilterOptions) {
        self.filters = filters;
    }

    pub fn filters(&self) -> FilterOptions {
        self.filters
    }

    pub fn pagination(&self) -> &PaginationState {
        &self.pagination
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// ID of the page anchor: the last history record, or the last record
    /// of the realtime window before any history is loaded.
    ///
    /// Both lists arrive in the store's own order, so their tails are the
    /// oldest records as the store sees them. Picking the anchor by parsed
    /// time instead can select a record the store ranks newer and fetch the
    /// same page forever.
    pub fn page_anchor_id(&self) -> Option<String> {
        self.history
            .last()
            .or_else(|| self.realtime.last())
            .map(|a| a.id.clone())
    }

    pub fn begin_load_more(&mut self) -> LoadMoreOutcome {
        self.pagination.try_begin()
    }

    /// Append a loaded page to history and update pagination.
    pub fn apply_page(&mut self, fetch: PageFetch) {
        if let PageFetch::Loaded { page, .. } = &fetch {
            let held: HashSet<&str> = self.history.iter().map(|a| a.id.as_str()).collect();
            let fresh: Vec<ActivityRecord> = page
                .activities
                .iter()
                .filter(|a| !held.contains(a.id.as_str()))
                .cloned()
                .collect();
            if fresh.len() < page.activities.len() {
                tracing::debug!(
                    skipped = page.activities.len() - fresh.len(),
                    "History page repeated activities already held"
                );
            }
            self.history.extend(fresh);
        }
        self.pagination.complete(&fetch, self.history.len());
    }

    pub fn fail_page(&mut self) {
        self.pagination.fail();
    }

    /// Build a snapshot for the given viewer.
    pub fn snapshot(
        &self,
        viewer_id: Option<&str>,
        directory: &dyn UserDirectory,
        now: DateTime<Utc>,
    ) -> FeedSnapshot {
        let ctx = FilterContext {
            viewer_id,
            options: self.filters,
            directory,
        };
        let items = build_feed(&self.realtime, &self.history, &ctx, now);

        FeedSnapshot {
            items,
            has_more: self.pagination.has_more(),
            loading: self.pagination.is_loading(),
            filters: self.filters,
            viewer_id: viewer_id.map(str::to_string),
            activity_count: merge_activities(&self.realtime, &self.history).len(),
        }
    }
}

enum Command {
    LoadMore(oneshot::Sender<LoadMoreOutcome>),
    SetFilters(FilterOptions, oneshot::Sender<()>),
}

/// Cloneable client for a running feed controller.
#[derive(Clone)]
pub struct FeedHandle {
    commands: mpsc::Sender<Command>,
    snapshot_rx: watch::Receiver<Arc<FeedSnapshot>>,
}

impl FeedHandle {
    /// Latest published projection.
    pub fn snapshot(&self) -> Arc<FeedSnapshot> {
        self.snapshot_rx.borrow().clone()
    }

    /// Receiver notified on every recomputation.
    pub fn subscribe(&self) -> watch::Receiver<Arc<FeedSnapshot>> {
        self.snapshot_rx.clone()
    }

    /// Ask for the next page of history.
    pub async fn load_more(&self) -> Result<LoadMoreOutcome> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Command::LoadMore(reply_tx)).await?;
        reply_rx.await.map_err(|_| controller_stopped())
    }

    /// Replace the filter toggles. Returns once the new projection is published.
    pub async fn set_filters(&self, filters: FilterOptions) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Command::SetFilters(filters, reply_tx)).await?;
        reply_rx.await.map_err(|_| controller_stopped())
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| controller_stopped())
    }
}

fn controller_stopped() -> AppError {
    AppError::Unavailable("Feed controller is not running".to_string())
}

/// Owns the controller task.
pub struct FeedController {
    handle: FeedHandle,
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl FeedController {
    /// Start the controller task. Must be called within a tokio runtime.
    pub fn spawn(
        sources: FeedSources,
        viewer_rx: watch::Receiver<Option<String>>,
        config: FeedConfig,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (snapshot_tx, snapshot_rx) =
            watch::channel(Arc::new(FeedSnapshot::empty(config.filters)));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (page_tx, page_rx) = mpsc::channel(1);

        let worker = FeedWorker {
            state: FeedState::new(&config),
            config,
            sources,
            viewer_rx,
            snapshot_tx,
            page_tx,
        };
        let task = tokio::spawn(worker.run(command_rx, page_rx, shutdown_rx));

        Self {
            handle: FeedHandle {
                commands: command_tx,
                snapshot_rx,
            },
            shutdown_tx,
            task,
        }
    }

    pub fn handle(&self) -> FeedHandle {
        self.handle.clone()
    }

    /// Stop the controller and unsubscribe from the realtime source.
    /// A page request still in flight finishes on its own and is discarded.
    pub async fn shutdown(self) -> Result<()> {
        let _ = self.shutdown_tx.send(true);
        self.task
            .await
            .context("Feed controller task did not finish cleanly")?;
        Ok(())
    }
}

struct FeedWorker {
    state: FeedState,
    config: FeedConfig,
    sources: FeedSources,
    viewer_rx: watch::Receiver<Option<String>>,
    snapshot_tx: watch::Sender<Arc<FeedSnapshot>>,
    page_tx: mpsc::Sender<Result<PageFetch>>,
}

impl FeedWorker {
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut pages: mpsc::Receiver<Result<PageFetch>>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        let mut realtime = match self
            .sources
            .realtime
            .subscribe(self.config.realtime_limit)
            .await
        {
            Ok(stream) => Some(stream),
            Err(e) => {
                tracing::warn!(error = %e, "Realtime subscription failed, showing history only");
                None
            }
        };

        let mut directory_ready = self.sources.directory.ready();
        self.spawn_directory_warmup();

        let mut viewer_open = true;
        let mut directory_open = true;

        tracing::info!(
            realtime_limit = self.config.realtime_limit,
            page_size = self.config.page_size,
            "Feed controller started"
        );
        self.publish();

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => break,

                next = next_window(&mut realtime) => match next {
                    Some(Ok(window)) => {
                        tracing::debug!(count = window.len(), "Realtime window received");
                        self.state.replace_realtime(window);
                        self.publish();
                    }
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "Realtime source error, keeping current feed");
                    }
                    None => {
                        tracing::info!("Realtime stream ended");
                        realtime = None;
                    }
                },

                changed = self.viewer_rx.changed(), if viewer_open => {
                    if changed.is_err() {
                        viewer_open = false;
                    } else {
                        self.publish();
                    }
                }

                changed = directory_ready.changed(), if directory_open => {
                    if changed.is_err() {
                        directory_open = false;
                    } else {
                        tracing::debug!("User directory ready, recomputing feed");
                        self.publish();
                    }
                }

                Some(command) = commands.recv() => self.handle_command(command),

                Some(result) = pages.recv() => {
                    match result {
                        Ok(fetch) => self.state.apply_page(fetch),
                        Err(e) => {
                            tracing::warn!(
                                error = %e,
                                "History page fetch failed, keeping current feed"
                            );
                            self.state.fail_page();
                        }
                    }
                    self.publish();
                }

                else => break,
            }
        }

        tracing::info!("Feed controller stopped");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::LoadMore(reply) => {
                let outcome = self.state.begin_load_more();
                if outcome == LoadMoreOutcome::Started {
                    self.spawn_page_fetch();
                    self.publish();
                } else {
                    tracing::debug!(?outcome, "Load more ignored");
                }
                let _ = reply.send(outcome);
            }
            Command::SetFilters(filters, reply) => {
                // Bot hiding needs the directory; retry a warm-up that failed earlier.
                if filters.hide_bots && !*self.sources.directory.ready().borrow() {
                    self.spawn_directory_warmup();
                }
                self.state.set_filters(filters);
                self.publish();
                let _ = reply.send(());
            }
        }
    }

    /// Warm the user directory in the background. Readiness arrives on the
    /// directory's watch channel; a failure leaves the cache cold and the
    /// next attempt loads again.
    fn spawn_directory_warmup(&self) {
        let directory = self.sources.directory.clone();
        tokio::spawn(async move {
            if let Err(e) = directory.ensure_loaded().await {
                tracing::warn!(error = %e, "User directory warm-up failed");
            }
        });
    }

    fn spawn_page_fetch(&self) {
        let anchor = self.state.page_anchor_id();
        let limit = self.state.pagination().page_size();
        let cursors = self.sources.cursors.clone();
        let paginated = self.sources.paginated.clone();
        let page_tx = self.page_tx.clone();

        tokio::spawn(async move {
            let result =
                fetch_next_page(cursors.as_ref(), paginated.as_ref(), anchor.as_deref(), limit)
                    .await;
            if page_tx.send(result).await.is_err() {
                tracing::debug!("Feed controller gone, discarding history page");
            }
        });
    }

    fn publish(&mut self) {
        let viewer_id = self.viewer_rx.borrow_and_update().clone();
        let snapshot = self.state.snapshot(
            viewer_id.as_deref(),
            self.sources.directory.as_ref(),
            Utc::now(),
        );

        tracing::debug!(
            items = snapshot.items.len(),
            activities = snapshot.activity_count,
            has_more = snapshot.has_more,
            loading = snapshot.loading,
            "Feed recomputed"
        );

        self.snapshot_tx.send_replace(Arc::new(snapshot));
    }
}

async fn next_window(stream: &mut Option<ActivityStream>) -> Option<Result<Vec<ActivityRecord>>> {
    match stream {
        Some(stream) => stream.next().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActivityKind, Cursor};
    use crate::services::sources::Page;

    fn level_up(id: &str, created_at: &str) -> ActivityRecord {
        ActivityRecord {
            id: id.to_string(),
            user_id: "u1".to_string(),
            created_at: created_at.to_string(),
            kind: ActivityKind::LevelUp { level: None },
        }
    }

    fn loaded(activities: Vec<ActivityRecord>, requested: usize) -> PageFetch {
        PageFetch::Loaded {
            cursor: Some(Cursor::new("c")),
            page: Page {
                activities,
                is_last_page: false,
            },
            requested,
        }
    }

    #[test]
    fn test_anchor_follows_history_then_realtime_tail() {
        let mut state = FeedState::new(&FeedConfig::default());
        assert_eq!(state.page_anchor_id(), None);

        state.replace_realtime(vec![
            level_up("3", "2024-03-01T12:00:00Z"),
            level_up("2", "2024-03-01T11:00:00Z"),
        ]);
        assert_eq!(state.page_anchor_id().as_deref(), Some("2"));

        state.begin_load_more();
        state.apply_page(loaded(vec![level_up("1", "2024-03-01T10:00:00Z")], 20));

        assert_eq!(state.page_anchor_id().as_deref(), Some("1"));
        assert_eq!(state.history_len(), 1);
        assert!(!state.pagination().has_more());
    }

    #[test]
    fn test_anchor_uses_store_order_not_parsed_time() {
        let mut state = FeedState::new(&FeedConfig::default());

        // As strings "09:00:00Z" ranks above "09:00:00.500Z", so a store
        // returns `y` before `x` even though `y` is older in time.
        state.replace_realtime(vec![level_up("n1", "2024-03-01T10:00:00Z")]);
        state.begin_load_more();
        state.apply_page(loaded(vec![level_up("y", "2024-03-01T09:00:00Z")], 1));
        state.begin_load_more();
        state.apply_page(loaded(vec![level_up("x", "2024-03-01T09:00:00.500Z")], 1));

        assert_eq!(state.page_anchor_id().as_deref(), Some("x"));
    }

    #[test]
    fn test_repeated_page_records_are_not_held_twice() {
        let mut state = FeedState::new(&FeedConfig::default());

        state.begin_load_more();
        state.apply_page(loaded(
            vec![
                level_up("2", "2024-03-01T11:00:00Z"),
                level_up("1", "2024-03-01T10:00:00Z"),
            ],
            2,
        ));
        state.begin_load_more();
        state.apply_page(loaded(
            vec![
                level_up("1", "2024-03-01T10:00:00Z"),
                level_up("0", "2024-03-01T09:00:00Z"),
            ],
            2,
        ));

        assert_eq!(state.history_len(), 3);
        assert_eq!(state.page_anchor_id().as_deref(), Some("0"));
    }

    #[test]
    fn test_realtime_window_is_replaced_not_appended() {
        let mut state = FeedState::new(&FeedConfig::default());
        state.replace_realtime(vec![level_up("1", "2024-03-01T10:00:00Z")]);
        state.replace_realtime(vec![level_up("2", "2024-03-01T11:00:00Z")]);

        assert_eq!(state.page_anchor_id().as_deref(), Some("2"));
    }
}
