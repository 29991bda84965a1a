// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! DevQuest feed: aggregated developer activity with pull-request stacking
//!
//! This crate merges a live window of recent activity with paginated
//! history, collapses activity on the same pull request into stacks, applies
//! viewer filters, and serves the result over a small HTTP API.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use tokio::sync::watch;

use config::Config;
use services::{FeedController, FeedHandle, FeedSources};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub feed: FeedHandle,
    /// Current viewer; the feed controller recomputes on every change
    pub viewer_tx: watch::Sender<Option<String>>,
}

/// Start the feed controller over `sources` and build the state the router
/// needs. The caller owns the controller and shuts it down.
pub fn start_feed(config: Config, sources: FeedSources) -> (Arc<AppState>, FeedController) {
    let (viewer_tx, viewer_rx) = watch::channel(config.viewer_id.clone());
    let controller = FeedController::spawn(sources, viewer_rx, config.feed_config());

    let state = Arc::new(AppState {
        config,
        feed: controller.handle(),
        viewer_tx,
    });

    (state, controller)
}
