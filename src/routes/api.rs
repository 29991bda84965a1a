// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Feed API routes.

use crate::error::{AppError, Result};
use crate::models::{FeedItem, FilterOptions};
use crate::services::{FeedSnapshot, LoadMoreOutcome};
use crate::AppState;
use axum::{
    extract::State,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Longest accepted viewer ID.
const MAX_VIEWER_ID_LEN: usize = 128;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/feed", get(get_feed))
        .route("/api/feed/load-more", post(load_more))
        .route("/api/feed/filters", put(put_filters))
        .route("/api/viewer", put(put_viewer))
}

// ─── Feed ────────────────────────────────────────────────────

/// Current feed projection.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FeedResponse {
    pub items: Vec<FeedItem>,
    pub has_more: bool,
    pub loading: bool,
    pub filters: FilterOptions,
    pub viewer_id: Option<String>,
}

impl From<&FeedSnapshot> for FeedResponse {
    fn from(snapshot: &FeedSnapshot) -> Self {
        Self {
            items: snapshot.items.clone(),
            has_more: snapshot.has_more,
            loading: snapshot.loading,
            filters: snapshot.filters,
            viewer_id: snapshot.viewer_id.clone(),
        }
    }
}

async fn get_feed(State(state): State<Arc<AppState>>) -> Json<FeedResponse> {
    let snapshot = state.feed.snapshot();
    Json(FeedResponse::from(snapshot.as_ref()))
}

// ─── Pagination ──────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LoadMoreResponse {
    pub outcome: LoadMoreOutcome,
}

/// Request the next page of history. The page lands asynchronously; poll
/// `/api/feed` for the updated projection.
async fn load_more(State(state): State<Arc<AppState>>) -> Result<Json<LoadMoreResponse>> {
    let outcome = state.feed.load_more().await?;
    tracing::debug!(?outcome, "Load more requested");
    Ok(Json(LoadMoreResponse { outcome }))
}

// ─── Viewer State ────────────────────────────────────────────

async fn put_filters(
    State(state): State<Arc<AppState>>,
    Json(filters): Json<FilterOptions>,
) -> Result<Json<FilterOptions>> {
    state.feed.set_filters(filters).await?;
    tracing::info!(
        show_only_mine = filters.show_only_mine,
        hide_bots = filters.hide_bots,
        "Feed filters updated"
    );
    Ok(Json(filters))
}

#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ViewerRequest {
    pub viewer_id: Option<String>,
}

/// Reject blank or oversized IDs; trim surrounding whitespace.
fn validate_viewer_id(viewer_id: Option<String>) -> Result<Option<String>> {
    let Some(raw) = viewer_id else {
        return Ok(None);
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest(
            "'viewer_id' must not be blank; use null to clear it".to_string(),
        ));
    }
    if trimmed.len() > MAX_VIEWER_ID_LEN {
        return Err(AppError::BadRequest(format!(
            "'viewer_id' must be at most {} bytes",
            MAX_VIEWER_ID_LEN
        )));
    }

    Ok(Some(trimmed.to_string()))
}

async fn put_viewer(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ViewerRequest>,
) -> Result<Json<ViewerRequest>> {
    let viewer_id = validate_viewer_id(request.viewer_id)?;

    let changed = state.viewer_tx.send_if_modified(|current| {
        if *current == viewer_id {
            return false;
        }
        current.clone_from(&viewer_id);
        true
    });
    if changed {
        tracing::info!(viewer_id = ?viewer_id, "Viewer changed");
    }

    Ok(Json(ViewerRequest { viewer_id }))
}
