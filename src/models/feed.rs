// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Render-ready feed items.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::activity::parse_timestamp;
use crate::models::{ActivityRecord, ActivityStack};

/// One entry of the rendered activity feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum FeedItem {
    Stack { stack: ActivityStack },
    Single { activity: ActivityRecord },
    DateSeparator {
        #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
        date: NaiveDate,
        label: String,
    },
}

impl FeedItem {
    /// Identity used for tie-breaking and logging. Separators have none.
    pub fn item_id(&self) -> Option<&str> {
        match self {
            FeedItem::Stack { stack } => Some(&stack.id),
            FeedItem::Single { activity } => Some(&activity.id),
            FeedItem::DateSeparator { .. } => None,
        }
    }

    /// The item's representative ISO timestamp: an activity's `created_at`,
    /// or a stack's `last_updated_at`.
    pub fn representative_date(&self) -> Option<&str> {
        let raw = match self {
            FeedItem::Stack { stack } => stack.last_updated_at.as_str(),
            FeedItem::Single { activity } => activity.created_at.as_str(),
            FeedItem::DateSeparator { .. } => return None,
        };
        (!raw.is_empty()).then_some(raw)
    }

    pub fn representative_timestamp(&self) -> Option<DateTime<Utc>> {
        self.representative_date().and_then(parse_timestamp)
    }

    pub fn is_separator(&self) -> bool {
        matches!(self, FeedItem::DateSeparator { .. })
    }
}

/// Viewer-controlled feed filters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FilterOptions {
    /// Only show activity by the current viewer
    #[serde(default)]
    pub show_only_mine: bool,
    /// Hide activity authored by bot accounts
    #[serde(default)]
    pub hide_bots: bool,
}
