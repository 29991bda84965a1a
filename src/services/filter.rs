// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Viewer and bot filters over stacked feed items.
//!
//! Filters run after stacking so a stack is judged by all of its members:
//! it is kept for "mine" if any member belongs to the viewer, and kept under
//! bot-hiding unless every member is bot-authored. Unknown users are never
//! treated as bots.

use crate::models::{ActivityRecord, FeedItem, FilterOptions, UserType};
use crate::services::directory::UserDirectory;

/// Inputs the filters are evaluated against.
pub struct FilterContext<'a> {
    pub viewer_id: Option<&'a str>,
    pub options: FilterOptions,
    pub directory: &'a dyn UserDirectory,
}

/// Keep the items that pass both the ownership and bot-visibility filters.
pub fn apply_filters(items: Vec<FeedItem>, ctx: &FilterContext<'_>) -> Vec<FeedItem> {
    let before = items.len();
    let kept: Vec<FeedItem> = items
        .into_iter()
        .filter(|item| {
            passes_ownership(item, ctx.viewer_id, ctx.options.show_only_mine)
                && passes_bot_visibility(item, ctx.directory, ctx.options.hide_bots)
        })
        .collect();

    tracing::trace!(
        before,
        after = kept.len(),
        show_only_mine = ctx.options.show_only_mine,
        hide_bots = ctx.options.hide_bots,
        "Applied feed filters"
    );

    kept
}

/// "Mine" filter. Without a viewer, nothing is the viewer's.
pub fn passes_ownership(item: &FeedItem, viewer_id: Option<&str>, show_only_mine: bool) -> bool {
    if !show_only_mine {
        return true;
    }
    let Some(viewer_id) = viewer_id else {
        return false;
    };

    match item {
        FeedItem::Single { activity } => activity.user_id == viewer_id,
        FeedItem::Stack { stack } => stack.has_member_by(viewer_id),
        FeedItem::DateSeparator { .. } => true,
    }
}

/// Bot-visibility filter.
pub fn passes_bot_visibility(
    item: &FeedItem,
    directory: &dyn UserDirectory,
    hide_bots: bool,
) -> bool {
    if !hide_bots {
        return true;
    }

    match item {
        FeedItem::Single { activity } => !is_bot_authored(activity, directory),
        FeedItem::Stack { stack } => !stack
            .activities
            .iter()
            .all(|activity| is_bot_authored(activity, directory)),
        FeedItem::DateSeparator { .. } => true,
    }
}

/// Only a cached `bot` entry counts; a directory miss is treated as human.
fn is_bot_authored(activity: &ActivityRecord, directory: &dyn UserDirectory) -> bool {
    directory
        .get(&activity.user_id)
        .is_some_and(|user| user.user_type == UserType::Bot)
}
