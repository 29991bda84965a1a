// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Pull request stacking.
//!
//! Groups PR-related game actions that share a repository and PR number into
//! [`ActivityStack`]s. Everything else (pushes, badges, level-ups, CI events,
//! and PRs with a single activity) is emitted as a single feed item.
//!
//! The output depends only on the *set* of input records: members are sorted
//! by `(created_at, id)` and the feed by `(representative time, item id)`,
//! so any permutation of the same input yields identical items.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::models::{ActivityRecord, ActivityStack, FeedItem, PrState, SourceActionType};

/// Minimum number of activities for a PR group to be shown as a stack.
const MIN_STACK_SIZE: usize = 2;

/// Grouping key `{repository}:{pr_number}` for PR-related game actions.
///
/// The repository part is the repository ID, falling back to its name, and
/// finally to the empty string when the context has neither.
pub fn stack_key(activity: &ActivityRecord) -> Option<String> {
    let action_type = activity.source_action_type()?;
    if !action_type.is_pull_request_related() {
        return None;
    }

    let pr_number = activity.pull_request()?.number?;
    let repository = activity
        .repository()
        .and_then(|repo| {
            repo.id
                .as_deref()
                .filter(|id| !id.is_empty())
                .or_else(|| repo.name.as_deref().filter(|n| !n.is_empty()))
        })
        .unwrap_or("");

    Some(format!("{}:{}", repository, pr_number))
}

/// Group merged activities into stacks and singles, newest first.
pub fn build_feed_items(activities: &[ActivityRecord]) -> Vec<FeedItem> {
    let mut groups: BTreeMap<String, Vec<&ActivityRecord>> = BTreeMap::new();
    let mut items = Vec::with_capacity(activities.len());

    for activity in activities {
        match stack_key(activity) {
            Some(key) => groups.entry(key).or_default().push(activity),
            None => items.push(FeedItem::Single {
                activity: activity.clone(),
            }),
        }
    }

    let mut stack_count = 0;
    for (key, members) in groups {
        if members.len() >= MIN_STACK_SIZE {
            stack_count += 1;
            items.push(FeedItem::Stack {
                stack: build_stack(key, members),
            });
        } else {
            items.extend(members.into_iter().map(|activity| FeedItem::Single {
                activity: activity.clone(),
            }));
        }
    }

    items.sort_by(compare_items_newest_first);

    tracing::trace!(
        activities = activities.len(),
        items = items.len(),
        stacks = stack_count,
        "Built feed items"
    );

    items
}

/// Build a stack from two or more members sharing `key`.
fn build_stack(key: String, mut members: Vec<&ActivityRecord>) -> ActivityStack {
    members.sort_by(|a, b| compare_activities_oldest_first(a, b));

    let pr_number = members
        .iter()
        .find_map(|a| a.pull_request().and_then(|pr| pr.number))
        .unwrap_or_default();
    let pr_title = members
        .iter()
        .find_map(|a| a.pr_title())
        .unwrap_or_default()
        .to_string();
    let repo_name = members
        .iter()
        .find_map(|a| a.repo_name())
        .unwrap_or_default()
        .to_string();
    let total_xp: i64 = members.iter().map(|a| a.xp_earned()).sum();
    let final_state = derive_final_state(&members);

    let first_activity_at = members
        .first()
        .map(|a| a.created_at.clone())
        .unwrap_or_default();
    let last_updated_at = members
        .last()
        .map(|a| a.created_at.clone())
        .unwrap_or_default();

    ActivityStack {
        id: key,
        pr_number,
        pr_title,
        repo_name,
        activities: members.into_iter().cloned().collect(),
        total_xp,
        final_state,
        last_updated_at,
        first_activity_at,
    }
}

/// A merge anywhere in the group wins over a close, which wins over open.
fn derive_final_state(members: &[&ActivityRecord]) -> PrState {
    let has = |wanted: SourceActionType| {
        members
            .iter()
            .any(|a| a.source_action_type() == Some(wanted))
    };

    if has(SourceActionType::PullRequestMerge) {
        PrState::Merged
    } else if has(SourceActionType::PullRequestClose) {
        PrState::Closed
    } else {
        PrState::Open
    }
}

/// Sort key for a timestamp string. Unparseable values sort as oldest.
fn time_key(raw: &str) -> (Option<DateTime<Utc>>, &str) {
    (crate::models::activity::parse_timestamp(raw), raw)
}

fn compare_activities_oldest_first(a: &ActivityRecord, b: &ActivityRecord) -> Ordering {
    time_key(&a.created_at)
        .cmp(&time_key(&b.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// Descending by representative time, then by item ID descending.
fn compare_items_newest_first(a: &FeedItem, b: &FeedItem) -> Ordering {
    let a_time = time_key(a.representative_date().unwrap_or_default());
    let b_time = time_key(b.representative_date().unwrap_or_default());

    b_time
        .cmp(&a_time)
        .then_with(|| b.item_id().cmp(&a.item_id()))
}
