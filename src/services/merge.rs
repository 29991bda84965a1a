// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Merge the live window with paginated history.
//!
//! The realtime window is authoritative: when the same activity ID shows up
//! in both sets, the realtime copy wins and the paginated copy is dropped.

use std::collections::HashSet;

use crate::models::ActivityRecord;

/// Combine the realtime window with paginated history into one newest-first
/// list with unique IDs.
///
/// Realtime entries come first, followed by the paginated entries that are
/// not already present. Repeated IDs inside either input keep their first
/// occurrence.
pub fn merge_activities(
    realtime: &[ActivityRecord],
    paginated: &[ActivityRecord],
) -> Vec<ActivityRecord> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(realtime.len() + paginated.len());
    let mut merged = Vec::with_capacity(realtime.len() + paginated.len());

    for activity in realtime.iter().chain(paginated) {
        if seen.insert(activity.id.as_str()) {
            merged.push(activity.clone());
        }
    }

    let dropped = realtime.len() + paginated.len() - merged.len();
    if dropped > 0 {
        tracing::debug!(
            realtime = realtime.len(),
            paginated = paginated.len(),
            dropped,
            "Dropped duplicate activities during merge"
        );
    }

    merged
}
