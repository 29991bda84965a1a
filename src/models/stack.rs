// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Pull request stacks: collapsed groups of related activities.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::ActivityRecord;

/// Terminal state of a pull request as observed in its stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[serde(rename_all = "lowercase")]
pub enum PrState {
    Open,
    Closed,
    Merged,
}

/// Two or more activities sharing the same repository and PR number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct ActivityStack {
    /// `{repository}:{pr_number}`
    pub id: String,
    pub pr_number: u64,
    pub pr_title: String,
    pub repo_name: String,
    /// Members, oldest first
    pub activities: Vec<ActivityRecord>,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_xp: i64,
    pub final_state: PrState,
    /// `created_at` of the newest member
    pub last_updated_at: String,
    /// `created_at` of the oldest member
    pub first_activity_at: String,
}

impl ActivityStack {
    /// Whether any member was produced by the given user.
    pub fn has_member_by(&self, user_id: &str) -> bool {
        self.activities.iter().any(|a| a.user_id == user_id)
    }
}
