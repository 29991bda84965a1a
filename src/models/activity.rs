// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Activity records as produced by the upstream activity store.
//!
//! Records are immutable inputs to the feed engine. Every optional field is
//! tolerated as absent so a partially written record still renders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// A single event in the developer activity stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    /// Document ID of the activity
    pub id: String,
    /// User who produced the activity
    pub user_id: String,
    /// Creation time (ISO 8601)
    #[serde(default)]
    pub created_at: String,
    /// Type-specific payload
    #[serde(flatten)]
    pub kind: ActivityKind,
}

/// Type-specific activity payload, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ActivityKind {
    GameAction(GameAction),
    BadgeEarned {
        #[serde(default, rename = "badgeId")]
        badge_id: Option<String>,
        #[serde(default, rename = "badgeName")]
        badge_name: Option<String>,
    },
    LevelUp {
        #[serde(default)]
        level: Option<u32>,
    },
    #[serde(other)]
    Other,
}

/// A coding action mirrored from the source-control provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[serde(rename_all = "camelCase")]
pub struct GameAction {
    #[serde(default)]
    pub source_action_type: SourceActionType,
    #[serde(default)]
    pub context: Option<ActionContext>,
    #[serde(default)]
    pub xp: Option<XpAward>,
}

/// Provider action that produced a game action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[serde(rename_all = "snake_case")]
pub enum SourceActionType {
    Push,
    PullRequestCreate,
    PullRequestMerge,
    PullRequestClose,
    PullRequestReviewSubmit,
    PullRequestReviewComment,
    Comment,
    ReviewComment,
    IssueCreate,
    IssueClose,
    UserRegistration,
    CiSuccess,
    CiFailure,
    #[default]
    #[serde(other)]
    Other,
}

impl SourceActionType {
    /// Whether this action belongs to a pull request conversation.
    pub fn is_pull_request_related(self) -> bool {
        matches!(
            self,
            SourceActionType::PullRequestCreate
                | SourceActionType::PullRequestMerge
                | SourceActionType::PullRequestClose
                | SourceActionType::PullRequestReviewSubmit
                | SourceActionType::PullRequestReviewComment
                | SourceActionType::Comment
                | SourceActionType::ReviewComment
        )
    }
}

/// Repository and pull request the action happened in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[serde(rename_all = "camelCase")]
pub struct ActionContext {
    #[serde(default)]
    pub repository: Option<RepositoryRef>,
    #[serde(default)]
    pub pull_request: Option<PullRequestRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
pub struct RepositoryRef {
    /// Provider repository ID (numeric IDs are accepted and stringified)
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
pub struct PullRequestRef {
    #[serde(default)]
    pub number: Option<u64>,
    #[serde(default)]
    pub title: Option<String>,
}

/// XP granted for an action, scored upstream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
pub struct XpAward {
    #[serde(default)]
    pub earned: Option<i64>,
}

impl ActivityRecord {
    /// Parsed creation time, or `None` if the timestamp is missing or malformed.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.created_at)
    }

    pub fn game_action(&self) -> Option<&GameAction> {
        match &self.kind {
            ActivityKind::GameAction(action) => Some(action),
            _ => None,
        }
    }

    /// XP earned by this activity (0 when absent).
    pub fn xp_earned(&self) -> i64 {
        self.game_action()
            .and_then(|a| a.xp)
            .and_then(|xp| xp.earned)
            .unwrap_or(0)
    }

    pub fn source_action_type(&self) -> Option<SourceActionType> {
        self.game_action().map(|a| a.source_action_type)
    }

    pub fn pull_request(&self) -> Option<&PullRequestRef> {
        self.game_action()?.context.as_ref()?.pull_request.as_ref()
    }

    pub fn repository(&self) -> Option<&RepositoryRef> {
        self.game_action()?.context.as_ref()?.repository.as_ref()
    }

    /// Non-empty pull request title, if any.
    pub fn pr_title(&self) -> Option<&str> {
        self.pull_request()
            .and_then(|pr| pr.title.as_deref())
            .filter(|t| !t.is_empty())
    }

    /// Non-empty repository name, if any.
    pub fn repo_name(&self) -> Option<&str> {
        self.repository()
            .and_then(|repo| repo.name.as_deref())
            .filter(|n| !n.is_empty())
    }
}

/// Parse an ISO 8601 timestamp into UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Accept repository IDs written either as strings or as numbers.
fn deserialize_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(Option::<RawId>::deserialize(deserializer)?.map(|raw| match raw {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    }))
}
