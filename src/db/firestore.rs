// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides the feed engine's store operations:
//! - Activities (realtime window, paginated history, cursor lookup)
//! - Users (directory warm-up)

use std::time::Duration;

use async_trait::async_trait;
use futures_util::{stream, StreamExt};
use tokio::time::MissedTickBehavior;

use crate::db::collections;
use crate::db::cursor::{decode_cursor, encode_cursor, CursorPosition};
use crate::error::AppError;
use crate::models::{ActivityRecord, Cursor, UserProfile};
use crate::services::directory::UserInfoLoader;
use crate::services::sources::{
    ActivityStream, CursorResolver, Page, PaginatedSource, RealtimeSource,
};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
    poll_interval: Duration,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // The emulator takes no credentials; skip the default token lookup.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
            poll_interval: DEFAULT_POLL_INTERVAL,
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJmZWVkIn0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
            poll_interval: DEFAULT_POLL_INTERVAL,
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self {
            client: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// How often the realtime window is re-queried.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval.max(Duration::from_millis(100));
        self
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Activity Operations ─────────────────────────────────────

    /// Get an activity by ID.
    pub async fn get_activity(
        &self,
        activity_id: &str,
    ) -> Result<Option<ActivityRecord>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::ACTIVITIES)
            .obj()
            .one(activity_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Store an activity, keyed by its ID.
    pub async fn set_activity(&self, activity: &ActivityRecord) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::ACTIVITIES)
            .document_id(&activity.id)
            .object(activity)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Newest activities, newest first.
    pub async fn newest_activities(&self, limit: usize) -> Result<Vec<ActivityRecord>, AppError> {
        self.activities_older_than(None, limit).await
    }

    /// Activities strictly older than `position` in `(createdAt, id)`
    /// descending order.
    pub async fn activities_older_than(
        &self,
        position: Option<&CursorPosition>,
        limit: usize,
    ) -> Result<Vec<ActivityRecord>, AppError> {
        let query = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::ACTIVITIES);

        let query = if let Some(position) = position {
            let created_at = position.created_at.clone();
            let activity_id = position.activity_id.clone();
            query.filter(move |q| {
                q.for_any([
                    q.field("createdAt").less_than(created_at.clone()),
                    q.for_all([
                        q.field("createdAt").eq(created_at.clone()),
                        q.field("id").less_than(activity_id.clone()),
                    ]),
                ])
            })
        } else {
            query
        };

        query
            .order_by([
                ("createdAt", firestore::FirestoreQueryDirection::Descending),
                ("id", firestore::FirestoreQueryDirection::Descending),
            ])
            .limit(u32::try_from(limit).unwrap_or(u32::MAX))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Every user profile.
    pub async fn list_users(&self) -> Result<Vec<UserProfile>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or update a user profile.
    pub async fn upsert_user(&self, user: &UserProfile) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.user_id)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

struct PollState {
    db: FirestoreDb,
    ticker: tokio::time::Interval,
    last: Option<Vec<ActivityRecord>>,
    limit: usize,
}

#[async_trait]
impl RealtimeSource for FirestoreDb {
    /// Poll the newest window and emit it whenever it differs from the
    /// last one delivered. Query errors are emitted and polling continues.
    async fn subscribe(&self, limit: usize) -> Result<ActivityStream, AppError> {
        self.get_client()?;

        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let state = PollState {
            db: self.clone(),
            ticker,
            last: None,
            limit,
        };

        let windows = stream::unfold(state, |mut state| async move {
            loop {
                state.ticker.tick().await;
                match state.db.newest_activities(state.limit).await {
                    Ok(window) => {
                        if state.last.as_ref() == Some(&window) {
                            continue;
                        }
                        state.last = Some(window.clone());
                        return Some((Ok(window), state));
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Realtime poll failed");
                        return Some((Err(e), state));
                    }
                }
            }
        });

        Ok(windows.boxed())
    }
}

#[async_trait]
impl PaginatedSource for FirestoreDb {
    async fn fetch_older_than(
        &self,
        cursor: Option<&Cursor>,
        limit: usize,
    ) -> Result<Page, AppError> {
        let position = cursor.map(decode_cursor).transpose()?;
        let activities = self.activities_older_than(position.as_ref(), limit).await?;

        // A short page is the only end signal Firestore gives.
        let is_last_page = activities.len() < limit;
        Ok(Page {
            activities,
            is_last_page,
        })
    }
}

#[async_trait]
impl CursorResolver for FirestoreDb {
    async fn resolve_cursor(&self, activity_id: &str) -> Result<Option<Cursor>, AppError> {
        Ok(self
            .get_activity(activity_id)
            .await?
            .map(|activity| encode_cursor(&CursorPosition::of(&activity))))
    }
}

#[async_trait]
impl UserInfoLoader for FirestoreDb {
    async fn load_users(&self) -> Result<Vec<UserProfile>, AppError> {
        self.list_users().await
    }
}
