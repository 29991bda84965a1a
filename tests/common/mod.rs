// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use devquest_feed::config::Config;
use devquest_feed::db::{FirestoreDb, MemoryStore};
use devquest_feed::models::activity::{
    ActionContext, GameAction, PullRequestRef, RepositoryRef, XpAward,
};
use devquest_feed::models::{
    ActivityKind, ActivityRecord, SourceActionType, UserProfile, UserType,
};
use devquest_feed::routes::create_router;
use devquest_feed::services::{
    CachedUserDirectory, FeedController, FeedHandle, FeedSnapshot, FeedSources, UserInfoLoader,
};
use devquest_feed::AppState;
use std::sync::Arc;
use std::time::Duration;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Feed sources that all read from one memory store.
#[allow(dead_code)]
pub fn memory_sources(store: &MemoryStore) -> FeedSources {
    sources_with_loader(store, Arc::new(store.clone()))
}

/// Activities from `store`, user profiles from `loader`.
#[allow(dead_code)]
pub fn sources_with_loader(store: &MemoryStore, loader: Arc<dyn UserInfoLoader>) -> FeedSources {
    let store = Arc::new(store.clone());
    FeedSources {
        realtime: store.clone(),
        paginated: store.clone(),
        cursors: store,
        directory: Arc::new(CachedUserDirectory::new(loader)),
    }
}

/// A running feed controller and the router serving it.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub store: MemoryStore,
    pub controller: FeedController,
}

/// Create a test app over `store`. Must be called within a tokio runtime.
#[allow(dead_code)]
pub fn create_test_app(store: MemoryStore, config: Config) -> TestApp {
    let sources = memory_sources(&store);
    create_test_app_with_sources(store, sources, config)
}

/// Create a test app with explicit sources; `store` is kept for writes.
#[allow(dead_code)]
pub fn create_test_app_with_sources(
    store: MemoryStore,
    sources: FeedSources,
    config: Config,
) -> TestApp {
    let (state, controller) = devquest_feed::start_feed(config, sources);
    TestApp {
        router: create_router(state.clone()),
        state,
        store,
        controller,
    }
}

/// Wait until the published snapshot satisfies `pred`.
#[allow(dead_code)]
pub async fn wait_for_feed(
    feed: &FeedHandle,
    mut pred: impl FnMut(&FeedSnapshot) -> bool,
) -> Arc<FeedSnapshot> {
    let mut rx = feed.subscribe();
    let snapshot = tokio::time::timeout(
        Duration::from_secs(5),
        rx.wait_for(|snapshot| pred(snapshot.as_ref())),
    )
    .await
    .expect("Timed out waiting for feed snapshot")
    .expect("Feed controller stopped");
    Arc::clone(&snapshot)
}

/// IDs of the non-separator items, in order.
#[allow(dead_code)]
pub fn item_ids(snapshot: &FeedSnapshot) -> Vec<String> {
    snapshot
        .items
        .iter()
        .filter_map(|item| item.item_id().map(str::to_string))
        .collect()
}

#[allow(dead_code)]
pub fn pr_activity(
    id: &str,
    user_id: &str,
    pr_number: u64,
    action: SourceActionType,
    created_at: &str,
    xp: i64,
) -> ActivityRecord {
    ActivityRecord {
        id: id.to_string(),
        user_id: user_id.to_string(),
        created_at: created_at.to_string(),
        kind: ActivityKind::GameAction(GameAction {
            source_action_type: action,
            context: Some(ActionContext {
                repository: Some(RepositoryRef {
                    id: Some("42".to_string()),
                    name: Some("devquest/api".to_string()),
                }),
                pull_request: Some(PullRequestRef {
                    number: Some(pr_number),
                    title: Some(format!("PR {}", pr_number)),
                }),
            }),
            xp: Some(XpAward { earned: Some(xp) }),
        }),
    }
}

#[allow(dead_code)]
pub fn level_up(id: &str, user_id: &str, created_at: &str) -> ActivityRecord {
    ActivityRecord {
        id: id.to_string(),
        user_id: user_id.to_string(),
        created_at: created_at.to_string(),
        kind: ActivityKind::LevelUp { level: Some(3) },
    }
}

#[allow(dead_code)]
pub fn user(user_id: &str, user_type: UserType) -> UserProfile {
    UserProfile {
        user_id: user_id.to_string(),
        display_name: user_id.to_string(),
        photo_url: None,
        user_type,
    }
}
