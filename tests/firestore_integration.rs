// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore integration tests.
//!
//! These tests require the Firestore emulator to be running and are skipped
//! otherwise. Set FIRESTORE_EMULATOR_HOST to enable them.

use devquest_feed::db::{decode_cursor, CursorPosition};
use devquest_feed::models::{SourceActionType, UserType};
use devquest_feed::services::{CursorResolver, PaginatedSource, UserInfoLoader};

mod common;
use common::{pr_activity, test_db, user};

/// Unique suffix for test isolation; the emulator is shared across tests.
fn unique_suffix() -> u128 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos()
}

#[tokio::test]
async fn test_activity_round_trip() {
    require_emulator!();

    let db = test_db().await;
    let id = format!("act-{}", unique_suffix());
    let activity = pr_activity(
        &id,
        "alice",
        7,
        SourceActionType::PullRequestMerge,
        "2024-03-01T10:00:00Z",
        20,
    );

    db.set_activity(&activity).await.unwrap();

    let stored = db.get_activity(&id).await.unwrap();
    assert_eq!(stored, Some(activity));
}

#[tokio::test]
async fn test_resolve_cursor_and_fetch_older() {
    require_emulator!();

    let db = test_db().await;
    let suffix = unique_suffix();
    let ids: Vec<String> = (0..3).map(|i| format!("page-{}-{}", suffix, i)).collect();
    for (i, id) in ids.iter().enumerate() {
        let created_at = format!("2023-06-0{}T12:00:00Z", i + 1);
        let activity = pr_activity(
            id,
            "alice",
            11,
            SourceActionType::PullRequestReviewSubmit,
            &created_at,
            5,
        );
        db.set_activity(&activity).await.unwrap();
    }

    let cursor = db.resolve_cursor(&ids[2]).await.unwrap().unwrap();
    let position = decode_cursor(&cursor).unwrap();
    assert_eq!(
        position,
        CursorPosition {
            created_at: "2023-06-03T12:00:00Z".to_string(),
            activity_id: ids[2].clone(),
        }
    );

    let page = db.fetch_older_than(Some(&cursor), 50).await.unwrap();
    assert!(!page.activities.is_empty());
    assert!(page.activities.iter().all(|a| position.is_before(a)));
    assert!(page.activities.iter().any(|a| a.id == ids[1]));
    assert!(!page.activities.iter().any(|a| a.id == ids[2]));
}

#[tokio::test]
async fn test_resolve_missing_activity() {
    require_emulator!();

    let db = test_db().await;
    let missing = format!("missing-{}", unique_suffix());
    assert!(db.resolve_cursor(&missing).await.unwrap().is_none());
}

#[tokio::test]
async fn test_users_load() {
    require_emulator!();

    let db = test_db().await;
    let user_id = format!("bot-{}", unique_suffix());
    db.upsert_user(&user(&user_id, UserType::Bot)).await.unwrap();

    let users = db.load_users().await.unwrap();
    let loaded = users
        .iter()
        .find(|u| u.user_id == user_id)
        .expect("User should be listed");
    assert_eq!(loaded.user_type, UserType::Bot);
}
