// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User directory: cached profile lookups for display and bot filtering.
//!
//! Lookups are synchronous and best-effort. The cache is warmed once in bulk
//! by [`UserDirectory::ensure_loaded`]; until then every lookup misses and
//! callers must treat a miss permissively. Completion is published on the
//! [`UserDirectory::ready`] channel so the feed can recompute.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::{watch, OnceCell};

use crate::error::{AppError, Result};
use crate::models::{UserInfo, UserProfile};

/// Read access to cached user profiles.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Cached profile for `user_id`, or `None` if not (yet) known.
    fn get(&self, user_id: &str) -> Option<UserInfo>;

    /// Warm the cache. Idempotent: only the first successful call loads.
    async fn ensure_loaded(&self) -> Result<()>;

    /// Channel that flips to `true` once the cache has been warmed.
    fn ready(&self) -> watch::Receiver<bool>;
}

/// Bulk source of user profiles.
#[async_trait]
pub trait UserInfoLoader: Send + Sync {
    async fn load_users(&self) -> Result<Vec<UserProfile>>;
}

/// [`UserDirectory`] backed by a concurrent map filled from a loader.
pub struct CachedUserDirectory {
    loader: Arc<dyn UserInfoLoader>,
    cache: DashMap<String, UserInfo>,
    loaded: OnceCell<()>,
    ready_tx: watch::Sender<bool>,
}

impl CachedUserDirectory {
    pub fn new(loader: Arc<dyn UserInfoLoader>) -> Self {
        let (ready_tx, _) = watch::channel(false);
        Self {
            loader,
            cache: DashMap::new(),
            loaded: OnceCell::new(),
            ready_tx,
        }
    }

    /// Number of cached profiles.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

#[async_trait]
impl UserDirectory for CachedUserDirectory {
    fn get(&self, user_id: &str) -> Option<UserInfo> {
        self.cache.get(user_id).map(|entry| entry.value().clone())
    }

    async fn ensure_loaded(&self) -> Result<()> {
        self.loaded
            .get_or_try_init(|| async {
                let profiles = self.loader.load_users().await?;
                let count = profiles.len();
                for profile in profiles {
                    self.cache.insert(profile.user_id.clone(), profile.into());
                }
                self.ready_tx.send_replace(true);
                tracing::info!(count, "User directory loaded");
                Ok::<(), AppError>(())
            })
            .await
            .map(|_| ())
    }

    fn ready(&self) -> watch::Receiver<bool> {
        self.ready_tx.subscribe()
    }
}
