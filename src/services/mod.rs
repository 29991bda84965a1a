// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - feed engine and its collaborators.

pub mod directory;
pub mod feed;
pub mod filter;
pub mod merge;
pub mod pagination;
pub mod sources;
pub mod stacking;
pub mod timeline;

pub use directory::{CachedUserDirectory, UserDirectory, UserInfoLoader};
pub use feed::{build_feed, FeedConfig, FeedController, FeedHandle, FeedSnapshot, FeedState};
pub use pagination::{LoadMoreOutcome, PaginationState};
pub use sources::{
    ActivityStream, CursorResolver, FeedSources, Page, PaginatedSource, RealtimeSource,
};
