// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod activity;
pub mod cursor;
pub mod feed;
pub mod stack;
pub mod user;

pub use activity::{ActivityKind, ActivityRecord, GameAction, SourceActionType};
pub use cursor::Cursor;
pub use feed::{FeedItem, FilterOptions};
pub use stack::{ActivityStack, PrState};
pub use user::{UserInfo, UserProfile, UserType};
