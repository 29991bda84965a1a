// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Date separators for the rendered feed.

use chrono::{DateTime, Datelike, NaiveDate, Utc};

use crate::models::FeedItem;

/// Insert a date separator before the first item of every UTC calendar day.
///
/// `items` must already be ordered newest first. Items without a parseable
/// timestamp are passed through unlabeled and do not start a new day.
/// Separators already present in the input are discarded and rebuilt.
pub fn insert_date_separators(items: Vec<FeedItem>, now: DateTime<Utc>) -> Vec<FeedItem> {
    let today = now.date_naive();
    let mut formatted = Vec::with_capacity(items.len() + 8);
    let mut current_day: Option<NaiveDate> = None;

    for item in items {
        if item.is_separator() {
            continue;
        }

        if let Some(day) = item.representative_timestamp().map(|ts| ts.date_naive()) {
            if current_day != Some(day) {
                formatted.push(FeedItem::DateSeparator {
                    date: day,
                    label: day_label(day, today),
                });
                current_day = Some(day);
            }
        }

        formatted.push(item);
    }

    formatted
}

/// "Today", "Yesterday", or a weekday/month/day label relative to `today`.
pub fn day_label(day: NaiveDate, today: NaiveDate) -> String {
    if day == today {
        return "Today".to_string();
    }
    if today.pred_opt() == Some(day) {
        return "Yesterday".to_string();
    }

    if day.year() == today.year() {
        day.format("%A, %B %-d").to_string()
    } else {
        day.format("%A, %B %-d, %Y").to_string()
    }
}
