// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Cursor encoding shared by the store adapters.
//!
//! A cursor records the `(created_at, id)` position of its anchor activity
//! as URL-safe base64 so it can travel through the feed engine untouched.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};

use crate::error::AppError;
use crate::models::{ActivityRecord, Cursor};

const SEPARATOR: char = '|';

/// Position of the anchor activity in `(created_at, id)` descending order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorPosition {
    pub created_at: String,
    pub activity_id: String,
}

impl CursorPosition {
    pub fn of(activity: &ActivityRecord) -> Self {
        Self {
            created_at: activity.created_at.clone(),
            activity_id: activity.id.clone(),
        }
    }

    /// Whether `activity` sorts strictly after (older than) this position.
    pub fn is_before(&self, activity: &ActivityRecord) -> bool {
        (activity.created_at.as_str(), activity.id.as_str())
            < (self.created_at.as_str(), self.activity_id.as_str())
    }
}

pub fn encode_cursor(position: &CursorPosition) -> Cursor {
    let payload = format!(
        "{}{}{}",
        position.created_at, SEPARATOR, position.activity_id
    );
    Cursor::new(URL_SAFE_NO_PAD.encode(payload))
}

pub fn decode_cursor(cursor: &Cursor) -> Result<CursorPosition, AppError> {
    let invalid_cursor = || AppError::BadRequest("Invalid pagination cursor".to_string());

    let decoded = URL_SAFE_NO_PAD
        .decode(cursor.as_str())
        .map_err(|_| invalid_cursor())?;
    let decoded = String::from_utf8(decoded).map_err(|_| invalid_cursor())?;

    let (created_at, activity_id) = decoded.split_once(SEPARATOR).ok_or_else(invalid_cursor)?;
    if activity_id.is_empty() {
        return Err(invalid_cursor());
    }

    Ok(CursorPosition {
        created_at: created_at.to_string(),
        activity_id: activity_id.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_round_trip() {
        let position = CursorPosition {
            created_at: "2024-03-01T09:00:00Z".to_string(),
            activity_id: "act|42".to_string(),
        };

        let decoded = decode_cursor(&encode_cursor(&position)).unwrap();
        assert_eq!(decoded, position);
    }

    #[test]
    fn test_cursor_rejects_invalid_input() {
        let err = decode_cursor(&Cursor::new("not base64!")).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let no_separator = Cursor::new(URL_SAFE_NO_PAD.encode("2024-03-01T09:00:00Z"));
        assert!(decode_cursor(&no_separator).is_err());
    }
}
