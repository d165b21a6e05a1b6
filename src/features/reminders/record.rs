//! Persisted reminder record and the user-facing failure taxonomy
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Store the resolved target next to the raw `for` token
//! - 1.0.0: Initial release

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::chat::RoomId;

/// Literal target addressing the whole room
pub const TARGET_EVERYONE: &str = "everyone";
/// Literal target addressing the bot itself
pub const TARGET_MYSELF: &str = "myself";

/// A pending reminder as stored in the room-scoped key/value store
///
/// Records are immutable once stored; updating one means unset then set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderRecord {
    /// Unique key within the room, taken from the originating message id
    pub id: String,
    pub room_id: RoomId,
    /// Raw target token as typed (`me`, `everyone`, `yourself`, `@name` or empty)
    #[serde(rename = "for")]
    pub for_token: String,
    /// Resolved recipient: a username, `everyone` or `myself`
    #[serde(default)]
    pub target: String,
    /// Fully composed delivery text
    pub text: String,
    /// Normalized time expression, kept for diagnostics
    pub delay: String,
    pub user_id: u64,
    pub username: String,
    /// Due instant, unix seconds
    pub timestamp: i64,
}

impl ReminderRecord {
    /// Seconds until the reminder is due relative to `now` (may be negative)
    pub fn seconds_left(&self, now: i64) -> i64 {
        self.timestamp - now
    }

    /// Delivery addressed to the room or the bot rather than a person
    pub fn is_broadcast(&self) -> bool {
        self.target == TARGET_EVERYONE || self.target == TARGET_MYSELF
    }

    /// Whether the recipient is someone other than the setter
    pub fn targets_someone_else(&self) -> bool {
        !self.target.eq_ignore_ascii_case(&self.username)
    }
}

/// Failures surfaced to the requester as a chat reply
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReminderError {
    #[error("Have a look at the time again, yo!")]
    ParseFailure,

    #[error("missing reminder text")]
    MissingText,

    #[error("unrecognized reminder command")]
    Usage,

    #[error("Could not understand that message. NLP is hard, yo.")]
    Untaggable,

    #[error("I guess I'm late: {text}")]
    AlreadyPast { text: String },

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("Dunno what happened but I couldn't set the reminder.")]
    StorageFailure,

    #[error("I'm sorry, I couldn't find that key.")]
    NotFound,
}

impl ReminderError {
    /// Whether the reply should thread onto the request instead of posting plainly
    pub fn is_reply(&self) -> bool {
        matches!(
            self,
            ReminderError::Untaggable
                | ReminderError::AlreadyPast { .. }
                | ReminderError::Unauthorized(_)
                | ReminderError::NotFound
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(target: &str, username: &str) -> ReminderRecord {
        ReminderRecord {
            id: "1001".to_string(),
            room_id: 42,
            for_token: "me".to_string(),
            target: target.to_string(),
            text: "@alice, grab a beer. ".to_string(),
            delay: "2 hours".to_string(),
            user_id: 7,
            username: username.to_string(),
            timestamp: 1_700_007_200,
        }
    }

    #[test]
    fn test_serializes_with_wire_names() {
        let value = serde_json::to_value(record("alice", "alice")).unwrap();
        assert_eq!(value["for"], "me");
        assert_eq!(value["roomId"], 42);
        assert_eq!(value["userId"], 7);
        assert_eq!(value["timestamp"], 1_700_007_200i64);
    }

    #[test]
    fn test_missing_target_defaults_to_empty() {
        let json = r#"{"id":"1","roomId":1,"for":"","text":"t","delay":"1 hour","userId":2,"username":"bob","timestamp":5}"#;
        let parsed: ReminderRecord = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.target, "");
        assert_eq!(parsed.seconds_left(2), 3);
    }

    #[test]
    fn test_addressing_rules() {
        assert!(record(TARGET_EVERYONE, "alice").is_broadcast());
        assert!(record(TARGET_MYSELF, "alice").is_broadcast());
        assert!(!record("Alice", "alice").targets_someone_else());
        assert!(record("bob", "alice").targets_someone_else());
    }

    #[test]
    fn test_error_texts() {
        assert_eq!(
            ReminderError::ParseFailure.to_string(),
            "Have a look at the time again, yo!"
        );
        assert_eq!(
            ReminderError::AlreadyPast {
                text: "foo".to_string()
            }
            .to_string(),
            "I guess I'm late: foo"
        );
        assert!(ReminderError::NotFound.is_reply());
        assert!(!ReminderError::StorageFailure.is_reply());
    }
}
