//! Chat primitives and the collaborators the engine talks to
//!
//! The transport itself lives outside this crate; everything here is the
//! narrow surface the reminder engine needs from it.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Add admin check collaborator
//! - 1.0.0: Initial release with command parsing and delivery trait

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashSet;

/// Numeric room identifier, scoping key for persisted state
pub type RoomId = u64;

/// Bullet used in list-style replies
pub const BULLET: char = '•';
/// Arrow separator used in list-style replies
pub const RIGHTWARDS_ARROW: char = '→';

/// A chat line addressed to the bot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Identifier of the originating message
    pub id: String,
    pub room: RoomId,
    pub user_id: u64,
    pub username: String,
    /// Command name without prefix, lowercased
    pub name: String,
    pub parameters: Vec<String>,
}

impl Command {
    /// Parse a raw chat line into a command if it starts with `prefix`
    pub fn parse(
        prefix: &str,
        room: RoomId,
        message_id: impl Into<String>,
        user_id: u64,
        username: impl Into<String>,
        text: &str,
    ) -> Option<Command> {
        let body = text.trim().strip_prefix(prefix)?;
        let mut words = body.split_whitespace();
        let name = words.next()?.to_lowercase();

        Some(Command {
            id: message_id.into(),
            room,
            user_id,
            username: username.into(),
            name,
            parameters: words.map(str::to_string).collect(),
        })
    }

    pub fn has_parameters(&self) -> bool {
        !self.parameters.is_empty()
    }

    pub fn parameter(&self, index: usize) -> Option<&str> {
        self.parameters.get(index).map(String::as_str)
    }

    /// All parameters joined back with single spaces
    pub fn text(&self) -> String {
        self.parameters.join(" ")
    }
}

/// Outbound message transport
#[async_trait]
pub trait Delivery: Send + Sync {
    /// Post a message to the room; `allow_pings` lets @mentions notify users
    async fn post_message(&self, room: RoomId, text: &str, allow_pings: bool) -> Result<()>;

    /// Post a reply threaded onto the message `reply_to`
    async fn post_reply(&self, room: RoomId, reply_to: &str, text: &str) -> Result<()>;
}

/// Authorization collaborator
#[async_trait]
pub trait AdminCheck: Send + Sync {
    async fn is_admin(&self, room: RoomId, user_id: u64) -> Result<bool>;
}

/// Admin check backed by a fixed set of user ids, valid in every room
#[derive(Debug, Clone, Default)]
pub struct StaticAdmins {
    user_ids: HashSet<u64>,
}

impl StaticAdmins {
    pub fn new(user_ids: impl IntoIterator<Item = u64>) -> Self {
        Self {
            user_ids: user_ids.into_iter().collect(),
        }
    }
}

#[async_trait]
impl AdminCheck for StaticAdmins {
    async fn is_admin(&self, _room: RoomId, user_id: u64) -> Result<bool> {
        Ok(self.user_ids.contains(&user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command() {
        let command =
            Command::parse("!!", 42, "1001", 7, "alice", "!!Reminder grab a beer in 2 hours")
                .unwrap();
        assert_eq!(command.name, "reminder");
        assert_eq!(command.room, 42);
        assert_eq!(command.id, "1001");
        assert_eq!(command.parameter(0), Some("grab"));
        assert_eq!(command.text(), "grab a beer in 2 hours");
    }

    #[test]
    fn test_parse_requires_prefix() {
        assert!(Command::parse("!!", 42, "1", 7, "alice", "reminder list").is_none());
        assert!(Command::parse("!!", 42, "1", 7, "alice", "!!").is_none());
    }

    #[test]
    fn test_parse_without_parameters() {
        let command = Command::parse("!!", 1, "1", 7, "alice", "  !!reminder  ").unwrap();
        assert!(!command.has_parameters());
        assert_eq!(command.parameter(0), None);
    }

    #[tokio::test]
    async fn test_static_admins() {
        let admins = StaticAdmins::new([7, 9]);
        assert!(admins.is_admin(42, 7).await.unwrap());
        assert!(!admins.is_admin(42, 8).await.unwrap());
    }
}
