//! Chat command handler trait
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 2.0.0: Prefix commands from plain chat lines, room lifecycle hooks
//! - 1.0.0: Initial implementation for modular command handling

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use super::context::CommandContext;
use crate::core::chat::{Command, RoomId};

/// Trait for chat command handlers
///
/// Each handler processes one or more command names. Handlers are registered
/// with a CommandRegistry and dispatched based on command name.
///
/// # Example
///
/// ```ignore
/// pub struct PingHandler;
///
/// #[async_trait]
/// impl CommandHandler for PingHandler {
///     fn command_names(&self) -> &'static [&'static str] {
///         &["ping"]
///     }
///
///     async fn handle(&self, ctx: Arc<CommandContext>, command: &Command) -> Result<()> {
///         ctx.say(command.room, "pong").await
///     }
/// }
/// ```
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Command name(s) this handler processes
    ///
    /// A handler can process multiple commands if they share logic.
    fn command_names(&self) -> &'static [&'static str];

    /// Handle a parsed command
    ///
    /// # Arguments
    ///
    /// * `ctx` - Shared command context with scheduler, tagger and collaborators
    /// * `command` - The command line addressed to the bot
    async fn handle(&self, ctx: Arc<CommandContext>, command: &Command) -> Result<()>;

    /// Called when the bot joins a room
    async fn enable_for_room(&self, _ctx: Arc<CommandContext>, _room: RoomId) -> Result<()> {
        Ok(())
    }

    /// Called when the bot leaves a room
    async fn disable_for_room(&self, _ctx: Arc<CommandContext>, _room: RoomId) -> Result<()> {
        Ok(())
    }
}
