//! Shared context for command handlers
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 2.0.0: Reminder scheduler, tagger and injectable randomness
//! - 1.0.0: Initial implementation with core shared state

use anyhow::Result;
use log::warn;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::core::chat::{AdminCheck, Command, Delivery, RoomId};
use crate::core::Config;
use crate::features::reminders::{ReminderScheduler, ReminderStore};
use crate::features::tagger::PartOfSpeechTagger;

/// Shared context for all command handlers
///
/// Contains the services command handlers need:
/// - ReminderScheduler owning persistence and timers
/// - Delivery for replies
/// - AdminCheck for privileged actions
/// - PartOfSpeechTagger for request rewriting
/// - A random source for message flourishes
#[derive(Clone)]
pub struct CommandContext {
    pub config: Config,
    pub scheduler: ReminderScheduler,
    pub delivery: Arc<dyn Delivery>,
    pub admins: Arc<dyn AdminCheck>,
    pub tagger: Arc<dyn PartOfSpeechTagger>,
    pub rng: Arc<Mutex<StdRng>>,
}

impl CommandContext {
    pub fn new(
        config: Config,
        store: Arc<dyn ReminderStore>,
        delivery: Arc<dyn Delivery>,
        admins: Arc<dyn AdminCheck>,
        tagger: Arc<dyn PartOfSpeechTagger>,
    ) -> Self {
        let scheduler = ReminderScheduler::new(store, delivery.clone(), config.apology_grace);
        Self {
            config,
            scheduler,
            delivery,
            admins,
            tagger,
            rng: Arc::new(Mutex::new(StdRng::from_os_rng())),
        }
    }

    /// Replace the random source (tests use a seeded one)
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = Arc::new(Mutex::new(rng));
        self
    }

    /// Whether the command's author is an admin; lookup failures count as no
    pub async fn is_admin(&self, command: &Command) -> bool {
        match self.admins.is_admin(command.room, command.user_id).await {
            Ok(is_admin) => is_admin,
            Err(e) => {
                warn!(
                    "Admin lookup failed for user {} in room {}: {e:#}",
                    command.user_id, command.room
                );
                false
            }
        }
    }

    /// Post a plain message to a room
    pub async fn say(&self, room: RoomId, text: &str) -> Result<()> {
        self.delivery.post_message(room, text, false).await
    }

    /// Reply to the command's originating message
    pub async fn reply(&self, command: &Command, text: &str) -> Result<()> {
        self.delivery.post_reply(command.room, &command.id, text).await
    }
}
