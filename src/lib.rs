// Core layer - chat primitives and configuration
pub mod core;

// Features layer - reminder engine and tagging
pub mod features;

// Infrastructure
pub mod database;

// Application layer
pub mod commands;

pub use core::Config;

pub use features::reminders::{ReminderError, ReminderRecord, ReminderScheduler, ReminderStore};
pub use features::tagger::{LexiconTagger, PartOfSpeechTagger};
