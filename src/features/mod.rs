//! # Features
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0

pub mod reminders;
pub mod tagger;

pub use reminders::{ReminderScheduler, ReminderStore};
pub use tagger::{LexiconTagger, PartOfSpeechTagger};
