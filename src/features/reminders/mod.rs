//! # Reminders Feature
//!
//! Natural-language reminders: target resolution, pronoun rewriting,
//! time expression parsing, persistence and one-shot delivery timers.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 2.0.0: Free-form chat requests with pronoun rewriting, room-scoped store
//! - 1.0.0: Initial release

pub mod composer;
pub mod record;
pub mod rewriter;
pub mod scheduler;
pub mod store;
pub mod target;
pub mod time_parser;

pub use composer::compose;
pub use record::{ReminderError, ReminderRecord, TARGET_EVERYONE, TARGET_MYSELF};
pub use rewriter::PronounRewriter;
pub use scheduler::{Recovery, ReminderScheduler};
pub use store::{MemoryStore, ReminderStore};
pub use target::{Resolution, TargetKind};
pub use time_parser::DueTime;
