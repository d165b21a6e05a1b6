//! # Core Module
//!
//! Configuration and the chat-facing primitives shared by every feature.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Add chat module with command parsing and collaborator traits
//! - 1.0.0: Initial creation with config module

pub mod chat;
pub mod config;

// Re-export commonly used items
pub use chat::{AdminCheck, Command, Delivery, RoomId, StaticAdmins, BULLET, RIGHTWARDS_ARROW};
pub use config::Config;
