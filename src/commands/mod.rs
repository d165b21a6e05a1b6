//! # Command System
//!
//! Prefix command (`!!reminder ...`) handling for chat lines.
//!
//! - **Version**: 3.0.0
//! - **Since**: 0.2.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 3.0.0: Prefix commands parsed from plain chat lines
//! - 2.1.0: Add modular handler infrastructure (handler trait, context, registry)
//! - 1.0.0: Initial reorganization with modular command structure

pub mod context;
pub mod handler;
pub mod handlers;
pub mod registry;

pub use context::CommandContext;
pub use handler::CommandHandler;
pub use registry::CommandRegistry;

/// Registry with every built-in handler registered
pub fn default_registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    for handler in handlers::create_all_handlers() {
        registry.register(handler);
    }
    registry
}
