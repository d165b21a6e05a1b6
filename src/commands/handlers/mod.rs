//! Per-command handler implementations
//!
//! - **Version**: 3.0.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 3.0.0: Reminder handler is the only command surface
//! - 1.0.0: Initial extraction from monolithic command_handler.rs

pub mod remind;

use std::sync::Arc;

use super::handler::CommandHandler;

/// Create all registered command handlers
///
/// Returns a vector of handlers ready to be registered with CommandRegistry.
pub fn create_all_handlers() -> Vec<Arc<dyn CommandHandler>> {
    vec![Arc::new(remind::RemindHandler)]
}
