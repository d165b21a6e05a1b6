//! Command handler registry
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 1.1.0: Dispatch and room lifecycle fan-out
//! - 1.0.0: Initial implementation for handler dispatch

use anyhow::Result;
use log::{debug, error};
use std::collections::HashMap;
use std::sync::Arc;

use super::context::CommandContext;
use super::handler::CommandHandler;
use crate::core::chat::{Command, RoomId};

/// Registry mapping command names to handlers
///
/// Multiple command names can map to the same handler if they share logic.
///
/// # Example
///
/// ```ignore
/// let mut registry = CommandRegistry::new();
/// registry.register(Arc::new(RemindHandler));
///
/// registry.dispatch(ctx, &command).await?;
/// ```
#[derive(Clone)]
pub struct CommandRegistry {
    handlers: HashMap<&'static str, Arc<dyn CommandHandler>>,
    unique: Vec<Arc<dyn CommandHandler>>,
}

impl CommandRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            unique: Vec::new(),
        }
    }

    /// Register a handler for its declared command names
    pub fn register(&mut self, handler: Arc<dyn CommandHandler>) {
        for name in handler.command_names() {
            self.handlers.insert(name, Arc::clone(&handler));
        }
        self.unique.push(handler);
    }

    /// Get handler for a command name
    pub fn get(&self, name: &str) -> Option<Arc<dyn CommandHandler>> {
        self.handlers.get(name).cloned()
    }

    /// Check if a command is registered
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Number of registered command names
    ///
    /// Note: This counts command names, not unique handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Get all registered command names
    pub fn command_names(&self) -> impl Iterator<Item = &&'static str> {
        self.handlers.keys()
    }

    /// Route a command to its handler; returns false when nothing handles it
    pub async fn dispatch(&self, ctx: Arc<CommandContext>, command: &Command) -> Result<bool> {
        let Some(handler) = self.get(&command.name) else {
            debug!("No handler for command '{}'", command.name);
            return Ok(false);
        };
        handler.handle(ctx, command).await?;
        Ok(true)
    }

    /// Run every handler's room activation hook
    pub async fn enable_for_room(&self, ctx: Arc<CommandContext>, room: RoomId) {
        for handler in &self.unique {
            if let Err(e) = handler.enable_for_room(Arc::clone(&ctx), room).await {
                error!("Failed to enable {:?} for room {room}: {e:#}", handler.command_names());
            }
        }
    }

    /// Run every handler's room deactivation hook
    pub async fn disable_for_room(&self, ctx: Arc<CommandContext>, room: RoomId) {
        for handler in &self.unique {
            if let Err(e) = handler.disable_for_room(Arc::clone(&ctx), room).await {
                error!("Failed to disable {:?} for room {room}: {e:#}", handler.command_names());
            }
        }
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chat::StaticAdmins;
    use crate::core::Config;
    use crate::features::reminders::scheduler::tests::RecordingDelivery;
    use crate::features::reminders::MemoryStore;
    use crate::features::tagger::LexiconTagger;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // Mock handler for testing
    struct MockHandler {
        names: &'static [&'static str],
        handled: AtomicUsize,
        enabled: AtomicUsize,
    }

    impl MockHandler {
        fn new(names: &'static [&'static str]) -> Self {
            Self {
                names,
                handled: AtomicUsize::new(0),
                enabled: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl CommandHandler for MockHandler {
        fn command_names(&self) -> &'static [&'static str] {
            self.names
        }

        async fn handle(&self, _ctx: Arc<CommandContext>, _command: &Command) -> Result<()> {
            self.handled.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn enable_for_room(&self, _ctx: Arc<CommandContext>, _room: RoomId) -> Result<()> {
            self.enabled.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn context() -> Arc<CommandContext> {
        Arc::new(CommandContext::new(
            Config::default(),
            Arc::new(MemoryStore::new()),
            Arc::new(RecordingDelivery::default()),
            Arc::new(StaticAdmins::default()),
            Arc::new(LexiconTagger::new()),
        ))
    }

    #[test]
    fn test_registry_new_is_empty() {
        let registry = CommandRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_registry_register_multiple_names() {
        let mut registry = CommandRegistry::new();
        registry.register(Arc::new(MockHandler::new(&["reminder", "in", "at"])));

        assert_eq!(registry.len(), 3);
        assert!(registry.contains("reminder"));
        assert!(registry.contains("in"));
        assert!(registry.contains("at"));
        assert!(!registry.contains("ping"));
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_registry_default() {
        let registry = CommandRegistry::default();
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_routes_by_name() {
        let handler = Arc::new(MockHandler::new(&["reminder", "in"]));
        let mut registry = CommandRegistry::new();
        registry.register(handler.clone());

        let command = Command::parse("!!", 42, "1", 7, "alice", "!!in 5 mins tea").unwrap();
        assert!(registry.dispatch(context(), &command).await.unwrap());

        let unknown = Command::parse("!!", 42, "2", 7, "alice", "!!ping").unwrap();
        assert!(!registry.dispatch(context(), &unknown).await.unwrap());

        assert_eq!(handler.handled.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_enable_runs_once_per_handler() {
        let handler = Arc::new(MockHandler::new(&["reminder", "in", "at"]));
        let mut registry = CommandRegistry::new();
        registry.register(handler.clone());

        registry.enable_for_room(context(), 42).await;
        assert_eq!(handler.enabled.load(Ordering::SeqCst), 1);
    }
}
