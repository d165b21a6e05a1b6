//! Environment-driven configuration
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.0.0: Initial release with store, prefix, admin and room settings

use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

use crate::core::chat::RoomId;

/// Runtime configuration, read once at startup
#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: String,
    pub log_level: String,
    pub command_prefix: String,
    pub bot_name: String,
    pub admin_user_ids: Vec<u64>,
    pub rooms: Vec<RoomId>,
    pub apology_grace: Duration,
}

impl Config {
    /// Build configuration from environment variables (call `dotenvy::dotenv()` first)
    pub fn from_env() -> Result<Self> {
        let apology_grace_secs = match env::var("APOLOGY_GRACE_SECS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("APOLOGY_GRACE_SECS is not a number: {raw}"))?,
            Err(_) => 1,
        };

        Ok(Config {
            database_path: env::var("DATABASE_PATH").unwrap_or_else(|_| "reminders.db".to_string()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            command_prefix: env::var("COMMAND_PREFIX").unwrap_or_else(|_| "!!".to_string()),
            bot_name: env::var("BOT_NAME").unwrap_or_else(|_| "nudge".to_string()),
            admin_user_ids: parse_id_list("ADMIN_USER_IDS", &env::var("ADMIN_USER_IDS").unwrap_or_default())?,
            rooms: parse_id_list("ROOMS", &env::var("ROOMS").unwrap_or_default())?,
            apology_grace: Duration::from_secs(apology_grace_secs),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_path: ":memory:".to_string(),
            log_level: "info".to_string(),
            command_prefix: "!!".to_string(),
            bot_name: "nudge".to_string(),
            admin_user_ids: Vec::new(),
            rooms: Vec::new(),
            apology_grace: Duration::from_secs(1),
        }
    }
}

/// Parse a comma-separated list of numeric ids, ignoring blanks
fn parse_id_list(key: &str, raw: &str) -> Result<Vec<u64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u64>()
                .with_context(|| format!("{key} contains an invalid id: {s}"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id_list() {
        assert_eq!(parse_id_list("ROOMS", "").unwrap(), Vec::<u64>::new());
        assert_eq!(parse_id_list("ROOMS", "42, 7,,11").unwrap(), vec![42, 7, 11]);
        assert!(parse_id_list("ROOMS", "42,abc").is_err());
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.command_prefix, "!!");
        assert_eq!(config.apology_grace, Duration::from_secs(1));
        assert!(config.admin_user_ids.is_empty());
    }
}
