//! # Database
//!
//! SQLite key/value storage. Every value lives under a plugin namespace and
//! a room id, and no query ever crosses either boundary.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: Generic room-scoped key/value table replacing per-feature tables
//! - 1.0.0: Initial release

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, info, warn};
use sqlite::{Connection, State};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::core::chat::RoomId;
use crate::features::reminders::record::ReminderRecord;
use crate::features::reminders::store::ReminderStore;

/// Namespace reminder records are stored under
pub const REMINDERS_NAMESPACE: &str = "reminders";

#[derive(Clone)]
pub struct Database {
    connection: Arc<Mutex<Connection>>,
}

impl Database {
    pub async fn new(path: &str) -> Result<Self> {
        let connection = sqlite::open(path)
            .with_context(|| format!("Failed to open database at {path}"))?;

        connection
            .execute(
                "CREATE TABLE IF NOT EXISTS key_value (
                    plugin TEXT NOT NULL,
                    room_id INTEGER NOT NULL,
                    key TEXT NOT NULL,
                    value TEXT NOT NULL,
                    updated_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                    PRIMARY KEY (plugin, room_id, key)
                )",
            )
            .context("Failed to create key_value table")?;

        info!("Database initialized at {path}");

        Ok(Database {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Store `value`, replacing any previous value under the same key
    pub async fn set_value(&self, plugin: &str, room: RoomId, key: &str, value: &str) -> Result<()> {
        let conn = self.connection.lock().await;
        let mut statement = conn.prepare(
            "INSERT OR REPLACE INTO key_value (plugin, room_id, key, value, updated_at)
             VALUES (?, ?, ?, ?, CURRENT_TIMESTAMP)",
        )?;
        statement.bind((1, plugin))?;
        statement.bind((2, room as i64))?;
        statement.bind((3, key))?;
        statement.bind((4, value))?;
        statement.next()?;
        Ok(())
    }

    pub async fn get_value(&self, plugin: &str, room: RoomId, key: &str) -> Result<Option<String>> {
        let conn = self.connection.lock().await;
        let mut statement = conn.prepare(
            "SELECT value FROM key_value WHERE plugin = ? AND room_id = ? AND key = ?",
        )?;
        statement.bind((1, plugin))?;
        statement.bind((2, room as i64))?;
        statement.bind((3, key))?;

        if let State::Row = statement.next()? {
            Ok(Some(statement.read::<String, _>("value")?))
        } else {
            Ok(None)
        }
    }

    /// Delete a key; returns whether a row was removed
    pub async fn delete_value(&self, plugin: &str, room: RoomId, key: &str) -> Result<bool> {
        let conn = self.connection.lock().await;
        let mut statement = conn.prepare(
            "DELETE FROM key_value WHERE plugin = ? AND room_id = ? AND key = ?",
        )?;
        statement.bind((1, plugin))?;
        statement.bind((2, room as i64))?;
        statement.bind((3, key))?;
        statement.next()?;
        drop(statement);
        Ok(conn.change_count() > 0)
    }

    /// Every key/value pair of a namespace in one room, ordered by key
    pub async fn list_values(&self, plugin: &str, room: RoomId) -> Result<Vec<(String, String)>> {
        let conn = self.connection.lock().await;
        let mut statement = conn.prepare(
            "SELECT key, value FROM key_value WHERE plugin = ? AND room_id = ? ORDER BY key",
        )?;
        statement.bind((1, plugin))?;
        statement.bind((2, room as i64))?;

        let mut values = Vec::new();
        while let State::Row = statement.next()? {
            values.push((
                statement.read::<String, _>("key")?,
                statement.read::<String, _>("value")?,
            ));
        }
        Ok(values)
    }
}

#[async_trait]
impl ReminderStore for Database {
    async fn set(&self, id: &str, record: &ReminderRecord, room: RoomId) -> Result<bool> {
        let value = serde_json::to_string(record)?;
        self.set_value(REMINDERS_NAMESPACE, room, id, &value).await?;
        debug!("Stored reminder {id} in room {room}");
        Ok(true)
    }

    async fn get(&self, id: &str, room: RoomId) -> Result<Option<ReminderRecord>> {
        match self.get_value(REMINDERS_NAMESPACE, room, id).await? {
            Some(value) => {
                let record = serde_json::from_str(&value)
                    .with_context(|| format!("Corrupt reminder {id} in room {room}"))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    async fn exists(&self, id: &str, room: RoomId) -> Result<bool> {
        Ok(self.get_value(REMINDERS_NAMESPACE, room, id).await?.is_some())
    }

    async fn unset(&self, id: &str, room: RoomId) -> Result<bool> {
        self.delete_value(REMINDERS_NAMESPACE, room, id).await
    }

    async fn get_all(&self, room: RoomId) -> Result<BTreeMap<String, ReminderRecord>> {
        let mut records = BTreeMap::new();
        for (key, value) in self.list_values(REMINDERS_NAMESPACE, room).await? {
            match serde_json::from_str::<ReminderRecord>(&value) {
                Ok(record) => {
                    records.insert(key, record);
                }
                Err(e) => warn!("Skipping unreadable reminder {key} in room {room}: {e}"),
            }
        }
        Ok(records)
    }

    async fn get_keys(&self, room: RoomId) -> Result<BTreeSet<String>> {
        Ok(self
            .list_values(REMINDERS_NAMESPACE, room)
            .await?
            .into_iter()
            .map(|(key, _)| key)
            .collect())
    }
}
