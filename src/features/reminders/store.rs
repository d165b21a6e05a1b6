//! Room-scoped reminder persistence
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::{BTreeMap, BTreeSet};

use super::record::ReminderRecord;
use crate::core::chat::RoomId;

/// Key/value store for reminder records, scoped by room
///
/// No operation sees keys belonging to another room.
#[async_trait]
pub trait ReminderStore: Send + Sync {
    /// Store a record under `id`; returns false when the write was refused
    async fn set(&self, id: &str, record: &ReminderRecord, room: RoomId) -> Result<bool>;

    async fn get(&self, id: &str, room: RoomId) -> Result<Option<ReminderRecord>>;

    async fn exists(&self, id: &str, room: RoomId) -> Result<bool>;

    /// Remove a record; returns whether something was removed
    async fn unset(&self, id: &str, room: RoomId) -> Result<bool>;

    async fn get_all(&self, room: RoomId) -> Result<BTreeMap<String, ReminderRecord>>;

    async fn get_keys(&self, room: RoomId) -> Result<BTreeSet<String>>;
}

/// In-process store; contents are lost on restart
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: DashMap<(RoomId, String), ReminderRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReminderStore for MemoryStore {
    async fn set(&self, id: &str, record: &ReminderRecord, room: RoomId) -> Result<bool> {
        self.records.insert((room, id.to_string()), record.clone());
        Ok(true)
    }

    async fn get(&self, id: &str, room: RoomId) -> Result<Option<ReminderRecord>> {
        Ok(self
            .records
            .get(&(room, id.to_string()))
            .map(|entry| entry.value().clone()))
    }

    async fn exists(&self, id: &str, room: RoomId) -> Result<bool> {
        Ok(self.records.contains_key(&(room, id.to_string())))
    }

    async fn unset(&self, id: &str, room: RoomId) -> Result<bool> {
        Ok(self.records.remove(&(room, id.to_string())).is_some())
    }

    async fn get_all(&self, room: RoomId) -> Result<BTreeMap<String, ReminderRecord>> {
        Ok(self
            .records
            .iter()
            .filter(|entry| entry.key().0 == room)
            .map(|entry| (entry.key().1.clone(), entry.value().clone()))
            .collect())
    }

    async fn get_keys(&self, room: RoomId) -> Result<BTreeSet<String>> {
        Ok(self
            .records
            .iter()
            .filter(|entry| entry.key().0 == room)
            .map(|entry| entry.key().1.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, room: RoomId) -> ReminderRecord {
        ReminderRecord {
            id: id.to_string(),
            room_id: room,
            for_token: String::new(),
            target: "alice".to_string(),
            text: "stretch".to_string(),
            delay: "5 minutes".to_string(),
            user_id: 7,
            username: "alice".to_string(),
            timestamp: 100,
        }
    }

    #[tokio::test]
    async fn test_memory_store_lifecycle() {
        let store = MemoryStore::new();
        assert!(store.set("1", &record("1", 42), 42).await.unwrap());
        assert!(store.exists("1", 42).await.unwrap());
        assert_eq!(store.get("1", 42).await.unwrap(), Some(record("1", 42)));

        assert!(store.unset("1", 42).await.unwrap());
        assert!(!store.unset("1", 42).await.unwrap());
        assert!(!store.exists("1", 42).await.unwrap());
    }

    #[tokio::test]
    async fn test_memory_store_rooms_are_isolated() {
        let store = MemoryStore::new();
        store.set("1", &record("1", 42), 42).await.unwrap();
        store.set("2", &record("2", 43), 43).await.unwrap();

        let keys = store.get_keys(42).await.unwrap();
        assert_eq!(keys.into_iter().collect::<Vec<_>>(), vec!["1".to_string()]);
        assert!(store.get("2", 42).await.unwrap().is_none());
        assert_eq!(store.get_all(43).await.unwrap().len(), 1);
    }
}
