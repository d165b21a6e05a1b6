//! Watcher registry and one-shot reminder timers
//!
//! Every armed reminder owns exactly one watcher, keyed by `(room, id)`.
//! Arming a key that already has a watcher aborts the old one first, so no
//! two timers can ever race for the same record.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: Keyed watcher registry replacing the flat watcher list
//! - 1.1.0: Apologize for reminders that came due while the room was inactive
//! - 1.0.0: Initial release

use anyhow::Result;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use log::{debug, error, info, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

use super::record::{ReminderError, ReminderRecord};
use super::store::ReminderStore;
use crate::core::chat::{Delivery, RoomId};

type WatchKey = (RoomId, String);

/// What a watcher does when its timer fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FireKind {
    /// Regular delivery at the due instant
    Deliver,
    /// Late delivery of a reminder that came due while the room was inactive
    Apologize,
}

/// In-memory timer handle for one reminder
struct Watcher {
    watch_id: u64,
    deadline: Instant,
    handle: JoinHandle<()>,
}

/// Result of reconstructing a room's timers from the store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Recovery {
    /// Reminders still in the future, armed for their remaining delay
    pub rearmed: usize,
    /// Overdue reminders queued for an apology delivery
    pub apologized: usize,
}

/// Owns every pending timer across rooms
#[derive(Clone)]
pub struct ReminderScheduler {
    store: Arc<dyn ReminderStore>,
    delivery: Arc<dyn Delivery>,
    watchers: Arc<DashMap<WatchKey, Watcher>>,
    next_watch_id: Arc<AtomicU64>,
    apology_grace: Duration,
}

impl ReminderScheduler {
    pub fn new(
        store: Arc<dyn ReminderStore>,
        delivery: Arc<dyn Delivery>,
        apology_grace: Duration,
    ) -> Self {
        Self {
            store,
            delivery,
            watchers: Arc::new(DashMap::new()),
            next_watch_id: Arc::new(AtomicU64::new(1)),
            apology_grace,
        }
    }

    /// Persist a reminder and arm its timer
    ///
    /// Nothing is stored when the due instant is already past, and nothing
    /// is armed unless the store accepted the record.
    pub async fn schedule(
        &self,
        record: ReminderRecord,
        now: DateTime<Utc>,
    ) -> Result<(), ReminderError> {
        let seconds = record.seconds_left(now.timestamp());
        if seconds <= 0 {
            return Err(ReminderError::AlreadyPast { text: record.text });
        }

        match self.store.set(&record.id, &record, record.room_id).await {
            Ok(true) => {}
            Ok(false) => {
                warn!("Store refused reminder {} in room {}", record.id, record.room_id);
                return Err(ReminderError::StorageFailure);
            }
            Err(e) => {
                error!(
                    "Failed to persist reminder {} in room {}: {e:#}",
                    record.id, record.room_id
                );
                return Err(ReminderError::StorageFailure);
            }
        }

        self.arm(
            record.room_id,
            &record.id,
            Duration::from_secs(seconds.unsigned_abs()),
            FireKind::Deliver,
        );
        info!(
            "⏰ Armed reminder {} in room {} ({seconds}s, {})",
            record.id, record.room_id, record.delay
        );
        Ok(())
    }

    fn arm(&self, room: RoomId, id: &str, delay: Duration, kind: FireKind) {
        let key: WatchKey = (room, id.to_string());
        let watch_id = self.next_watch_id.fetch_add(1, Ordering::Relaxed);
        let deadline = Instant::now() + delay;

        // Holding the entry keeps the task from clearing its slot before it is filled
        let entry = self.watchers.entry(key.clone());
        let scheduler = self.clone();
        let handle = tokio::spawn(async move {
            sleep_until(deadline).await;
            scheduler
                .watchers
                .remove_if(&key, |_, watcher| watcher.watch_id == watch_id);
            if let Err(e) = scheduler.fire(key.0, &key.1, kind).await {
                error!("Reminder {} in room {} failed to fire: {e:#}", key.1, key.0);
            }
        });

        let watcher = Watcher {
            watch_id,
            deadline,
            handle,
        };
        match entry {
            Entry::Occupied(mut occupied) => {
                let previous = occupied.insert(watcher);
                previous.handle.abort();
                debug!("Replaced watcher for reminder {id} in room {room}");
            }
            Entry::Vacant(vacant) => {
                vacant.insert(watcher);
            }
        }
    }

    async fn fire(&self, room: RoomId, id: &str, kind: FireKind) -> Result<()> {
        let Some(record) = self.store.get(id, room).await? else {
            debug!("Reminder {id} in room {room} was unset before firing, skipping");
            return Ok(());
        };

        if !self.store.unset(id, room).await? {
            debug!("Reminder {id} in room {room} already removed, skipping");
            return Ok(());
        }

        match kind {
            FireKind::Deliver => {
                info!("🔔 Delivering reminder {id} in room {room}");
                self.deliver(&record).await
            }
            FireKind::Apologize => {
                info!("🔔 Delivering overdue reminder {id} in room {room}");
                let text = format!("I guess I'm late but, {}", record.text);
                self.delivery.post_message(room, &text, true).await
            }
        }
    }

    async fn deliver(&self, record: &ReminderRecord) -> Result<()> {
        let room = record.room_id;
        if record.is_broadcast() {
            self.delivery.post_message(room, &record.text, false).await
        } else if record.targets_someone_else() {
            self.delivery.post_message(room, &record.text, true).await
        } else {
            self.delivery
                .post_reply(room, &record.id, &record.text)
                .await
        }
    }

    /// Rebuild a room's watchers from persisted state
    ///
    /// Existing watchers for the room are discarded first.
    pub async fn activate_room(&self, room: RoomId) -> Result<Recovery> {
        let discarded = self.cancel_room(room);
        if discarded > 0 {
            debug!("Discarded {discarded} stale watchers for room {room}");
        }

        let now = Utc::now().timestamp();
        let mut recovery = Recovery::default();

        for id in self.store.get_keys(room).await? {
            let Some(record) = self.store.get(&id, room).await? else {
                continue;
            };

            let seconds_left = record.seconds_left(now);
            if seconds_left <= 0 {
                self.arm(room, &id, self.apology_grace, FireKind::Apologize);
                recovery.apologized += 1;
            } else {
                self.arm(
                    room,
                    &id,
                    Duration::from_secs(seconds_left.unsigned_abs()),
                    FireKind::Deliver,
                );
                recovery.rearmed += 1;
            }
        }

        info!(
            "Room {room} activated: {} reminders rearmed, {} overdue",
            recovery.rearmed, recovery.apologized
        );
        Ok(recovery)
    }

    /// Cancel every watcher held for the room; persisted records stay put
    pub fn deactivate_room(&self, room: RoomId) -> usize {
        let cancelled = self.cancel_room(room);
        info!("Room {room} deactivated: {cancelled} watchers cancelled");
        cancelled
    }

    /// Cancel every watcher in every room
    pub fn deactivate_all(&self) -> usize {
        let cancelled = self.watchers.len();
        self.watchers.retain(|_, watcher| {
            watcher.handle.abort();
            false
        });
        cancelled
    }

    fn cancel_room(&self, room: RoomId) -> usize {
        let mut cancelled = 0;
        self.watchers.retain(|key, watcher| {
            if key.0 == room {
                watcher.handle.abort();
                cancelled += 1;
                false
            } else {
                true
            }
        });
        cancelled
    }

    /// Remove a persisted reminder; an armed watcher for it fires as a no-op
    pub async fn unset(&self, room: RoomId, id: &str) -> Result<bool> {
        if !self.store.exists(id, room).await? {
            return Ok(false);
        }
        let removed = self.store.unset(id, room).await?;
        info!("Unset reminder {id} in room {room}");
        Ok(removed)
    }

    /// Remove every persisted reminder of a room
    pub async fn nuke(&self, room: RoomId) -> Result<usize> {
        let mut removed = 0;
        for id in self.store.get_keys(room).await? {
            if self.store.unset(&id, room).await? {
                removed += 1;
            }
        }
        info!("Nuked {removed} reminders in room {room}");
        Ok(removed)
    }

    /// Reminders still due in the future, soonest first
    ///
    /// Overdue records are left alone: the next activation apologizes for them.
    pub async fn pending(&self, room: RoomId, now: DateTime<Utc>) -> Result<Vec<ReminderRecord>> {
        let mut pending = Vec::new();
        for (id, record) in self.store.get_all(room).await? {
            if record.seconds_left(now.timestamp()) <= 0 {
                debug!("Reminder {id} in room {room} is overdue, leaving it for recovery");
                continue;
            }
            pending.push(record);
        }
        pending.sort_by_key(|record| record.timestamp);
        Ok(pending)
    }

    /// Number of watchers currently held for the room
    pub fn armed_count(&self, room: RoomId) -> usize {
        self.watchers.iter().filter(|entry| entry.key().0 == room).count()
    }

    /// Deadline of the watcher armed for a reminder, if any
    pub fn deadline(&self, room: RoomId, id: &str) -> Option<Instant> {
        self.watchers
            .get(&(room, id.to_string()))
            .map(|watcher| watcher.deadline)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::features::reminders::store::MemoryStore;
    use async_trait::async_trait;
    use std::collections::{BTreeMap, BTreeSet};
    use tokio::sync::Mutex;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub(crate) enum Posted {
        Message {
            room: RoomId,
            text: String,
            pings: bool,
        },
        Reply {
            room: RoomId,
            reply_to: String,
            text: String,
        },
    }

    #[derive(Default)]
    pub(crate) struct RecordingDelivery {
        pub(crate) posted: Mutex<Vec<Posted>>,
    }

    impl RecordingDelivery {
        pub(crate) async fn posted(&self) -> Vec<Posted> {
            self.posted.lock().await.clone()
        }
    }

    #[async_trait]
    impl Delivery for RecordingDelivery {
        async fn post_message(&self, room: RoomId, text: &str, allow_pings: bool) -> Result<()> {
            self.posted.lock().await.push(Posted::Message {
                room,
                text: text.to_string(),
                pings: allow_pings,
            });
            Ok(())
        }

        async fn post_reply(&self, room: RoomId, reply_to: &str, text: &str) -> Result<()> {
            self.posted.lock().await.push(Posted::Reply {
                room,
                reply_to: reply_to.to_string(),
                text: text.to_string(),
            });
            Ok(())
        }
    }

    struct RefusingStore;

    #[async_trait]
    impl ReminderStore for RefusingStore {
        async fn set(&self, _id: &str, _record: &ReminderRecord, _room: RoomId) -> Result<bool> {
            Ok(false)
        }
        async fn get(&self, _id: &str, _room: RoomId) -> Result<Option<ReminderRecord>> {
            Ok(None)
        }
        async fn exists(&self, _id: &str, _room: RoomId) -> Result<bool> {
            Ok(false)
        }
        async fn unset(&self, _id: &str, _room: RoomId) -> Result<bool> {
            Ok(false)
        }
        async fn get_all(&self, _room: RoomId) -> Result<BTreeMap<String, ReminderRecord>> {
            Ok(BTreeMap::new())
        }
        async fn get_keys(&self, _room: RoomId) -> Result<BTreeSet<String>> {
            Ok(BTreeSet::new())
        }
    }

    const ROOM: RoomId = 42;

    fn record(id: &str, target: &str, timestamp: i64) -> ReminderRecord {
        ReminderRecord {
            id: id.to_string(),
            room_id: ROOM,
            for_token: "me".to_string(),
            target: target.to_string(),
            text: "@alice, grab a beer.".to_string(),
            delay: "2 hours".to_string(),
            user_id: 7,
            username: "alice".to_string(),
            timestamp,
        }
    }

    fn setup() -> (ReminderScheduler, Arc<MemoryStore>, Arc<RecordingDelivery>) {
        let store = Arc::new(MemoryStore::new());
        let delivery = Arc::new(RecordingDelivery::default());
        let scheduler =
            ReminderScheduler::new(store.clone(), delivery.clone(), Duration::from_secs(1));
        (scheduler, store, delivery)
    }

    #[tokio::test(start_paused = true)]
    async fn test_schedule_then_fire_replies_to_setter() {
        let (scheduler, store, delivery) = setup();
        let now = Utc::now();
        let rec = record("1001", "alice", now.timestamp() + 7200);

        scheduler.schedule(rec, now).await.unwrap();
        assert_eq!(scheduler.armed_count(ROOM), 1);
        assert!(store.exists("1001", ROOM).await.unwrap());

        tokio::time::sleep(Duration::from_secs(7201)).await;

        assert_eq!(
            delivery.posted().await,
            vec![Posted::Reply {
                room: ROOM,
                reply_to: "1001".to_string(),
                text: "@alice, grab a beer.".to_string(),
            }]
        );
        assert!(!store.exists("1001", ROOM).await.unwrap());
        assert_eq!(scheduler.armed_count(ROOM), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delivery_routing() {
        let (scheduler, _store, delivery) = setup();
        let now = Utc::now();
        scheduler
            .schedule(record("1", "everyone", now.timestamp() + 10), now)
            .await
            .unwrap();
        scheduler
            .schedule(record("2", "bob", now.timestamp() + 20), now)
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_secs(30)).await;

        let posted = delivery.posted().await;
        assert_eq!(posted.len(), 2);
        assert!(matches!(&posted[0], Posted::Message { pings: false, .. }));
        assert!(matches!(&posted[1], Posted::Message { pings: true, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_firing_unset_reminder_is_noop() {
        let (scheduler, _store, delivery) = setup();
        let now = Utc::now();
        scheduler
            .schedule(record("1001", "alice", now.timestamp() + 60), now)
            .await
            .unwrap();

        assert!(scheduler.unset(ROOM, "1001").await.unwrap());
        // timer is still armed until it fires
        assert_eq!(scheduler.armed_count(ROOM), 1);

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert!(delivery.posted().await.is_empty());
        assert_eq!(scheduler.armed_count(ROOM), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_already_past_is_not_persisted() {
        let (scheduler, store, _delivery) = setup();
        let now = Utc::now();
        let err = scheduler
            .schedule(record("1001", "alice", now.timestamp()), now)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ReminderError::AlreadyPast {
                text: "@alice, grab a beer.".to_string()
            }
        );
        assert!(store.get_keys(ROOM).await.unwrap().is_empty());
        assert_eq!(scheduler.armed_count(ROOM), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_storage_failure_arms_nothing() {
        let delivery = Arc::new(RecordingDelivery::default());
        let scheduler =
            ReminderScheduler::new(Arc::new(RefusingStore), delivery, Duration::from_secs(1));
        let now = Utc::now();

        let err = scheduler
            .schedule(record("1001", "alice", now.timestamp() + 60), now)
            .await
            .unwrap_err();
        assert_eq!(err, ReminderError::StorageFailure);
        assert_eq!(scheduler.armed_count(ROOM), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovery_apologizes_for_overdue_reminder() {
        let (scheduler, store, delivery) = setup();
        let rec = record("1001", "alice", Utc::now().timestamp() - 10);
        store.set("1001", &rec, ROOM).await.unwrap();

        let recovery = scheduler.activate_room(ROOM).await.unwrap();
        assert_eq!(
            recovery,
            Recovery {
                rearmed: 0,
                apologized: 1
            }
        );
        assert!(delivery.posted().await.is_empty());

        tokio::time::sleep(Duration::from_secs(2)).await;

        assert_eq!(
            delivery.posted().await,
            vec![Posted::Message {
                room: ROOM,
                text: "I guess I'm late but, @alice, grab a beer.".to_string(),
                pings: true,
            }]
        );
        assert!(!store.exists("1001", ROOM).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovery_rearms_future_reminder() {
        let (scheduler, store, delivery) = setup();
        let rec = record("1001", "alice", Utc::now().timestamp() + 3600);
        store.set("1001", &rec, ROOM).await.unwrap();

        let recovery = scheduler.activate_room(ROOM).await.unwrap();
        assert_eq!(
            recovery,
            Recovery {
                rearmed: 1,
                apologized: 0
            }
        );

        let remaining = scheduler.deadline(ROOM, "1001").unwrap() - Instant::now();
        assert!(remaining > Duration::from_secs(3598) && remaining <= Duration::from_secs(3600));

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(delivery.posted().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reactivation_replaces_watchers() {
        let (scheduler, store, delivery) = setup();
        let rec = record("1001", "alice", Utc::now().timestamp() + 60);
        store.set("1001", &rec, ROOM).await.unwrap();

        scheduler.activate_room(ROOM).await.unwrap();
        scheduler.activate_room(ROOM).await.unwrap();
        assert_eq!(scheduler.armed_count(ROOM), 1);

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(delivery.posted().await.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deactivate_cancels_but_keeps_records() {
        let (scheduler, store, delivery) = setup();
        let now = Utc::now();
        scheduler
            .schedule(record("1001", "alice", now.timestamp() + 60), now)
            .await
            .unwrap();

        assert_eq!(scheduler.deactivate_room(ROOM), 1);
        assert_eq!(scheduler.armed_count(ROOM), 0);

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert!(delivery.posted().await.is_empty());
        assert!(store.exists("1001", ROOM).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deactivate_leaves_other_rooms() {
        let (scheduler, _store, _delivery) = setup();
        let now = Utc::now();
        let mut other = record("2002", "alice", now.timestamp() + 60);
        other.room_id = 43;
        scheduler
            .schedule(record("1001", "alice", now.timestamp() + 60), now)
            .await
            .unwrap();
        scheduler.schedule(other, now).await.unwrap();

        scheduler.deactivate_room(ROOM);
        assert_eq!(scheduler.armed_count(43), 1);
        assert_eq!(scheduler.deactivate_all(), 1);
        assert_eq!(scheduler.armed_count(43), 0);
    }

    #[tokio::test]
    async fn test_unset_unknown_and_nuke() {
        let (scheduler, store, _delivery) = setup();
        let now = Utc::now().timestamp();
        assert!(!scheduler.unset(ROOM, "missing").await.unwrap());

        store.set("1", &record("1", "alice", now + 60), ROOM).await.unwrap();
        store.set("2", &record("2", "alice", now + 60), ROOM).await.unwrap();
        assert_eq!(scheduler.nuke(ROOM).await.unwrap(), 2);
        assert!(store.get_keys(ROOM).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_pending_skips_overdue() {
        let (scheduler, store, _delivery) = setup();
        let now = Utc::now();
        store
            .set("1", &record("1", "alice", now.timestamp() - 5), ROOM)
            .await
            .unwrap();
        store
            .set("2", &record("2", "alice", now.timestamp() + 500), ROOM)
            .await
            .unwrap();
        store
            .set("3", &record("3", "alice", now.timestamp() + 100), ROOM)
            .await
            .unwrap();

        let pending = scheduler.pending(ROOM, now).await.unwrap();
        let ids: Vec<&str> = pending.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "2"]);
        assert!(store.exists("1", ROOM).await.unwrap());
    }
}
