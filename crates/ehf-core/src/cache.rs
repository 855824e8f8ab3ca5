//! Session cache.
//!
//! Results are kept per session under `ehfStatus_{id}` with the status label as value.
//! Only resolved statuses are written, so a failed lookup is retried by the next session.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use ulid::Ulid;

use crate::domain::{EntityId, SessionId, Status};
use crate::impls::InMemorySessionStore;
use crate::ports::{Clock, SessionStore};

pub const CACHE_KEY_PREFIX: &str = "ehfStatus_";

pub fn cache_key(id: &EntityId) -> String {
    format!("{CACHE_KEY_PREFIX}{id}")
}

/// Typed view over a `SessionStore`.
#[derive(Clone)]
pub struct SessionCache {
    store: Arc<dyn SessionStore>,
}

impl SessionCache {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemorySessionStore::new()))
    }

    pub fn get(&self, id: &EntityId) -> Option<Status> {
        let key = cache_key(id);
        let label = self.store.get(&key)?;
        match Status::from_label(&label) {
            Some(status) if status.is_resolved() => Some(status),
            _ => {
                warn!(%id, %label, "dropping unusable cached status");
                self.forget(id);
                None
            }
        }
    }

    /// Stores `status` if it is resolved. Returns whether anything was written.
    pub fn put(&self, id: &EntityId, status: Status) -> bool {
        if !status.is_resolved() {
            return false;
        }
        debug!(%id, %status, "caching status");
        self.store.set(&cache_key(id), status.label().to_string());
        true
    }

    pub fn forget(&self, id: &EntityId) {
        self.store.remove(&cache_key(id));
    }

    pub fn clear(&self) {
        self.store.clear();
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

/// One session context. Owns the cache for as long as the session lives.
pub struct Session {
    id: SessionId,
    started_at: DateTime<Utc>,
    cache: SessionCache,
}

impl Session {
    pub fn start(clock: &dyn Clock, store: Arc<dyn SessionStore>) -> Self {
        let started_at = clock.now();
        let timestamp_ms = started_at.timestamp_millis().max(0) as u64;
        let id = SessionId::from_ulid(Ulid::from_parts(timestamp_ms, rand::random()));
        debug!(session = %id, "session started");
        Self {
            id,
            started_at,
            cache: SessionCache::new(store),
        }
    }

    pub fn in_memory(clock: &dyn Clock) -> Self {
        Self::start(clock, Arc::new(InMemorySessionStore::new()))
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn cache(&self) -> &SessionCache {
        &self.cache
    }

    /// Ends the session; everything it cached is dropped.
    pub fn end(self) {
        debug!(session = %self.id, entries = self.cache.len(), "session ended");
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::FixedClock;
    use crate::testing::id;
    use chrono::TimeZone;

    #[test]
    fn key_uses_prefix() {
        assert_eq!(cache_key(&id("923609016")), "ehfStatus_923609016");
    }

    #[test]
    fn only_resolved_statuses_are_cached() {
        let cache = SessionCache::in_memory();
        assert!(!cache.put(&id("A"), Status::Pending));
        assert!(cache.is_empty());

        assert!(cache.put(&id("A"), Status::Confirmed));
        assert!(cache.put(&id("B"), Status::Rejected));
        assert_eq!(cache.get(&id("A")), Some(Status::Confirmed));
        assert_eq!(cache.get(&id("B")), Some(Status::Rejected));
        assert_eq!(cache.get(&id("C")), None);
    }

    #[test]
    fn stored_label_is_the_status_class() {
        let store = Arc::new(InMemorySessionStore::new());
        let cache = SessionCache::new(store.clone());
        cache.put(&id("A"), Status::Confirmed);
        assert_eq!(store.get("ehfStatus_A").as_deref(), Some("grønn"));
    }

    #[test]
    fn garbage_and_pending_labels_read_as_miss() {
        let store = Arc::new(InMemorySessionStore::new());
        store.set("ehfStatus_A", "purple".to_string());
        store.set("ehfStatus_B", "gul".to_string());
        let cache = SessionCache::new(store.clone());
        assert_eq!(cache.get(&id("A")), None);
        assert_eq!(cache.get(&id("B")), None);
        // 読めないエントリは取り除かれる
        assert!(store.is_empty());
    }

    #[test]
    fn forget_removes_one_entry() {
        let cache = SessionCache::in_memory();
        cache.put(&id("A"), Status::Confirmed);
        cache.put(&id("B"), Status::Rejected);

        cache.forget(&id("A"));
        assert_eq!(cache.get(&id("A")), None);
        assert_eq!(cache.get(&id("B")), Some(Status::Rejected));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn ending_session_clears_cache() {
        let clock = FixedClock(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
        let store = Arc::new(InMemorySessionStore::new());
        let session = Session::start(&clock, store.clone());
        session.cache().put(&id("A"), Status::Confirmed);
        assert_eq!(session.started_at(), clock.0);
        assert_eq!(
            session.id().as_ulid().timestamp_ms(),
            clock.0.timestamp_millis() as u64
        );

        session.end();
        assert!(store.is_empty());
    }

    #[test]
    fn sessions_get_distinct_ids() {
        let clock = FixedClock(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
        let a = Session::in_memory(&clock);
        let b = Session::in_memory(&clock);
        assert_ne!(a.id(), b.id());
    }
}
