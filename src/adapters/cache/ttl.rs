//! Process-local TTL cache for entitlement lookups.
//!
//! Entries expire a fixed time after they were written. Every write sweeps
//! expired entries, so the map never holds more than one TTL's worth of keys.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::domain::billing::Entitlement;
use crate::ports::{Clock, EntitlementCache, EntitlementKey, SystemClock};

/// Default lifetime of a cached entitlement.
pub const DEFAULT_TTL: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
struct CacheEntry {
    created_secs: i64,
    value: Entitlement,
}

/// Read-through cache with a fixed time-to-live.
pub struct TtlEntitlementCache {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: RwLock<HashMap<EntitlementKey, CacheEntry>>,
}

impl TtlEntitlementCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            entries: RwLock::new(HashMap::new()),
        }
    }

    fn is_live(&self, entry: &CacheEntry, now_secs: i64) -> bool {
        let ttl_secs = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        entry.created_secs.saturating_add(ttl_secs) > now_secs
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

impl Default for TtlEntitlementCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

#[async_trait]
impl EntitlementCache for TtlEntitlementCache {
    async fn get(&self, key: &EntitlementKey) -> Option<Entitlement> {
        let now = self.clock.now().as_unix_secs();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if self.is_live(entry, now) => return Some(entry.value.clone()),
                Some(_) => {}
                None => return None,
            }
        }
        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|entry| !self.is_live(entry, now)) {
            entries.remove(key);
        }
        None
    }

    async fn put(&self, key: EntitlementKey, value: Entitlement) {
        let now = self.clock.now().as_unix_secs();
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| self.is_live(entry, now));
        entries.insert(
            key,
            CacheEntry {
                created_secs: now,
                value,
            },
        );
    }
}

/// Cache that never stores anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledEntitlementCache;

#[async_trait]
impl EntitlementCache for DisabledEntitlementCache {
    async fn get(&self, _key: &EntitlementKey) -> Option<Entitlement> {
        None
    }

    async fn put(&self, _key: EntitlementKey, _value: Entitlement) {}
}
