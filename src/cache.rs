//! Process-wide tenant → connection string cache. No TTL, no eviction: entries live until
//! invalidated or the process restarts.
//!
//! Every invalidation bumps a generation counter. Writers that looked the tenant up before an
//! invalidation use [`ConnectionCache::put_if_current`] so their result is not written back.

use crate::tenant::TenantId;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A resolved, fully qualified datastore URL for one tenant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionRecord {
    pub connection_string: String,
    pub resolved_at: DateTime<Utc>,
}

impl ConnectionRecord {
    fn now(connection_string: String) -> Self {
        ConnectionRecord {
            connection_string,
            resolved_at: Utc::now(),
        }
    }
}

/// Sharded concurrent map; clones share the same entries.
#[derive(Clone, Debug, Default)]
pub struct ConnectionCache {
    entries: Arc<DashMap<TenantId, ConnectionRecord>>,
    generation: Arc<AtomicU64>,
}

impl ConnectionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, tenant: &TenantId) -> Option<String> {
        self.entries.get(tenant).map(|r| r.connection_string.clone())
    }

    pub fn record(&self, tenant: &TenantId) -> Option<ConnectionRecord> {
        self.entries.get(tenant).map(|r| r.value().clone())
    }

    pub fn put(&self, tenant: TenantId, connection_string: String) {
        self.entries.insert(tenant, ConnectionRecord::now(connection_string));
    }

    /// Current invalidation generation. Take it before starting a lookup.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Store the entry unless an invalidation ran since `generation` was read. Returns whether
    /// it was stored.
    pub fn put_if_current(&self, tenant: TenantId, connection_string: String, generation: u64) -> bool {
        // The shard lock is held while checking, so an invalidation either bumps the counter
        // first (and we skip) or removes what we insert once the lock is released.
        let entry = self.entries.entry(tenant);
        if self.generation() != generation {
            return false;
        }
        entry.insert(ConnectionRecord::now(connection_string));
        true
    }

    /// Returns whether an entry was removed.
    pub fn invalidate(&self, tenant: &TenantId) -> bool {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.entries.remove(tenant).is_some()
    }

    /// Empties the cache and returns how many entries were dropped.
    pub fn invalidate_all(&self) -> usize {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let mut removed = 0;
        self.entries.retain(|_, _| {
            removed += 1;
            false
        });
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cached tenants with their resolution time, ordered by tenant id.
    pub fn cached_tenants(&self) -> Vec<(TenantId, DateTime<Utc>)> {
        let mut tenants: Vec<_> = self
            .entries
            .iter()
            .map(|r| (r.key().clone(), r.value().resolved_at))
            .collect();
        tenants.sort_by(|a, b| a.0.cmp(&b.0));
        tenants
    }
}
