//! Lookup result cache.

use std::time::{Duration, SystemTime};

use log::debug;
use moka::future::Cache;

use crate::model::OnuInfo;

/// Default lifetime of a cached lookup.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);

/// Default number of cached lookups.
pub const DEFAULT_CACHE_CAPACITY: u64 = 1024;

/// A cached lookup and when it was taken.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub record: OnuInfo,
    pub captured_at: SystemTime,
}

/// Short-lived cache of successful lookups, keyed by device and query.
///
/// Only hits are stored; a query that found nothing always goes to the
/// device. Entries expire `ttl` after insertion. Clones share storage.
#[derive(Clone)]
pub struct ResultCache {
    entries: Cache<(String, String), CacheEntry>,
}

impl ResultCache {
    pub fn new(ttl: Duration, capacity: u64) -> Self {
        let entries = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(ttl)
            .build();
        Self { entries }
    }

    /// Cache key for a query string: trimmed and lowercased.
    pub fn normalize_query(query: &str) -> String {
        query.trim().to_lowercase()
    }

    pub async fn get(&self, device: &str, query: &str) -> Option<OnuInfo> {
        self.get_entry(device, query).await.map(|entry| entry.record)
    }

    pub async fn get_entry(&self, device: &str, query: &str) -> Option<CacheEntry> {
        let key = (device.to_string(), Self::normalize_query(query));
        self.entries.get(&key).await
    }

    pub async fn put(&self, device: &str, query: &str, record: OnuInfo) {
        let key = (device.to_string(), Self::normalize_query(query));
        debug!("caching {} for {}/{}", record.unit.onu_id, key.0, key.1);
        self.entries
            .insert(
                key,
                CacheEntry {
                    record,
                    captured_at: SystemTime::now(),
                },
            )
            .await;
    }

    pub async fn invalidate(&self, device: &str, query: &str) {
        let key = (device.to_string(), Self::normalize_query(query));
        self.entries.invalidate(&key).await;
    }

    /// Approximate number of live entries.
    pub fn entry_count(&self) -> u64 {
        self.entries.entry_count()
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL, DEFAULT_CACHE_CAPACITY)
    }
}

impl std::fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCache")
            .field("entries", &self.entries.entry_count())
            .finish()
    }
}
