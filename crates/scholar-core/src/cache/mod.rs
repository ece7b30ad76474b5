//! Response cache for model calls
//!
//! Entries are keyed by a fingerprint of (model identity, prompt) and expire
//! after a fixed TTL. Expired entries behave as absent; they are purged
//! lazily on [`ResponseCache::get`] or eagerly by
//! [`ResponseCache::remove_expired`].
//!
//! Timestamps use [`tokio::time::Instant`] so that tests can drive expiry
//! with a paused clock.

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use sha2::{Digest, Sha256};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::config::CacheConfig;

/// Separator between model identity and prompt in the fingerprint input
const FINGERPRINT_SEPARATOR: u8 = 0x1f;

/// Number of key characters shown in log lines
const LOGGED_KEY_LEN: usize = 16;

/// Deterministic fingerprint of a model call
///
/// Lowercase hex SHA-256 over `model_identity || 0x1F || prompt`.
pub fn fingerprint(model_identity: &str, prompt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(model_identity.as_bytes());
    hasher.update([FINGERPRINT_SEPARATOR]);
    hasher.update(prompt.as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    created_at: Instant,
}

impl CacheEntry {
    fn is_live(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.created_at) <= ttl
    }
}

/// Point-in-time cache counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

/// TTL-based response cache
#[derive(Debug)]
pub struct ResponseCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
    /// 0 means unbounded
    max_entries: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResponseCache {
    /// Create an unbounded cache with the given TTL
    pub fn new(ttl: Duration) -> Self {
        info!(ttl_secs = ttl.as_secs(), "Initialized response cache");
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            max_entries: 0,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Create a cache from config
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.ttl()).with_max_entries(config.max_entries)
    }

    /// Bound the number of entries (0 disables the bound)
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// Configured time-to-live
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Look up a live entry, purging it if it has expired
    pub fn get(&self, key: &str) -> Option<String> {
        let now = Instant::now();

        let expired = match self.entries.read() {
            Ok(entries) => match entries.get(key) {
                Some(entry) if entry.is_live(now, self.ttl) => {
                    debug!(key = %short_key(key), "Cache hit");
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    return Some(entry.value.clone());
                }
                Some(_) => true,
                None => false,
            },
            Err(_) => false,
        };

        if expired {
            if let Ok(mut entries) = self.entries.write() {
                // Re-check under the write lock; a concurrent set may have refreshed it
                let still_stale = entries
                    .get(key)
                    .is_some_and(|entry| !entry.is_live(now, self.ttl));
                if still_stale {
                    entries.remove(key);
                    debug!(key = %short_key(key), "Cache entry expired");
                }
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Store a value, stamping it with the current time
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        debug!(key = %short_key(&key), "Caching response");

        let entry = CacheEntry {
            value: value.into(),
            created_at: Instant::now(),
        };

        if let Ok(mut entries) = self.entries.write() {
            if self.max_entries > 0
                && !entries.contains_key(&key)
                && entries.len() >= self.max_entries
            {
                self.make_room(&mut entries);
            }
            entries.insert(key, entry);
        }
    }

    /// Remove a single entry, returning whether it was present
    pub fn remove(&self, key: &str) -> bool {
        self.entries
            .write()
            .map(|mut entries| entries.remove(key).is_some())
            .unwrap_or(false)
    }

    /// Drop every entry
    pub fn clear(&self) {
        info!("Clearing cache");
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }

    /// Purge all expired entries, returning how many were removed
    pub fn remove_expired(&self) -> usize {
        let now = Instant::now();
        let removed = match self.entries.write() {
            Ok(mut entries) => {
                let before = entries.len();
                entries.retain(|_, entry| entry.is_live(now, self.ttl));
                before - entries.len()
            }
            Err(_) => 0,
        };

        if removed > 0 {
            info!(removed, "Removed expired cache entries");
        }
        removed
    }

    /// Number of stored entries, including not-yet-purged expired ones
    pub fn size(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.size(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Free one slot: drop expired entries first, then the oldest one
    fn make_room(&self, entries: &mut HashMap<String, CacheEntry>) {
        let now = Instant::now();
        entries.retain(|_, entry| entry.is_live(now, self.ttl));
        if entries.len() < self.max_entries {
            return;
        }

        let oldest = entries
            .iter()
            .min_by_key(|(_, entry)| entry.created_at)
            .map(|(key, _)| key.clone());
        if let Some(key) = oldest {
            debug!(key = %short_key(&key), "Evicting oldest cache entry");
            entries.remove(&key);
        }
    }
}

fn short_key(key: &str) -> &str {
    key.get(..LOGGED_KEY_LEN).unwrap_or(key)
}
