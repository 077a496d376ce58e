//! TTL cache for generation results.
//!
//! Entries expire passively: `get` ignores anything past its deadline, and a
//! periodic sweep drops expired entries to bound memory.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};
use vitalis_core::intent::Intent;

/// Characters of normalized input that participate in a cache key.
pub const CACHE_KEY_INPUT_CHARS: usize = 50;

/// A cached value with its lifetime.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub data: T,
    pub created_at: Instant,
    pub expires_at: Instant,
}

impl<T> CacheEntry<T> {
    /// An entry is expired at and after its deadline.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Builds the cache key `"{intent}-{first 50 chars of normalized input}"`.
///
/// Normalization trims, lowercases and collapses runs of whitespace so that
/// trivially different spellings of the same request share an entry.
pub fn cache_key(intent: Intent, input: &str) -> String {
    let normalized = input
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    let prefix: String = normalized.chars().take(CACHE_KEY_INPUT_CHARS).collect();
    format!("{}-{}", intent, prefix)
}

/// Concurrency-safe TTL map.
///
/// Owned by the orchestrator and safe to share between sessions. Writers to
/// the same key race as last-write-wins.
pub struct ResponseCache<T: Clone + Send + Sync + 'static> {
    entries: Arc<RwLock<HashMap<String, CacheEntry<T>>>>,
    default_ttl: Duration,
}

impl<T: Clone + Send + Sync + 'static> ResponseCache<T> {
    /// Creates an empty cache whose `insert` uses `default_ttl`.
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Returns the value for `key` unless it is missing or expired.
    pub async fn get(&self, key: &str) -> Option<T> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        if entry.is_expired_at(Instant::now()) {
            return None;
        }
        Some(entry.data.clone())
    }

    /// Stores `data` under `key` for `ttl`, replacing any previous entry.
    pub async fn set(&self, key: impl Into<String>, data: T, ttl: Duration) {
        let now = Instant::now();
        let entry = CacheEntry {
            data,
            created_at: now,
            expires_at: now + ttl,
        };
        let mut entries = self.entries.write().await;
        entries.insert(key.into(), entry);
    }

    /// Stores `data` with the default TTL.
    pub async fn insert(&self, key: impl Into<String>, data: T) {
        self.set(key, data, self.default_ttl).await;
    }

    pub async fn remove(&self, key: &str) {
        let mut entries = self.entries.write().await;
        entries.remove(key);
    }

    /// Clears all cached entries.
    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        entries.clear();
    }

    /// Number of stored entries, expired ones included until swept.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Removes expired entries and returns how many were dropped.
    ///
    /// Only entries past their deadline at the moment of the sweep go.
    pub async fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired_at(now));
        let removed = before - entries.len();
        if removed > 0 {
            tracing::debug!("[ResponseCache] Swept {} expired entries", removed);
        }
        removed
    }

    /// Starts a background task sweeping every `period`.
    ///
    /// The task holds only a weak reference and stops once the cache is
    /// dropped. The first sweep happens one `period` after the call.
    pub fn spawn_sweeper(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let cache: Weak<Self> = Arc::downgrade(self);

        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            tracing::debug!("[ResponseCache] Sweeper started ({:?} interval)", period);

            loop {
                ticker.tick().await;
                let Some(cache) = cache.upgrade() else {
                    tracing::debug!("[ResponseCache] Cache dropped, sweeper exiting");
                    break;
                };
                cache.sweep().await;
            }
        })
    }
}
