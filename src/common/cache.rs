// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use dashmap::DashMap;
use std::any::Any;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

type CacheValue = Arc<dyn Any + Send + Sync>;

struct CacheEntry {
    value: CacheValue,
    expires_at: Instant,
}

/// TTL store mapping string keys to opaque values, safe under concurrent
/// readers and writers. Expired entries are dropped lazily on read and by
/// the optional background sweeper.
#[derive(Clone, Default)]
pub struct TtlCache {
    entries: Arc<DashMap<String, CacheEntry>>,
}

impl TtlCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the live value for `key`, removing it if expired.
    pub fn get(&self, key: &str) -> Option<CacheValue> {
        let expired = match self.entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove(key);
        }
        None
    }

    /// Last writer wins; there is no compare-and-swap.
    pub fn set<T: Any + Send + Sync>(&self, key: impl Into<String>, value: T, ttl: Duration) {
        let expires_at = Instant::now().checked_add(ttl).unwrap_or_else(Instant::now);
        self.entries.insert(
            key.into(),
            CacheEntry {
                value: Arc::new(value),
                expires_at,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Spawns a background task evicting expired entries every `interval`.
    pub fn spawn_sweeper(&self, interval: Duration) -> JoinHandle<()> {
        let entries = Arc::clone(&self.entries);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let now = Instant::now();
                entries.retain(|_, entry| entry.expires_at > now);
            }
        })
    }
}
