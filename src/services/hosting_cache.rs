use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use regex::Regex;

use crate::services::resolver::HostingConfig;

/// Share of the capacity freed at once when the cache is full
const EVICTION_DIVISOR: usize = 10;

/// Process-local cache of resolved configs keyed by request host.
///
/// Entries expire after a TTL and are dropped early by invalidation events:
/// a plain key removes that host, a key starting with `^` removes every host
/// the pattern matches. The number of entries never exceeds the capacity.
///
/// Every invalidation bumps a generation counter. A resolution started
/// before an invalidation is not stored, so it cannot outlive it.
#[derive(Clone)]
pub struct HostingCache {
    ttl: Duration,
    capacity: usize,
    entries: Arc<DashMap<String, CacheEntry>>,
    generation: Arc<AtomicU64>,
}

struct CacheEntry {
    configs: Arc<Vec<HostingConfig>>,
    stored_at: Instant,
}

impl HostingCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            ttl,
            capacity,
            entries: Arc::new(DashMap::new()),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn get(&self, host: &str) -> Option<Arc<Vec<HostingConfig>>> {
        if let Some(entry) = self.entries.get(host) {
            if entry.stored_at.elapsed() < self.ttl {
                return Some(entry.configs.clone());
            }
        }

        // Expired entries are dropped on read
        self.entries
            .remove_if(host, |_, e| e.stored_at.elapsed() >= self.ttl);
        None
    }

    /// Current generation; take it before resolving and hand it to [`insert`](Self::insert)
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Store a resolution made at `generation`. The configs are returned but
    /// not stored when an invalidation happened since.
    pub fn insert(
        &self,
        host: &str,
        configs: Vec<HostingConfig>,
        generation: u64,
    ) -> Arc<Vec<HostingConfig>> {
        let configs = Arc::new(configs);
        if self.capacity == 0 || self.generation() != generation {
            return configs;
        }

        if self.entries.len() >= self.capacity && !self.entries.contains_key(host) {
            self.make_room();
        }

        self.entries.insert(
            host.to_string(),
            CacheEntry {
                configs: configs.clone(),
                stored_at: Instant::now(),
            },
        );

        // An invalidation running concurrently may have missed the new entry
        if self.generation() != generation {
            self.entries
                .remove_if(host, |_, e| Arc::ptr_eq(&e.configs, &configs));
        }

        configs
    }

    /// Drop expired entries, then arbitrary ones until a batch of slots is free
    fn make_room(&self) {
        self.entries
            .retain(|_, e| e.stored_at.elapsed() < self.ttl);

        let batch = (self.capacity / EVICTION_DIVISOR).max(1);
        let target = self.capacity.saturating_sub(batch);
        let excess = self.entries.len().saturating_sub(target);
        if excess == 0 {
            return;
        }

        let victims: Vec<String> = self
            .entries
            .iter()
            .take(excess)
            .map(|e| e.key().clone())
            .collect();
        for host in &victims {
            self.entries.remove(host);
        }

        tracing::debug!(evicted = victims.len(), "Hosting cache full");
    }

    /// Drop the entries a cache key refers to; returns how many were removed
    pub fn invalidate(&self, key: &str) -> usize {
        self.generation.fetch_add(1, Ordering::SeqCst);

        if !key.starts_with('^') {
            return usize::from(self.entries.remove(&key.to_ascii_lowercase()).is_some());
        }

        match Regex::new(key) {
            Ok(pattern) => {
                let mut removed = 0;
                self.entries.retain(|host, _| {
                    let keep = !pattern.is_match(host);
                    if !keep {
                        removed += 1;
                    }
                    keep
                });
                removed
            }
            Err(e) => {
                tracing::warn!(key, error = %e, "Invalid cache key pattern, clearing cache");
                let removed = self.entries.len();
                self.entries.clear();
                removed
            }
        }
    }

    pub fn clear(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
