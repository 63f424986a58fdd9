use std::collections::HashMap;
use std::future::Future;
use std::num::NonZeroUsize;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::CacheConfig;
use crate::error::{AppError, Result};

/// Eviction policy selected at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CacheStrategy {
    None,
    Map,
    Lru,
}

impl FromStr for CacheStrategy {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "lru" | "true" => Ok(CacheStrategy::Lru),
            "map" => Ok(CacheStrategy::Map),
            "none" | "noop" | "false" | "off" => Ok(CacheStrategy::None),
            other => Err(AppError::InvalidConfig(format!(
                "unknown cache strategy '{}' (expected lru, map or none)",
                other
            ))),
        }
    }
}

impl TryFrom<String> for CacheStrategy {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<CacheStrategy> for String {
    fn from(strategy: CacheStrategy) -> Self {
        strategy.to_string()
    }
}

impl std::fmt::Display for CacheStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheStrategy::None => write!(f, "none"),
            CacheStrategy::Map => write!(f, "map"),
            CacheStrategy::Lru => write!(f, "lru"),
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn new(value: V, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub current_size: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

enum Store<V> {
    NoOp,
    Map(HashMap<String, CacheEntry<V>>),
    Lru(LruCache<String, CacheEntry<V>>),
}

impl<V: Clone> Store<V> {
    /// Returns a live value, dropping the entry if it has expired.
    fn lookup(&mut self, key: &str) -> Option<V> {
        match self {
            Store::NoOp => None,
            Store::Map(map) => {
                let live = map
                    .get(key)
                    .filter(|entry| !entry.is_expired())
                    .map(|entry| entry.value.clone());
                if live.is_none() {
                    map.remove(key);
                }
                live
            }
            Store::Lru(lru) => {
                let live = lru
                    .get(key)
                    .filter(|entry| !entry.is_expired())
                    .map(|entry| entry.value.clone());
                if live.is_none() {
                    lru.pop(key);
                }
                live
            }
        }
    }

    /// Stores the entry and reports whether another key had to be evicted.
    fn insert(&mut self, key: &str, entry: CacheEntry<V>) -> bool {
        match self {
            Store::NoOp => false,
            Store::Map(map) => {
                map.insert(key.to_string(), entry);
                false
            }
            Store::Lru(lru) => matches!(
                lru.push(key.to_string(), entry),
                Some((evicted, _)) if evicted != key
            ),
        }
    }

    fn len(&self) -> usize {
        match self {
            Store::NoOp => 0,
            Store::Map(map) => map.len(),
            Store::Lru(lru) => lru.len(),
        }
    }

    fn contains(&self, key: &str) -> bool {
        match self {
            Store::NoOp => false,
            Store::Map(map) => map.contains_key(key),
            Store::Lru(lru) => lru.contains(key),
        }
    }
}

struct Inner<V> {
    store: Store<V>,
    stats: CacheStats,
}

/// Memoizes expensive computations for a short window.
///
/// The lock is only held while reading or writing an entry, never while
/// `compute` runs, so two concurrent misses on the same key may both compute.
pub struct ResponseCache<V> {
    inner: Arc<Mutex<Inner<V>>>,
    strategy: CacheStrategy,
    ttl: Duration,
}

impl<V> Clone for ResponseCache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            strategy: self.strategy,
            ttl: self.ttl,
        }
    }
}

impl<V: Clone> ResponseCache<V> {
    pub fn new(strategy: CacheStrategy, ttl: Duration, max_size: usize) -> Result<Self> {
        let store = match strategy {
            CacheStrategy::None => Store::NoOp,
            CacheStrategy::Map => Store::Map(HashMap::new()),
            CacheStrategy::Lru => {
                let capacity = NonZeroUsize::new(max_size).ok_or_else(|| {
                    AppError::InvalidConfig("LRU cache capacity must be greater than 0".to_string())
                })?;
                Store::Lru(LruCache::new(capacity))
            }
        };

        if strategy != CacheStrategy::None && ttl.is_zero() {
            return Err(AppError::InvalidConfig(
                "Cache TTL must be greater than 0".to_string(),
            ));
        }

        Ok(Self {
            inner: Arc::new(Mutex::new(Inner {
                store,
                stats: CacheStats::default(),
            })),
            strategy,
            ttl,
        })
    }

    pub fn no_op() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                store: Store::NoOp,
                stats: CacheStats::default(),
            })),
            strategy: CacheStrategy::None,
            ttl: Duration::ZERO,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        Self::new(
            config.strategy,
            Duration::from_secs(config.ttl_seconds),
            config.max_size,
        )
    }

    pub fn strategy(&self) -> CacheStrategy {
        self.strategy
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the live value stored under `key`, or runs `compute` and
    /// stores its output with a fresh expiry.
    pub async fn cached<F, Fut>(&self, key: &str, compute: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        if self.strategy == CacheStrategy::None {
            return compute().await;
        }

        {
            let mut inner = self.inner.lock();
            if let Some(value) = inner.store.lookup(key) {
                inner.stats.hits += 1;
                debug!("Cache hit for key: {}", key);
                return value;
            }
            inner.stats.misses += 1;
        }

        debug!("Cache miss for key: {}", key);
        let value = compute().await;

        let mut inner = self.inner.lock();
        if inner.store.insert(key, CacheEntry::new(value.clone(), self.ttl)) {
            inner.stats.evictions += 1;
            debug!("Evicted least recently used entry to make room for key: {}", key);
        }
        let size = inner.store.len();
        inner.stats.current_size = size;
        debug!("Cached value for key: {} (TTL: {:?})", key, self.ttl);

        value
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.lock().store.contains(key)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            current_size: inner.store.len(),
            ..inner.stats.clone()
        }
    }
}
