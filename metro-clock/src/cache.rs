//! TTL cache for upstream responses.
//!
//! Every key owns a slot guarded by an async mutex. A caller that finds its
//! slot stale keeps the lock while the loader runs, so concurrent callers for
//! the same key queue behind it and then observe the fresh value instead of
//! issuing a second upstream request.
//!
//! Entries are never evicted: the key space is small and fixed (one entry per
//! station, stop or feed), so staleness is the only thing that matters.

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use moka::future::Cache as MokaCache;
use tokio::sync::Mutex as SlotLock;
use tracing::debug;

/// Source of the current time for freshness checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when advanced explicitly.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(|e| e.into_inner());
        *offset += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let offset = self.offset.lock().unwrap_or_else(|e| e.into_inner());
        self.origin + *offset
    }
}

/// A cached value and the moment its load started.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    fetched_at: Instant,
    value: V,
}

impl<V> CacheEntry<V> {
    fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.fetched_at) < ttl
    }
}

type Slot<V> = Arc<SlotLock<Option<CacheEntry<V>>>>;

/// Per-key memoization with a caller-supplied TTL.
pub struct TtlCache<V> {
    /// One slot per key. Moka coalesces concurrent slot creation.
    slots: MokaCache<String, Slot<V>>,
    clock: Arc<dyn Clock>,
}

impl<V> TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Create a cache driven by the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create a cache driven by the given clock.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            slots: MokaCache::builder().build(),
            clock,
        }
    }

    async fn slot(&self, key: &str) -> Slot<V> {
        self.slots
            .get_with(key.to_string(), async { Arc::new(SlotLock::new(None)) })
            .await
    }

    /// Return the cached value for `key` if it is younger than `ttl`,
    /// otherwise run `loader` and cache its result.
    ///
    /// A failed load propagates the error and leaves any previous entry in
    /// place. At most one load per key is in flight at a time.
    pub async fn get_or_load<F, Fut, E>(&self, key: &str, ttl: Duration, loader: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let slot = self.slot(key).await;
        let mut entry = slot.lock().await;

        let now = self.clock.now();
        if let Some(cached) = entry.as_ref()
            && cached.is_fresh(now, ttl)
        {
            debug!(key, "cache hit");
            return Ok(cached.value.clone());
        }

        debug!(key, ttl_secs = ttl.as_secs(), "cache miss, loading");
        let value = loader().await?;
        *entry = Some(CacheEntry {
            fetched_at: now,
            value: value.clone(),
        });

        Ok(value)
    }

    /// The last value stored under `key`, fresh or not.
    #[cfg(test)]
    pub(crate) async fn peek(&self, key: &str) -> Option<V> {
        let slot = self.slots.get(key).await?;
        let entry = slot.lock().await;
        entry.as_ref().map(|e| e.value.clone())
    }
}

impl<V> Default for TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
