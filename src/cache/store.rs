use crate::cache::key::CacheKey;
use crate::geometry::mip::TextureRect;
use crate::render::buffer::{PixelFormat, TileBuffer};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

/// Published render result. Immutable once constructed.
#[derive(Debug)]
pub struct CacheEntry {
    key: CacheKey,
    texture: TextureRect,
    format: PixelFormat,
    data: Box<[u8]>,
}

impl CacheEntry {
    /// Take ownership of a finished render buffer.
    pub fn from_buffer(key: CacheKey, buffer: TileBuffer) -> Self {
        let (texture, format, data) = buffer.into_parts();
        Self {
            key,
            texture,
            format,
            data: data.into_boxed_slice(),
        }
    }

    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    pub fn texture(&self) -> &TextureRect {
        &self.texture
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn byte_len(&self) -> usize {
        self.data.len()
    }
}

/// Change notification delivered to cache observers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheEvent {
    Inserted { key: CacheKey },
    Evicted { key: CacheKey },
}

/// Callback registered with [`CacheStore::subscribe`].
pub type CacheObserver = Box<dyn Fn(&CacheEvent) + Send + Sync>;

/// Storage contract the viewer caches render results through.
pub trait CacheStore: Send + Sync {
    /// Entry stored under `key`, if any.
    fn lookup(&self, key: &CacheKey) -> Option<Arc<CacheEntry>>;

    /// Publish `buffer` under `key`, replacing any previous entry.
    fn insert(&self, key: CacheKey, buffer: TileBuffer) -> Arc<CacheEntry>;

    /// Remove `entry` if it is still the one stored under its key.
    fn evict(&self, entry: &CacheEntry);

    /// Remove whatever is stored under `key`.
    fn evict_key(&self, key: &CacheKey) {
        if let Some(e) = self.lookup(key) {
            self.evict(&e);
        }
    }

    /// Register an observer for insertions and evictions.
    fn subscribe(&self, observer: CacheObserver);
}

/// Limits for [`InMemoryFrameCache`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct InMemoryCacheOpts {
    /// Maximum bytes retained across all entries.
    pub max_bytes: usize,
    /// Maximum number of retained entries.
    pub max_entries: usize,
}

impl Default for InMemoryCacheOpts {
    fn default() -> Self {
        Self {
            max_bytes: 512 * 1024 * 1024,
            max_entries: 256,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub bytes: usize,
    pub hits: u64,
    pub misses: u64,
    pub inserts: u64,
    pub evictions: u64,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<CacheKey, Arc<CacheEntry>>,
    // Least recently used first. Linear scans are fine at entry granularity.
    order: VecDeque<CacheKey>,
    stats: CacheStats,
}

impl Inner {
    fn remove(&mut self, key: &CacheKey) -> Option<Arc<CacheEntry>> {
        let e = self.entries.remove(key)?;
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            self.order.remove(pos);
        }
        self.stats.entries = self.entries.len();
        self.stats.bytes = self.stats.bytes.saturating_sub(e.byte_len());
        Some(e)
    }

    fn touch(&mut self, key: &CacheKey) {
        if let Some(pos) = self.order.iter().position(|k| k == key)
            && let Some(k) = self.order.remove(pos)
        {
            self.order.push_back(k);
        }
    }
}

/// Bounded in-process frame cache with least-recently-used eviction.
///
/// An entry larger than `max_bytes` on its own is still stored, after evicting everything else.
pub struct InMemoryFrameCache {
    opts: InMemoryCacheOpts,
    inner: Mutex<Inner>,
    observers: RwLock<Vec<CacheObserver>>,
}

impl InMemoryFrameCache {
    pub fn new(opts: InMemoryCacheOpts) -> Self {
        Self {
            opts,
            inner: Mutex::new(Inner::default()),
            observers: RwLock::new(Vec::new()),
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.lock().stats
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    // Called without the entry lock held so observers may query the cache.
    fn notify(&self, events: &[CacheEvent]) {
        if events.is_empty() {
            return;
        }
        let observers = self.observers.read().unwrap_or_else(|e| e.into_inner());
        for ev in events {
            for o in observers.iter() {
                o(ev);
            }
        }
    }
}

impl Default for InMemoryFrameCache {
    fn default() -> Self {
        Self::new(InMemoryCacheOpts::default())
    }
}

impl CacheStore for InMemoryFrameCache {
    fn lookup(&self, key: &CacheKey) -> Option<Arc<CacheEntry>> {
        let mut inner = self.lock();
        match inner.entries.get(key).cloned() {
            Some(e) => {
                inner.stats.hits = inner.stats.hits.saturating_add(1);
                inner.touch(key);
                Some(e)
            }
            None => {
                inner.stats.misses = inner.stats.misses.saturating_add(1);
                None
            }
        }
    }

    fn insert(&self, key: CacheKey, buffer: TileBuffer) -> Arc<CacheEntry> {
        let entry = Arc::new(CacheEntry::from_buffer(key, buffer));
        let bytes = entry.byte_len();
        let mut events = Vec::new();
        {
            let mut inner = self.lock();
            if inner.remove(&key).is_some() {
                events.push(CacheEvent::Evicted { key });
            }
            while !inner.order.is_empty()
                && (inner.stats.bytes.saturating_add(bytes) > self.opts.max_bytes
                    || inner.entries.len() >= self.opts.max_entries)
            {
                let Some(oldest) = inner.order.front().copied() else {
                    break;
                };
                inner.remove(&oldest);
                inner.stats.evictions = inner.stats.evictions.saturating_add(1);
                events.push(CacheEvent::Evicted { key: oldest });
            }
            inner.entries.insert(key, Arc::clone(&entry));
            inner.order.push_back(key);
            inner.stats.entries = inner.entries.len();
            inner.stats.bytes = inner.stats.bytes.saturating_add(bytes);
            inner.stats.inserts = inner.stats.inserts.saturating_add(1);
        }
        tracing::debug!(key = %key.fingerprint(), bytes, "cache insert");
        events.push(CacheEvent::Inserted { key });
        self.notify(&events);
        entry
    }

    fn evict(&self, entry: &CacheEntry) {
        let key = *entry.key();
        let removed = {
            let mut inner = self.lock();
            let same = inner
                .entries
                .get(&key)
                .is_some_and(|e| std::ptr::eq(Arc::as_ptr(e), entry));
            if same {
                inner.remove(&key);
                inner.stats.evictions = inner.stats.evictions.saturating_add(1);
            }
            same
        };
        if removed {
            tracing::debug!(key = %key.fingerprint(), "cache evict");
            self.notify(&[CacheEvent::Evicted { key }]);
        }
    }

    fn evict_key(&self, key: &CacheKey) {
        let removed = {
            let mut inner = self.lock();
            let removed = inner.remove(key).is_some();
            if removed {
                inner.stats.evictions = inner.stats.evictions.saturating_add(1);
            }
            removed
        };
        if removed {
            tracing::debug!(key = %key.fingerprint(), "cache evict");
            self.notify(&[CacheEvent::Evicted { key: *key }]);
        }
    }

    fn subscribe(&self, observer: CacheObserver) {
        self.observers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(observer);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/cache/store.rs"]
mod tests;
