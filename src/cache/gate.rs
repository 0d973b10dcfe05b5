use crate::cache::key::CacheKey;
use crate::cache::store::{CacheEntry, CacheStore};
use crate::render::buffer::TileBuffer;
use std::sync::Arc;

/// Why a render skips the cache entirely.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BypassReason {
    /// Explicit refresh request. The upstream graph is asked to bypass its caches too.
    ForceRefresh,
    /// A user sub-region is active; exact geometric matches are too unlikely to be worth storing.
    UserRegion,
}

/// Outcome of consulting the cache for one render.
#[derive(Debug)]
pub enum CacheDecision {
    /// Display the stored result as is.
    Hit(Arc<CacheEntry>),
    /// Render, then publish through the reservation.
    Miss(Reservation),
    /// Render without lookup and without publishing.
    Bypass(BypassReason),
}

impl CacheDecision {
    /// Whether the upstream render should bypass its own caches.
    pub fn bypass_upstream_cache(&self) -> bool {
        matches!(self, Self::Bypass(BypassReason::ForceRefresh))
    }
}

/// Decides hit/miss/bypass and owns the publish/evict side of the cache.
#[derive(Clone)]
pub struct FrameCacheGate {
    store: Arc<dyn CacheStore>,
}

impl FrameCacheGate {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    /// Bypass rules are checked in order: force refresh, then user region. Only a genuine lookup
    /// miss yields a reservation.
    pub fn decide(&self, key: CacheKey, force_refresh: bool, user_region: bool) -> CacheDecision {
        let decision = if force_refresh {
            CacheDecision::Bypass(BypassReason::ForceRefresh)
        } else if user_region {
            CacheDecision::Bypass(BypassReason::UserRegion)
        } else {
            match self.store.lookup(&key) {
                Some(entry) => CacheDecision::Hit(entry),
                None => CacheDecision::Miss(Reservation {
                    key,
                    store: Arc::clone(&self.store),
                    published: false,
                }),
            }
        };
        match &decision {
            CacheDecision::Hit(_) => tracing::debug!(key = %key.fingerprint(), "viewer cache hit"),
            CacheDecision::Miss(_) => {
                tracing::debug!(key = %key.fingerprint(), "viewer cache miss")
            }
            CacheDecision::Bypass(reason) => {
                tracing::debug!(key = %key.fingerprint(), ?reason, "viewer cache bypass")
            }
        }
        decision
    }
}

/// The right to publish a render result under one key.
///
/// Dropping it unpublished evicts anything stored under the key, so an aborted or failed render
/// never leaves a result behind.
#[derive(Debug)]
pub struct Reservation {
    key: CacheKey,
    store: Arc<dyn CacheStore>,
    published: bool,
}

impl Reservation {
    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    /// Transfer `buffer` into the cache.
    pub fn publish(mut self, buffer: TileBuffer) -> Arc<CacheEntry> {
        self.published = true;
        self.store.insert(self.key, buffer)
    }
}

impl Drop for Reservation {
    fn drop(&mut self) {
        if !self.published {
            tracing::debug!(key = %self.key.fingerprint(), "evicting unpublished reservation");
            self.store.evict_key(&self.key);
        }
    }
}

impl std::fmt::Debug for dyn CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CacheStore")
    }
}
