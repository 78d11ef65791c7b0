//! Optional nonce replay guard.
//!
//! The signing scheme itself only bounds replay by the timestamp window: a
//! captured request can be resent verbatim until its timestamp expires.
//! [`NonceCache`] closes that gap by remembering every (access key, nonce)
//! pair for a TTL and rejecting repeats. It is not enabled by default.

use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;

/// Default capacity of a [`NonceCache`].
pub const DEFAULT_MAX_ENTRIES: usize = 100_000;

/// Concurrent TTL cache of seen nonces.
///
/// The TTL should be at least twice the acceptable clock skew so that a
/// request cannot be replayed at the far edge of its validity window. An
/// entry stays live while `now - first_seen <= ttl`, matching the inclusive
/// timestamp window.
#[derive(Debug)]
pub struct NonceCache {
    seen: DashMap<(String, String), i64>,
    ttl: Duration,
    max_entries: usize,
}

impl NonceCache {
    /// Create a cache holding at most `max_entries` nonces for `ttl` each.
    #[must_use]
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            seen: DashMap::with_capacity(max_entries.min(1024)),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    /// Create a cache whose TTL covers the full window of `acceptable_skew`.
    #[must_use]
    pub fn for_skew(acceptable_skew: Duration) -> Self {
        Self::new(acceptable_skew * 2, DEFAULT_MAX_ENTRIES)
    }

    /// Record the nonce, returning `false` if it was already seen within the TTL.
    pub fn check_and_insert(&self, access_key: &str, nonce: &str, now: i64) -> bool {
        if self.seen.len() >= self.max_entries {
            self.purge_expired(now);
            if self.seen.len() >= self.max_entries {
                self.evict_oldest();
            }
        }

        let ttl = self.ttl_secs();
        match self.seen.entry((access_key.to_owned(), nonce.to_owned())) {
            Entry::Occupied(mut entry) => {
                if now.saturating_sub(*entry.get()) <= ttl {
                    debug!(access_key, "nonce replay detected");
                    false
                } else {
                    entry.insert(now);
                    true
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(now);
                true
            }
        }
    }

    /// Drop entries older than the TTL.
    pub fn purge_expired(&self, now: i64) {
        let ttl = self.ttl_secs();
        self.seen
            .retain(|_, first_seen| now.saturating_sub(*first_seen) <= ttl);
    }

    /// Number of tracked nonces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Whether no nonces are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    fn ttl_secs(&self) -> i64 {
        i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX)
    }

    fn evict_oldest(&self) {
        let oldest = self
            .seen
            .iter()
            .min_by_key(|entry| *entry.value())
            .map(|entry| entry.key().clone());
        if let Some(key) = oldest {
            self.seen.remove(&key);
        }
    }
}
