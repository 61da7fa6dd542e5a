//! The authoritative cache store: owns key-value entries, enforces the byte budget, and drives
//! an [`EvictionPolicy`] to make room when a SET would otherwise overflow `maxmem`.

use std::collections::HashMap;
use std::sync::Mutex;

use tracing::debug;

use crate::error::{CacheError, Result};
use crate::policy::EvictionPolicy;

struct State {
    store: HashMap<String, Vec<u8>>,
    used: usize,
    policy: Option<Box<dyn EvictionPolicy>>,
}

/// A concurrent, bounded-capacity, byte-accounted key-value cache.
///
/// All five operations (`set`, `get`, `del`, `reset`, `space_used`) are atomic with respect to
/// each other: a single [`Mutex`] guards the store, the running byte total, and the eviction
/// policy together, so a GET's recency touch can never race an eviction's victim selection.
///
/// Oversized SETs, and SETs that cannot be made to fit (including the case where no policy is
/// configured at all), fail silently: `space_used()` and a subsequent `get()` are the only
/// observable signals. With no policy configured, a cache that is full stays full forever —
/// this is intentional, matching the source cache's behavior of only evicting on demand.
pub struct CacheEngine {
    maxmem: usize,
    state: Mutex<State>,
}

impl std::fmt::Debug for CacheEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheEngine")
            .field("maxmem", &self.maxmem)
            .finish_non_exhaustive()
    }
}

impl CacheEngine {
    /// Creates a new engine with the given byte budget and optional eviction policy.
    ///
    /// `load_factor_hint` only sizes the initial capacity reserved in the backing map; it has no
    /// effect on behavior. A `policy` of `None` disables eviction entirely.
    pub fn new(
        maxmem: usize,
        load_factor_hint: usize,
        policy: Option<Box<dyn EvictionPolicy>>,
    ) -> Result<Self> {
        if maxmem == 0 {
            return Err(CacheError::ZeroCapacity);
        }
        Ok(Self {
            maxmem,
            state: Mutex::new(State {
                store: HashMap::with_capacity(load_factor_hint),
                used: 0,
                policy,
            }),
        })
    }

    /// The immutable byte budget this engine was constructed with.
    pub fn maxmem(&self) -> usize {
        self.maxmem
    }

    /// Inserts `size` bytes of `bytes` under `key`, evicting as needed to stay within budget.
    ///
    /// Silently does nothing if `key` is empty, `size` is zero, `size` exceeds `maxmem`, `size`
    /// exceeds `bytes.len()`, or the cache cannot make room (no policy configured, or the policy
    /// runs out of victims before enough space is freed).
    pub fn set(&self, key: &str, bytes: &[u8], size: usize) {
        if key.is_empty() || size == 0 || size > self.maxmem {
            debug!(key, size, maxmem = self.maxmem, "rejected invalid or oversized SET");
            return;
        }
        let Some(payload) = bytes.get(..size) else {
            debug!(key, size, buffer_len = bytes.len(), "rejected SET with undersized buffer");
            return;
        };

        let mut state = self.state.lock().expect("cache mutex poisoned");

        // Overwrite: remove the old entry first so its bytes aren't double-counted against the
        // deficit we're about to compute, and so the policy sees a fresh insertion.
        if let Some(old) = state.store.remove(key) {
            state.used -= old.len();
            if let Some(policy) = state.policy.as_mut() {
                policy.forget(key);
            }
        }

        while state.used + size > self.maxmem {
            let Some(policy) = state.policy.as_mut() else {
                debug!(key, "aborted SET: no eviction policy configured and cache is full");
                return;
            };
            let Some(victim) = policy.evict() else {
                debug!(key, "aborted SET: policy has no more victims to offer");
                return;
            };
            if let Some(evicted) = state.store.remove(&victim) {
                state.used -= evicted.len();
                debug!(victim = victim.as_str(), "evicted entry to make room");
            }
            // A victim not present in the store is a stale policy entry; just loop again.
        }

        state.store.insert(key.to_string(), payload.to_vec());
        state.used += size;
        if let Some(policy) = state.policy.as_mut() {
            policy.touch(key);
        }
    }

    /// Returns a fresh owned copy of the bytes stored under `key`, or `None` on a miss.
    ///
    /// A hit counts as a touch for recency-based policies.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        let mut state = self.state.lock().expect("cache mutex poisoned");
        let value = state.store.get(key).cloned();
        if value.is_some() {
            if let Some(policy) = state.policy.as_mut() {
                policy.touch(key);
            }
        }
        value
    }

    /// Removes `key` if present, returning whether it was found.
    pub fn del(&self, key: &str) -> bool {
        let mut state = self.state.lock().expect("cache mutex poisoned");
        match state.store.remove(key) {
            Some(bytes) => {
                state.used -= bytes.len();
                if let Some(policy) = state.policy.as_mut() {
                    policy.forget(key);
                }
                true
            }
            None => false,
        }
    }

    /// The current sum of stored entry sizes.
    pub fn space_used(&self) -> usize {
        self.state.lock().expect("cache mutex poisoned").used
    }

    /// Drops every entry and clears the policy's tracked state.
    pub fn reset(&self) {
        let mut state = self.state.lock().expect("cache mutex poisoned");
        state.store.clear();
        state.used = 0;
        if let Some(policy) = state.policy.as_mut() {
            policy.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fifo::FifoPolicy;
    use crate::lru::LruPolicy;

    fn cstr(s: &str) -> Vec<u8> {
        let mut v = s.as_bytes().to_vec();
        v.push(0);
        v
    }

    #[test]
    fn basic_round_trip() {
        let cache = CacheEngine::new(64, 16, None).unwrap();
        let v1 = cstr("314159");
        cache.set("Item1", &v1, v1.len());
        let v2 = cstr("pi");
        cache.set("Item2", &v2, v2.len());

        assert_eq!(cache.get("Item1").unwrap(), v1);
        assert_eq!(cache.get("Item2").unwrap(), v2);
        assert_eq!(cache.space_used(), v1.len() + v2.len());
    }

    #[test]
    fn overwrite_replaces_value_and_size() {
        let cache = CacheEngine::new(64, 16, None).unwrap();
        let v1 = cstr("314159");
        cache.set("Item1", &v1, v1.len());
        let v2 = cstr("tau2");
        cache.set("Item1", &v2, v2.len());

        assert_eq!(cache.get("Item1").unwrap(), v2);
        assert_eq!(cache.space_used(), v2.len());
    }

    #[test]
    fn oversized_set_without_policy_is_a_silent_noop() {
        let cache = CacheEngine::new(10, 16, None).unwrap();
        let v = cstr("0123456789"); // 11 bytes > maxmem of 10
        cache.set("a", &v, v.len());

        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.space_used(), 0);
    }

    #[test]
    fn fifo_evicts_oldest_key_first() {
        let cache = CacheEngine::new(10, 16, Some(Box::new(FifoPolicy::new()))).unwrap();
        cache.set("k1", b"aaaa", 5);
        cache.set("k2", b"bbbb", 5);
        cache.set("k3", b"cccc", 5);

        assert_eq!(cache.get("k1"), None);
        assert_eq!(cache.get("k2").unwrap(), b"bbbb\0");
        assert_eq!(cache.get("k3").unwrap(), b"cccc\0");
        assert_eq!(cache.space_used(), 10);
    }

    #[test]
    fn lru_keeps_recently_touched_key() {
        let cache = CacheEngine::new(10, 16, Some(Box::new(LruPolicy::new()))).unwrap();
        cache.set("k1", b"aaaa", 5);
        cache.set("k2", b"bbbb", 5);
        cache.get("k1");
        cache.set("k3", b"cccc", 5);

        assert_eq!(cache.get("k1").unwrap(), b"aaaa\0");
        assert_eq!(cache.get("k2"), None);
        assert_eq!(cache.get("k3").unwrap(), b"cccc\0");
    }

    #[test]
    fn reset_clears_everything_and_cache_is_usable_after() {
        let cache = CacheEngine::new(64, 16, Some(Box::new(LruPolicy::new()))).unwrap();
        cache.set("a", b"1", 1);
        cache.set("b", b"2", 1);
        cache.reset();

        assert_eq!(cache.space_used(), 0);
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), None);

        cache.set("c", b"3", 1);
        assert_eq!(cache.get("c").unwrap(), b"3");

        cache.reset();
        cache.reset(); // idempotent
        assert_eq!(cache.space_used(), 0);
    }

    #[test]
    fn del_absent_key_returns_false() {
        let cache = CacheEngine::new(64, 16, None).unwrap();
        assert!(!cache.del("missing"));
        cache.set("present", b"x", 1);
        assert!(cache.del("present"));
        assert!(!cache.del("present"));
    }

    #[test]
    fn zero_length_value_is_rejected() {
        let cache = CacheEngine::new(64, 16, None).unwrap();
        cache.set("empty", b"", 0);
        assert_eq!(cache.get("empty"), None);
    }

    #[test]
    fn zero_capacity_construction_fails() {
        assert_eq!(CacheEngine::new(0, 16, None).unwrap_err(), CacheError::ZeroCapacity);
    }

    #[test]
    fn deep_copy_is_independent_of_caller_buffers() {
        let cache = CacheEngine::new(64, 16, None).unwrap();
        let mut input = vec![1u8, 2, 3];
        cache.set("k", &input, input.len());
        input[0] = 99; // mutate caller's buffer after SET

        let mut out = cache.get("k").unwrap();
        assert_eq!(out, vec![1, 2, 3]);
        out[0] = 42; // mutate caller's output buffer after GET
        assert_eq!(cache.get("k").unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn eviction_of_key_covering_full_deficit_is_sufficient() {
        let cache = CacheEngine::new(10, 16, Some(Box::new(FifoPolicy::new()))).unwrap();
        cache.set("big", b"0123456789", 10);
        cache.set("small", b"x", 1);

        // "big" alone covers the 1-byte deficit; only one eviction should occur.
        assert_eq!(cache.get("big"), None);
        assert_eq!(cache.get("small").unwrap(), b"x");
        assert_eq!(cache.space_used(), 1);
    }
}
