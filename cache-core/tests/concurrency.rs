//! Exercises the engine from many threads at once to check that its locking leaves `space_used`
//! and stored entries internally consistent, independent of which eviction policy is in play.

use std::sync::Arc;
use std::thread;

use cache_core::{CacheEngine, FifoPolicy, LruPolicy};

#[test]
fn disjoint_keys_from_many_threads_leave_used_consistent() {
    let cache = Arc::new(CacheEngine::new(10_000, 64, Some(Box::new(LruPolicy::new()))).unwrap());

    thread::scope(|scope| {
        for t in 0..8 {
            let cache = Arc::clone(&cache);
            scope.spawn(move || {
                for i in 0..50 {
                    let key = format!("t{t}-k{i}");
                    cache.set(&key, b"0123456789", 10);
                }
            });
        }
    });

    assert_eq!(cache.space_used(), 8 * 50 * 10);
}

#[test]
fn shared_key_pool_stays_internally_consistent() {
    let cache = Arc::new(CacheEngine::new(1_000, 64, Some(Box::new(FifoPolicy::new()))).unwrap());
    let keys: Vec<String> = (0..16).map(|i| format!("shared-{i}")).collect();

    thread::scope(|scope| {
        for t in 0..8 {
            let cache = Arc::clone(&cache);
            let keys = keys.clone();
            scope.spawn(move || {
                for round in 0..200 {
                    let key = &keys[(round + t) % keys.len()];
                    match round % 3 {
                        0 => cache.set(key, b"abcde", 5),
                        1 => {
                            cache.get(key);
                        }
                        _ => {
                            cache.del(key);
                        }
                    }
                }
            });
        }
    });

    // Whatever state the cache landed in, space_used must equal the sum of live entry
    // sizes, and every key that round-trips via get() must come back at exactly 5 bytes.
    let mut recomputed = 0usize;
    for key in &keys {
        if let Some(bytes) = cache.get(key) {
            assert_eq!(bytes.len(), 5);
            recomputed += bytes.len();
        }
    }
    assert_eq!(cache.space_used(), recomputed);
}
