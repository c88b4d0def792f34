//! Concurrency tests for the memoization caches.
//!
//! Many threads hit the same key at once; the wrapped callable must still
//! run exactly once for it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Barrier;
use std::thread;
use std::time::Duration;

use fallible_core::{Callable, MemoConfig, Memoize, Never, Outcome};

const THREADS: usize = 8;

fn slow_square(calls: &AtomicUsize) -> impl Fn(u64) -> Outcome<u64> + Sync + '_ {
    move |x: u64| {
        calls.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(20));
        Ok(x * x)
    }
}

#[test]
fn concurrent_misses_on_one_key_compute_once() {
    let calls = AtomicUsize::new(0);
    let cached = slow_square(&calls).memoized();
    let barrier = Barrier::new(THREADS);

    thread::scope(|s| {
        for _ in 0..THREADS {
            s.spawn(|| {
                barrier.wait();
                assert_eq!(cached.invoke((5,)).unwrap(), 25);
            });
        }
    });

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(cached.stats().misses, 1);
    assert_eq!(cached.stats().hits, THREADS as u64 - 1);
}

#[test]
fn sharded_cache_computes_each_key_once() {
    let calls = AtomicUsize::new(0);
    let cached = slow_square(&calls).memoized_with(MemoConfig::default().with_shards(4));
    let barrier = Barrier::new(THREADS);

    thread::scope(|s| {
        for t in 0..THREADS {
            let cached = &cached;
            let barrier = &barrier;
            s.spawn(move || {
                barrier.wait();
                // Every thread walks the same keys, starting at a different one.
                for i in 0..4u64 {
                    let key = (t as u64 + i) % 4;
                    assert_eq!(cached.invoke((key,)).unwrap(), key * key);
                }
            });
        }
    });

    assert_eq!(calls.load(Ordering::SeqCst), 4);
    assert_eq!(cached.len(), 4);
}

#[test]
fn concurrent_supplier_computes_once() {
    let calls = AtomicUsize::new(0);
    let supplier = || -> Outcome<String, Never> {
        calls.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(20));
        Ok("config loaded".to_string())
    };
    let cached = supplier.memoized();
    let barrier = Barrier::new(THREADS);

    thread::scope(|s| {
        for _ in 0..THREADS {
            s.spawn(|| {
                barrier.wait();
                assert_eq!(cached.invoke(()).unwrap(), "config loaded");
            });
        }
    });

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(cached.is_populated());
}

#[test]
fn failed_supplier_is_retried() {
    let attempts = AtomicUsize::new(0);
    let supplier = || -> Outcome<u32, std::io::Error> {
        if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
            Err(std::io::Error::other("not yet").into())
        } else {
            Ok(7)
        }
    };
    let cached = supplier.memoized();

    assert!(cached.invoke(()).is_err());
    assert!(!cached.is_populated());
    assert_eq!(cached.invoke(()).unwrap(), 7);
    assert_eq!(cached.invoke(()).unwrap(), 7);
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}
