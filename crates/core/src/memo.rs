//! # Memoization Cache
//!
//! Opt-in caching for pure callables. The cache maps the whole input tuple
//! (by value equality) to the output computed for it.
//!
//! ## Concurrency contract
//!
//! - Each key is computed at most once: a miss is computed and stored while
//!   the lock covering that key is held.
//! - With the default [`MemoConfig`] there is a single lock for the whole
//!   cache, so concurrent misses on *different* keys are serialized too.
//!   `with_shards(n)` splits the association into `n` independently locked
//!   maps; a key always lands on the same shard, so at-most-once still holds.
//! - Zero-input callables use a single slot instead: reads after the first
//!   successful computation do not take a lock.
//! - The lock is held while the wrapped callable runs, and it is not
//!   reentrant. A callable that invokes its own wrapper again (a recursive
//!   function reaching its cache through an `Arc`, say) deadlocks.
//!
//! Entries are never evicted. The cache lives as long as the wrapper.
//! Failures are not cached; a failed key is recomputed on the next call.
//!
//! Memoizing a callable with side effects is the caller's responsibility:
//! the wrapper assumes the result depends only on the inputs.

use std::collections::hash_map::RandomState;
use std::collections::HashMap;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use crate::callable::{Callable, Inputs};
use crate::error::Outcome;

// ============================================================================
// Configuration
// ============================================================================

/// Configuration for a memoization cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoConfig {
    /// Number of independently locked maps. `1` is a single coarse lock.
    pub shards: usize,
    /// Capacity reserved up front in each shard.
    pub initial_capacity: usize,
}

impl Default for MemoConfig {
    fn default() -> Self {
        Self {
            shards: 1,
            initial_capacity: 0,
        }
    }
}

impl MemoConfig {
    /// Set the number of shards. Values below one are treated as one.
    pub fn with_shards(mut self, shards: usize) -> Self {
        self.shards = shards.max(1);
        self
    }

    /// Reserve capacity in each shard.
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }
}

/// Hit and miss counters of a cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoStats {
    pub hits: u64,
    pub misses: u64,
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Counters {
    fn hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    fn miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> MemoStats {
        MemoStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

// A panic inside the wrapped callable happens before the map is touched, so
// a poisoned guard still protects a consistent map.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// Multi-input cache
// ============================================================================

/// Caching wrapper for callables with one or more inputs.
pub struct Memoized<C, Args>
where
    Args: Inputs,
    C: Callable<Args>,
{
    inner: C,
    shards: Vec<Mutex<HashMap<Args, C::Output>>>,
    hasher: RandomState,
    config: MemoConfig,
    counters: Counters,
}

impl<C, Args> Memoized<C, Args>
where
    Args: Inputs + Eq + Hash + Clone,
    C: Callable<Args>,
    C::Output: Clone,
{
    pub fn new(inner: C) -> Self {
        Self::with_config(inner, MemoConfig::default())
    }

    pub fn with_config(inner: C, config: MemoConfig) -> Self {
        let config = MemoConfig {
            shards: config.shards.max(1),
            ..config
        };
        let shards = (0..config.shards)
            .map(|_| Mutex::new(HashMap::with_capacity(config.initial_capacity)))
            .collect();
        Self {
            inner,
            shards,
            hasher: RandomState::new(),
            config,
            counters: Counters::default(),
        }
    }

    /// Already memoized: returns `self` without adding another layer.
    pub fn memoized(self) -> Self {
        self
    }

    fn shard(&self, args: &Args) -> &Mutex<HashMap<Args, C::Output>> {
        if self.shards.len() == 1 {
            return &self.shards[0];
        }
        let index = self.hasher.hash_one(args) as usize % self.shards.len();
        &self.shards[index]
    }

    /// Whether a result for `args` is stored.
    pub fn contains(&self, args: &Args) -> bool {
        lock(self.shard(args)).contains_key(args)
    }

    /// Number of stored results.
    pub fn len(&self) -> usize {
        self.shards.iter().map(|shard| lock(shard).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> MemoStats {
        self.counters.snapshot()
    }

    pub fn config(&self) -> &MemoConfig {
        &self.config
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }
}

impl<C, Args> Callable<Args> for Memoized<C, Args>
where
    Args: Inputs + Eq + Hash + Clone,
    C: Callable<Args>,
    C::Output: Clone,
{
    type Output = C::Output;
    type Error = C::Error;

    fn invoke(&self, args: Args) -> Outcome<C::Output, C::Error> {
        let mut cache = lock(self.shard(&args));
        if let Some(value) = cache.get(&args) {
            self.counters.hit();
            return Ok(value.clone());
        }

        self.counters.miss();
        let value = self.inner.invoke(args.clone())?;
        cache.insert(args, value.clone());
        Ok(value)
    }
}

impl<C, Args> fmt::Debug for Memoized<C, Args>
where
    Args: Inputs + Eq + Hash + Clone,
    C: Callable<Args>,
    C::Output: Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memoized")
            .field("entries", &self.len())
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish()
    }
}

// ============================================================================
// Zero-input cache
// ============================================================================

/// Caching wrapper for zero-input callables.
///
/// Double-checked: the slot is read without locking, and the miss lock is
/// taken only while the slot is still empty.
pub struct MemoizedSupplier<C>
where
    C: Callable<()>,
{
    inner: C,
    slot: OnceLock<C::Output>,
    miss_lock: Mutex<()>,
    counters: Counters,
}

impl<C> MemoizedSupplier<C>
where
    C: Callable<()>,
    C::Output: Clone,
{
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            slot: OnceLock::new(),
            miss_lock: Mutex::new(()),
            counters: Counters::default(),
        }
    }

    /// Already memoized: returns `self` without adding another layer.
    pub fn memoized(self) -> Self {
        self
    }

    pub fn is_populated(&self) -> bool {
        self.slot.get().is_some()
    }

    pub fn stats(&self) -> MemoStats {
        self.counters.snapshot()
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }
}

impl<C> Callable<()> for MemoizedSupplier<C>
where
    C: Callable<()>,
    C::Output: Clone,
{
    type Output = C::Output;
    type Error = C::Error;

    fn invoke(&self, (): ()) -> Outcome<C::Output, C::Error> {
        if let Some(value) = self.slot.get() {
            self.counters.hit();
            return Ok(value.clone());
        }

        let _guard = lock(&self.miss_lock);
        if let Some(value) = self.slot.get() {
            self.counters.hit();
            return Ok(value.clone());
        }

        self.counters.miss();
        let value = self.inner.invoke(())?;
        Ok(self.slot.get_or_init(|| value).clone())
    }
}

impl<C> fmt::Debug for MemoizedSupplier<C>
where
    C: Callable<()>,
    C::Output: Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoizedSupplier")
            .field("populated", &self.is_populated())
            .field("stats", &self.stats())
            .finish()
    }
}

// ============================================================================
// Memoize
// ============================================================================

/// Wrap a callable in the cache that fits its arity.
///
/// Both wrappers expose an inherent `memoized()` returning `self`, which
/// method resolution picks before this trait, so memoizing twice is a no-op.
///
/// That only applies where the concrete wrapper type is visible. Generic
/// code bounded on `Memoize` calls the trait method, which wraps the cache
/// in a second one: results stay correct, but every key is stored in both
/// layers.
pub trait Memoize<Args: Inputs>: Callable<Args> + Sized {
    type Memo: Callable<Args, Output = Self::Output, Error = Self::Error>;

    fn memoized_with(self, config: MemoConfig) -> Self::Memo;

    fn memoized(self) -> Self::Memo {
        self.memoized_with(MemoConfig::default())
    }
}

impl<C> Memoize<()> for C
where
    C: Callable<()>,
    C::Output: Clone,
{
    type Memo = MemoizedSupplier<C>;

    /// A single slot has nothing to shard; `config` is ignored.
    fn memoized_with(self, _config: MemoConfig) -> Self::Memo {
        MemoizedSupplier::new(self)
    }
}

macro_rules! impl_memoize {
    ($($A:ident),+) => {
        impl<C, $($A),+> Memoize<($($A,)+)> for C
        where
            ($($A,)+): Eq + Hash + Clone,
            C: Callable<($($A,)+)>,
            C::Output: Clone,
        {
            type Memo = Memoized<C, ($($A,)+)>;

            fn memoized_with(self, config: MemoConfig) -> Self::Memo {
                Memoized::with_config(self, config)
            }
        }
    };
}

impl_memoize!(A1);
impl_memoize!(A1, A2);
impl_memoize!(A1, A2, A3);
impl_memoize!(A1, A2, A3, A4);
impl_memoize!(A1, A2, A3, A4, A5);
