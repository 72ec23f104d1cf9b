//! Memoization of function results
//!
//! Independent of the validation core. A [`Caching`] hands out [`Memoized`]
//! functions that remember their results per argument value. With a maximum
//! size, a miss on a full cache empties that cache before the new result is
//! stored.
//!
//! Cached results go stale if the wrapped function's answer changes for the
//! same argument; clear the cache when that happens. Several arguments are
//! passed as a tuple.
//!
//! ```rust
//! use accessor::cache::Caching;
//!
//! let caching = Caching::new(2);
//! let square = caching.wrap(|x: &i64| x * x);
//!
//! assert_eq!(square.call(3), 9);
//! assert!(square.contains(&3));
//! caching.clear();
//! assert!(square.is_empty());
//! ```

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

trait ClearCache: Send + Sync {
    fn clear(&self);
}

struct CacheStore<A, R> {
    max_size: usize,
    entries: Mutex<HashMap<A, R>>,
}

impl<A, R> CacheStore<A, R> {
    fn entries(&self) -> MutexGuard<'_, HashMap<A, R>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<A: Send, R: Send> ClearCache for CacheStore<A, R> {
    fn clear(&self) {
        self.entries().clear();
    }
}

/// A function whose results are cached by argument
pub struct Memoized<A, R> {
    func: Box<dyn Fn(&A) -> R + Send + Sync>,
    store: Arc<CacheStore<A, R>>,
}

impl<A, R> Memoized<A, R>
where
    A: Eq + Hash + Clone + Send + 'static,
    R: Clone + Send + 'static,
{
    fn new(max_size: usize, func: impl Fn(&A) -> R + Send + Sync + 'static) -> Self {
        Self {
            func: Box::new(func),
            store: Arc::new(CacheStore {
                max_size,
                entries: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Return the cached result for `args`, computing it on a miss
    ///
    /// The function runs without the cache lock held.
    pub fn call(&self, args: A) -> R {
        if let Some(result) = self.store.entries().get(&args) {
            return result.clone();
        }

        let result = (self.func)(&args);

        let mut entries = self.store.entries();
        if self.store.max_size > 0 && entries.len() >= self.store.max_size {
            tracing::trace!(
                max_size = self.store.max_size,
                "memoization cache full, clearing"
            );
            entries.clear();
        }
        entries.insert(args, result.clone());
        result
    }

    /// Empty this function's cache
    pub fn clear(&self) {
        self.store.entries().clear();
    }

    /// Drop the cached result for one argument value
    pub fn forget(&self, args: &A) -> bool {
        self.store.entries().remove(args).is_some()
    }

    pub fn contains(&self, args: &A) -> bool {
        self.store.entries().contains_key(args)
    }

    pub fn len(&self) -> usize {
        self.store.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.entries().is_empty()
    }

    /// Maximum number of entries, `0` for unbounded
    pub fn max_size(&self) -> usize {
        self.store.max_size
    }
}

/// Factory of memoized functions sharing a size limit and a clear-all switch
#[derive(Default)]
pub struct Caching {
    max_size: usize,
    caches: Mutex<Vec<Weak<dyn ClearCache>>>,
}

impl Caching {
    /// `max_size` of `0` means the caches never flush on their own
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size,
            caches: Mutex::new(Vec::new()),
        }
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Memoize `func`; its cache is cleared by [`Caching::clear`]
    pub fn wrap<A, R>(&self, func: impl Fn(&A) -> R + Send + Sync + 'static) -> Memoized<A, R>
    where
        A: Eq + Hash + Clone + Send + 'static,
        R: Clone + Send + 'static,
    {
        let memoized = Memoized::new(self.max_size, func);
        let store: Arc<dyn ClearCache> = memoized.store.clone();
        let mut caches = self.caches();
        caches.retain(|cache| cache.strong_count() > 0);
        caches.push(Arc::downgrade(&store));
        memoized
    }

    /// Clear the caches of every function wrapped by this instance
    pub fn clear(&self) {
        let mut caches = self.caches();
        caches.retain(|cache| match cache.upgrade() {
            Some(cache) => {
                cache.clear();
                true
            }
            None => false,
        });
    }

    /// Number of wrapped functions still alive
    pub fn cache_count(&self) -> usize {
        self.caches()
            .iter()
            .filter(|cache| cache.strong_count() > 0)
            .count()
    }

    fn caches(&self) -> MutexGuard<'_, Vec<Weak<dyn ClearCache>>> {
        self.caches.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Memoize `func` with an unbounded cache not attached to any [`Caching`]
pub fn simple_caching<A, R>(func: impl Fn(&A) -> R + Send + Sync + 'static) -> Memoized<A, R>
where
    A: Eq + Hash + Clone + Send + 'static,
    R: Clone + Send + 'static,
{
    Memoized::new(0, func)
}
