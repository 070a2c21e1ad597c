//! In-process memoisation of component results.
//!
//! Entries are addressed by the structural hash a [`Component`] computes at
//! construction, plus everything else the result depends on. The cache is
//! type-erased so one instance can hold count tables of any weight type next
//! to `Pr[bad]` polynomials.
//!
//! [`Component`]: crate::component::Component

use std::any::Any;
use std::sync::{Arc, Mutex};

use qfault_ir::ErrorType;
use rustc_hash::FxHashMap;

use crate::error::{CountError, CountingResult};

/// Which computation a cache entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheQuery {
    /// `Component::count` with trivial input.
    Count,
    /// `Component::pr_bad`.
    PrBad,
}

/// Content address of a cached result.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Structural hash of the component.
    pub component: u64,
    /// Error type counted.
    pub error_type: ErrorType,
    /// Noise model descriptor.
    pub noise: String,
    /// Weight type of the noise model.
    pub weight: &'static str,
    /// Fault-order ceiling requested by the caller.
    pub k_max: Option<usize>,
    /// Computation.
    pub query: CacheQuery,
}

/// Thread-safe, type-erased result cache.
#[derive(Debug, Default)]
pub struct CountCache {
    entries: Mutex<FxHashMap<CacheKey, Arc<dyn Any + Send + Sync>>>,
}

impl CountCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an entry, cloning it out if present with the requested type.
    pub fn get<T: Clone + 'static>(&self, key: &CacheKey) -> CountingResult<Option<T>> {
        let entries = self.entries.lock().map_err(|_| CountError::CachePoisoned)?;
        Ok(entries
            .get(key)
            .and_then(|v| v.downcast_ref::<T>())
            .cloned())
    }

    /// Store an entry, replacing any previous value.
    pub fn insert<T: Send + Sync + 'static>(&self, key: CacheKey, value: T) -> CountingResult<()> {
        let mut entries = self.entries.lock().map_err(|_| CountError::CachePoisoned)?;
        entries.insert(key, Arc::new(value));
        Ok(())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.lock().map_or(0, |e| e.len())
    }

    /// True if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry.
    pub fn clear(&self) -> CountingResult<()> {
        self.entries
            .lock()
            .map_err(|_| CountError::CachePoisoned)?
            .clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(component: u64, query: CacheQuery) -> CacheKey {
        CacheKey {
            component,
            error_type: ErrorType::X,
            noise: "counting-X".to_string(),
            weight: "u64",
            k_max: Some(2),
            query,
        }
    }

    #[test]
    fn test_insert_get() {
        let cache = CountCache::new();
        assert!(cache.is_empty());
        cache.insert(key(1, CacheQuery::Count), vec![1u64, 2, 3]).unwrap();
        assert_eq!(
            cache.get::<Vec<u64>>(&key(1, CacheQuery::Count)).unwrap(),
            Some(vec![1, 2, 3])
        );
        assert_eq!(cache.get::<Vec<u64>>(&key(1, CacheQuery::PrBad)).unwrap(), None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_wrong_type_is_a_miss() {
        let cache = CountCache::new();
        cache.insert(key(7, CacheQuery::PrBad), 0.5f64).unwrap();
        assert_eq!(cache.get::<u64>(&key(7, CacheQuery::PrBad)).unwrap(), None);
        assert_eq!(cache.get::<f64>(&key(7, CacheQuery::PrBad)).unwrap(), Some(0.5));
    }

    #[test]
    fn test_clear() {
        let cache = CountCache::new();
        cache.insert(key(1, CacheQuery::Count), 1u64).unwrap();
        cache.insert(key(2, CacheQuery::Count), 2u64).unwrap();
        assert_eq!(cache.len(), 2);
        cache.clear().unwrap();
        assert!(cache.is_empty());
    }
}
