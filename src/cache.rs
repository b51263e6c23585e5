//! C8: bounded result cache for the viewer's query engine.
//!
//! A small generic LRU underlies a typed cache keyed by the query shape
//! (mode, kind filter, normalized keyword). Default capacity is 3 (§6):
//! this is a convenience for repeated identical queries within a single
//! interactive session, not a general-purpose cache.

use crate::model::EventRecord;
use std::collections::{HashMap, HashSet, VecDeque};
use std::hash::Hash;

#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub size: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Generic single-threaded LRU cache.
pub struct LruCache<K, V> {
    capacity: usize,
    map: HashMap<K, V>,
    order: VecDeque<K>,
    hits: usize,
    misses: usize,
}

impl<K: Hash + Eq + Clone, V> LruCache<K, V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            map: HashMap::new(),
            order: VecDeque::with_capacity(capacity),
            hits: 0,
            misses: 0,
        }
    }

    pub fn get(&mut self, key: &K) -> Option<&V> {
        if self.map.contains_key(key) {
            self.hits += 1;
            if let Some(pos) = self.order.iter().position(|k| k == key) {
                self.order.remove(pos);
                self.order.push_front(key.clone());
            }
            self.map.get(key)
        } else {
            self.misses += 1;
            None
        }
    }

    pub fn put(&mut self, key: K, value: V) {
        if self.map.contains_key(&key) {
            if let Some(pos) = self.order.iter().position(|k| k == &key) {
                self.order.remove(pos);
            }
        } else if self.order.len() >= self.capacity {
            if let Some(old) = self.order.pop_back() {
                self.map.remove(&old);
            }
        }
        self.order.push_front(key.clone());
        self.map.insert(key, value);
    }

    pub fn invalidate(&mut self, key: &K) {
        self.map.remove(key);
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            self.order.remove(pos);
        }
    }

    pub fn clear(&mut self) {
        self.map.clear();
        self.order.clear();
        self.hits = 0;
        self.misses = 0;
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            size: self.map.len(),
        }
    }
}

/// Query presentation mode (§4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryMode {
    All,
    LatestPerFile,
}

/// The full shape of a cacheable query: mode, kind filter (as a sorted id
/// set so insertion order never fragments the cache), and normalized
/// keyword cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub mode: QueryMode,
    pub kind_filter: Vec<i64>,
    pub keyword: String,
}

impl QueryKey {
    pub fn new(mode: QueryMode, kinds: &HashSet<crate::model::EventKind>, keyword: &crate::keyword::KeywordFilter) -> Self {
        let mut kind_filter: Vec<i64> = kinds.iter().map(|k| k.id()).collect();
        kind_filter.sort_unstable();
        Self {
            mode,
            kind_filter,
            keyword: keyword.cache_key(),
        }
    }
}

/// Typed result cache: query shape -> matching rows.
pub struct ResultCache {
    inner: LruCache<QueryKey, Vec<EventRecord>>,
}

impl ResultCache {
    pub const DEFAULT_CAPACITY: usize = 3;

    pub fn new(capacity: usize) -> Self {
        Self {
            inner: LruCache::new(capacity.max(1)),
        }
    }

    pub fn get(&mut self, key: &QueryKey) -> Option<&Vec<EventRecord>> {
        self.inner.get(key)
    }

    pub fn put(&mut self, key: QueryKey, rows: Vec<EventRecord>) {
        self.inner.put(key, rows);
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.stats()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Invalidation trigger: mode switch (all <-> latest-per-file).
    pub fn invalidate_mode(&mut self, mode: QueryMode) {
        self.retain_if(|k| k.mode != mode);
    }

    /// Invalidation trigger: keyword filter cleared.
    pub fn invalidate_keyword_cleared(&mut self) {
        self.retain_if(|k| !k.keyword.is_empty());
    }

    /// Invalidation trigger: kind filter reset to all-visible.
    pub fn invalidate_kind_filter_reset(&mut self) {
        self.retain_if(|k| !k.kind_filter.is_empty());
    }

    /// Invalidation trigger: kind filter toggled to a new set.
    pub fn invalidate_kind_filter_changed(&mut self, new_filter: &HashSet<crate::model::EventKind>) {
        let mut ids: Vec<i64> = new_filter.iter().map(|k| k.id()).collect();
        ids.sort_unstable();
        self.retain_if(|k| k.kind_filter != ids);
    }

    /// Drop every cached entry whose key fails `keep`. The underlying LRU has
    /// no bulk-retain primitive, so this rebuilds it from scratch; capacity
    /// stays at 3 by design, so this is never more than a few entries.
    fn retain_if(&mut self, keep: impl Fn(&QueryKey) -> bool) {
        let capacity = self.inner.capacity;
        let mut survivors: Vec<(QueryKey, Vec<EventRecord>)> = Vec::new();
        for key in self.inner.order.iter().rev() {
            if keep(key) {
                if let Some(rows) = self.inner.map.get(key) {
                    survivors.push((key.clone(), rows.clone()));
                }
            }
        }
        let mut fresh = LruCache::new(capacity);
        for (k, v) in survivors {
            fresh.put(k, v);
        }
        self.inner = fresh;
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }
}
