//! Process-lifetime memoisation cache.
//!
//! A thin façade over a concurrent map: reads never block other reads,
//! entries never expire, and the same cache instance is shared by every
//! task in the crawl. The query layer keys a cache by [`QueryRequest`]
//! value, the HTTP layer keys another by URL string; keeping the two in
//! separate typed instances keeps the key domains disjoint.
//!
//! [`QueryRequest`]: crate::api::QueryRequest

use dashmap::DashMap;
use std::hash::Hash;

/// Concurrency-safe memoisation map from comparable keys to cloneable
/// values. No eviction: entries live until [`Cache::clear`] or process
/// exit.
pub struct Cache<K, V> {
    map: DashMap<K, V>,
}

impl<K, V> std::fmt::Debug for Cache<K, V>
where
    K: Eq + Hash + std::fmt::Debug,
    V: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache").field("map", &self.map).finish()
    }
}

impl<K, V> Default for Cache<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash,
{
    #[must_use]
    pub fn new() -> Self {
        Self { map: DashMap::new() }
    }
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Look up `key`, returning a clone of the stored value.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<V> {
        self.map.get(key).map(|entry| entry.value().clone())
    }

    /// Store `value` under `key`, replacing any previous entry.
    pub fn set(&self, key: K, value: V) {
        self.map.insert(key, value);
    }

    /// Remove the entry for `key`, if any.
    pub fn clear(&self, key: &K) {
        self.map.remove(key);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Run `f` only when `key` is absent, storing and returning its result.
    pub fn get_or_insert_with(&self, key: K, f: impl FnOnce() -> V) -> V {
        self.map.entry(key).or_insert_with(f).value().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::Cache;

    #[test]
    fn set_get_clear_roundtrip() {
        let cache: Cache<String, String> = Cache::new();
        assert!(cache.get(&"k".to_string()).is_none());

        cache.set("k".to_string(), "v".to_string());
        assert_eq!(cache.get(&"k".to_string()).as_deref(), Some("v"));

        cache.clear(&"k".to_string());
        assert!(cache.get(&"k".to_string()).is_none());
    }

    #[test]
    fn concurrent_reads_and_writes() {
        use std::sync::Arc;

        let cache: Arc<Cache<u32, u32>> = Arc::new(Cache::new());
        let mut handles = Vec::new();
        for t in 0..8u32 {
            let cache = Arc::clone(&cache);
            handles.push(std::thread::spawn(move || {
                for i in 0..100 {
                    cache.set(t * 1000 + i, i);
                    let _ = cache.get(&(t * 1000));
                }
            }));
        }
        for h in handles {
            h.join().expect("worker panicked");
        }
        assert_eq!(cache.len(), 800);
    }
}
