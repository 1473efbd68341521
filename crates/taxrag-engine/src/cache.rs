use std::collections::{HashMap, VecDeque};

use taxrag_core::config::CacheSettings;
use taxrag_core::types::RankedResult;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    query: String,
    top_k: usize,
}

impl CacheKey {
    fn new(query: &str, top_k: usize) -> Self {
        Self { query: query.to_lowercase(), top_k }
    }
}

/// Bounded retrieval cache keyed by (lowercased query, result count).
///
/// Eviction is by insertion order, not access order: when full, the oldest
/// `evict_batch` keys are dropped before the new one goes in. Rewriting an
/// existing key keeps its original position.
#[derive(Debug, Clone)]
pub struct QueryCache {
    capacity: usize,
    evict_batch: usize,
    order: VecDeque<CacheKey>,
    entries: HashMap<CacheKey, Vec<RankedResult>>,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(&CacheSettings::default())
    }
}

impl QueryCache {
    pub fn new(settings: &CacheSettings) -> Self {
        Self {
            capacity: settings.capacity,
            evict_batch: settings.evict_batch.max(1),
            order: VecDeque::new(),
            entries: HashMap::new(),
        }
    }

    pub fn get(&self, query: &str, top_k: usize) -> Option<&[RankedResult]> {
        self.entries.get(&CacheKey::new(query, top_k)).map(Vec::as_slice)
    }

    pub fn put(&mut self, query: &str, top_k: usize, results: Vec<RankedResult>) {
        let key = CacheKey::new(query, top_k);
        if let Some(slot) = self.entries.get_mut(&key) {
            *slot = results;
            return;
        }
        if self.entries.len() >= self.capacity {
            for _ in 0..self.evict_batch {
                match self.order.pop_front() {
                    Some(old) => {
                        self.entries.remove(&old);
                    }
                    None => break,
                }
            }
            tracing::debug!(remaining = self.entries.len(), "query cache evicted oldest entries");
        }
        self.order.push_back(key.clone());
        self.entries.insert(key, results);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> QueryCache {
        QueryCache::new(&CacheSettings { capacity: 5, evict_batch: 2 })
    }

    #[test]
    fn key_ignores_case_but_not_top_k() {
        let mut cache = small();
        cache.put("What is 80C", 5, Vec::new());
        assert!(cache.get("what is 80c", 5).is_some());
        assert!(cache.get("what is 80c", 3).is_none());
    }

    #[test]
    fn evicts_oldest_batch_when_full() {
        let mut cache = small();
        for i in 0..5 {
            cache.put(&format!("q{i}"), 5, Vec::new());
        }
        cache.put("q5", 5, Vec::new());
        assert_eq!(cache.len(), 4);
        assert!(cache.get("q0", 5).is_none());
        assert!(cache.get("q1", 5).is_none());
        assert!(cache.get("q2", 5).is_some());
        assert!(cache.get("q5", 5).is_some());
    }

    #[test]
    fn overwrite_keeps_insertion_position() {
        let mut cache = small();
        for i in 0..5 {
            cache.put(&format!("q{i}"), 5, Vec::new());
        }
        cache.put("q0", 5, Vec::new());
        assert_eq!(cache.len(), 5);
        cache.put("q5", 5, Vec::new());
        assert!(cache.get("q0", 5).is_none());
    }
}
