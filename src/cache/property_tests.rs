//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check eviction order and capacity against simple reference models.

use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use std::thread;

use crate::cache::{BasicCache, Cache, CacheValue, LfuCache, LruCache};

// == Strategies ==
/// Small key space so operations collide often
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-f]{1,2}"
}

#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: u32 },
    Get { key: String },
    Remove { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        3 => (key_strategy(), any::<u32>()).prop_map(|(key, value)| CacheOp::Set { key, value }),
        2 => key_strategy().prop_map(|key| CacheOp::Get { key }),
        1 => key_strategy().prop_map(|key| CacheOp::Remove { key }),
    ]
}

fn read(cache: &dyn Cache, key: &str) -> Option<u32> {
    cache
        .get(key)
        .and_then(|v| v.downcast_ref::<u32>().copied())
}

fn payload(value: u32) -> CacheValue {
    Arc::new(value)
}

// == Reference Models ==
/// Keys ordered oldest first.
#[derive(Default)]
struct LruModel {
    values: HashMap<String, u32>,
    order: Vec<String>,
}

impl LruModel {
    fn touch(&mut self, key: &str) {
        self.order.retain(|k| k != key);
        self.order.push(key.to_string());
    }

    fn set(&mut self, key: &str, value: u32, capacity: usize) {
        if !self.values.contains_key(key) && self.values.len() >= capacity {
            let oldest = self.order.remove(0);
            self.values.remove(&oldest);
        }
        self.values.insert(key.to_string(), value);
        self.touch(key);
    }

    fn get(&mut self, key: &str) -> Option<u32> {
        let value = self.values.get(key).copied()?;
        self.touch(key);
        Some(value)
    }

    fn remove(&mut self, key: &str) {
        self.values.remove(key);
        self.order.retain(|k| k != key);
    }
}

/// Counts plus a recency list scanned linearly on eviction.
#[derive(Default)]
struct LfuModel {
    values: HashMap<String, u32>,
    counts: HashMap<String, u64>,
    recency: Vec<String>,
}

impl LfuModel {
    fn touch(&mut self, key: &str) {
        *self.counts.entry(key.to_string()).or_insert(0) += 1;
        self.recency.retain(|k| k != key);
        self.recency.push(key.to_string());
    }

    fn set(&mut self, key: &str, value: u32, capacity: usize) {
        if !self.values.contains_key(key) && self.values.len() >= capacity {
            let lowest = self.counts.values().copied().min().unwrap_or(0);
            let victim = self
                .recency
                .iter()
                .find(|k| self.counts[*k] == lowest)
                .cloned()
                .unwrap();
            self.remove(&victim);
        }
        self.values.insert(key.to_string(), value);
        self.touch(key);
    }

    fn get(&mut self, key: &str) -> Option<u32> {
        let value = self.values.get(key).copied()?;
        self.touch(key);
        Some(value)
    }

    fn remove(&mut self, key: &str) {
        self.values.remove(key);
        self.counts.remove(key);
        self.recency.retain(|k| k != key);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // For any operation sequence, the LRU cache answers every read exactly like
    // the reference model and never holds more than its bound.
    #[test]
    fn prop_lru_matches_reference_model(
        capacity in 1usize..5,
        ops in prop::collection::vec(cache_op_strategy(), 1..80)
    ) {
        let cache = LruCache::new(capacity, capacity, None).unwrap();
        let mut model = LruModel::default();

        for op in ops {
            match op {
                CacheOp::Set { key, value } => {
                    cache.set(&key, payload(value), None);
                    model.set(&key, value, capacity);
                }
                CacheOp::Get { key } => {
                    prop_assert_eq!(read(&cache, &key), model.get(&key), "get {}", key);
                }
                CacheOp::Remove { key } => {
                    cache.remove(&key);
                    model.remove(&key);
                }
            }
            prop_assert!(cache.len() <= capacity);
            prop_assert_eq!(cache.len(), model.values.len());
            cache.assert_lockstep();
        }
    }

    // Same for LFU: lowest count evicted first, ties broken by least recent touch.
    #[test]
    fn prop_lfu_matches_reference_model(
        capacity in 1usize..5,
        ops in prop::collection::vec(cache_op_strategy(), 1..80)
    ) {
        let cache = LfuCache::new(capacity, capacity, None).unwrap();
        let mut model = LfuModel::default();

        for op in ops {
            match op {
                CacheOp::Set { key, value } => {
                    cache.set(&key, payload(value), None);
                    model.set(&key, value, capacity);
                }
                CacheOp::Get { key } => {
                    prop_assert_eq!(read(&cache, &key), model.get(&key), "get {}", key);
                }
                CacheOp::Remove { key } => {
                    cache.remove(&key);
                    model.remove(&key);
                }
            }
            prop_assert!(cache.len() <= capacity);
            prop_assert_eq!(cache.len(), model.values.len());
            cache.assert_lockstep();
        }
    }

    // Storing V1 then V2 under one key leaves V2 and does not change occupancy.
    #[test]
    fn prop_overwrite_semantics(
        keys in prop::collection::hash_set(key_strategy(), 1..6),
        value1 in any::<u32>(),
        value2 in any::<u32>()
    ) {
        let caches: Vec<Box<dyn Cache>> = vec![
            Box::new(BasicCache::new(8, None)),
            Box::new(LruCache::new(8, 8, None).unwrap()),
            Box::new(LfuCache::new(8, 8, None).unwrap()),
        ];

        for cache in &caches {
            for key in &keys {
                cache.set(key, payload(value1), None);
            }
            let occupancy = cache.len();
            let target = keys.iter().next().unwrap();

            cache.set(target, payload(value2), None);

            prop_assert_eq!(cache.len(), occupancy);
            prop_assert_eq!(read(cache.as_ref(), target), Some(value2));
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    // N concurrent writers to one key leave exactly one of their values behind.
    #[test]
    fn prop_concurrent_writes_leave_one_value(writers in 2u32..12) {
        let caches: Vec<Box<dyn Cache>> = vec![
            Box::new(BasicCache::new(8, None)),
            Box::new(LruCache::new(8, 2, None).unwrap()),
            Box::new(LfuCache::new(8, 2, None).unwrap()),
        ];

        for cache in &caches {
            thread::scope(|s| {
                for i in 0..writers {
                    let cache = cache.as_ref();
                    s.spawn(move || cache.set("shared", payload(i), None));
                }
            });

            let winner = read(cache.as_ref(), "shared");
            prop_assert!(matches!(winner, Some(v) if v < writers));
            prop_assert_eq!(cache.len(), 1);
        }
    }
}
