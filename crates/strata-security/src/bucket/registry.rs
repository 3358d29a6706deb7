//! Per-identifier token buckets

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use super::clock::{Clock, SystemClock};
use super::token_bucket::TokenBucket;

const DEFAULT_MAX_ENTRIES: usize = 10_000;

/// Lazily creates one [`TokenBucket`] per identifier from a shared template.
///
/// When the registry reaches `max_entries`, buckets that have refilled to
/// capacity are dropped first; they are indistinguishable from fresh ones.
/// If that is not enough, the fullest draining buckets are evicted until a
/// tenth of the slots are free again.
#[derive(Debug)]
pub struct BucketRegistry {
    rate: f64,
    capacity: f64,
    max_entries: usize,
    clock: Arc<dyn Clock>,
    buckets: Mutex<HashMap<String, Arc<TokenBucket>>>,
}

impl BucketRegistry {
    pub fn new(rate: f64, capacity: f64) -> Self {
        Self {
            rate,
            capacity,
            max_entries: DEFAULT_MAX_ENTRIES,
            clock: Arc::new(SystemClock),
            buckets: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries.max(1);
        self
    }

    /// Bucket for `key`, created full on first use
    pub fn bucket(&self, key: &str) -> Arc<TokenBucket> {
        let mut buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(bucket) = buckets.get(key) {
            return Arc::clone(bucket);
        }

        if buckets.len() >= self.max_entries {
            Self::prune(&mut buckets, self.max_entries);
        }

        let bucket = Arc::new(
            TokenBucket::new(self.rate, self.capacity).with_clock(Arc::clone(&self.clock)),
        );
        buckets.insert(key.to_string(), Arc::clone(&bucket));
        bucket
    }

    /// Take one token from `key`'s bucket
    pub fn allow(&self, key: &str) -> bool {
        self.bucket(key).allow()
    }

    pub fn len(&self) -> usize {
        self.buckets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    fn prune(buckets: &mut HashMap<String, Arc<TokenBucket>>, max_entries: usize) {
        let before = buckets.len();
        buckets.retain(|_, bucket| bucket.tokens() < bucket.capacity());

        // Free a tenth of the slots at once
        let target = max_entries.saturating_sub((max_entries / 10).max(1));
        if buckets.len() > target {
            let mut by_fullness: Vec<(f64, String)> = buckets
                .iter()
                .map(|(key, bucket)| (bucket.tokens(), key.clone()))
                .collect();
            by_fullness.sort_by(|a, b| b.0.total_cmp(&a.0));
            let excess = buckets.len() - target;
            for (_, key) in by_fullness.into_iter().take(excess) {
                buckets.remove(&key);
            }
        }

        tracing::debug!(
            removed = before - buckets.len(),
            remaining = buckets.len(),
            "pruned rate limit buckets"
        );
    }
}
