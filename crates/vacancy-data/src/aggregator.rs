//! Grouping of salary observations into keyed buckets.

use std::hash::Hash;

use indexmap::IndexMap;

// ── Bucket ────────────────────────────────────────────────────────────────────

/// Salary total and observation count under one key.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bucket {
    pub sum: f64,
    pub count: u64,
}

impl Bucket {
    /// Add one salary observation.
    pub fn add(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    /// Fold another bucket for the same key into this one.
    pub fn absorb(&mut self, other: &Bucket) {
        self.sum += other.sum;
        self.count += other.count;
    }

    /// Arithmetic mean truncated toward zero; 0 for an empty bucket.
    pub fn mean(&self) -> i64 {
        if self.count == 0 {
            return 0;
        }
        (self.sum / self.count as f64) as i64
    }
}

// ── GroupAggregator ───────────────────────────────────────────────────────────

/// Accumulates observations per key, remembering first-insertion order.
#[derive(Debug, Clone)]
pub struct GroupAggregator<K> {
    buckets: IndexMap<K, Bucket>,
}

impl<K> Default for GroupAggregator<K> {
    fn default() -> Self {
        Self {
            buckets: IndexMap::new(),
        }
    }
}

impl<K: Clone + Eq + Hash> GroupAggregator<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `value` under `key`, creating the bucket on first use.
    pub fn add(&mut self, key: K, value: f64) {
        self.buckets.entry(key).or_default().add(value);
    }

    /// Truncated mean per key, in first-insertion order.
    pub fn mean_per_key(&self) -> IndexMap<K, i64> {
        self.buckets
            .iter()
            .map(|(k, b)| (k.clone(), b.mean()))
            .collect()
    }

    /// Observation count per key, in first-insertion order.
    pub fn count_per_key(&self) -> IndexMap<K, u64> {
        self.buckets
            .iter()
            .map(|(k, b)| (k.clone(), b.count))
            .collect()
    }

    /// Total observations across all keys.
    pub fn total_count(&self) -> u64 {
        self.buckets.values().map(|b| b.count).sum()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.buckets.keys()
    }

    pub fn get(&self, key: &K) -> Option<&Bucket> {
        self.buckets.get(key)
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Fold `other` into `self` key-wise. Keys new to `self` are appended in
    /// `other`'s order.
    pub fn merge(&mut self, other: &GroupAggregator<K>) {
        for (key, bucket) in &other.buckets {
            self.buckets.entry(key.clone()).or_default().absorb(bucket);
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_is_truncated() {
        let mut agg = GroupAggregator::new();
        agg.add(2012, 10.0);
        agg.add(2012, 11.0);
        agg.add(2012, 11.0);
        // 32 / 3 = 10.67
        assert_eq!(agg.mean_per_key().get(&2012), Some(&10));
    }

    #[test]
    fn test_counts_and_total() {
        let mut agg = GroupAggregator::new();
        agg.add("Москва".to_string(), 100.0);
        agg.add("Казань".to_string(), 200.0);
        agg.add("Москва".to_string(), 300.0);
        let counts = agg.count_per_key();
        assert_eq!(counts.get(&"Москва".to_string()), Some(&2));
        assert_eq!(counts.get(&"Казань".to_string()), Some(&1));
        assert_eq!(agg.total_count(), 3);
        assert_eq!(agg.len(), 2);
    }

    #[test]
    fn test_first_insertion_order_kept() {
        let mut agg = GroupAggregator::new();
        for key in ["b", "a", "c", "a", "b"] {
            agg.add(key, 1.0);
        }
        let keys: Vec<_> = agg.keys().copied().collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_empty_aggregator() {
        let agg: GroupAggregator<i32> = GroupAggregator::new();
        assert!(agg.is_empty());
        assert!(agg.mean_per_key().is_empty());
        assert_eq!(agg.total_count(), 0);
    }

    #[test]
    fn test_merge_adds_sum_and_count() {
        let mut left = GroupAggregator::new();
        left.add(2010, 100.0);
        left.add(2011, 50.0);
        let mut right = GroupAggregator::new();
        right.add(2011, 150.0);
        right.add(2012, 10.0);

        left.merge(&right);
        let bucket = left.get(&2011).unwrap();
        assert_eq!(bucket.count, 2);
        assert_eq!(bucket.sum, 200.0);
        assert_eq!(left.mean_per_key().get(&2011), Some(&100));
        assert_eq!(left.keys().copied().collect::<Vec<_>>(), vec![2010, 2011, 2012]);
    }

    #[test]
    fn test_merge_equals_single_pass() {
        let values = [(1, 10.0), (2, 25.0), (1, 31.0), (3, 7.0), (2, 1.0)];
        let mut whole = GroupAggregator::new();
        for (k, v) in values {
            whole.add(k, v);
        }
        let mut a = GroupAggregator::new();
        let mut b = GroupAggregator::new();
        for (k, v) in &values[..2] {
            a.add(*k, *v);
        }
        for (k, v) in &values[2..] {
            b.add(*k, *v);
        }
        a.merge(&b);
        // IndexMap equality ignores order, so compare the entry sequences.
        let entries = |m: IndexMap<i32, i64>| m.into_iter().collect::<Vec<_>>();
        assert_eq!(entries(a.mean_per_key()), entries(whole.mean_per_key()));
        assert_eq!(
            a.count_per_key().into_iter().collect::<Vec<_>>(),
            whole.count_per_key().into_iter().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_bucket_mean_of_empty_is_zero() {
        assert_eq!(Bucket::default().mean(), 0);
    }
}
