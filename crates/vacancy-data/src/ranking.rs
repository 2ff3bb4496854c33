//! Population-share filtering and top-N ranking of city statistics.

use std::cmp::Ordering;
use std::hash::Hash;

use indexmap::{IndexMap, IndexSet};

/// Keys below this share of all vacancies are dropped as long tail.
pub const MIN_POPULATION_SHARE: f64 = 0.01;

/// Length of every ranked view.
pub const TOP_N: usize = 10;

/// Round a share to four decimal places.
pub fn round_share(share: f64) -> f64 {
    (share * 10_000.0).round() / 10_000.0
}

/// Keys whose unrounded share of `total` is at least
/// [`MIN_POPULATION_SHARE`], in input order.
pub fn surviving_keys<K: Clone + Eq + Hash>(counts: &IndexMap<K, u64>, total: u64) -> IndexSet<K> {
    if total == 0 {
        return IndexSet::new();
    }
    counts
        .iter()
        .filter(|(_, &count)| count as f64 / total as f64 >= MIN_POPULATION_SHARE)
        .map(|(k, _)| k.clone())
        .collect()
}

/// Share per key, filtered to surviving keys, sorted by rounded share
/// descending (ties keep input order), truncated to [`TOP_N`].
pub fn filter_and_rank<K: Clone + Eq + Hash>(counts: &IndexMap<K, u64>, total: u64) -> IndexMap<K, f64> {
    if total == 0 {
        return IndexMap::new();
    }
    let shares: IndexMap<K, f64> = counts
        .iter()
        .map(|(k, &count)| (k.clone(), count as f64 / total as f64))
        .filter(|(_, share)| *share >= MIN_POPULATION_SHARE)
        .map(|(k, share)| (k, round_share(share)))
        .collect();
    rank_descending(shares)
}

/// Values restricted to `allowed` keys, sorted descending (ties keep input
/// order), truncated to [`TOP_N`].
pub fn top_by_value<K, V>(values: &IndexMap<K, V>, allowed: &IndexSet<K>) -> IndexMap<K, V>
where
    K: Clone + Eq + Hash,
    V: Copy + PartialOrd,
{
    let kept: IndexMap<K, V> = values
        .iter()
        .filter(|(k, _)| allowed.contains(*k))
        .map(|(k, v)| (k.clone(), *v))
        .collect();
    rank_descending(kept)
}

fn rank_descending<K, V: PartialOrd>(mut entries: IndexMap<K, V>) -> IndexMap<K, V> {
    // `IndexMap::sort_by` is stable.
    entries.sort_by(|_, a, _, b| b.partial_cmp(a).unwrap_or(Ordering::Equal));
    entries.truncate(TOP_N);
    entries
}
