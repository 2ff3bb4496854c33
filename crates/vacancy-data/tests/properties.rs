//! Property tests for the statistics invariants.
//!
//! Uses proptest to verify:
//! 1. Truncated means match a naive recomputation for every key
//! 2. The population filter keeps exactly the keys at or above 1%
//! 3. Ranked views are short and non-increasing
//! 4. A profession with no matches still covers every year, with zeros
//! 5. Reference-currency salaries pass through unchanged
//! 6. Merging accumulators is order-independent

use std::collections::HashMap;

use chrono::{FixedOffset, TimeZone};
use indexmap::IndexMap;
use proptest::prelude::*;
use vacancy_core::currency::SalaryNormalizer;
use vacancy_core::models::VacancyRecord;
use vacancy_data::aggregator::GroupAggregator;
use vacancy_data::analysis::Accumulators;
use vacancy_data::ranking::{filter_and_rank, surviving_keys, top_by_value, TOP_N};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_observations() -> impl Strategy<Value = Vec<(u8, f64)>> {
    prop::collection::vec((0u8..8, 0.0..500_000.0_f64), 1..200)
}

fn arb_counts() -> impl Strategy<Value = Vec<u64>> {
    prop::collection::vec(0u64..500, 1..40)
}

fn arb_record() -> impl Strategy<Value = VacancyRecord> {
    (
        prop::sample::select(vec!["Программист", "Аналитик", "Тестировщик"]),
        10_000.0..300_000.0_f64,
        prop::sample::select(vec!["Москва", "Казань", "Пермь", "Тверь"]),
        2007i32..2023,
    )
        .prop_map(|(title, salary, city, year)| VacancyRecord {
            job_title: title.to_string(),
            salary,
            area_name: city.to_string(),
            year,
        })
}

fn keyed(counts: &[u64]) -> IndexMap<String, u64> {
    counts
        .iter()
        .enumerate()
        .map(|(i, c)| (format!("city{i}"), *c))
        .collect()
}

// ── 1. Means ─────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn mean_matches_naive_truncation(obs in arb_observations()) {
        let mut agg = GroupAggregator::new();
        let mut naive: HashMap<u8, Vec<f64>> = HashMap::new();
        for (k, v) in &obs {
            agg.add(*k, *v);
            naive.entry(*k).or_default().push(*v);
        }

        let means = agg.mean_per_key();
        prop_assert_eq!(means.len(), naive.len());
        for (k, values) in &naive {
            let expected = (values.iter().sum::<f64>() / values.len() as f64) as i64;
            prop_assert_eq!(means.get(k).copied(), Some(expected));
        }
    }
}

// ── 2 & 3. Population filter and ranking ─────────────────────────────

proptest! {
    #[test]
    fn filter_keeps_exactly_the_population(counts in arb_counts()) {
        let total: u64 = counts.iter().sum();
        let map = keyed(&counts);
        let survivors = surviving_keys(&map, total);

        for (k, c) in map.iter() {
            let share = if total == 0 { 0.0 } else { *c as f64 / total as f64 };
            prop_assert_eq!(survivors.contains(k), total > 0 && share >= 0.01);
        }

        let ranked = filter_and_rank(&map, total);
        for k in ranked.keys() {
            prop_assert!(survivors.contains(k));
        }
        prop_assert_eq!(ranked.len(), survivors.len().min(TOP_N));
    }

    #[test]
    fn ranked_views_are_short_and_non_increasing(counts in arb_counts()) {
        let total: u64 = counts.iter().sum();
        let map = keyed(&counts);

        let shares: Vec<f64> = filter_and_rank(&map, total).values().copied().collect();
        prop_assert!(shares.len() <= TOP_N);
        prop_assert!(shares.windows(2).all(|w| w[0] >= w[1]));

        let salaries: IndexMap<String, i64> =
            map.iter().map(|(k, c)| (k.clone(), *c as i64 * 7)).collect();
        let survivors = surviving_keys(&map, total);
        let top: Vec<i64> = top_by_value(&salaries, &survivors).values().copied().collect();
        prop_assert!(top.len() <= TOP_N);
        prop_assert!(top.windows(2).all(|w| w[0] >= w[1]));
    }
}

// ── 4. Empty profession fallback ─────────────────────────────────────

proptest! {
    #[test]
    fn unmatched_profession_covers_every_year(
        records in prop::collection::vec(arb_record(), 1..60)
    ) {
        let mut acc = Accumulators::new("Водитель");
        for r in &records {
            acc.observe(r);
        }
        let result = acc.finalize();

        let years: Vec<i32> = result.salary_by_year.keys().copied().collect();
        let prof_years: Vec<i32> = result.profession_salary_by_year.keys().copied().collect();
        prop_assert_eq!(&prof_years, &years);
        prop_assert!(result.profession_salary_by_year.values().all(|v| *v == 0));
        prop_assert!(result.profession_count_by_year.values().all(|v| *v == 0));
        prop_assert!(years.windows(2).all(|w| w[0] < w[1]));
    }
}

// ── 5. Reference currency identity ───────────────────────────────────

proptest! {
    #[test]
    fn reference_currency_is_identity(
        x in 0.0..10_000_000.0_f64,
        secs in 0i64..1_700_000_000,
        offset_hours in -11i32..=12,
    ) {
        let tz = FixedOffset::east_opt(offset_hours * 3600).unwrap();
        let date = tz.timestamp_opt(secs, 0).unwrap();
        let n = SalaryNormalizer::builtin();
        prop_assert_eq!(n.normalize(Some(x), Some(x), "RUR", &date).unwrap(), Some(x));
    }
}

// ── 6. Merge order ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn merge_is_order_independent(
        left in prop::collection::vec(arb_record(), 0..40),
        right in prop::collection::vec(arb_record(), 0..40),
    ) {
        let build = |records: &[VacancyRecord]| {
            let mut acc = Accumulators::new("Программист");
            records.iter().for_each(|r| acc.observe(r));
            acc
        };

        let mut lr = build(&left);
        lr.merge(&build(&right));
        let mut rl = build(&right);
        rl.merge(&build(&left));

        let a = lr.finalize();
        let b = rl.finalize();
        prop_assert_eq!(a.count_by_year, b.count_by_year);
        prop_assert_eq!(a.profession_count_by_year, b.profession_count_by_year);
        prop_assert_eq!(lr.records_seen(), (left.len() + right.len()) as u64);
    }
}
