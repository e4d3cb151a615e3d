//! Property tests for dataset invariants.
//!
//! Uses proptest to verify:
//! 1. Assembly uniqueness — no two records share an (entity, year) pair
//! 2. Split disjointness — train and test never share an (entity, year) pair
//! 3. Encoder stability — codes are dense and repeatable

use std::collections::HashSet;

use polars::prelude::*;
use proptest::prelude::*;

use epicast_core::data::assemble::assemble;
use epicast_core::data::encode::EntityEncoder;
use epicast_core::data::schema::TableSchema;
use epicast_core::split::split;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_entities() -> impl Strategy<Value = Vec<String>> {
    prop::collection::hash_set("[a-z]{3,8}", 1..8)
        .prop_map(|set| set.into_iter().collect::<Vec<_>>())
}

fn arb_years() -> impl Strategy<Value = Vec<i32>> {
    prop::collection::hash_set(2000i32..2030, 1..6)
        .prop_map(|set| {
            let mut years: Vec<i32> = set.into_iter().collect();
            years.sort_unstable();
            years
        })
}

fn partition_frame(entities: &[String], base: f64) -> DataFrame {
    let pm25: Vec<f64> = entities.iter().map(|_| base).collect();
    let pm10: Vec<f64> = entities.iter().map(|_| base * 1.4).collect();
    let deaths: Vec<f64> = entities
        .iter()
        .enumerate()
        .map(|(i, _)| base + i as f64)
        .collect();
    let names: Vec<&str> = entities.iter().map(|e| e.as_str()).collect();
    df!(
        "comune" => names,
        "pm25" => pm25.as_slice(),
        "pm10" => pm10.as_slice(),
        "cns_deaths" => deaths.as_slice(),
    )
    .unwrap()
}

// ── 1. Assembly uniqueness ───────────────────────────────────────────

proptest! {
    /// No two assembled records share the same (entity_id, year) pair.
    #[test]
    fn assembled_identity_is_unique(entities in arb_entities(), years in arb_years()) {
        let partitions: Vec<(String, DataFrame)> = years
            .iter()
            .map(|y| (y.to_string(), partition_frame(&entities, *y as f64)))
            .collect();

        let ds = assemble(partitions, &TableSchema::default()).unwrap();

        let mut seen = HashSet::new();
        for rec in ds.records() {
            prop_assert!(
                seen.insert((rec.entity_id.clone(), rec.year)),
                "duplicate pair ({}, {})", rec.entity_id, rec.year
            );
        }
        prop_assert_eq!(ds.len(), entities.len() * years.len());
    }

    /// Every record's year is one of the partition labels it was read from.
    #[test]
    fn record_year_matches_partition(entities in arb_entities(), years in arb_years()) {
        let partitions: Vec<(String, DataFrame)> = years
            .iter()
            .map(|y| (y.to_string(), partition_frame(&entities, *y as f64)))
            .collect();

        let ds = assemble(partitions, &TableSchema::default()).unwrap();
        let year_set: HashSet<i32> = years.iter().copied().collect();
        for rec in ds.records() {
            prop_assert!(year_set.contains(&rec.year));
        }
    }
}

// ── 2. Split disjointness ────────────────────────────────────────────

proptest! {
    /// Train and test are disjoint by (entity_id, year) for every accepted
    /// cutoff/test-year choice.
    #[test]
    fn split_sides_are_disjoint(
        entities in arb_entities(),
        years in arb_years(),
        cutoff in 1999i32..2031,
        gap in 1i32..5,
    ) {
        let partitions: Vec<(String, DataFrame)> = years
            .iter()
            .map(|y| (y.to_string(), partition_frame(&entities, *y as f64)))
            .collect();
        let ds = assemble(partitions, &TableSchema::default()).unwrap();

        let test_year = cutoff + gap;
        let s = split(&ds, cutoff, test_year).unwrap();

        let train_keys: HashSet<(String, i32)> = s
            .train
            .iter()
            .map(|r| (r.entity_id.clone(), r.year))
            .collect();
        for rec in &s.test {
            prop_assert!(!train_keys.contains(&(rec.entity_id.clone(), rec.year)));
        }

        // Both sides respect their year predicates exactly.
        prop_assert!(s.train.iter().all(|r| r.year <= cutoff));
        prop_assert!(s.test.iter().all(|r| r.year == test_year));
    }
}

// ── 3. Encoder stability ─────────────────────────────────────────────

proptest! {
    /// Encoding the same entity twice yields the same code, and codes form a
    /// dense 0..n range.
    #[test]
    fn encoder_is_stable_and_dense(entities in arb_entities(), years in arb_years()) {
        let partitions: Vec<(String, DataFrame)> = years
            .iter()
            .map(|y| (y.to_string(), partition_frame(&entities, *y as f64)))
            .collect();
        let ds = assemble(partitions, &TableSchema::default()).unwrap();

        let enc = EntityEncoder::fit(&ds);
        prop_assert_eq!(enc.len(), entities.len());

        let mut codes = HashSet::new();
        for id in &entities {
            let first = enc.encode(id).unwrap();
            let second = enc.encode(id).unwrap();
            prop_assert_eq!(first, second);
            prop_assert!((first as usize) < entities.len());
            codes.insert(first);
            prop_assert_eq!(enc.decode(first), Some(id.as_str()));
        }
        prop_assert_eq!(codes.len(), entities.len());
    }
}
