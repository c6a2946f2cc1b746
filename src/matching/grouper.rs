//! Bucketing by (normalized city, state).
//!
//! [`PlaceIndex`] keeps the member positions of every bucket in dataset order and is
//! used for candidate lookup. [`ConflictIndex`] keeps only bucket sizes and answers
//! whether a dataset is conflicted at a key. Both are built once, before any record
//! is matched, from the unmodified datasets.

use std::collections::HashMap;

use crate::models::{ConflictKey, PlaceKey};

/// state -> normalized city -> positions, nested so lookups borrow `&str`.
#[derive(Debug, Clone, Default)]
pub struct PlaceIndex {
    buckets: HashMap<String, HashMap<String, Vec<usize>>>,
}

impl PlaceIndex {
    pub fn build<T: PlaceKey>(records: &[T]) -> Self {
        let mut buckets: HashMap<String, HashMap<String, Vec<usize>>> = HashMap::new();
        for (i, r) in records.iter().enumerate() {
            buckets
                .entry(r.state().to_string())
                .or_default()
                .entry(r.norm_city().to_string())
                .or_default()
                .push(i);
        }
        Self { buckets }
    }

    /// Positions sharing the key, in original dataset order. Empty when none.
    pub fn get(&self, norm_city: &str, state: &str) -> &[usize] {
        self.buckets
            .get(state)
            .and_then(|by_city| by_city.get(norm_city))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConflictIndex {
    counts: HashMap<String, HashMap<String, usize>>,
}

impl ConflictIndex {
    pub fn build<T: PlaceKey>(records: &[T]) -> Self {
        let mut counts: HashMap<String, HashMap<String, usize>> = HashMap::new();
        for r in records {
            *counts
                .entry(r.state().to_string())
                .or_default()
                .entry(r.norm_city().to_string())
                .or_default() += 1;
        }
        Self { counts }
    }

    pub fn count(&self, norm_city: &str, state: &str) -> usize {
        self.counts
            .get(state)
            .and_then(|by_city| by_city.get(norm_city))
            .copied()
            .unwrap_or(0)
    }

    pub fn is_conflicted(&self, norm_city: &str, state: &str) -> bool {
        self.count(norm_city, state) > 1
    }

    /// Number of keys shared by more than one record.
    pub fn conflicted_count(&self) -> usize {
        self.counts
            .values()
            .flat_map(|by_city| by_city.values())
            .filter(|n| **n > 1)
            .count()
    }

    /// Every conflicted key, sorted for stable reporting.
    pub fn conflicted_keys(&self) -> Vec<ConflictKey> {
        let mut keys: Vec<ConflictKey> = self
            .counts
            .iter()
            .flat_map(|(state, by_city)| {
                by_city
                    .iter()
                    .filter(|(_, n)| **n > 1)
                    .map(move |(city, _)| ConflictKey {
                        norm_city: city.clone(),
                        state: state.clone(),
                    })
            })
            .collect();
        keys.sort();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LegacyRecord, NewRecord};

    fn legacy() -> Vec<LegacyRecord> {
        vec![
            LegacyRecord::new("Springfield", "IL", Some("Sangamon")),
            LegacyRecord::new("Springfield", "MO", Some("Greene")),
            LegacyRecord::new("Franklin", "PA", Some("Venango")),
            LegacyRecord::new("Franklin Township", "PA", Some("Beaver")),
            LegacyRecord::new("Franklin City", "PA", Some("Cambria")),
            LegacyRecord::new("St. Louis", "MO", Some("St Louis")),
            LegacyRecord::new("Saint Louis", "MO", Some("St Louis City")),
        ]
    }

    #[test]
    fn counts_match_direct_enumeration() {
        let rows = legacy();
        let idx = ConflictIndex::build(&rows);
        for r in &rows {
            let direct = rows
                .iter()
                .filter(|o| o.norm_city() == r.norm_city() && o.state() == r.state())
                .count();
            assert_eq!(idx.count(r.norm_city(), r.state()), direct);
        }
        assert_eq!(idx.conflicted_count(), 2);
        assert_eq!(idx.conflicted_keys().len(), idx.conflicted_count());
    }

    #[test]
    fn conflict_status() {
        let idx = ConflictIndex::build(&legacy());
        assert!(idx.is_conflicted("franklin", "PA"));
        assert!(idx.is_conflicted("st louis", "MO"));
        assert!(!idx.is_conflicted("springfield", "IL"));
        assert!(!idx.is_conflicted("franklin township", "PA"));
        assert!(!idx.is_conflicted("nowhere", "ZZ"));
        assert_eq!(
            idx.conflicted_keys(),
            vec![
                ConflictKey {
                    norm_city: "franklin".into(),
                    state: "PA".into()
                },
                ConflictKey {
                    norm_city: "st louis".into(),
                    state: "MO".into()
                },
            ]
        );
    }

    #[test]
    fn per_dataset_status_is_independent() {
        let new_rows = vec![NewRecord::new("Franklin", "PA", "Venango", Some(6000))];
        let legacy_idx = ConflictIndex::build(&legacy());
        let new_idx = ConflictIndex::build(&new_rows);
        assert!(legacy_idx.is_conflicted("franklin", "PA"));
        assert!(!new_idx.is_conflicted("franklin", "PA"));
    }

    #[test]
    fn place_index_keeps_order() {
        let rows = legacy();
        let idx = PlaceIndex::build(&rows);
        assert_eq!(idx.get("franklin", "PA"), &[2, 4]);
        assert_eq!(idx.get("st louis", "MO"), &[5, 6]);
        assert!(idx.get("franklin", "OH").is_empty());
    }
}
