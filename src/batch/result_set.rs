use std::collections::HashSet;

use crate::record::{Batch, DedupKey, Record};

/// Deduplicated output of a fetch run. A record's index is its position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    records: Vec<Record>,
}

impl ResultSet {
    /// Concatenates batches in arrival order and keeps the first record seen
    /// for every dedup key.
    pub fn from_batches(batches: Vec<Batch>, dedup_key: &DedupKey) -> Self {
        let mut seen = HashSet::new();
        let records = batches
            .into_iter()
            .flatten()
            .filter(|record| seen.insert(dedup_key.key_of(record)))
            .collect();

        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }
}
