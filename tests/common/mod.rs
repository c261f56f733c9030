//! Shared test utilities and fixtures

#![allow(dead_code)]

use std::collections::BTreeSet;

use recon_core::{CollectionKey, CollectionStore, MemoryStore, RecordStore, StoreError};
use recon_types::{SectionKey, SectionStatuses, VehicleRecord};

/// A catalog vehicle listed at $25,000 with all baseline sections not started.
pub fn vehicle(id: &str) -> VehicleRecord {
    let mut record = VehicleRecord::new(id, format!("1HGCM8263{id:0>8}"), 2019, "Honda", "Accord");
    record.price = 25_000.0;
    record.mileage = 48_210;
    record.color = "Silver".into();
    record.location = "Lot A".into();
    record.status = SectionStatuses::not_started(&SectionKey::baseline());
    record
}

pub fn catalog(ids: &[&str]) -> Vec<VehicleRecord> {
    ids.iter().map(|id| vehicle(id)).collect()
}

pub fn memory_engine(ids: &[&str]) -> RecordStore<MemoryStore> {
    RecordStore::new(MemoryStore::new(), catalog(ids))
}

/// Ids stored in one raw collection blob, ignoring merge rules.
pub fn stored_ids<S: CollectionStore>(store: &S, key: CollectionKey) -> BTreeSet<String> {
    let Some(blob) = store.get(key).unwrap() else {
        return BTreeSet::new();
    };
    let value: serde_json::Value = serde_json::from_str(&blob).unwrap();
    match value {
        serde_json::Value::Object(map) => map.keys().cloned().collect(),
        serde_json::Value::Array(items) => items
            .iter()
            .filter_map(|item| item["id"].as_str().map(ToString::to_string))
            .collect(),
        other => panic!("unexpected {key} blob: {other}"),
    }
}

/// Memory store whose puts start failing after a fixed number of successes.
#[derive(Debug, Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    allowed_puts: Option<usize>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Let `n` more writes succeed, then fail every one after.
    pub fn fail_after(&mut self, n: usize) {
        self.allowed_puts = Some(n);
    }

    pub fn heal(&mut self) {
        self.allowed_puts = None;
    }
}

impl CollectionStore for FlakyStore {
    fn get(&self, key: CollectionKey) -> Result<Option<String>, StoreError> {
        self.inner.get(key)
    }

    fn put(&mut self, key: CollectionKey, value: &str) -> Result<(), StoreError> {
        match self.allowed_puts {
            Some(0) => Err(StoreError::Unavailable(format!("injected failure writing {key}"))),
            Some(ref mut remaining) => {
                *remaining -= 1;
                self.inner.put(key, value)
            }
            None => self.inner.put(key, value),
        }
    }
}
