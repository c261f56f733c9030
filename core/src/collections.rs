//! Decoding and encoding of the persisted collection blobs.
//!
//! Reads are fail-open: a blob that does not parse is logged and read as an
//! empty collection, and a list entry that does not decode is skipped, so the
//! remaining data stays available. Writes are not: a list collection is
//! rewritten from its raw entries, and one that does not parse at all is
//! refused rather than replaced.

use recon_types::{VehicleId, VehicleRecord};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{EngineError, EngineResult};
use crate::store::CollectionKey;

/// `updatesOverlay`: vehicle id -> latest edited snapshot, kept as raw JSON
/// so partial entries still merge onto their base record.
pub(crate) type Overlay = Map<String, Value>;

/// A list collection (`added`, `sold`, `pending`) held as raw JSON entries.
///
/// Entries that no longer decode as a [`VehicleRecord`] are carried through
/// rewrites untouched.
#[derive(Debug)]
pub(crate) struct RecordList {
    key: CollectionKey,
    entries: Vec<Value>,
}

impl RecordList {
    /// Parse a list blob for a write. A blob that is not a JSON array fails
    /// with [`EngineError::Serialization`].
    pub(crate) fn decode(key: CollectionKey, raw: Option<&str>) -> EngineResult<Self> {
        let entries = match raw.filter(|raw| !raw.trim().is_empty()) {
            None => Vec::new(),
            Some(raw) => serde_json::from_str(raw)
                .map_err(|source| EngineError::Serialization { key, source })?,
        };
        Ok(Self { key, entries })
    }

    /// Parse a list blob for a read; a malformed blob is logged and empty.
    pub(crate) fn decode_lenient(key: CollectionKey, raw: Option<&str>) -> Self {
        Self::decode(key, raw).unwrap_or_else(|err| {
            tracing::warn!(collection = %key, "Treating malformed collection as empty: {err}");
            Self {
                key,
                entries: Vec::new(),
            }
        })
    }

    /// The entries that decode, in stored order. The rest are logged.
    pub(crate) fn records(&self) -> Vec<VehicleRecord> {
        self.entries
            .iter()
            .filter_map(|entry| match VehicleRecord::deserialize(entry) {
                Ok(record) => Some(record),
                Err(err) => {
                    tracing::warn!(
                        collection = %self.key,
                        id = entry_id(entry).unwrap_or("?"),
                        "Skipping undecodable entry: {err}"
                    );
                    None
                }
            })
            .collect()
    }

    /// Ids of every entry that carries one, decodable or not.
    pub(crate) fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(entry_id)
    }

    pub(crate) fn contains(&self, id: &VehicleId) -> bool {
        self.ids().any(|existing| existing == id.as_str())
    }

    /// Drop every entry for `id`. Returns whether anything was removed.
    pub(crate) fn remove(&mut self, id: &VehicleId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry_id(entry) != Some(id.as_str()));
        self.entries.len() != before
    }

    /// Put `record` first, replacing any older entry with its id.
    pub(crate) fn prepend(&mut self, record: &VehicleRecord) -> EngineResult<()> {
        let entry = serde_json::to_value(record).map_err(|source| EngineError::Serialization {
            key: self.key,
            source,
        })?;
        self.remove(&record.id);
        self.entries.insert(0, entry);
        Ok(())
    }

    pub(crate) fn encode(&self) -> EngineResult<String> {
        encode(self.key, &self.entries)
    }
}

fn entry_id(entry: &Value) -> Option<&str> {
    entry.get("id").and_then(Value::as_str)
}

pub(crate) fn decode_overlay(raw: Option<&str>) -> Overlay {
    let key = CollectionKey::UpdatesOverlay;
    let Some(raw) = raw.filter(|raw| !raw.trim().is_empty()) else {
        return Overlay::new();
    };
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(entries)) => entries,
        Ok(other) => {
            tracing::warn!(
                collection = %key,
                kind = json_kind(&other),
                "Treating non-object overlay as empty"
            );
            Overlay::new()
        }
        Err(err) => {
            tracing::warn!(collection = %key, "Treating malformed collection as empty: {err}");
            Overlay::new()
        }
    }
}

pub(crate) fn encode<T: Serialize + ?Sized>(key: CollectionKey, value: &T) -> EngineResult<String> {
    serde_json::to_string(value).map_err(|source| EngineError::Serialization { key, source })
}

pub(crate) fn to_overlay_entry(record: &VehicleRecord) -> EngineResult<Value> {
    serde_json::to_value(record).map_err(|source| EngineError::Serialization {
        key: CollectionKey::UpdatesOverlay,
        source,
    })
}

/// Merge an overlay entry's fields onto `base`. The base id always wins.
///
/// Returns `None` (and logs) when the merged object is not a valid record.
pub(crate) fn merge_overlay(base: &VehicleRecord, patch: &Value) -> Option<VehicleRecord> {
    let Value::Object(fields) = patch else {
        tracing::warn!(id = %base.id, "Ignoring non-object overlay entry");
        return None;
    };
    let mut merged = match serde_json::to_value(base) {
        Ok(Value::Object(merged)) => merged,
        Ok(_) | Err(_) => return None,
    };
    for (field, value) in fields {
        merged.insert(field.clone(), value.clone());
    }
    merged.insert("id".to_string(), Value::String(base.id.to_string()));

    match serde_json::from_value(Value::Object(merged)) {
        Ok(record) => Some(record),
        Err(err) => {
            tracing::warn!(id = %base.id, "Ignoring overlay entry that does not merge: {err}");
            None
        }
    }
}

/// Decode an overlay entry that has no baseline or added counterpart.
pub(crate) fn standalone_overlay(id: &str, entry: &Value) -> Option<VehicleRecord> {
    let Value::Object(fields) = entry else {
        tracing::warn!(id, "Ignoring non-object overlay entry");
        return None;
    };
    let mut fields = fields.clone();
    fields.insert("id".to_string(), Value::String(id.to_string()));
    match serde_json::from_value(Value::Object(fields)) {
        Ok(record) => Some(record),
        Err(err) => {
            tracing::warn!(id, "Ignoring overlay entry without a base record: {err}");
            None
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
