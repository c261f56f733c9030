use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Stable identifier of a vehicle across every collection it passes through.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VehicleId(String);

impl VehicleId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for VehicleId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for VehicleId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a team note.
///
/// Serialized as a decimal string. Accepts either a string or a bare integer
/// on input so older blobs that stored millisecond timestamps as numbers
/// still load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NoteId(u64);

impl NoteId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Next id after `previous` that is also no smaller than `floor`.
    ///
    /// `floor` is normally the current Unix time in milliseconds.
    #[must_use]
    pub fn next_after(previous: Option<NoteId>, floor: u64) -> Self {
        let after_previous = previous.map_or(0, |id| id.0.saturating_add(1));
        Self(after_previous.max(floor))
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for NoteId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for NoteId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct NoteIdVisitor;

        impl Visitor<'_> for NoteIdVisitor {
            type Value = NoteId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a non-negative integer or a decimal string")
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<NoteId, E> {
                Ok(NoteId(value))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<NoteId, E> {
                u64::try_from(value)
                    .map(NoteId)
                    .map_err(|_| E::invalid_value(de::Unexpected::Signed(value), &self))
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<NoteId, E> {
                value
                    .trim()
                    .parse()
                    .map(NoteId)
                    .map_err(|_| E::invalid_value(de::Unexpected::Str(value), &self))
            }
        }

        deserializer.deserialize_any(NoteIdVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_after_respects_floor_and_previous() {
        assert_eq!(NoteId::next_after(None, 1_000), NoteId::new(1_000));
        assert_eq!(
            NoteId::next_after(Some(NoteId::new(5_000)), 1_000),
            NoteId::new(5_001)
        );
        assert_eq!(
            NoteId::next_after(Some(NoteId::new(10)), 1_000),
            NoteId::new(1_000)
        );
    }

    #[test]
    fn note_id_accepts_string_and_number() {
        let from_str: NoteId = serde_json::from_str("\"1700000000000\"").unwrap();
        let from_num: NoteId = serde_json::from_str("1700000000000").unwrap();
        assert_eq!(from_str, from_num);
        assert_eq!(serde_json::to_string(&from_num).unwrap(), "\"1700000000000\"");
    }

    #[test]
    fn note_id_rejects_garbage() {
        assert!(serde_json::from_str::<NoteId>("\"abc\"").is_err());
        assert!(serde_json::from_str::<NoteId>("-4").is_err());
    }
}
