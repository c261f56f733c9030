//! Team notes: the per-vehicle audit trail.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Initials, NoteId, SectionKey, SectionKeyError};

/// What a note is about.
///
/// Serialized as a bare string: `"general"`, `"summary"`, or a section key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum NoteCategory {
    #[default]
    General,
    Summary,
    Section(SectionKey),
}

impl NoteCategory {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::General => "general",
            Self::Summary => "summary",
            Self::Section(key) => key.as_str(),
        }
    }

    pub fn parse(raw: &str) -> Result<Self, SectionKeyError> {
        match raw.trim() {
            "general" => Ok(Self::General),
            "summary" => Ok(Self::Summary),
            other => SectionKey::new(other).map(Self::Section),
        }
    }
}

impl TryFrom<String> for NoteCategory {
    type Error = SectionKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<NoteCategory> for String {
    fn from(value: NoteCategory) -> Self {
        match value {
            NoteCategory::Section(key) => key.into(),
            other => other.as_str().to_string(),
        }
    }
}

impl From<SectionKey> for NoteCategory {
    fn from(value: SectionKey) -> Self {
        Self::Section(value)
    }
}

impl fmt::Display for NoteCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One append-only entry in a vehicle's audit trail.
///
/// Certified notes are only ever produced by the engine itself, from a
/// verified section completion or a lifecycle transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamNote {
    pub id: NoteId,
    pub text: String,
    pub user_initials: Initials,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub category: NoteCategory,
    #[serde(default)]
    pub is_certified: bool,
}
