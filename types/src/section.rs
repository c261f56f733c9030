//! Inspection sections and their per-vehicle status map.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sections every dealership inspects, regardless of configuration.
pub const BASELINE_SECTION_KEYS: [&str; 5] =
    ["emissions", "cosmetic", "mechanical", "cleaned", "photos"];

/// Category names owned by the audit log; a section may not reuse them.
const RESERVED_KEYS: [&str; 2] = ["general", "summary"];

/// Key of one inspection section (`emissions`, `cleaned`, or a configured one).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SectionKey(String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SectionKeyError {
    #[error("section key must not be empty")]
    Empty,
    #[error("section key `{0}` is reserved for note categories")]
    Reserved(String),
}

impl SectionKey {
    pub fn new(value: impl AsRef<str>) -> Result<Self, SectionKeyError> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(SectionKeyError::Empty);
        }
        if RESERVED_KEYS.contains(&trimmed) {
            return Err(SectionKeyError::Reserved(trimmed.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The five baseline sections, in inspection order.
    #[must_use]
    pub fn baseline() -> Vec<SectionKey> {
        BASELINE_SECTION_KEYS
            .iter()
            .map(|key| SectionKey((*key).to_string()))
            .collect()
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_baseline(&self) -> bool {
        BASELINE_SECTION_KEYS.contains(&self.0.as_str())
    }

    /// Human label used in generated note text.
    ///
    /// Baseline keys have fixed labels (`cleaned` reads as "Cleaning");
    /// any other key is shown with its first letter upper-cased.
    #[must_use]
    pub fn label(&self) -> String {
        match self.0.as_str() {
            "emissions" => "Emissions".to_string(),
            "cosmetic" => "Cosmetic".to_string(),
            "mechanical" => "Mechanical".to_string(),
            "cleaned" => "Cleaning".to_string(),
            "photos" => "Photos".to_string(),
            other => {
                let mut chars = other.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            }
        }
    }
}

impl TryFrom<String> for SectionKey {
    type Error = SectionKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for SectionKey {
    type Error = SectionKeyError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SectionKey> for String {
    fn from(value: SectionKey) -> Self {
        value.0
    }
}

impl fmt::Display for SectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Progress of a single inspection section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SectionStatus {
    #[default]
    NotStarted,
    Pending,
    NeedsAttention,
    Completed,
}

impl SectionStatus {
    pub const ALL: [SectionStatus; 4] = [
        SectionStatus::NotStarted,
        SectionStatus::Pending,
        SectionStatus::NeedsAttention,
        SectionStatus::Completed,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not-started",
            Self::Pending => "pending",
            Self::NeedsAttention => "needs-attention",
            Self::Completed => "completed",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
    }
}

impl fmt::Display for SectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Section key -> status map carried by every vehicle record.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionStatuses(BTreeMap<SectionKey, SectionStatus>);

impl SectionStatuses {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All given sections, each `not-started`.
    #[must_use]
    pub fn not_started<'a>(keys: impl IntoIterator<Item = &'a SectionKey>) -> Self {
        Self(
            keys.into_iter()
                .map(|key| (key.clone(), SectionStatus::NotStarted))
                .collect(),
        )
    }

    #[must_use]
    pub fn get(&self, key: &SectionKey) -> Option<SectionStatus> {
        self.0.get(key).copied()
    }

    #[must_use]
    pub fn contains(&self, key: &SectionKey) -> bool {
        self.0.contains_key(key)
    }

    /// Set a section's status, returning the previous value.
    pub fn set(&mut self, key: SectionKey, status: SectionStatus) -> Option<SectionStatus> {
        self.0.insert(key, status)
    }

    /// Insert `not-started` entries for keys that are absent.
    ///
    /// Returns the number of keys added; existing entries are left untouched.
    pub fn fill_missing<'a>(&mut self, keys: impl IntoIterator<Item = &'a SectionKey>) -> usize {
        let mut added = 0;
        for key in keys {
            if !self.0.contains_key(key) {
                self.0.insert(key.clone(), SectionStatus::NotStarted);
                added += 1;
            }
        }
        added
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.0
            .values()
            .filter(|status| **status == SectionStatus::Completed)
            .count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SectionKey, SectionStatus)> {
        self.0.iter().map(|(key, status)| (key, *status))
    }

    /// Percentage of sections completed, `0.0` for an empty map.
    #[must_use]
    pub fn progress(&self) -> f64 {
        if self.0.is_empty() {
            return 0.0;
        }
        100.0 * self.completed_count() as f64 / self.0.len() as f64
    }

    /// True when at least one section exists and all are completed.
    #[must_use]
    pub fn all_completed(&self) -> bool {
        !self.0.is_empty() && self.completed_count() == self.0.len()
    }
}

impl FromIterator<(SectionKey, SectionStatus)> for SectionStatuses {
    fn from_iter<I: IntoIterator<Item = (SectionKey, SectionStatus)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
