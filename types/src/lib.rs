//! Core domain types for recon.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the application.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory
#![allow(clippy::missing_panics_doc)] // Panics are documented in assertions

mod ids;
mod money;
mod note;
mod section;
mod vehicle;

pub use ids::{NoteId, VehicleId};
pub use money::format_usd;
pub use note::{NoteCategory, TeamNote};
pub use section::{
    BASELINE_SECTION_KEYS, SectionKey, SectionKeyError, SectionStatus, SectionStatuses,
};
pub use vehicle::{
    Disposition, Lifecycle, LifecycleState, LocationEntry, PendingInfo, ReactivatedFrom,
    Reactivation, SoldInfo, VehicleRecord, VehicleUpdate,
};

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Actor Initials
// ============================================================================

/// Initials identifying the person performing a mutation.
///
/// Guaranteed non-empty after trimming; the stored value is trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Initials(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("actor initials must not be empty")]
pub struct EmptyInitialsError;

impl Initials {
    pub fn new(value: impl AsRef<str>) -> Result<Self, EmptyInitialsError> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            Err(EmptyInitialsError)
        } else {
            Ok(Self(trimmed.to_string()))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Initials {
    type Error = EmptyInitialsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for Initials {
    type Error = EmptyInitialsError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Initials> for String {
    fn from(value: Initials) -> Self {
        value.0
    }
}

impl fmt::Display for Initials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl AsRef<str> for Initials {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}
