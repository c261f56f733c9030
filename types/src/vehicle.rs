//! The canonical vehicle record and its lifecycle.
//!
//! Lifecycle details are stored as flat `isSold`/`soldBy`/... fields next to
//! the descriptive ones. In memory they are an enum, so a record can never be
//! both sold and pending.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Initials, NoteId, SectionStatuses, TeamNote, VehicleId};

// ── Lifecycle ────────────────────────────────────────────────

/// Which collection holds the authoritative record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    Active,
    Pending,
    Sold,
}

impl LifecycleState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Pending => "pending",
            Self::Sold => "sold",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State a vehicle was reactivated out of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactivatedFrom {
    Sold,
    Pending,
}

impl ReactivatedFrom {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sold => "sold",
            Self::Pending => "pending",
        }
    }
}

impl From<ReactivatedFrom> for LifecycleState {
    fn from(value: ReactivatedFrom) -> Self {
        match value {
            ReactivatedFrom::Sold => LifecycleState::Sold,
            ReactivatedFrom::Pending => LifecycleState::Pending,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SoldInfo {
    pub by: Initials,
    pub date: DateTime<Utc>,
    pub price: f64,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingInfo {
    pub by: Initials,
    pub date: DateTime<Utc>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reactivation {
    pub by: Initials,
    pub date: DateTime<Utc>,
    pub from: ReactivatedFrom,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Disposition {
    #[default]
    Active,
    Pending(PendingInfo),
    Sold(SoldInfo),
}

/// Lifecycle fields of a record: where it is now, and its last reactivation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "LifecycleWire", into = "LifecycleWire")]
pub struct Lifecycle {
    pub disposition: Disposition,
    pub reactivation: Option<Reactivation>,
}

impl Lifecycle {
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        match self.disposition {
            Disposition::Active => LifecycleState::Active,
            Disposition::Pending(_) => LifecycleState::Pending,
            Disposition::Sold(_) => LifecycleState::Sold,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("record is marked {state} but has no `{field}`")]
pub struct LifecycleWireError {
    state: LifecycleState,
    field: &'static str,
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LifecycleWire {
    #[serde(default, skip_serializing_if = "is_false")]
    is_sold: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    sold_by: Option<Initials>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sold_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sold_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sold_notes: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    is_pending: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pending_by: Option<Initials>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pending_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pending_notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reactivated_by: Option<Initials>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reactivated_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reactivated_from: Option<ReactivatedFrom>,
}

fn required<T>(
    value: Option<T>,
    state: LifecycleState,
    field: &'static str,
) -> Result<T, LifecycleWireError> {
    value.ok_or(LifecycleWireError { state, field })
}

impl TryFrom<LifecycleWire> for Lifecycle {
    type Error = LifecycleWireError;

    fn try_from(wire: LifecycleWire) -> Result<Self, Self::Error> {
        // Sold wins over pending: it is the later lifecycle stage.
        let disposition = if wire.is_sold {
            let state = LifecycleState::Sold;
            Disposition::Sold(SoldInfo {
                by: required(wire.sold_by, state, "soldBy")?,
                date: required(wire.sold_date, state, "soldDate")?,
                price: required(wire.sold_price, state, "soldPrice")?,
                notes: wire.sold_notes,
            })
        } else if wire.is_pending {
            let state = LifecycleState::Pending;
            Disposition::Pending(PendingInfo {
                by: required(wire.pending_by, state, "pendingBy")?,
                date: required(wire.pending_date, state, "pendingDate")?,
                notes: wire.pending_notes,
            })
        } else {
            Disposition::Active
        };

        let reactivation = match (
            wire.reactivated_by,
            wire.reactivated_date,
            wire.reactivated_from,
        ) {
            (Some(by), Some(date), Some(from)) => Some(Reactivation { by, date, from }),
            _ => None,
        };

        Ok(Self {
            disposition,
            reactivation,
        })
    }
}

impl From<Lifecycle> for LifecycleWire {
    fn from(value: Lifecycle) -> Self {
        let mut wire = LifecycleWire::default();
        match value.disposition {
            Disposition::Active => {}
            Disposition::Pending(info) => {
                wire.is_pending = true;
                wire.pending_by = Some(info.by);
                wire.pending_date = Some(info.date);
                wire.pending_notes = info.notes;
            }
            Disposition::Sold(info) => {
                wire.is_sold = true;
                wire.sold_by = Some(info.by);
                wire.sold_date = Some(info.date);
                wire.sold_price = Some(info.price);
                wire.sold_notes = info.notes;
            }
        }
        if let Some(reactivation) = value.reactivation {
            wire.reactivated_by = Some(reactivation.by);
            wire.reactivated_date = Some(reactivation.date);
            wire.reactivated_from = Some(reactivation.from);
        }
        wire
    }
}

// ── Record ───────────────────────────────────────────────────

/// A previous location of a vehicle on the lot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationEntry {
    pub location: String,
    pub changed_by: Initials,
    pub changed_at: DateTime<Utc>,
}

/// One authoritative, merged view of a vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleRecord {
    pub id: VehicleId,
    pub vin: String,
    pub year: u16,
    pub make: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trim: Option<String>,
    #[serde(default)]
    pub mileage: u32,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_acquired: Option<NaiveDate>,
    /// Free-text notes, editable; distinct from the append-only team notes.
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub status: SectionStatuses,
    #[serde(default)]
    pub team_notes: Vec<TeamNote>,
    #[serde(default)]
    pub location_history: Vec<LocationEntry>,
    #[serde(flatten)]
    pub lifecycle: Lifecycle,
}

impl VehicleRecord {
    /// A fresh, active record with empty sections and no notes.
    #[must_use]
    pub fn new(
        id: impl Into<VehicleId>,
        vin: impl Into<String>,
        year: u16,
        make: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            vin: vin.into(),
            year,
            make: make.into(),
            model: model.into(),
            trim: None,
            mileage: 0,
            color: String::new(),
            price: 0.0,
            location: String::new(),
            date_acquired: None,
            notes: String::new(),
            status: SectionStatuses::new(),
            team_notes: Vec::new(),
            location_history: Vec::new(),
            lifecycle: Lifecycle::default(),
        }
    }

    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    #[must_use]
    pub fn is_sold(&self) -> bool {
        matches!(self.lifecycle.disposition, Disposition::Sold(_))
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self.lifecycle.disposition, Disposition::Pending(_))
    }

    /// "2019 Honda Civic".
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {} {}", self.year, self.make, self.model)
    }

    #[must_use]
    pub fn last_note_id(&self) -> Option<NoteId> {
        self.team_notes.iter().map(|note| note.id).max()
    }
}

/// A partial set of field edits; `None` leaves the field as it is.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VehicleUpdate {
    pub vin: Option<String>,
    pub year: Option<u16>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub trim: Option<String>,
    pub mileage: Option<u32>,
    pub color: Option<String>,
    pub price: Option<f64>,
    pub location: Option<String>,
    pub date_acquired: Option<NaiveDate>,
    pub notes: Option<String>,
    pub status: Option<SectionStatuses>,
    pub team_notes: Option<Vec<TeamNote>>,
    pub location_history: Option<Vec<LocationEntry>>,
}

impl VehicleUpdate {
    #[must_use]
    pub fn status(status: SectionStatuses) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn team_notes(notes: Vec<TeamNote>) -> Self {
        Self {
            team_notes: Some(notes),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge the set fields onto `record`.
    pub fn apply_to(self, record: &mut VehicleRecord) {
        macro_rules! merge {
            ($($field:ident),+ $(,)?) => {
                $(if let Some(value) = self.$field {
                    record.$field = value;
                })+
            };
        }

        merge!(
            vin,
            year,
            make,
            model,
            mileage,
            color,
            price,
            location,
            notes,
            status,
            team_notes,
            location_history,
        );
        if let Some(trim) = self.trim {
            record.trim = Some(trim);
        }
        if let Some(date) = self.date_acquired {
            record.date_acquired = Some(date);
        }
    }
}
