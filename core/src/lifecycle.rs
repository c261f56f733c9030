//! Lifecycle transitions: Active -> Pending | Sold, and back to Active.
//!
//! A transition moves the authoritative snapshot between collections. Each
//! collection write is atomic on its own, but there is no transaction across
//! them: if `mark_sold` fails after the overlay entry is removed and before
//! the sold snapshot lands, the vehicle is missing from both until a later
//! successful write restores it. The failure is reported, not repaired.

use chrono::Utc;
use recon_types::{
    Disposition, Initials, LifecycleState, NoteCategory, PendingInfo, ReactivatedFrom,
    Reactivation, SoldInfo, VehicleId, VehicleRecord, format_usd,
};

use crate::audit::stamp;
use crate::errors::{EngineError, EngineResult};
use crate::records::RecordStore;
use crate::store::{CollectionKey, CollectionStore};

pub struct LifecycleManager<'a, S: CollectionStore> {
    records: &'a mut RecordStore<S>,
}

impl<'a, S: CollectionStore> LifecycleManager<'a, S> {
    pub(crate) fn new(records: &'a mut RecordStore<S>) -> Self {
        Self { records }
    }

    /// Move an active vehicle to `sold`.
    ///
    /// `price` defaults to the listed price. Blank `notes` are dropped.
    pub fn mark_sold(
        &mut self,
        id: &VehicleId,
        actor: &str,
        price: Option<f64>,
        notes: Option<&str>,
    ) -> EngineResult<VehicleRecord> {
        let actor = Initials::new(actor)?;
        let mut record = self.records.get_by_id(id)?;
        require_state(&record, LifecycleState::Active, LifecycleState::Sold)?;

        let price = price.unwrap_or(record.price);
        let notes = clean_notes(notes);
        let now = Utc::now();
        let text = with_notes(
            format!("Vehicle sold for {}.", format_usd(price)),
            notes.as_deref(),
        );

        let note = stamp(&record, text, actor.clone(), NoteCategory::General, true, now);
        record.team_notes.push(note);
        record.lifecycle.disposition = Disposition::Sold(SoldInfo {
            by: actor,
            date: now,
            price,
            notes,
        });

        self.move_out_of_overlay(CollectionKey::Sold, &record)?;
        tracing::info!(id = %id, price, "Vehicle sold");
        Ok(record)
    }

    /// Move an active vehicle to `pending`.
    pub fn mark_pending(
        &mut self,
        id: &VehicleId,
        actor: &str,
        notes: Option<&str>,
    ) -> EngineResult<VehicleRecord> {
        let actor = Initials::new(actor)?;
        let mut record = self.records.get_by_id(id)?;
        require_state(&record, LifecycleState::Active, LifecycleState::Pending)?;

        let notes = clean_notes(notes);
        let now = Utc::now();
        let text = with_notes(
            "Vehicle moved to pending status.".to_string(),
            notes.as_deref(),
        );

        let note = stamp(&record, text, actor.clone(), NoteCategory::General, true, now);
        record.team_notes.push(note);
        record.lifecycle.disposition = Disposition::Pending(PendingInfo {
            by: actor,
            date: now,
            notes,
        });

        self.move_out_of_overlay(CollectionKey::Pending, &record)?;
        tracing::info!(id = %id, "Vehicle moved to pending");
        Ok(record)
    }

    /// Return a sold or pending vehicle to active.
    ///
    /// The sale or pending details are cleared; the reactivation itself is
    /// remembered on the record and in its notes.
    pub fn reactivate(&mut self, id: &VehicleId, actor: &str) -> EngineResult<VehicleRecord> {
        let actor = Initials::new(actor)?;
        let mut record = self.records.get_by_id(id)?;
        let from = match record.state() {
            LifecycleState::Sold => ReactivatedFrom::Sold,
            LifecycleState::Pending => ReactivatedFrom::Pending,
            LifecycleState::Active => {
                return Err(EngineError::InvalidTransition {
                    id: id.clone(),
                    from: LifecycleState::Active,
                    to: LifecycleState::Active,
                });
            }
        };

        let now = Utc::now();
        let text = format!("Vehicle reactivated from {} status.", from.as_str());
        let note = stamp(&record, text, actor.clone(), NoteCategory::General, true, now);
        record.team_notes.push(note);
        record.lifecycle.disposition = Disposition::Active;
        record.lifecycle.reactivation = Some(Reactivation {
            by: actor,
            date: now,
            from,
        });

        // A stale copy may sit in the other collection too; clear both.
        self.records.remove_from(CollectionKey::Sold, id)?;
        self.records.remove_from(CollectionKey::Pending, id)?;
        self.records.upsert_overlay(&record)?;
        tracing::info!(id = %id, from = from.as_str(), "Vehicle reactivated");
        Ok(record)
    }

    /// Remove the overlay entry, then prepend the snapshot to `target`.
    fn move_out_of_overlay(
        &mut self,
        target: CollectionKey,
        record: &VehicleRecord,
    ) -> EngineResult<()> {
        // A target that cannot be rewritten refuses the move before anything changes.
        self.records.check_list(target)?;
        self.records.remove_from_overlay(&record.id)?;
        if let Err(err) = self.records.prepend_to(target, record) {
            tracing::warn!(
                id = %record.id,
                collection = %target,
                "Transition interrupted after overlay removal: {err}"
            );
            return Err(err);
        }
        Ok(())
    }
}

fn require_state(
    record: &VehicleRecord,
    expected: LifecycleState,
    to: LifecycleState,
) -> EngineResult<()> {
    let from = record.state();
    if from == expected {
        Ok(())
    } else {
        Err(EngineError::InvalidTransition {
            id: record.id.clone(),
            from,
            to,
        })
    }
}

fn clean_notes(notes: Option<&str>) -> Option<String> {
    notes
        .map(str::trim)
        .filter(|notes| !notes.is_empty())
        .map(ToString::to_string)
}

fn with_notes(mut text: String, notes: Option<&str>) -> String {
    if let Some(notes) = notes {
        text.push(' ');
        text.push_str(notes);
    }
    text
}
