//! Per-section inspection status, progress, and readiness.

use recon_types::{
    Initials, NoteCategory, SectionKey, SectionStatus, VehicleId, VehicleRecord, VehicleUpdate,
};

use crate::audit::append_note;
use crate::errors::EngineResult;
use crate::records::RecordStore;
use crate::store::CollectionStore;

pub struct StatusTracker<'a, S: CollectionStore> {
    records: &'a mut RecordStore<S>,
}

impl<'a, S: CollectionStore> StatusTracker<'a, S> {
    pub(crate) fn new(records: &'a mut RecordStore<S>) -> Self {
        Self { records }
    }

    /// Set one section's status. Setting the current value again still
    /// writes, with no other effect.
    pub fn set_status(
        &mut self,
        id: &VehicleId,
        key: &SectionKey,
        status: SectionStatus,
    ) -> EngineResult<VehicleRecord> {
        let record = self.records.get_by_id(id)?;
        let mut statuses = record.status;
        statuses.set(key.clone(), status);
        self.records.apply_update(id, VehicleUpdate::status(statuses))
    }

    /// Mark a section completed and record a certified note for it.
    pub fn complete_section(
        &mut self,
        id: &VehicleId,
        key: &SectionKey,
        user_initials: &str,
    ) -> EngineResult<VehicleRecord> {
        let author = Initials::new(user_initials)?;
        let record = self.set_status(id, key, SectionStatus::Completed)?;

        let text = format!("{} completed and verified.", key.label());
        let (record, note) = append_note(
            self.records,
            record,
            text,
            author,
            NoteCategory::Section(key.clone()),
            true,
        )?;
        tracing::info!(id = %id, section = %key, note = %note.id, "Section completed");
        Ok(record)
    }
}

/// Percentage of sections completed; 0 when the record tracks none.
#[must_use]
pub fn compute_progress(record: &VehicleRecord) -> f64 {
    record.status.progress()
}

/// True iff the record tracks at least one section and every one is completed.
#[must_use]
pub fn is_ready_for_sale(record: &VehicleRecord) -> bool {
    record.status.all_completed()
}
