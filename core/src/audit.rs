//! The append-only team note ledger attached to every vehicle.

use chrono::{DateTime, Utc};
use recon_types::{
    Initials, NoteCategory, NoteId, TeamNote, VehicleId, VehicleRecord, VehicleUpdate,
};

use crate::errors::EngineResult;
use crate::records::RecordStore;
use crate::store::CollectionStore;

/// Caller-supplied fields of a new note. Id and timestamp are assigned on append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteDraft {
    pub text: String,
    pub user_initials: String,
    pub category: NoteCategory,
}

impl NoteDraft {
    #[must_use]
    pub fn general(text: impl Into<String>, user_initials: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            user_initials: user_initials.into(),
            category: NoteCategory::General,
        }
    }

    #[must_use]
    pub fn with_category(mut self, category: NoteCategory) -> Self {
        self.category = category;
        self
    }
}

pub struct AuditLog<'a, S: CollectionStore> {
    records: &'a mut RecordStore<S>,
}

impl<'a, S: CollectionStore> AuditLog<'a, S> {
    pub(crate) fn new(records: &'a mut RecordStore<S>) -> Self {
        Self { records }
    }

    /// Append an uncertified note to an active vehicle.
    ///
    /// Certified notes are reserved for section completions and lifecycle
    /// transitions and cannot be created through this path.
    pub fn append(&mut self, id: &VehicleId, draft: NoteDraft) -> EngineResult<TeamNote> {
        let author = Initials::new(&draft.user_initials)?;
        let record = self.records.get_by_id(id)?;
        let (_, note) = append_note(
            self.records,
            record,
            draft.text,
            author,
            draft.category,
            false,
        )?;
        Ok(note)
    }
}

/// Persist a new note on `record` through the overlay write path.
pub(crate) fn append_note<S: CollectionStore>(
    records: &mut RecordStore<S>,
    record: VehicleRecord,
    text: String,
    author: Initials,
    category: NoteCategory,
    certified: bool,
) -> EngineResult<(VehicleRecord, TeamNote)> {
    let note = stamp(&record, text, author, category, certified, Utc::now());
    let mut notes = record.team_notes;
    notes.push(note.clone());
    let updated = records.apply_update(&record.id, VehicleUpdate::team_notes(notes))?;
    Ok((updated, note))
}

/// Build a note with an id above every existing id on `record`.
pub(crate) fn stamp(
    record: &VehicleRecord,
    text: String,
    author: Initials,
    category: NoteCategory,
    certified: bool,
    now: DateTime<Utc>,
) -> TeamNote {
    let now_ms = u64::try_from(now.timestamp_millis()).unwrap_or(0);
    TeamNote {
        id: NoteId::next_after(record.last_note_id(), now_ms),
        text,
        user_initials: author,
        timestamp: now,
        category,
        is_certified: certified,
    }
}

/// Notes of one category, in append order.
pub fn filter_by_category<'r>(
    record: &'r VehicleRecord,
    category: &'r NoteCategory,
) -> impl Iterator<Item = &'r TeamNote> + 'r {
    record
        .team_notes
        .iter()
        .filter(move |note| note.category == *category)
}

pub fn summary_notes(record: &VehicleRecord) -> impl Iterator<Item = &TeamNote> {
    record
        .team_notes
        .iter()
        .filter(|note| note.category == NoteCategory::Summary)
}
