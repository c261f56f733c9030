//! The Record Store: one canonical view per vehicle, and the only write path
//! for overlay edits.
//!
//! A vehicle's record is composed from, in order of precedence:
//!
//! 1. `sold` / `pending` snapshots (a vehicle found here is not active),
//! 2. the `updatesOverlay` entry, merged field-by-field onto
//! 3. its `added` entry or baseline catalog entry.
//!
//! Every successful collection write is announced through the
//! [`Broadcaster`].

use std::collections::HashSet;

use chrono::Utc;
use recon_types::{
    Initials, Lifecycle, LifecycleState, LocationEntry, SectionKey, VehicleId, VehicleRecord,
    VehicleUpdate,
};

use crate::audit::AuditLog;
use crate::broadcast::Broadcaster;
use crate::collections::{
    Overlay, RecordList, decode_overlay, encode, merge_overlay, standalone_overlay,
    to_overlay_entry,
};
use crate::errors::{EngineError, EngineResult};
use crate::lifecycle::LifecycleManager;
use crate::status::StatusTracker;
use crate::store::{CollectionKey, CollectionStore};

#[derive(Debug)]
pub struct RecordStore<S: CollectionStore> {
    store: S,
    catalog: Vec<VehicleRecord>,
    broadcaster: Broadcaster,
}

impl<S: CollectionStore> RecordStore<S> {
    /// `catalog` is the read-only baseline inventory.
    pub fn new(store: S, catalog: Vec<VehicleRecord>) -> Self {
        Self {
            store,
            catalog,
            broadcaster: Broadcaster::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Writes made through this handle are not announced.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn broadcaster_mut(&mut self) -> &mut Broadcaster {
        &mut self.broadcaster
    }

    pub fn catalog(&self) -> &[VehicleRecord] {
        &self.catalog
    }

    pub fn status_tracker(&mut self) -> StatusTracker<'_, S> {
        StatusTracker::new(self)
    }

    pub fn lifecycle(&mut self) -> LifecycleManager<'_, S> {
        LifecycleManager::new(self)
    }

    pub fn audit_log(&mut self) -> AuditLog<'_, S> {
        AuditLog::new(self)
    }

    // ── Reads ─────────────────────────────────────────────────

    /// Every vehicle, merged: active ones first (added, then catalog, then
    /// overlay-only), then sold, then pending.
    ///
    /// Never fails. Unreadable or malformed collections are logged and read
    /// as empty; single entries that do not decode are logged and skipped.
    pub fn load_all(&self) -> Vec<VehicleRecord> {
        let added = self.read_list_lenient(CollectionKey::Added).records();
        let overlay = decode_overlay(self.read_lenient(CollectionKey::UpdatesOverlay).as_deref());
        let sold = self.read_list_lenient(CollectionKey::Sold);
        let pending = self.read_list_lenient(CollectionKey::Pending);

        // Entries that fail to decode still keep their id out of the active set.
        let inactive: HashSet<VehicleId> = sold
            .ids()
            .chain(pending.ids())
            .map(VehicleId::from)
            .collect();
        let mut seen: HashSet<VehicleId> = HashSet::new();
        let mut merged = Vec::with_capacity(added.len() + self.catalog.len());

        for base in added.iter().chain(self.catalog.iter()) {
            if inactive.contains(&base.id) || !seen.insert(base.id.clone()) {
                continue;
            }
            let record = overlay
                .get(base.id.as_str())
                .and_then(|entry| merge_overlay(base, entry))
                .unwrap_or_else(|| base.clone());
            merged.push(record);
        }

        for (id, entry) in &overlay {
            let id = VehicleId::from(id.as_str());
            if inactive.contains(&id) || seen.contains(&id) {
                continue;
            }
            if let Some(record) = standalone_overlay(id.as_str(), entry) {
                seen.insert(id);
                merged.push(record);
            }
        }

        // Sold before pending, so a vehicle present in both reads as sold.
        for record in sold.records().into_iter().chain(pending.records()) {
            if seen.insert(record.id.clone()) {
                merged.push(record);
            }
        }

        merged
    }

    pub fn load_active(&self) -> Vec<VehicleRecord> {
        self.load_in_state(LifecycleState::Active)
    }

    pub fn load_sold(&self) -> Vec<VehicleRecord> {
        self.load_in_state(LifecycleState::Sold)
    }

    pub fn load_pending(&self) -> Vec<VehicleRecord> {
        self.load_in_state(LifecycleState::Pending)
    }

    fn load_in_state(&self, state: LifecycleState) -> Vec<VehicleRecord> {
        self.load_all()
            .into_iter()
            .filter(|record| record.state() == state)
            .collect()
    }

    pub fn get_by_id(&self, id: &VehicleId) -> EngineResult<VehicleRecord> {
        self.load_all()
            .into_iter()
            .find(|record| record.id == *id)
            .ok_or_else(|| EngineError::NotFound(id.clone()))
    }

    // ── Overlay writes ────────────────────────────────────────

    /// Merge `update` onto the current record and persist the full result to
    /// the overlay.
    ///
    /// Sold and pending records are immutable; editing one is refused with
    /// [`EngineError::InvalidTransition`] since an overlay entry is by
    /// definition an active record.
    pub fn apply_update(
        &mut self,
        id: &VehicleId,
        update: VehicleUpdate,
    ) -> EngineResult<VehicleRecord> {
        let mut record = self.get_by_id(id)?;
        require_active(&record)?;

        update.apply_to(&mut record);
        self.upsert_overlay(&record)?;
        Ok(record)
    }

    /// Give `record` a `not-started` entry for every active section it lacks.
    ///
    /// Writes once when anything was missing; otherwise returns the record
    /// unchanged without touching storage. Statuses already stored are never
    /// overwritten, even when `record` is an older copy. Sold and pending
    /// records are left as they are.
    pub fn ensure_section_statuses(
        &mut self,
        record: VehicleRecord,
        active_keys: &[SectionKey],
    ) -> EngineResult<VehicleRecord> {
        if record.state() != LifecycleState::Active
            || active_keys.iter().all(|key| record.status.contains(key))
        {
            return Ok(record);
        }

        // Fill against the stored record: `record` may predate later edits.
        let current = self.get_by_id(&record.id)?;
        if current.state() != LifecycleState::Active {
            return Ok(current);
        }
        let mut status = current.status.clone();
        if status.fill_missing(active_keys) == 0 {
            return Ok(current);
        }
        self.apply_update(&current.id, VehicleUpdate::status(status))
    }

    /// [`Self::ensure_section_statuses`] for every active vehicle, persisted
    /// as a single overlay write. Returns the number of records changed.
    pub fn ensure_all_section_statuses(
        &mut self,
        active_keys: &[SectionKey],
    ) -> EngineResult<usize> {
        let mut overlay = self.read_overlay()?;
        let mut changed = 0;
        for mut record in self.load_active() {
            if record.status.fill_missing(active_keys) == 0 {
                continue;
            }
            overlay.insert(record.id.to_string(), to_overlay_entry(&record)?);
            changed += 1;
        }

        if changed > 0 {
            self.write(
                CollectionKey::UpdatesOverlay,
                &encode(CollectionKey::UpdatesOverlay, &overlay)?,
            )?;
            tracing::info!(
                changed,
                sections = active_keys.len(),
                "Initialized missing section statuses"
            );
        }
        Ok(changed)
    }

    /// Add a vehicle that is not part of the baseline catalog.
    ///
    /// The record starts active with no notes, whatever it carried in.
    pub fn register(&mut self, mut record: VehicleRecord) -> EngineResult<VehicleRecord> {
        if self.load_all().iter().any(|existing| existing.id == record.id) {
            return Err(EngineError::DuplicateVehicle(record.id));
        }
        record.lifecycle = Lifecycle::default();
        record.team_notes.clear();

        let mut added = self.read_list(CollectionKey::Added)?;
        if added.contains(&record.id) {
            return Err(EngineError::DuplicateVehicle(record.id));
        }
        added.prepend(&record)?;
        self.write(CollectionKey::Added, &added.encode()?)?;
        tracing::info!(id = %record.id, vehicle = %record.display_name(), "Registered vehicle");
        Ok(record)
    }

    /// Move a vehicle to `location`, remembering where it was.
    pub fn relocate(
        &mut self,
        id: &VehicleId,
        location: &str,
        actor: &str,
    ) -> EngineResult<VehicleRecord> {
        let actor = Initials::new(actor)?;
        let record = self.get_by_id(id)?;
        require_active(&record)?;

        let location = location.trim();
        if record.location == location {
            return Ok(record);
        }

        let mut history = record.location_history;
        if !record.location.is_empty() {
            history.push(LocationEntry {
                location: record.location,
                changed_by: actor,
                changed_at: Utc::now(),
            });
        }
        self.apply_update(
            id,
            VehicleUpdate {
                location: Some(location.to_string()),
                location_history: Some(history),
                ..VehicleUpdate::default()
            },
        )
    }

    // ── Collection plumbing used by the transition paths ─────

    pub(crate) fn upsert_overlay(&mut self, record: &VehicleRecord) -> EngineResult<()> {
        let mut overlay = self.read_overlay()?;
        overlay.insert(record.id.to_string(), to_overlay_entry(record)?);
        self.write(
            CollectionKey::UpdatesOverlay,
            &encode(CollectionKey::UpdatesOverlay, &overlay)?,
        )
    }

    /// Drop `id` from the overlay. Writes only when an entry existed.
    pub(crate) fn remove_from_overlay(&mut self, id: &VehicleId) -> EngineResult<bool> {
        let mut overlay = self.read_overlay()?;
        if overlay.remove(id.as_str()).is_none() {
            return Ok(false);
        }
        self.write(
            CollectionKey::UpdatesOverlay,
            &encode(CollectionKey::UpdatesOverlay, &overlay)?,
        )?;
        Ok(true)
    }

    /// Insert `record` at the front of `sold` or `pending`.
    pub(crate) fn prepend_to(
        &mut self,
        key: CollectionKey,
        record: &VehicleRecord,
    ) -> EngineResult<()> {
        let mut records = self.read_list(key)?;
        records.prepend(record)?;
        self.write(key, &records.encode()?)
    }

    /// Fails when `key` holds a blob that a later rewrite would refuse.
    pub(crate) fn check_list(&self, key: CollectionKey) -> EngineResult<()> {
        self.read_list(key).map(drop)
    }

    /// Drop `id` from a list collection. Writes only when it was present.
    pub(crate) fn remove_from(&mut self, key: CollectionKey, id: &VehicleId) -> EngineResult<bool> {
        let mut records = self.read_list(key)?;
        if !records.remove(id) {
            return Ok(false);
        }
        self.write(key, &records.encode()?)?;
        Ok(true)
    }

    fn read_overlay(&self) -> EngineResult<Overlay> {
        let raw = self.store.get(CollectionKey::UpdatesOverlay)?;
        Ok(decode_overlay(raw.as_deref()))
    }

    fn read_list(&self, key: CollectionKey) -> EngineResult<RecordList> {
        let raw = self.store.get(key)?;
        RecordList::decode(key, raw.as_deref())
    }

    fn read_list_lenient(&self, key: CollectionKey) -> RecordList {
        RecordList::decode_lenient(key, self.read_lenient(key).as_deref())
    }

    fn read_lenient(&self, key: CollectionKey) -> Option<String> {
        match self.store.get(key) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(collection = %key, "Treating unreadable collection as empty: {err}");
                None
            }
        }
    }

    fn write(&mut self, key: CollectionKey, blob: &str) -> EngineResult<()> {
        self.store.put(key, blob)?;
        tracing::debug!(collection = %key, bytes = blob.len(), "Collection written");
        self.broadcaster.notify(key, blob);
        Ok(())
    }
}

fn require_active(record: &VehicleRecord) -> EngineResult<()> {
    match record.state() {
        LifecycleState::Active => Ok(()),
        from => Err(EngineError::InvalidTransition {
            id: record.id.clone(),
            from,
            to: LifecycleState::Active,
        }),
    }
}
