//! Inspection progress, readiness, and lazy section initialization.

use recon_core::{
    CollectionKey, MemoryStore, NoteDraft, RecordStore, compute_progress, filter_by_category,
    is_ready_for_sale, summary_notes,
};
use recon_types::{NoteCategory, SectionKey, SectionStatus, SectionStatuses, VehicleId};

use crate::common::{memory_engine, vehicle};

fn assert_progress(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "progress {actual} != {expected}"
    );
}

#[test]
fn progress_moves_from_zero_to_sixty_to_one_hundred() {
    let mut records = memory_engine(&["1"]);
    let id = VehicleId::from("1");
    let keys = SectionKey::baseline();

    let record = records.get_by_id(&id).unwrap();
    assert_progress(compute_progress(&record), 0.0);

    for key in &keys[..3] {
        records.status_tracker().complete_section(&id, key, "JD").unwrap();
    }
    let record = records.get_by_id(&id).unwrap();
    assert_progress(compute_progress(&record), 60.0);
    assert!(!is_ready_for_sale(&record));

    for key in &keys[3..] {
        records.status_tracker().complete_section(&id, key, "JD").unwrap();
    }
    let record = records.get_by_id(&id).unwrap();
    assert_progress(compute_progress(&record), 100.0);
    assert!(is_ready_for_sale(&record));
}

#[test]
fn ready_for_sale_iff_progress_is_complete() {
    let mut records = memory_engine(&["1"]);
    let id = VehicleId::from("1");
    let keys = SectionKey::baseline();

    // Walk every section through every status and check the equivalence each time.
    for key in &keys {
        for status in SectionStatus::ALL {
            let record = records
                .status_tracker()
                .set_status(&id, key, status)
                .unwrap();
            let complete = (compute_progress(&record) - 100.0).abs() < f64::EPSILON;
            assert_eq!(is_ready_for_sale(&record), complete);
        }
    }

    let mut empty = vehicle("2");
    empty.status = SectionStatuses::new();
    assert_eq!(
        is_ready_for_sale(&empty),
        (compute_progress(&empty) - 100.0).abs() < f64::EPSILON
    );
}

#[test]
fn ensure_section_statuses_twice_writes_once() {
    let mut bare = vehicle("1");
    bare.status = SectionStatuses::new();
    let mut records = RecordStore::new(MemoryStore::new(), vec![bare]);
    let keys = SectionKey::baseline();

    let record = records.get_by_id(&VehicleId::from("1")).unwrap();
    let record = records.ensure_section_statuses(record, &keys).unwrap();
    let again = records.ensure_section_statuses(record.clone(), &keys).unwrap();

    assert_eq!(records.store().writes(), 1);
    assert_eq!(record, again);
    assert!(keys.iter().all(|key| again.status.get(key) == Some(SectionStatus::NotStarted)));
}

#[test]
fn initialization_survives_reload() {
    let mut bare = vehicle("1");
    bare.status = SectionStatuses::new();
    let mut records = RecordStore::new(MemoryStore::new(), vec![bare]);
    let keys = SectionKey::baseline();

    let record = records.get_by_id(&VehicleId::from("1")).unwrap();
    records.ensure_section_statuses(record, &keys).unwrap();

    let reloaded = records.get_by_id(&VehicleId::from("1")).unwrap();
    assert_eq!(reloaded.status.len(), keys.len());
    assert!(records.store().blob(CollectionKey::UpdatesOverlay).is_some());
}

#[test]
fn completions_leave_certified_section_notes() {
    let mut records = memory_engine(&["1"]);
    let id = VehicleId::from("1");
    let emissions = SectionKey::new("emissions").unwrap();

    records
        .status_tracker()
        .complete_section(&id, &emissions, "JD")
        .unwrap();
    records
        .audit_log()
        .append(
            &id,
            NoteDraft::general("Passed on first try", "JD")
                .with_category(NoteCategory::Section(emissions.clone())),
        )
        .unwrap();
    records
        .audit_log()
        .append(
            &id,
            NoteDraft::general("Front-line ready", "JD").with_category(NoteCategory::Summary),
        )
        .unwrap();

    let record = records.get_by_id(&id).unwrap();
    let emissions = NoteCategory::Section(emissions);
    let section_notes: Vec<_> = filter_by_category(&record, &emissions).collect();
    assert_eq!(section_notes.len(), 2);
    assert!(section_notes[0].is_certified);
    assert_eq!(section_notes[0].text, "Emissions completed and verified.");
    assert!(!section_notes[1].is_certified);

    let summaries: Vec<_> = summary_notes(&record).collect();
    assert_eq!(summaries.len(), 1);
    assert!(record.team_notes.windows(2).all(|pair| pair[0].id < pair[1].id));
}

#[test]
fn initializing_from_an_older_copy_keeps_completed_sections() {
    let mut bare = vehicle("1");
    bare.status = SectionStatuses::new();
    let mut records = RecordStore::new(MemoryStore::new(), vec![bare]);
    let id = VehicleId::from("1");
    let emissions = SectionKey::new("emissions").unwrap();

    let older = records.get_by_id(&id).unwrap();
    records
        .status_tracker()
        .complete_section(&id, &emissions, "JD")
        .unwrap();

    let mut keys = SectionKey::baseline();
    keys.push(SectionKey::new("tires").unwrap());
    let record = records.ensure_section_statuses(older, &keys).unwrap();

    assert_eq!(record.status.len(), 6);
    assert_eq!(record.status.get(&emissions), Some(SectionStatus::Completed));
    let certified = filter_by_category(&record, &NoteCategory::Section(emissions))
        .filter(|note| note.is_certified)
        .count();
    assert_eq!(certified, 1);
    assert_progress(compute_progress(&record), 100.0 / 6.0);
}
