//! The engine over a real data directory.

use std::fs;
use std::path::Path;

use recon_core::{CollectionKey, FileStore, RecordStore, load_catalog};
use recon_types::{LifecycleState, SectionKey, VehicleId};

use crate::common::{catalog, vehicle};

fn open(dir: &Path) -> RecordStore<FileStore> {
    let catalog_path = dir.join("catalog.json");
    if !catalog_path.exists() {
        fs::write(&catalog_path, serde_json::to_string(&catalog(&["1", "2"])).unwrap()).unwrap();
    }
    RecordStore::new(FileStore::open(dir).unwrap(), load_catalog(&catalog_path))
}

#[test]
fn state_survives_reopening_the_data_directory() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut records = open(dir.path());
        records.register(vehicle("9")).unwrap();
        records
            .status_tracker()
            .complete_section(&VehicleId::from("9"), &SectionKey::new("photos").unwrap(), "JD")
            .unwrap();
        records
            .lifecycle()
            .mark_pending(&VehicleId::from("2"), "AB", Some("Deposit"))
            .unwrap();
    }

    let records = open(dir.path());
    let all = records.load_all();
    let summary: Vec<_> = all
        .iter()
        .map(|r| (r.id.as_str(), r.state()))
        .collect();
    assert_eq!(
        summary,
        [
            ("9", LifecycleState::Active),
            ("1", LifecycleState::Active),
            ("2", LifecycleState::Pending),
        ]
    );
    assert_eq!(all[0].team_notes.len(), 1);
    assert!(dir.path().join("added.json").exists());
    assert!(dir.path().join("pending.json").exists());
}

#[test]
fn corrupt_collection_file_reads_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut records = open(dir.path());
        records
            .lifecycle()
            .mark_sold(&VehicleId::from("1"), "AB", None, None)
            .unwrap();
    }
    fs::write(dir.path().join("sold.json"), "[{\"id\": \"1\", truncated").unwrap();

    let records = open(dir.path());
    let all = records.load_all();
    assert_eq!(all.len(), 2);
    assert!(all.iter().all(|r| r.state() == LifecycleState::Active));
}

#[test]
fn broadcast_payload_matches_file_contents() {
    let dir = tempfile::tempdir().unwrap();
    let mut records = open(dir.path());
    let rx = records.broadcaster_mut().channel();

    records
        .relocate(&VehicleId::from("1"), "Detail bay", "JD")
        .unwrap();

    let event = rx.try_recv().unwrap();
    assert_eq!(event.key, CollectionKey::UpdatesOverlay);
    let on_disk = fs::read_to_string(records.store().path_for(CollectionKey::UpdatesOverlay)).unwrap();
    assert_eq!(event.value, on_disk);
}

#[test]
fn interrupted_write_backup_is_recovered_on_load() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut records = open(dir.path());
        records
            .lifecycle()
            .mark_sold(&VehicleId::from("2"), "AB", None, None)
            .unwrap();
    }
    let sold = dir.path().join("sold.json");
    fs::rename(&sold, sold.with_extension("bak")).unwrap();

    let records = open(dir.path());
    assert_eq!(records.load_sold().len(), 1);
    assert!(sold.exists());
}

#[test]
fn undecodable_sold_entry_is_kept_through_later_sales() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut records = open(dir.path());
        records
            .lifecycle()
            .mark_sold(&VehicleId::from("2"), "AB", None, None)
            .unwrap();
    }
    let sold = dir.path().join("sold.json");
    let mut entries: Vec<serde_json::Value> =
        serde_json::from_str(&fs::read_to_string(&sold).unwrap()).unwrap();
    entries[0]["year"] = serde_json::json!("2017");
    fs::write(&sold, serde_json::to_string(&entries).unwrap()).unwrap();

    let mut records = open(dir.path());
    // The damaged snapshot still keeps vehicle 2 off the active lot.
    let active: Vec<_> = records.load_active().into_iter().map(|r| r.id).collect();
    assert_eq!(active, [VehicleId::from("1")]);

    records
        .lifecycle()
        .mark_sold(&VehicleId::from("1"), "AB", None, None)
        .unwrap();

    let stored: Vec<serde_json::Value> =
        serde_json::from_str(&fs::read_to_string(&sold).unwrap()).unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0]["id"], "1");
    assert_eq!(stored[1]["id"], "2");
    assert_eq!(stored[1]["year"], "2017");
}
