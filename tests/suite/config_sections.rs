//! Configured inspection sections flowing into the engine.

use std::fs;

use recon_config::ReconConfig;
use recon_core::{compute_progress, is_ready_for_sale};
use recon_types::{SectionKey, SectionStatus, VehicleId};

use crate::common::memory_engine;

fn config(raw: &str) -> ReconConfig {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, raw).unwrap();
    ReconConfig::load_from(&path).unwrap().unwrap()
}

#[test]
fn custom_section_is_tracked_like_a_baseline_one() {
    let config = config(
        r#"
        [[inspection.sections]]
        key = "emissions"

        [[inspection.sections]]
        key = "tires"
        label = "Tires & Wheels"

        [[inspection.sections]]
        key = "photos"
        enabled = false
        "#,
    );
    let keys = config.active_section_keys();
    assert_eq!(keys.len(), 2);

    let mut records = memory_engine(&["1"]);
    let changed = records.ensure_all_section_statuses(&keys).unwrap();
    assert_eq!(changed, 1);

    let id = VehicleId::from("1");
    let tires = SectionKey::new("tires").unwrap();
    let record = records.get_by_id(&id).unwrap();
    assert_eq!(record.status.get(&tires), Some(SectionStatus::NotStarted));
    // Baseline entries already present are untouched; the new one joins them.
    assert_eq!(record.status.len(), 6);

    let record = records
        .status_tracker()
        .complete_section(&id, &tires, "JD")
        .unwrap();
    assert_eq!(
        record.team_notes.last().unwrap().text,
        "Tires completed and verified."
    );
    assert!((compute_progress(&record) - 100.0 / 6.0).abs() < 1e-9);
    assert!(!is_ready_for_sale(&record));
}

#[test]
fn unconfigured_sections_fall_back_to_baseline() {
    let config = config("[store]\ndata_dir = \"/tmp/recon-test\"\n");
    assert_eq!(config.active_section_keys(), SectionKey::baseline());

    let mut records = memory_engine(&["1"]);
    assert_eq!(
        records.ensure_all_section_statuses(&config.active_section_keys()).unwrap(),
        0
    );
    assert_eq!(records.store().writes(), 0);
}
