//! Lifecycle state machine properties across whole transition sequences.

use std::collections::HashSet;

use recon_core::{CollectionKey, EngineError, MemoryStore, RecordStore};
use recon_types::{LifecycleState, ReactivatedFrom, VehicleId};

use crate::common::{memory_engine, stored_ids};

fn assert_single_home(records: &RecordStore<MemoryStore>, ids: &[&str]) {
    let overlay = stored_ids(records.store(), CollectionKey::UpdatesOverlay);
    let sold = stored_ids(records.store(), CollectionKey::Sold);
    let pending = stored_ids(records.store(), CollectionKey::Pending);

    for id in ids {
        let homes = [&overlay, &sold, &pending]
            .iter()
            .filter(|set| set.contains(*id))
            .count();
        assert!(homes <= 1, "vehicle {id} stored in {homes} collections");
    }

    let all = records.load_all();
    for record in &all {
        assert!(
            !(record.is_sold() && record.is_pending()),
            "vehicle {} is both sold and pending",
            record.id
        );
    }
    let unique: HashSet<_> = all.iter().map(|r| &r.id).collect();
    assert_eq!(unique.len(), all.len(), "duplicate ids in merged view");
}

#[test]
fn every_transition_sequence_keeps_one_home_per_vehicle() {
    let ids = ["1", "2", "3", "4"];
    let mut records = memory_engine(&ids);

    // Deterministic pseudo-random walk over the transition graph.
    let mut seed: u64 = 0x9e37_79b9_7f4a_7c15;
    for step in 0..200 {
        seed = seed
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        let id = VehicleId::from(ids[(seed >> 33) as usize % ids.len()]);
        let op = (seed >> 17) % 5;

        let result = match op {
            0 => records.lifecycle().mark_sold(&id, "AB", None, None),
            1 => records.lifecycle().mark_pending(&id, "CD", Some("Deposit")),
            2 | 3 => records.lifecycle().reactivate(&id, "EF"),
            _ => records.relocate(&id, &format!("Row {step}"), "GH"),
        };
        if let Err(err) = result {
            assert!(
                matches!(err, EngineError::InvalidTransition { .. }),
                "step {step}: unexpected error {err}"
            );
        }

        assert_single_home(&records, &ids);
    }
}

#[test]
fn sell_then_reactivate_restores_active_record() {
    let mut records = memory_engine(&["1"]);
    let id = VehicleId::from("1");

    records.lifecycle().mark_sold(&id, "AB", None, None).unwrap();
    assert!(stored_ids(records.store(), CollectionKey::Sold).contains("1"));

    let record = records.lifecycle().reactivate(&id, "AB").unwrap();

    assert!(!record.is_sold());
    assert!(!record.is_pending());
    assert!(!stored_ids(records.store(), CollectionKey::Sold).contains("1"));

    let reloaded = records.get_by_id(&id).unwrap();
    assert_eq!(reloaded.state(), LifecycleState::Active);
    assert_eq!(
        reloaded.lifecycle.reactivation.as_ref().map(|r| r.from),
        Some(ReactivatedFrom::Sold)
    );
    let texts: Vec<_> = reloaded.team_notes.iter().map(|n| n.text.as_str()).collect();
    assert_eq!(
        texts,
        [
            "Vehicle sold for $25,000.",
            "Vehicle reactivated from sold status."
        ]
    );
}

#[test]
fn second_sale_fails_with_invalid_transition() {
    let mut records = memory_engine(&["1"]);
    let id = VehicleId::from("1");

    records.lifecycle().mark_sold(&id, "AB", Some(24_000.0), None).unwrap();
    let writes = records.store().writes();

    let err = records.lifecycle().mark_sold(&id, "AB", None, None).unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransition { .. }));
    assert_eq!(records.store().writes(), writes);
}

#[test]
fn pending_with_empty_actor_persists_nothing() {
    let mut records = memory_engine(&["1"]);

    let err = records
        .lifecycle()
        .mark_pending(&VehicleId::from("1"), "", Some("hold"))
        .unwrap_err();

    assert!(matches!(err, EngineError::MissingActor));
    assert_eq!(records.store().writes(), 0);
    assert!(records.store().blob(CollectionKey::Pending).is_none());
}

#[test]
fn unknown_vehicle_is_not_found() {
    let mut records = memory_engine(&["1"]);
    let err = records
        .lifecycle()
        .mark_sold(&VehicleId::from("99"), "AB", None, None)
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
}

#[test]
fn sold_vehicle_stays_suppressed_from_active_views() {
    let mut records = memory_engine(&["1", "2"]);
    records
        .lifecycle()
        .mark_sold(&VehicleId::from("1"), "AB", None, None)
        .unwrap();

    let active: Vec<_> = records.load_active().into_iter().map(|r| r.id).collect();
    assert_eq!(active, [VehicleId::from("2")]);
    assert_eq!(records.load_sold().len(), 1);
    // The catalog entry is never purged.
    assert_eq!(records.catalog().len(), 2);
}

#[test]
fn transitions_broadcast_each_collection_write() {
    let mut records = memory_engine(&["1"]);
    let rx = records.broadcaster_mut().channel();
    let id = VehicleId::from("1");

    records.relocate(&id, "Showroom", "AB").unwrap();
    records.lifecycle().mark_pending(&id, "AB", None).unwrap();

    let keys: Vec<_> = rx.try_iter().map(|event| event.key).collect();
    assert_eq!(
        keys,
        [
            CollectionKey::UpdatesOverlay,
            CollectionKey::UpdatesOverlay,
            CollectionKey::Pending
        ]
    );
}
