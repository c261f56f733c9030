//! Behavior when a multi-collection transition is interrupted between writes.

use recon_core::{CollectionKey, EngineError, RecordStore, StoreError};
use recon_types::{LifecycleState, VehicleId};

use crate::common::{FlakyStore, catalog, stored_ids};

#[test]
fn sale_interrupted_after_overlay_removal_leaves_no_stored_copy() {
    let mut records = RecordStore::new(FlakyStore::new(), catalog(&["1"]));
    let id = VehicleId::from("1");
    records.relocate(&id, "Showroom", "AB").unwrap();

    let events = records.broadcaster_mut().channel();
    // The overlay removal succeeds; the sold insert fails.
    records.store_mut().fail_after(1);

    let err = records.lifecycle().mark_sold(&id, "AB", None, None).unwrap_err();
    assert!(matches!(err, EngineError::Store(StoreError::Unavailable(_))));

    assert!(!stored_ids(records.store(), CollectionKey::UpdatesOverlay).contains("1"));
    assert!(!stored_ids(records.store(), CollectionKey::Sold).contains("1"));

    // Only the write that landed was announced.
    let keys: Vec<_> = events.try_iter().map(|event| event.key).collect();
    assert_eq!(keys, [CollectionKey::UpdatesOverlay]);

    // The baseline entry shows through again, without the overlay edits.
    let record = records.get_by_id(&id).unwrap();
    assert_eq!(record.state(), LifecycleState::Active);
    assert_eq!(record.location, "Lot A");
}

#[test]
fn retry_after_interrupted_sale_completes_it() {
    let mut records = RecordStore::new(FlakyStore::new(), catalog(&["1"]));
    let id = VehicleId::from("1");
    records.relocate(&id, "Showroom", "AB").unwrap();

    records.store_mut().fail_after(1);
    records.lifecycle().mark_sold(&id, "AB", None, None).unwrap_err();

    records.store_mut().heal();
    let sold = records.lifecycle().mark_sold(&id, "AB", None, None).unwrap();

    assert!(sold.is_sold());
    assert_eq!(
        stored_ids(records.store(), CollectionKey::Sold).into_iter().collect::<Vec<_>>(),
        ["1"]
    );
}

#[test]
fn failed_overlay_write_changes_nothing() {
    let mut records = RecordStore::new(FlakyStore::new(), catalog(&["1"]));
    let id = VehicleId::from("1");
    records.store_mut().fail_after(0);

    let err = records.relocate(&id, "Showroom", "AB").unwrap_err();
    assert!(matches!(err, EngineError::Store(_)));

    records.store_mut().heal();
    assert_eq!(records.get_by_id(&id).unwrap().location, "Lot A");
}
