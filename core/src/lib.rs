//! The recon engine.
//!
//! Composes one authoritative record per vehicle from a baseline catalog and
//! the mutable `added` / `updatesOverlay` / `sold` / `pending` collections,
//! tracks inspection progress, and moves vehicles through their lifecycle.
//!
//! Everything is synchronous and assumes a single writer per process.
//! Other observers of the same storage learn about writes through the
//! [`Broadcaster`] and are expected to reload.

#![allow(clippy::missing_errors_doc)]

mod audit;
pub mod broadcast;
mod catalog;
mod collections;
mod errors;
mod file_store;
mod lifecycle;
mod records;
mod status;
pub mod store;

pub use audit::{AuditLog, NoteDraft, filter_by_category, summary_notes};
pub use broadcast::{Broadcaster, ChangeEvent, ChangeSubscriber, Delivery};
pub use catalog::load_catalog;
pub use errors::{EngineError, EngineResult};
pub use file_store::FileStore;
pub use lifecycle::LifecycleManager;
pub use records::RecordStore;
pub use status::{StatusTracker, compute_progress, is_ready_for_sale};
pub use store::{CollectionKey, CollectionStore, MemoryStore, StoreError};
