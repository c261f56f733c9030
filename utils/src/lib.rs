//! Shared infrastructure utilities for recon.
//!
//! This crate provides cross-cutting utilities that don't belong in the
//! domain-pure `recon-types` crate:
//!
//! - **`atomic_write`**: Crash-safe file persistence (temp + rename)

pub mod atomic_write;

pub use atomic_write::{
    AtomicWriteOptions, FileSyncPolicy, ParentDirSyncPolicy, PersistMode,
    atomic_write_with_options, recover_bak_file,
};
