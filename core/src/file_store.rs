//! Directory-backed [`CollectionStore`]: one `<collection>.json` file per key.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use recon_utils::{AtomicWriteOptions, PersistMode, atomic_write_with_options, recover_bak_file};

use crate::store::{CollectionKey, CollectionStore, StoreError};

#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
    options: AtomicWriteOptions,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `root`.
    ///
    /// Collection files carry sale prices and staff initials, so they are
    /// written owner-only unless [`Self::with_options`] says otherwise.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| {
            StoreError::Unavailable(format!("cannot create {}: {source}", root.display()))
        })?;
        Ok(Self {
            root,
            options: AtomicWriteOptions {
                mode: PersistMode::OwnerOnly,
                ..AtomicWriteOptions::default()
            },
        })
    }

    #[must_use]
    pub fn with_options(mut self, options: AtomicWriteOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn path_for(&self, key: CollectionKey) -> PathBuf {
        self.root.join(format!("{}.json", key.as_str()))
    }
}

impl CollectionStore for FileStore {
    fn get(&self, key: CollectionKey) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key);
        recover_bak_file(&path);

        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Read { key, path, source }),
        }
    }

    fn put(&mut self, key: CollectionKey, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        atomic_write_with_options(&path, value.as_bytes(), self.options)
            .map_err(|source| StoreError::Write { key, path, source })
    }
}
