//! Atomic file write helpers.
//!
//! Every collection blob is replaced as a whole: the new bytes go to a temp
//! file in the same directory, which is then renamed over the target. Where
//! rename-over-existing fails (Windows), the old file is moved to `.bak`
//! first and restored if the second rename fails too.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PersistMode {
    /// Allow the file to inherit the default umask.
    #[default]
    Default,
    /// Owner-only read/write (0o600 on Unix).
    OwnerOnly,
}

impl PersistMode {
    #[cfg(unix)]
    fn mode(self) -> Option<u32> {
        match self {
            Self::Default => None,
            Self::OwnerOnly => Some(0o600),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileSyncPolicy {
    SyncAll,
    SkipSync,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentDirSyncPolicy {
    SyncBestEffort,
    SkipSync,
}

#[derive(Debug, Clone, Copy)]
pub struct AtomicWriteOptions {
    /// File sync policy for the temp file before it is renamed into place.
    pub file_sync: FileSyncPolicy,
    /// Parent directory sync policy after the rename.
    pub parent_dir_sync: ParentDirSyncPolicy,
    /// Permission policy for the written file.
    pub mode: PersistMode,
}

impl Default for AtomicWriteOptions {
    fn default() -> Self {
        Self {
            file_sync: FileSyncPolicy::SyncAll,
            parent_dir_sync: ParentDirSyncPolicy::SyncBestEffort,
            mode: PersistMode::Default,
        }
    }
}

/// Recover from an interrupted atomic write by restoring `path.bak`.
///
/// If `path` is missing but its backup exists, a crash happened between the
/// two renames of the fallback path. Put the backup back so the next read
/// sees the last complete blob.
pub fn recover_bak_file(path: &Path) {
    let backup = path.with_extension("bak");
    if path.exists() || !backup.exists() {
        return;
    }
    match fs::rename(&backup, path) {
        Ok(()) => {
            tracing::warn!(
                path = %path.display(),
                "Recovered .bak file from interrupted atomic write"
            );
        }
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                "Failed to recover .bak file: {e}"
            );
        }
    }
}

pub fn atomic_write_with_options(
    path: impl AsRef<Path>,
    bytes: &[u8],
    options: AtomicWriteOptions,
) -> io::Result<()> {
    let path = path.as_ref();
    let parent = parent_dir(path);

    let mut tmp = NamedTempFile::new_in(parent)?;
    apply_mode(tmp.path(), options.mode)?;
    tmp.write_all(bytes)?;
    if options.file_sync == FileSyncPolicy::SyncAll {
        tmp.as_file().sync_all()?;
    }

    if let Err(err) = tmp.persist(path) {
        if !path.exists() {
            return Err(err.error);
        }
        replace_via_backup(err.file, path)?;
    }

    apply_mode(path, options.mode)?;
    if options.parent_dir_sync == ParentDirSyncPolicy::SyncBestEffort {
        best_effort_sync_parent_dir(parent);
    }

    Ok(())
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

fn replace_via_backup(tmp: NamedTempFile, path: &Path) -> io::Result<()> {
    let backup_path = path.with_extension("bak");
    let _ = fs::remove_file(&backup_path);
    fs::rename(path, &backup_path)?;

    if let Err(rename_err) = tmp.persist(path) {
        let _ = fs::rename(&backup_path, path);
        return Err(rename_err.error);
    }
    if let Err(e) = fs::remove_file(&backup_path) {
        tracing::warn!(
            path = %backup_path.display(),
            "Failed to remove .bak after atomic write: {e}"
        );
    }
    Ok(())
}

#[cfg(unix)]
fn apply_mode(path: &Path, mode: PersistMode) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    match mode.mode() {
        Some(bits) => fs::set_permissions(path, fs::Permissions::from_mode(bits)),
        None => Ok(()),
    }
}

#[cfg(not(unix))]
fn apply_mode(_path: &Path, _mode: PersistMode) -> io::Result<()> {
    Ok(())
}

#[cfg(unix)]
fn best_effort_sync_parent_dir(parent: &Path) {
    if let Err(e) = File::open(parent).and_then(|d| d.sync_all()) {
        debug!(path = %parent.display(), "Parent directory sync_all failed (best-effort): {e}");
    }
}

#[cfg(not(unix))]
fn best_effort_sync_parent_dir(_parent: &Path) {}
