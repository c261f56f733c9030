//! Baseline catalog loading.

use std::fs;
use std::io;
use std::path::Path;

use recon_types::VehicleRecord;

/// Read the baseline inventory from a JSON array file.
///
/// A missing file is an empty catalog. A file that cannot be read or parsed
/// is logged and also treated as empty, same as any other collection source.
pub fn load_catalog(path: &Path) -> Vec<VehicleRecord> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "No baseline catalog");
            return Vec::new();
        }
        Err(err) => {
            tracing::warn!(path = %path.display(), "Failed to read baseline catalog: {err}");
            return Vec::new();
        }
    };

    match serde_json::from_str::<Vec<VehicleRecord>>(&content) {
        Ok(records) => {
            tracing::debug!(
                path = %path.display(),
                vehicles = records.len(),
                "Loaded baseline catalog"
            );
            records
        }
        Err(err) => {
            tracing::warn!(
                path = %path.display(),
                "Treating malformed baseline catalog as empty: {err}"
            );
            Vec::new()
        }
    }
}
