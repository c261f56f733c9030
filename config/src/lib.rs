//! Configuration loading for recon.
//!
//! ```toml
//! [store]
//! data_dir = "${HOME}/recon-data"
//! catalog = "catalog.json"
//!
//! [[inspection.sections]]
//! key = "emissions"
//! label = "Emissions"
//!
//! [[inspection.sections]]
//! key = "tires"
//! label = "Tires & Wheels"
//! enabled = false
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::{env, fs, io};

use recon_types::SectionKey;
use serde::Deserialize;
use thiserror::Error;

/// Environment variable that overrides the config file location.
pub const CONFIG_ENV_VAR: &str = "RECON_CONFIG";

const DEFAULT_CATALOG_FILE: &str = "catalog.json";

// Default value function for serde (bool::default() is false, so only true needs a fn)
const fn default_true() -> bool {
    true
}

#[derive(Debug, Default, Deserialize)]
pub struct ReconConfig {
    pub store: Option<StoreConfig>,
    pub inspection: Option<InspectionConfig>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl ConfigError {
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

/// Where collection blobs and the baseline catalog live.
#[derive(Debug, Default, Deserialize)]
pub struct StoreConfig {
    /// Directory holding one JSON blob per collection. `~` and `${VAR}` are expanded.
    pub data_dir: Option<String>,
    /// Baseline catalog file; relative paths resolve against `data_dir`.
    pub catalog: Option<String>,
}

/// Inspection sections a dealership tracks.
///
/// An empty list means the five baseline sections.
#[derive(Debug, Default, Deserialize)]
pub struct InspectionConfig {
    #[serde(default)]
    pub sections: Vec<SectionConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SectionConfig {
    pub key: String,
    /// Display label. Consumed by presentation layers only.
    pub label: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl ReconConfig {
    /// Load from [`config_path`]. `Ok(None)` when no file exists.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(None),
        }
    }

    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        match toml::from_str(&content) {
            Ok(config) => Ok(Some(config)),
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        }
    }

    #[must_use]
    pub fn path() -> Option<PathBuf> {
        config_path()
    }

    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.store
            .as_ref()
            .and_then(|store| store.data_dir.as_deref())
            .map(expand_path)
            .unwrap_or_else(default_data_dir)
    }

    #[must_use]
    pub fn catalog_path(&self) -> PathBuf {
        let raw = self
            .store
            .as_ref()
            .and_then(|store| store.catalog.as_deref())
            .unwrap_or(DEFAULT_CATALOG_FILE);
        let path = expand_path(raw);
        if path.is_absolute() {
            path
        } else {
            self.data_dir().join(path)
        }
    }

    /// Keys of the enabled sections, in configured order.
    ///
    /// Invalid and duplicate keys are skipped with a warning. Falls back to the
    /// baseline sections when none are configured.
    #[must_use]
    pub fn active_section_keys(&self) -> Vec<SectionKey> {
        let configured = self
            .inspection
            .as_ref()
            .map(|inspection| inspection.sections.as_slice())
            .unwrap_or_default();
        if configured.is_empty() {
            return SectionKey::baseline();
        }

        let mut seen = HashSet::new();
        let mut keys = Vec::new();
        for section in configured.iter().filter(|section| section.enabled) {
            match SectionKey::new(&section.key) {
                Ok(key) => {
                    if seen.insert(key.clone()) {
                        keys.push(key);
                    } else {
                        tracing::warn!(key = %key, "Duplicate inspection section in config");
                    }
                }
                Err(err) => {
                    tracing::warn!(key = %section.key, "Skipping inspection section: {err}");
                }
            }
        }
        keys
    }
}

/// `$RECON_CONFIG`, else `~/.recon/config.toml`.
#[must_use]
pub fn config_path() -> Option<PathBuf> {
    if let Ok(raw) = env::var(CONFIG_ENV_VAR)
        && !raw.trim().is_empty()
    {
        return Some(expand_path(&raw));
    }
    dirs::home_dir().map(|home| home.join(".recon").join("config.toml"))
}

/// `~/.recon/data`, or `./.recon/data` when the home directory is unknown.
#[must_use]
pub fn default_data_dir() -> PathBuf {
    dirs::home_dir().map_or_else(
        || PathBuf::from(".recon").join("data"),
        |home| home.join(".recon").join("data"),
    )
}

/// Expand `${VAR}` references and a leading `~/`.
#[must_use]
pub fn expand_path(raw: &str) -> PathBuf {
    let expanded = expand_env_vars(raw.trim());
    if let Some(rest) = expanded.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(expanded)
}

/// Replace `${VAR}` with the variable's value (empty when unset).
///
/// An unclosed `${` is kept literally.
#[must_use]
pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let var = &after[..end];
                if !var.is_empty() {
                    out.push_str(&env::var(var).unwrap_or_default());
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);

    out
}
