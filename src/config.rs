//! Runtime configuration for the calculator front end

use std::env;
use std::path::PathBuf;

use crate::history::{FileStorage, HistoryStore, DEFAULT_STORAGE_KEY};

/// Default directory holding history snapshots
pub const DEFAULT_DATA_DIR: &str = "data";

/// Default snapshot size limit, matching the usual browser local storage quota
pub const DEFAULT_MAX_SNAPSHOT_BYTES: usize = 5 * 1024 * 1024;

pub const ENV_DATA_DIR: &str = "DEPOSIT_CALC_DATA_DIR";
pub const ENV_STORAGE_KEY: &str = "DEPOSIT_CALC_STORAGE_KEY";
pub const ENV_MAX_BYTES: &str = "DEPOSIT_CALC_MAX_BYTES";

/// Where and how the calculation history is stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalculatorConfig {
    /// Directory for snapshot files
    pub data_dir: PathBuf,

    /// Key (file stem) the snapshot is stored under
    pub storage_key: String,

    /// Largest snapshot the backend accepts; `None` for unlimited
    pub max_snapshot_bytes: Option<usize>,
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            max_snapshot_bytes: Some(DEFAULT_MAX_SNAPSHOT_BYTES),
        }
    }
}

impl CalculatorConfig {
    /// Defaults overlaid with `DEPOSIT_CALC_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Defaults overlaid with values from `lookup`
    ///
    /// Blank values are ignored. `DEPOSIT_CALC_MAX_BYTES=0` disables the limit;
    /// an unparseable value keeps the default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let value = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(dir) = value(ENV_DATA_DIR) {
            config.data_dir = PathBuf::from(dir.trim());
        }
        if let Some(key) = value(ENV_STORAGE_KEY) {
            config.storage_key = key.trim().to_string();
        }
        if let Some(raw) = value(ENV_MAX_BYTES) {
            match raw.trim().parse::<usize>() {
                Ok(0) => config.max_snapshot_bytes = None,
                Ok(bytes) => config.max_snapshot_bytes = Some(bytes),
                Err(_) => log::warn!(
                    "event=config_invalid var={} value={} action=keep_default",
                    ENV_MAX_BYTES,
                    raw
                ),
            }
        }

        config
    }

    /// File backend described by this config
    pub fn storage(&self) -> FileStorage {
        FileStorage::new(&self.data_dir).with_max_value_bytes(self.max_snapshot_bytes)
    }

    /// Open the history store described by this config
    pub fn open_history(&self) -> HistoryStore<FileStorage> {
        HistoryStore::open_with_key(self.storage(), self.storage_key.clone())
    }
}
