use std::fs;
use std::path::Path;

use ldb_journal::{EcoFileConfig, SyncMode};
use serde::{Deserialize, Serialize};

use crate::error::DbResult;

/// Database-level settings, loadable from TOML.
///
/// ```toml
/// eco_sync = "every_write"
/// max_eco_bytes = 1048576
/// default_hier_delimiter = "|"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    /// Sync strategy after writing an ECO file.
    pub eco_sync: SyncMode,
    /// Largest ECO payload accepted on read.
    pub max_eco_bytes: u64,
    /// Hierarchy delimiter for libraries created without one.
    pub default_hier_delimiter: char,
}

impl Default for DbConfig {
    fn default() -> Self {
        let eco = EcoFileConfig::default();
        Self {
            eco_sync: eco.sync_mode,
            max_eco_bytes: eco.max_bytes,
            default_hier_delimiter: '/',
        }
    }
}

impl DbConfig {
    pub fn from_toml_str(text: &str) -> DbResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Read a TOML config file.
    pub fn load(path: &Path) -> DbResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Settings handed to the ECO file reader and writer.
    pub fn eco_file(&self) -> EcoFileConfig {
        EcoFileConfig {
            sync_mode: self.eco_sync,
            max_bytes: self.max_eco_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = DbConfig::default();
        assert_eq!(c.eco_sync, SyncMode::OsDefault);
        assert_eq!(c.max_eco_bytes, 64 * 1024 * 1024);
        assert_eq!(c.default_hier_delimiter, '/');
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c = DbConfig::from_toml_str("eco_sync = \"every_write\"\n").unwrap();
        assert_eq!(c.eco_sync, SyncMode::EveryWrite);
        assert_eq!(c.max_eco_bytes, DbConfig::default().max_eco_bytes);
        assert_eq!(c.eco_file().sync_mode, SyncMode::EveryWrite);
    }

    #[test]
    fn full_toml() {
        let c = DbConfig::from_toml_str(
            "eco_sync = \"os_default\"\nmax_eco_bytes = 1024\ndefault_hier_delimiter = \"|\"\n",
        )
        .unwrap();
        assert_eq!(c.max_eco_bytes, 1024);
        assert_eq!(c.default_hier_delimiter, '|');
    }

    #[test]
    fn unknown_sync_mode_rejected() {
        assert!(DbConfig::from_toml_str("eco_sync = \"sometimes\"\n").is_err());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ldb.toml");
        fs::write(&path, "max_eco_bytes = 77\n").unwrap();
        assert_eq!(DbConfig::load(&path).unwrap().max_eco_bytes, 77);
    }
}
