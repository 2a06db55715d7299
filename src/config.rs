//! Inventory Configuration
//!
//! Resolves the reclass inventory layout: `nodes/` and `classes/cluster/`
//! below a base directory.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Nodes directory name under the inventory root
pub const NODES_DIR: &str = "nodes";

/// Classes directory name under the inventory root
pub const CLASSES_DIR: &str = "classes";

/// Cluster directory name under the classes directory
pub const CLUSTER_DIR: &str = "cluster";

/// Configuration for the YAML metadata store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Inventory root directory
    pub inventory_base_uri: PathBuf,
}

/// Subset of a reclass config file we read
#[derive(Debug, Deserialize)]
struct ConfigFile {
    inventory_base_uri: Option<PathBuf>,
}

impl StoreConfig {
    /// Create a config rooted at `inventory`
    pub fn new(inventory: impl Into<PathBuf>) -> Self {
        Self {
            inventory_base_uri: inventory.into(),
        }
    }

    /// Load a reclass-style YAML config file
    ///
    /// A relative `inventory_base_uri` is resolved against the directory
    /// holding the config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| Error::StoreIo {
            path: path.to_path_buf(),
            source,
        })?;
        let file: ConfigFile = serde_yaml::from_str(&text).map_err(|source| Error::StoreFormat {
            path: path.to_path_buf(),
            source,
        })?;

        let base = file.inventory_base_uri.ok_or_else(|| {
            Error::Configuration(format!("{} has no inventory_base_uri", path.display()))
        })?;
        let base = if base.is_relative() {
            path.parent().unwrap_or_else(|| Path::new(".")).join(base)
        } else {
            base
        };

        debug!(config = %path.display(), inventory = %base.display(), "Loaded store config");
        Ok(Self::new(base))
    }

    pub fn nodes_dir(&self) -> PathBuf {
        self.inventory_base_uri.join(NODES_DIR)
    }

    pub fn classes_dir(&self) -> PathBuf {
        self.inventory_base_uri.join(CLASSES_DIR)
    }

    pub fn cluster_dir(&self) -> PathBuf {
        self.classes_dir().join(CLUSTER_DIR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_layout() {
        let config = StoreConfig::new("/srv/salt/reclass");
        assert_eq!(config.nodes_dir(), PathBuf::from("/srv/salt/reclass/nodes"));
        assert_eq!(
            config.cluster_dir(),
            PathBuf::from("/srv/salt/reclass/classes/cluster")
        );
    }

    #[test]
    fn test_from_file_relative_base() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("reclass-config.yml");
        std::fs::write(&path, "storage_type: yaml_fs\ninventory_base_uri: inventory\n").unwrap();

        let config = StoreConfig::from_file(&path).unwrap();
        assert_eq!(config.inventory_base_uri, tmp.path().join("inventory"));
    }

    #[test]
    fn test_from_file_missing_base() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("reclass-config.yml");
        std::fs::write(&path, "storage_type: yaml_fs\n").unwrap();

        let err = StoreConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_from_file_missing_file() {
        let err = StoreConfig::from_file("/nonexistent/reclass-config.yml").unwrap_err();
        assert!(matches!(err, Error::StoreIo { .. }));
    }
}
