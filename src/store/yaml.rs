//! Filesystem YAML Store
//!
//! Reads and writes a reclass inventory on disk:
//!
//! ```text
//! <inventory>/
//! ├── nodes/
//! │   ├── <fqdn>.yml
//! │   └── _generated/<fqdn>.yml
//! └── classes/
//!     └── cluster/<cluster>/overrides.yml
//! ```

use super::document::{ClusterDocument, NodeDocument};
use crate::config::StoreConfig;
use crate::domain::{
    split_fqdn, validate_node_name, ClusterTarget, MetadataStore, Node, NodeCreation, NodeSpec,
    ParamRemoval, ParamWrite, Params, DEFAULT_CLUSTER, DEFAULT_ENVIRONMENT,
};
use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};

/// Extension of node documents
pub const NODE_EXTENSION: &str = "yml";

/// Metadata store over a reclass inventory directory
///
/// Every operation reads the whole document, changes it in memory and
/// writes it back. There is no file locking: two processes updating the
/// same document at once can lose one of the updates.
#[derive(Debug, Clone)]
pub struct YamlStore {
    config: StoreConfig,
}

impl YamlStore {
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    /// Create a store rooted at an inventory directory
    pub fn with_inventory(inventory: impl Into<PathBuf>) -> Self {
        Self::new(StoreConfig::new(inventory))
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Path of a node document
    fn node_path(&self, name: &str, path: &str) -> Result<PathBuf> {
        validate_node_name(name)?;
        let dir = self.config.nodes_dir().join(relative(path)?);
        Ok(dir.join(format!("{}.{}", name, NODE_EXTENSION)))
    }

    /// Path of a cluster document
    fn cluster_path(&self, target: &ClusterTarget) -> Result<PathBuf> {
        if target.file_name.is_empty() {
            return Err(Error::InvalidRequest("empty cluster file name".into()));
        }
        Ok(self
            .config
            .cluster_dir()
            .join(relative(&target.cluster)?)
            .join(relative(&target.file_name)?))
    }

    /// Read a node document into a [`Node`]
    fn load_node(&self, file: &Path) -> Result<Node> {
        let nodes_dir = self.config.nodes_dir();
        let fqdn = file
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| Error::InvalidDocument {
                path: file.to_path_buf(),
                reason: "file name is not valid UTF-8".into(),
            })?
            .to_string();
        let path = file
            .parent()
            .and_then(|dir| dir.strip_prefix(&nodes_dir).ok())
            .map(|dir| {
                dir.components()
                    .filter_map(|c| c.as_os_str().to_str())
                    .collect::<Vec<_>>()
                    .join("/")
            })
            .unwrap_or_default();

        let doc: NodeDocument = read_document(file)?.unwrap_or_default();
        let (name, domain) = split_fqdn(&fqdn);

        Ok(Node {
            name,
            domain,
            cluster: doc
                .system_field("cluster")
                .unwrap_or_else(|| DEFAULT_CLUSTER.to_string()),
            environment: doc
                .system_field("environment")
                .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string()),
            path,
            parameters: doc.params(),
            classes: doc.classes,
            fqdn,
        })
    }

    fn load_cluster(&self, target: &ClusterTarget) -> Result<(PathBuf, Option<ClusterDocument>)> {
        let path = self.cluster_path(target)?;
        let doc = read_document(&path)?;
        Ok((path, doc))
    }
}

impl MetadataStore for YamlStore {
    fn node_exists(&self, name: &str) -> Result<bool> {
        match self.get_node(name) {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn get_node(&self, name: &str) -> Result<Node> {
        self.list_nodes()?
            .remove(name)
            .ok_or_else(|| Error::not_found("node", name))
    }

    fn create_node(&self, spec: &NodeSpec) -> Result<NodeCreation> {
        match self.get_node(&spec.name) {
            Ok(node) => {
                debug!(node = %spec.name, "Node exists");
                return Ok(NodeCreation::Existing(node));
            }
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }

        let file = self.node_path(&spec.name, spec.path.as_deref().unwrap_or(""))?;
        write_document(&file, &NodeDocument::from_spec(spec))?;
        info!(node = %spec.name, path = %file.display(), "Node created");

        self.load_node(&file).map(NodeCreation::Created)
    }

    fn update_node(
        &self,
        name: &str,
        classes: Option<Vec<String>>,
        parameters: Option<Params>,
    ) -> Result<Node> {
        let node = self.get_node(name)?;
        let file = self.node_path(name, &node.path)?;

        let mut doc: NodeDocument = read_document(&file)?.unwrap_or_default();
        if let Some(classes) = classes {
            doc.classes = classes;
        }
        if let Some(parameters) = parameters {
            doc.set_params(&parameters);
        }
        write_document(&file, &doc)?;
        info!(node = %name, "Node updated");

        self.load_node(&file)
    }

    fn list_nodes(&self) -> Result<BTreeMap<String, Node>> {
        let nodes_dir = self.config.nodes_dir();
        let pattern = format!(
            "{}/**/*.{}",
            glob::Pattern::escape(&nodes_dir.to_string_lossy()),
            NODE_EXTENSION
        );

        let mut nodes = BTreeMap::new();
        for entry in glob::glob(&pattern)? {
            let file = entry.map_err(|e| Error::StoreIo {
                path: e.path().to_path_buf(),
                source: e.into(),
            })?;
            if !file.is_file() {
                continue;
            }
            let node = self.load_node(&file)?;
            if let Some(previous) = nodes.insert(node.fqdn.clone(), node) {
                warn!(
                    node = %previous.fqdn,
                    path = %previous.path,
                    "Duplicate node document shadowed"
                );
            }
        }

        debug!(count = nodes.len(), dir = %nodes_dir.display(), "Listed nodes");
        Ok(nodes)
    }

    fn delete_node(&self, name: &str) -> Result<()> {
        let node = self.get_node(name)?;
        let file = self.node_path(name, &node.path)?;
        fs::remove_file(&file).map_err(|source| Error::StoreIo {
            path: file.clone(),
            source,
        })?;
        info!(node = %name, path = %file.display(), "Node deleted");
        Ok(())
    }

    fn list_cluster_params(&self, target: &ClusterTarget) -> Result<Params> {
        match self.load_cluster(target)? {
            (_, Some(doc)) => Ok(doc.params()),
            (path, None) => Err(Error::not_found("cluster file", path.display().to_string())),
        }
    }

    fn set_cluster_param(
        &self,
        name: &str,
        value: Value,
        target: &ClusterTarget,
    ) -> Result<ParamWrite> {
        let (path, doc) = self.load_cluster(target)?;
        let Some(mut doc) = doc else {
            return Err(Error::not_found("cluster file", path.display().to_string()));
        };

        if doc.get(name) == Some(&value) {
            debug!(param = %name, file = %target, "Cluster parameter already in correct state");
            return Ok(ParamWrite::Unchanged(value));
        }

        doc.insert(name, value.clone());
        write_document(&path, &doc)?;
        info!(param = %name, file = %target, "Cluster parameter set");
        Ok(ParamWrite::Updated(value))
    }

    fn delete_cluster_param(&self, name: &str, target: &ClusterTarget) -> Result<ParamRemoval> {
        let (path, doc) = self.load_cluster(target)?;
        let Some(mut doc) = doc else {
            return Ok(ParamRemoval::Absent);
        };
        if doc.remove(name).is_none() {
            return Ok(ParamRemoval::Absent);
        }

        write_document(&path, &doc)?;
        info!(param = %name, file = %target, "Cluster parameter deleted");
        Ok(ParamRemoval::Deleted)
    }
}

// =============================================================================
// File helpers
// =============================================================================

/// Read a YAML document; `None` if the file does not exist
///
/// An empty file reads as the default document.
fn read_document<T: DeserializeOwned + Default>(path: &Path) -> Result<Option<T>> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(Error::StoreIo {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    debug!(path = %path.display(), "Read document");

    if text.trim().is_empty() {
        return Ok(Some(T::default()));
    }
    let doc: Option<T> = serde_yaml::from_str(&text).map_err(|source| Error::StoreFormat {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(doc.unwrap_or_default()))
}

/// Write a whole YAML document, creating parent directories
fn write_document<T: Serialize>(path: &Path, doc: &T) -> Result<()> {
    let text = serde_yaml::to_string(doc).map_err(|source| Error::StoreFormat {
        path: path.to_path_buf(),
        source,
    })?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| Error::StoreIo {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, text).map_err(|source| Error::StoreIo {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "Wrote document");
    Ok(())
}

/// A relative path that stays inside its parent directory
fn relative(path: &str) -> Result<PathBuf> {
    let candidate = Path::new(path);
    let escapes = candidate
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(Error::InvalidRequest(format!(
            "path '{}' must be relative and stay inside the inventory",
            path
        )));
    }
    Ok(candidate.to_path_buf())
}
