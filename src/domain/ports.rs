//! Domain Ports - Core trait definitions for the classifier
//!
//! The classifier only talks to persistent metadata through [`MetadataStore`].
//! Adapters (filesystem YAML, in-memory) implement it to provide concrete
//! storage.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

// =============================================================================
// Defaults
// =============================================================================

/// Cluster stamped on nodes created without an explicit cluster
pub const DEFAULT_CLUSTER: &str = "default";

/// Environment stamped on nodes created without an explicit environment
pub const DEFAULT_ENVIRONMENT: &str = "prd";

/// Cluster-level file that receives parameter overrides
pub const DEFAULT_CLUSTER_FILE: &str = "overrides.yml";

/// Parameter mapping as stored under `parameters._param`
pub type Params = IndexMap<String, Value>;

// =============================================================================
// Node Types
// =============================================================================

/// A managed host as recorded in the metadata store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Fully-qualified name (the document file stem)
    pub fqdn: String,
    /// First label of the FQDN
    pub name: String,
    /// Remaining labels of the FQDN
    pub domain: String,
    /// Cluster the node belongs to
    pub cluster: String,
    /// Deployment environment
    pub environment: String,
    /// Directory relative to the nodes root ("" at the top level)
    pub path: String,
    /// Assigned classes
    pub classes: Vec<String>,
    /// Node-scoped parameters
    pub parameters: Params,
}

/// Request to create a node document
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSpec {
    /// Node FQDN
    pub name: String,
    /// Optional sub-directory under the nodes root
    pub path: Option<String>,
    pub cluster: String,
    pub environment: String,
    pub classes: Vec<String>,
    pub parameters: Params,
}

impl NodeSpec {
    /// Create a spec with default cluster and environment
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: None,
            cluster: DEFAULT_CLUSTER.to_string(),
            environment: DEFAULT_ENVIRONMENT.to_string(),
            classes: Vec::new(),
            parameters: Params::new(),
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_cluster(mut self, cluster: impl Into<String>) -> Self {
        self.cluster = cluster.into();
        self
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    pub fn with_classes(mut self, classes: Vec<String>) -> Self {
        self.classes = classes;
        self
    }

    pub fn with_parameters(mut self, parameters: Params) -> Self {
        self.parameters = parameters;
        self
    }

    /// Build the node record this spec describes
    pub fn to_node(&self) -> Node {
        let (name, domain) = split_fqdn(&self.name);
        Node {
            fqdn: self.name.clone(),
            name,
            domain,
            cluster: self.cluster.clone(),
            environment: self.environment.clone(),
            path: self.path.clone().unwrap_or_default(),
            classes: self.classes.clone(),
            parameters: self.parameters.clone(),
        }
    }
}

/// Outcome of a create request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "node", rename_all = "snake_case")]
pub enum NodeCreation {
    /// A new document was written
    Created(Node),
    /// A node of that name already existed, nothing was written
    Existing(Node),
}

impl NodeCreation {
    pub fn node(&self) -> &Node {
        match self {
            NodeCreation::Created(node) | NodeCreation::Existing(node) => node,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, NodeCreation::Created(_))
    }
}

// =============================================================================
// Cluster Parameter Types
// =============================================================================

/// A cluster-level metadata file, addressed by cluster and file name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClusterTarget {
    /// Cluster directory under `classes/cluster` ("" for the root)
    pub cluster: String,
    /// File name inside the cluster directory
    pub file_name: String,
}

impl ClusterTarget {
    pub fn new(cluster: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            cluster: cluster.into(),
            file_name: file_name.into(),
        }
    }

    /// Overrides file of the given cluster
    pub fn overrides(cluster: impl Into<String>) -> Self {
        Self::new(cluster, DEFAULT_CLUSTER_FILE)
    }
}

impl Default for ClusterTarget {
    fn default() -> Self {
        Self::overrides("")
    }
}

impl std::fmt::Display for ClusterTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.cluster.is_empty() {
            write!(f, "{}", self.file_name)
        } else {
            write!(f, "{}/{}", self.cluster, self.file_name)
        }
    }
}

/// Outcome of a cluster parameter upsert
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum ParamWrite {
    /// The value was written
    Updated(Value),
    /// The stored value was already identical, nothing was written
    Unchanged(Value),
}

impl ParamWrite {
    pub fn value(&self) -> &Value {
        match self {
            ParamWrite::Updated(value) | ParamWrite::Unchanged(value) => value,
        }
    }
}

/// Outcome of a cluster parameter delete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamRemoval {
    Deleted,
    /// Key (or the whole file) was not there
    Absent,
}

// =============================================================================
// Metadata Store Port
// =============================================================================

/// Persistent node and cluster metadata
///
/// Implementations are synchronous and hold no cross-call locks: every call
/// reads, mutates and writes back a whole document.
pub trait MetadataStore {
    /// Check whether a node of that FQDN exists
    fn node_exists(&self, name: &str) -> Result<bool>;

    /// Get a node by FQDN
    fn get_node(&self, name: &str) -> Result<Node>;

    /// Create a node, or return the existing one untouched
    fn create_node(&self, spec: &NodeSpec) -> Result<NodeCreation>;

    /// Replace the classes and/or parameters of an existing node
    fn update_node(
        &self,
        name: &str,
        classes: Option<Vec<String>>,
        parameters: Option<Params>,
    ) -> Result<Node>;

    /// All nodes, keyed and sorted by FQDN
    fn list_nodes(&self) -> Result<std::collections::BTreeMap<String, Node>>;

    /// Delete a node by FQDN
    fn delete_node(&self, name: &str) -> Result<()>;

    /// The whole `_param` mapping of a cluster file
    fn list_cluster_params(&self, target: &ClusterTarget) -> Result<Params>;

    /// A single cluster parameter
    fn get_cluster_param(&self, name: &str, target: &ClusterTarget) -> Result<Option<Value>> {
        Ok(self.list_cluster_params(target)?.get(name).cloned())
    }

    /// Insert or update a cluster parameter; NotFound if the file is missing
    fn set_cluster_param(&self, name: &str, value: Value, target: &ClusterTarget)
        -> Result<ParamWrite>;

    /// Remove a cluster parameter
    fn delete_cluster_param(&self, name: &str, target: &ClusterTarget) -> Result<ParamRemoval>;
}

/// Split an FQDN into host name and domain
pub fn split_fqdn(fqdn: &str) -> (String, String) {
    match fqdn.split_once('.') {
        Some((host, domain)) => (host.to_string(), domain.to_string()),
        None => (fqdn.to_string(), String::new()),
    }
}

/// Check that a node name can be used as a document file name
///
/// Rejects empty names, names starting with `.` and names containing a path
/// separator.
pub fn validate_node_name(name: &str) -> Result<()> {
    if name.is_empty() || name.starts_with('.') || name.contains(['/', '\\']) {
        return Err(Error::InvalidRequest(format!("invalid node name '{}'", name)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_fqdn() {
        assert_eq!(
            split_fqdn("web01.prod.example.com"),
            ("web01".to_string(), "prod.example.com".to_string())
        );
        assert_eq!(split_fqdn("localhost"), ("localhost".to_string(), String::new()));
    }

    #[test]
    fn test_validate_node_name() {
        assert!(validate_node_name("web01.example.com").is_ok());
        assert!(validate_node_name("localhost").is_ok());
        for name in ["", ".hidden", "a/b", "../escape", "a\\b"] {
            assert!(
                matches!(validate_node_name(name), Err(Error::InvalidRequest(_))),
                "{} should be rejected",
                name
            );
        }
    }

    #[test]
    fn test_node_spec_defaults() {
        let node = NodeSpec::new("db01.example.com")
            .with_classes(vec!["system.db".into()])
            .to_node();

        assert_eq!(node.name, "db01");
        assert_eq!(node.domain, "example.com");
        assert_eq!(node.cluster, DEFAULT_CLUSTER);
        assert_eq!(node.environment, DEFAULT_ENVIRONMENT);
        assert_eq!(node.path, "");
        assert_eq!(node.classes, vec!["system.db".to_string()]);
    }

    #[test]
    fn test_cluster_target_display() {
        assert_eq!(ClusterTarget::default().to_string(), "overrides.yml");
        assert_eq!(ClusterTarget::overrides("lab").to_string(), "lab/overrides.yml");
    }
}
