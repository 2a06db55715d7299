//! In-Memory Store
//!
//! Metadata store kept entirely in process memory. Used by tests and
//! benchmarks, and for dry runs that should not touch an inventory.

use crate::domain::{
    validate_node_name, ClusterTarget, MetadataStore, Node, NodeCreation, NodeSpec,
    ParamRemoval, ParamWrite, Params,
};
use crate::error::{Error, Result};
use parking_lot::RwLock;
use serde_yaml::Value;
use std::collections::{BTreeMap, HashMap};

/// In-memory metadata store
#[derive(Debug, Default)]
pub struct MemoryStore {
    nodes: RwLock<BTreeMap<String, Node>>,
    clusters: RwLock<HashMap<ClusterTarget, Params>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a cluster file, replacing any previous content
    pub fn insert_cluster_file(&self, target: ClusterTarget, params: Params) {
        self.clusters.write().insert(target, params);
    }

    /// Get current node count
    pub fn node_count(&self) -> usize {
        self.nodes.read().len()
    }
}

impl MetadataStore for MemoryStore {
    fn node_exists(&self, name: &str) -> Result<bool> {
        Ok(self.nodes.read().contains_key(name))
    }

    fn get_node(&self, name: &str) -> Result<Node> {
        self.nodes
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| Error::not_found("node", name))
    }

    fn create_node(&self, spec: &NodeSpec) -> Result<NodeCreation> {
        validate_node_name(&spec.name)?;

        let mut nodes = self.nodes.write();
        if let Some(existing) = nodes.get(&spec.name) {
            return Ok(NodeCreation::Existing(existing.clone()));
        }

        let node = spec.to_node();
        nodes.insert(spec.name.clone(), node.clone());
        Ok(NodeCreation::Created(node))
    }

    fn update_node(
        &self,
        name: &str,
        classes: Option<Vec<String>>,
        parameters: Option<Params>,
    ) -> Result<Node> {
        let mut nodes = self.nodes.write();
        let node = nodes
            .get_mut(name)
            .ok_or_else(|| Error::not_found("node", name))?;

        if let Some(classes) = classes {
            node.classes = classes;
        }
        if let Some(parameters) = parameters {
            node.parameters = parameters;
        }
        Ok(node.clone())
    }

    fn list_nodes(&self) -> Result<BTreeMap<String, Node>> {
        Ok(self.nodes.read().clone())
    }

    fn delete_node(&self, name: &str) -> Result<()> {
        self.nodes
            .write()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| Error::not_found("node", name))
    }

    fn list_cluster_params(&self, target: &ClusterTarget) -> Result<Params> {
        self.clusters
            .read()
            .get(target)
            .cloned()
            .ok_or_else(|| Error::not_found("cluster file", target.to_string()))
    }

    fn set_cluster_param(
        &self,
        name: &str,
        value: Value,
        target: &ClusterTarget,
    ) -> Result<ParamWrite> {
        let mut clusters = self.clusters.write();
        let params = clusters
            .get_mut(target)
            .ok_or_else(|| Error::not_found("cluster file", target.to_string()))?;

        if params.get(name) == Some(&value) {
            return Ok(ParamWrite::Unchanged(value));
        }
        params.insert(name.to_string(), value.clone());
        Ok(ParamWrite::Updated(value))
    }

    fn delete_cluster_param(&self, name: &str, target: &ClusterTarget) -> Result<ParamRemoval> {
        let mut clusters = self.clusters.write();
        let removed = clusters
            .get_mut(target)
            .and_then(|params| params.shift_remove(name));

        Ok(match removed {
            Some(_) => ParamRemoval::Deleted,
            None => ParamRemoval::Absent,
        })
    }
}
