//! Node Classifier
//!
//! Evaluates a rule table against a node's attributes, then persists the
//! generated classes and parameters through a [`MetadataStore`].

use super::attributes::{NodeAttributes, RESERVED_PREFIX};
use super::condition::evaluate as evaluate_condition;
use super::generator::{generate_classes, generate_params};
use super::rules::RuleTable;
use crate::domain::{
    ClusterTarget, MetadataStore, Node, NodeCreation, NodeSpec, ParamWrite, Params,
    DEFAULT_CLUSTER, DEFAULT_ENVIRONMENT,
};
use crate::error::Result;
use indexmap::IndexMap;
use serde::Serialize;
use serde_yaml::Value;
use tracing::{debug, info, warn};

/// Nodes directory bucket that receives classified nodes
pub const GENERATED_PATH: &str = "_generated";

// =============================================================================
// Classifier Configuration
// =============================================================================

/// Configuration for the node classifier
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Attribute keys with this prefix are ignored
    pub reserved_prefix: String,
    /// Path under the nodes directory for created nodes
    pub generated_path: String,
    /// Cluster file receiving cluster parameters
    pub cluster_target: ClusterTarget,
    /// Cluster stamped on created nodes
    pub node_cluster: String,
    /// Environment stamped on created nodes
    pub node_environment: String,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            reserved_prefix: RESERVED_PREFIX.to_string(),
            generated_path: GENERATED_PATH.to_string(),
            cluster_target: ClusterTarget::default(),
            node_cluster: DEFAULT_CLUSTER.to_string(),
            node_environment: DEFAULT_ENVIRONMENT.to_string(),
        }
    }
}

// =============================================================================
// Results
// =============================================================================

/// Classes and parameters produced by the matching rules
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Evaluation {
    /// Generated classes in rule order
    pub classes: Vec<String>,
    /// Node-scoped parameters, later rules win
    pub node_params: Params,
    /// Cluster-scoped parameters, later rules win
    pub cluster_params: Params,
    /// Names of the rules whose condition held
    pub matched_rules: Vec<String>,
    /// Rules skipped because of a malformed condition, with the reason
    pub rule_errors: IndexMap<String, String>,
}

/// What happened to the node record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NodeOutcome {
    Created { node: Node },
    Existing { node: Node },
    Failed { error: String },
}

impl From<Result<NodeCreation>> for NodeOutcome {
    fn from(result: Result<NodeCreation>) -> Self {
        match result {
            Ok(NodeCreation::Created(node)) => NodeOutcome::Created { node },
            Ok(NodeCreation::Existing(node)) => NodeOutcome::Existing { node },
            Err(e) => NodeOutcome::Failed {
                error: e.to_string(),
            },
        }
    }
}

/// What happened to one cluster parameter
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ParamOutcome {
    Updated { value: Value },
    Unchanged { value: Value },
    Failed { error: String },
}

impl From<Result<ParamWrite>> for ParamOutcome {
    fn from(result: Result<ParamWrite>) -> Self {
        match result {
            Ok(ParamWrite::Updated(value)) => ParamOutcome::Updated { value },
            Ok(ParamWrite::Unchanged(value)) => ParamOutcome::Unchanged { value },
            Err(e) => ParamOutcome::Failed {
                error: e.to_string(),
            },
        }
    }
}

/// Full classification result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    #[serde(flatten)]
    pub evaluation: Evaluation,
    /// Node creation outcome, `None` when no class was generated
    pub node_create: Option<NodeOutcome>,
    /// Upsert outcome per cluster parameter
    pub cluster_param: IndexMap<String, ParamOutcome>,
}

impl ClassificationResult {
    pub fn classes(&self) -> &[String] {
        &self.evaluation.classes
    }

    /// Whether any store write failed
    pub fn has_failures(&self) -> bool {
        matches!(self.node_create, Some(NodeOutcome::Failed { .. }))
            || self
                .cluster_param
                .values()
                .any(|outcome| matches!(outcome, ParamOutcome::Failed { .. }))
    }
}

// =============================================================================
// Classifier
// =============================================================================

/// Classifies nodes against a rule table and records the result
pub struct Classifier<'a, S: MetadataStore + ?Sized> {
    store: &'a S,
    config: ClassifierConfig,
}

impl<'a, S: MetadataStore + ?Sized> Classifier<'a, S> {
    /// Create a classifier with default config
    pub fn new(store: &'a S) -> Self {
        Self::with_config(store, ClassifierConfig::default())
    }

    /// Create a classifier with custom config
    pub fn with_config(store: &'a S, config: ClassifierConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Evaluate the rule table without touching the store
    pub fn evaluate(&self, attrs: &NodeAttributes, rules: &RuleTable) -> Evaluation {
        let attrs = attrs.without_reserved(&self.config.reserved_prefix);
        let mut evaluation = Evaluation::default();

        for (rule_name, rule) in rules {
            match evaluate_condition(&attrs, &rule.expression) {
                Ok(true) => {
                    debug!(rule = %rule_name, "Rule matched");
                    evaluation
                        .classes
                        .extend(generate_classes(&attrs, &rule.node_class));
                    evaluation
                        .node_params
                        .extend(generate_params(&attrs, &rule.node_param));
                    evaluation
                        .cluster_params
                        .extend(generate_params(&attrs, &rule.cluster_param));
                    evaluation.matched_rules.push(rule_name.clone());
                }
                Ok(false) => debug!(rule = %rule_name, "Rule did not match"),
                Err(e) => {
                    warn!(rule = %rule_name, error = %e, "Skipping rule");
                    evaluation.rule_errors.insert(rule_name.clone(), e.to_string());
                }
            }
        }

        evaluation
    }

    /// Classify a node and persist the generated metadata
    ///
    /// Store failures are captured in the result. A failed node creation
    /// does not prevent the cluster parameter writes.
    pub fn classify(
        &self,
        node_name: &str,
        attrs: &NodeAttributes,
        rules: &RuleTable,
    ) -> ClassificationResult {
        let evaluation = self.evaluate(attrs, rules);

        let node_create = if evaluation.classes.is_empty() {
            debug!(node = %node_name, "No classes generated, node not created");
            None
        } else {
            let spec = NodeSpec::new(node_name)
                .with_path(self.config.generated_path.clone())
                .with_cluster(self.config.node_cluster.clone())
                .with_environment(self.config.node_environment.clone())
                .with_classes(evaluation.classes.clone())
                .with_parameters(evaluation.node_params.clone());

            let outcome = NodeOutcome::from(self.store.create_node(&spec));
            match &outcome {
                NodeOutcome::Created { .. } => {
                    info!(node = %node_name, classes = evaluation.classes.len(), "Node classified")
                }
                NodeOutcome::Existing { .. } => {
                    debug!(node = %node_name, "Node already exists")
                }
                NodeOutcome::Failed { error } => {
                    warn!(node = %node_name, error = %error, "Node creation failed")
                }
            }
            Some(outcome)
        };

        let target = &self.config.cluster_target;
        let cluster_param = evaluation
            .cluster_params
            .iter()
            .map(|(name, value)| {
                let outcome =
                    ParamOutcome::from(self.store.set_cluster_param(name, value.clone(), target));
                if let ParamOutcome::Failed { error } = &outcome {
                    warn!(
                        param = %name,
                        file = %target,
                        error = %error,
                        "Cluster parameter write failed"
                    );
                }
                (name.clone(), outcome)
            })
            .collect();

        ClassificationResult {
            evaluation,
            node_create,
            cluster_param,
        }
    }
}
