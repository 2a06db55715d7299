//! YAML Document Shapes
//!
//! Node and cluster documents keep their parameters under
//! `parameters._param`. Keys outside the ones handled here are carried
//! through a read/write cycle untouched.

use crate::classification::scalar_to_string;
use crate::domain::{split_fqdn, NodeSpec, Params};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

/// Key of the flat parameter mapping inside `parameters`
pub const PARAM_KEY: &str = "_param";

/// A node document (`nodes/**/<fqdn>.yml`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeDocument {
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub parameters: Mapping,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl NodeDocument {
    /// Build the document for a new node
    pub fn from_spec(spec: &NodeSpec) -> Self {
        let (host, domain) = split_fqdn(&spec.name);

        let mut system = Mapping::new();
        system.insert("name".into(), host.into());
        system.insert("domain".into(), domain.into());
        system.insert("cluster".into(), spec.cluster.clone().into());
        system.insert("environment".into(), spec.environment.clone().into());

        let mut linux = Mapping::new();
        linux.insert("system".into(), Value::Mapping(system));

        let mut parameters = Mapping::new();
        parameters.insert(
            PARAM_KEY.into(),
            Value::Mapping(params_to_mapping(&spec.parameters)),
        );
        parameters.insert("linux".into(), Value::Mapping(linux));

        Self {
            classes: spec.classes.clone(),
            parameters,
            extra: IndexMap::new(),
        }
    }

    pub fn params(&self) -> Params {
        read_params(&self.parameters)
    }

    pub fn set_params(&mut self, params: &Params) {
        *param_mapping_mut(&mut self.parameters) = params_to_mapping(params);
    }

    /// A string field of `parameters.linux.system`
    pub fn system_field(&self, field: &str) -> Option<String> {
        self.parameters
            .get("linux")?
            .get("system")?
            .get(field)
            .and_then(scalar_to_string)
    }
}

/// A cluster-level document (`classes/cluster/<cluster>/<file>`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterDocument {
    #[serde(default)]
    pub parameters: Mapping,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl ClusterDocument {
    pub fn params(&self) -> Params {
        read_params(&self.parameters)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.parameters.get(PARAM_KEY)?.get(name)
    }

    /// Insert a value, returning the previous one
    pub fn insert(&mut self, name: &str, value: Value) -> Option<Value> {
        param_mapping_mut(&mut self.parameters).insert(name.into(), value)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        match self.parameters.get_mut(PARAM_KEY) {
            Some(Value::Mapping(params)) => params.remove(name),
            _ => None,
        }
    }
}

fn read_params(parameters: &Mapping) -> Params {
    match parameters.get(PARAM_KEY) {
        Some(Value::Mapping(params)) => mapping_to_params(params),
        _ => Params::new(),
    }
}

/// `parameters._param`, created (or replaced if not a mapping) on demand
fn param_mapping_mut(parameters: &mut Mapping) -> &mut Mapping {
    if !matches!(parameters.get(PARAM_KEY), Some(Value::Mapping(_))) {
        parameters.insert(PARAM_KEY.into(), Value::Mapping(Mapping::new()));
    }
    match parameters.get_mut(PARAM_KEY) {
        Some(Value::Mapping(params)) => params,
        _ => unreachable!("_param was just set to a mapping"),
    }
}

pub fn mapping_to_params(mapping: &Mapping) -> Params {
    mapping
        .iter()
        .filter_map(|(k, v)| scalar_to_string(k).map(|k| (k, v.clone())))
        .collect()
}

pub fn params_to_mapping(params: &Params) -> Mapping {
    params
        .iter()
        .map(|(k, v)| (Value::String(k.clone()), v.clone()))
        .collect()
}
