//! Class and Parameter Generators
//!
//! Turn a matching rule's specs into concrete classes and parameters.

use super::attributes::NodeAttributes;
use super::rules::{ClassSpec, ParamSpec, ParamValue};
use super::template::render;
use crate::domain::Params;
use serde_yaml::Value;

/// Generate classes for a rule: rendered templates first, then literals
pub fn generate_classes(attrs: &NodeAttributes, spec: &ClassSpec) -> Vec<String> {
    spec.templates
        .iter()
        .map(|template| render(template, attrs))
        .chain(spec.literals.iter().cloned())
        .collect()
}

/// Generate parameters for a rule
///
/// A present literal wins over the template. Parameters with neither are
/// skipped.
pub fn generate_params(attrs: &NodeAttributes, spec: &ParamSpec) -> Params {
    spec.iter()
        .filter_map(|(name, param)| resolve_param(attrs, param).map(|v| (name.clone(), v)))
        .collect()
}

fn resolve_param(attrs: &NodeAttributes, param: &ParamValue) -> Option<Value> {
    if is_present(&param.value) {
        return Some(param.value.clone());
    }
    param
        .value_template
        .as_deref()
        .filter(|template| !template.is_empty())
        .map(|template| Value::String(render(template, attrs)))
}

/// Whether a literal counts as set
///
/// Null, `false`, zero and empty strings/collections do not.
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Sequence(seq) => !seq.is_empty(),
        Value::Mapping(map) => !map.is_empty(),
        Value::Tagged(tagged) => is_present(&tagged.value),
    }
}
