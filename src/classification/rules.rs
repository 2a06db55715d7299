//! Classification Rules
//!
//! The class mapping table, as authored in YAML:
//!
//! ```yaml
//! web_servers:
//!   expression: <<host>>__startswith__web
//!   node_class:
//!     value_template: [cluster.<<cluster_name>>.web]
//!     value: [system.nginx]
//!   node_param:
//!     web_port:
//!       value: 8080
//!   cluster_param:
//!     web_vip_host:
//!       value_template: <<host>>
//! ```

use crate::error::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

/// Rule table keyed by rule type name, iterated in insertion order
pub type RuleTable = IndexMap<String, Rule>;

/// A conditional mapping from node attributes to classes and parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rule {
    /// Condition template
    pub expression: String,
    /// Classes assigned to matching nodes
    pub node_class: ClassSpec,
    /// Parameters written to the node document
    pub node_param: ParamSpec,
    /// Parameters written to the cluster overrides file
    pub cluster_param: ParamSpec,
}

impl Rule {
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            ..Default::default()
        }
    }

    pub fn with_classes(mut self, classes: ClassSpec) -> Self {
        self.node_class = classes;
        self
    }

    pub fn with_node_param(mut self, name: impl Into<String>, param: ParamValue) -> Self {
        self.node_param.insert(name.into(), param);
        self
    }

    pub fn with_cluster_param(mut self, name: impl Into<String>, param: ParamValue) -> Self {
        self.cluster_param.insert(name.into(), param);
        self
    }
}

/// Class names produced by a rule
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassSpec {
    /// Literal class names
    #[serde(rename = "value")]
    pub literals: Vec<String>,
    /// Templates rendered to class names
    #[serde(rename = "value_template")]
    pub templates: Vec<String>,
}

impl ClassSpec {
    pub fn literals<I, S>(classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            literals: classes.into_iter().map(Into::into).collect(),
            templates: Vec::new(),
        }
    }

    pub fn templates<I, S>(templates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            literals: Vec::new(),
            templates: templates.into_iter().map(Into::into).collect(),
        }
    }

    pub fn and_literals<I, S>(mut self, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.literals.extend(classes.into_iter().map(Into::into));
        self
    }
}

/// Parameter specs keyed by parameter name
pub type ParamSpec = IndexMap<String, ParamValue>;

/// A literal value or a template for one parameter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamValue {
    /// Literal value, any YAML
    #[serde(skip_serializing_if = "Value::is_null")]
    pub value: Value,
    /// Template rendered to a string value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_template: Option<String>,
}

impl ParamValue {
    pub fn literal(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            value_template: None,
        }
    }

    pub fn template(template: impl Into<String>) -> Self {
        Self {
            value: Value::Null,
            value_template: Some(template.into()),
        }
    }
}

/// Parse a rule table from YAML text
pub fn parse_rule_table(yaml: &str) -> Result<RuleTable> {
    let table: Option<RuleTable> = serde_yaml::from_str(yaml)?;
    Ok(table.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rule_table() {
        let yaml = r#"
web:
  expression: <<host>>__startswith__web
  node_class:
    value_template: [cluster.<<cluster_name>>.web]
    value: [system.nginx]
  node_param:
    web_port:
      value: 8080
  cluster_param:
    web_vip_host:
      value_template: <<host>>
base:
  expression: all
"#;
        let table = parse_rule_table(yaml).unwrap();

        let names: Vec<_> = table.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["web", "base"]);

        let web = &table["web"];
        assert_eq!(web.node_class.templates, vec!["cluster.<<cluster_name>>.web"]);
        assert_eq!(web.node_class.literals, vec!["system.nginx"]);
        assert_eq!(web.node_param["web_port"].value, Value::from(8080));
        assert_eq!(
            web.cluster_param["web_vip_host"].value_template.as_deref(),
            Some("<<host>>")
        );

        let base = &table["base"];
        assert_eq!(base.expression, "all");
        assert!(base.node_class.literals.is_empty());
        assert!(base.node_param.is_empty());
    }

    #[test]
    fn test_parse_empty_table() {
        assert!(parse_rule_table("").unwrap().is_empty());
        assert!(parse_rule_table("{}").unwrap().is_empty());
    }

    #[test]
    fn test_missing_expression_defaults_to_empty() {
        let table = parse_rule_table("r1:\n  node_class:\n    value: [a]\n").unwrap();
        assert_eq!(table["r1"].expression, "");
    }
}
