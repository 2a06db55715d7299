//! Reclass Classifier
//!
//! Node-classification metadata for a reclass inventory: CRUD over node and
//! cluster documents, and a rule-based classifier that maps observed node
//! attributes to classes and parameters.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        Classifier                            │
//! │  attributes ─► condition ─► class / param generators         │
//! │                    │                                         │
//! │              template renderer (<<name>>)                    │
//! ├──────────────────────────────┬───────────────────────────────┤
//! │                       MetadataStore                          │
//! │  ┌────────────────────────┐  │  ┌─────────────────────────┐  │
//! │  │   YamlStore            │  │  │   MemoryStore           │  │
//! │  │   nodes/**/<fqdn>.yml  │  │  │   (tests, dry runs)     │  │
//! │  │   classes/cluster/...  │  │  │                         │  │
//! │  └────────────────────────┘  │  └─────────────────────────┘  │
//! └──────────────────────────────┴───────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`classification`]: renderer, conditions, generators and the classifier
//! - [`domain`]: node types and the metadata store trait
//! - [`store`]: filesystem and in-memory stores
//! - [`config`]: inventory layout
//! - [`error`]: error types and handling

pub mod classification;
pub mod config;
pub mod domain;
pub mod error;
pub mod store;

// Re-export commonly used types
pub use classification::{
    parse_rule_table, render, ClassSpec, ClassificationResult, Classifier, ClassifierConfig,
    Evaluation, NodeAttributes, NodeOutcome, ParamOutcome, ParamSpec, ParamValue, Rule,
    RuleTable,
};

pub use config::StoreConfig;

pub use domain::ports::{
    ClusterTarget, MetadataStore, Node, NodeCreation, NodeSpec, ParamRemoval, ParamWrite, Params,
};

pub use error::{Error, ErrorKind, Result};

pub use store::{MemoryStore, YamlStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
