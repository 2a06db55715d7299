//! Classification Module
//!
//! Maps observed node attributes to classes and parameters through a table
//! of conditional, templated rules.

pub mod attributes;
pub mod classifier;
pub mod condition;
pub mod generator;
pub mod rules;
pub mod template;

pub use attributes::*;
pub use classifier::*;
pub use condition::{evaluate, Condition, Operator};
pub use generator::*;
pub use rules::*;
pub use template::render;
