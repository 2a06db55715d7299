//! Metadata Store Backends
//!
//! Implementations of [`MetadataStore`](crate::domain::MetadataStore):
//! the reclass inventory on disk, and an in-memory store.

pub mod document;
mod memory;
mod yaml;

pub use memory::MemoryStore;
pub use yaml::{YamlStore, NODE_EXTENSION};
