//! Domain layer - Core types and port definitions
//!
//! This module defines the metadata store trait that adapters implement,
//! following hexagonal architecture principles.

pub mod ports;

pub use ports::*;
