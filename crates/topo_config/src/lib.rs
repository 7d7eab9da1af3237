//! # topo_config
//!
//! Stack configuration loading for topo.
//!
//! Topology inputs live in a flat key/value store under namespaced keys
//! (`<namespace>:virtualMachines`, `<namespace>:subnets`, ...), each holding a
//! JSON document. This crate decodes them into typed records and runs the
//! checks that need no cross-references.
//!
//! ## Example
//!
//! ```rust,no_run
//! use topo_config::{ConfigStore, TopologyConfig, TopologyValidator};
//!
//! let store = ConfigStore::from_stack_file("Pulumi.dev.yaml").unwrap();
//! let topology = TopologyConfig::load(&store.namespace("azure-topology")).unwrap();
//!
//! let report = TopologyValidator::validate(&topology);
//! assert!(report.valid);
//! ```

pub mod error;
pub mod models;
pub mod reader;
pub mod topology;
pub mod validator;

pub use error::{ConfigError, ConfigResult};
pub use models::*;
pub use reader::{Config, ConfigStore};
pub use topology::{keys, TopologyConfig};
pub use validator::{TopologyValidator, ValidationResult};
