//! # topo_core
//!
//! Reference binding and deployment orchestration for topo.
//!
//! This crate turns a decoded [`TopologyConfig`](topo_config::TopologyConfig)
//! into an ordered series of declarations against a
//! [`ResourceEngine`](topo_engine::ResourceEngine).
//!
//! # Architecture
//!
//! - **Bindings**: one name-keyed map per category; references resolve against them
//! - **Naming**: expands virtual machine templates into named instances
//! - **Components**: bind and declare the records of one category
//! - **Deployment**: runs the components in dependency order and settles every id
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use topo_config::{ConfigStore, TopologyConfig};
//! use topo_core::Deployment;
//! use topo_engine::PreviewEngine;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = ConfigStore::from_stack_file("Pulumi.dev.yaml")?;
//!     let topology = TopologyConfig::load(&store.namespace("azure-topology"))?;
//!
//!     let deployment = Deployment::new(Arc::new(PreviewEngine::new("azure-topology", "dev")));
//!     let report = deployment.run(&topology).await?;
//!     println!("{} resources", report.resources.len());
//!     Ok(())
//! }
//! ```

pub mod components;
pub mod context;
pub mod deployment;
pub mod error;
pub mod naming;
pub mod resolver;

pub use context::{DeployContext, TAG_PROJECT, TAG_STACK};
pub use deployment::{
    DeployedResource, Deployment, DeploymentReport, DeploymentStep, Stage, StepAction,
};
pub use error::{CoreError, CoreResult};
pub use naming::{expand, expand_instances, instance_name, pad_width, Instance};
pub use resolver::{Bindings, ReferenceKind};
