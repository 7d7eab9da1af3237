//! CLI command definitions.
//!
//! Each subcommand loads a stack file, binds its topology and reports on it.
//! No live provider is linked; declarations go to the preview engine.

use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use topo_config::{ConfigStore, TopologyConfig};

pub mod names;
pub mod plan;
pub mod validate;

/// Project name used when none is given. Also the default config namespace.
pub const DEFAULT_PROJECT: &str = "azure-topology";

/// Stack name used when none can be derived from the stack file.
pub const DEFAULT_STACK: &str = "dev";

/// topo - Azure topology binding and planning
#[derive(Parser)]
#[command(name = "topo")]
#[command(version, about = "topo - bind and plan Azure network and compute topologies")]
#[command(long_about = r#"
topo reads a topology from the config section of a Pulumi stack file,
resolves every cross-reference by name and declares the resources in
dependency order.

COMMANDS:
  plan      → Declare the topology against the preview engine and print the plan
  validate  → Validate config and resolve every reference
  names     → Print the expanded instance names for a base name

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments
  3 - Validation failure
  5 - Engine error
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Plan a deployment and print the ordered declarations
    Plan(plan::PlanArgs),

    /// Validate a stack's topology
    Validate(validate::ValidateArgs),

    /// Expand a base name into instance names
    Names(names::NamesArgs),
}

/// Stack name from a `Pulumi.<stack>.yaml` file name.
pub fn stack_name(stack_file: &Path) -> String {
    stack_file
        .file_stem()
        .and_then(|stem| stem.to_str())
        .map(|stem| stem.strip_prefix("Pulumi.").unwrap_or(stem))
        .filter(|stem| !stem.is_empty())
        .unwrap_or(DEFAULT_STACK)
        .to_string()
}

/// Load the topology stored under `namespace` in a stack file.
pub fn load_topology(stack_file: &Path, namespace: &str) -> Result<TopologyConfig> {
    let store = ConfigStore::from_stack_file(stack_file)
        .with_context(|| format!("Failed to load stack file {}", stack_file.display()))?;
    info!(
        "Loaded {} config values from {}",
        store.len(),
        stack_file.display()
    );

    let topology = TopologyConfig::load(&store.namespace(namespace))?;
    Ok(topology)
}
