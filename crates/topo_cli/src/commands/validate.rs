//! Validate command - Check a stack's topology without printing a plan.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use tracing::info;

use topo_config::{TopologyConfig, TopologyValidator};
use topo_core::{Deployment, DeploymentReport};
use topo_engine::PreviewEngine;

use super::{load_topology, stack_name, DEFAULT_PROJECT};

#[derive(Args)]
pub struct ValidateArgs {
    /// Pulumi stack file holding the topology config
    #[arg(short = 'f', long, env = "TOPO_STACK_FILE")]
    pub stack_file: PathBuf,

    /// Config namespace (defaults to the project name)
    #[arg(short, long)]
    pub namespace: Option<String>,

    /// Project name, used for tags and URNs
    #[arg(short, long, default_value = DEFAULT_PROJECT)]
    pub project: String,

    /// Stack name (defaults to the stack file's `Pulumi.<stack>.yaml` name)
    #[arg(short, long)]
    pub stack: Option<String>,

    /// Skip reference binding
    #[arg(long)]
    pub skip_references: bool,
}

pub async fn execute(args: ValidateArgs) -> Result<()> {
    info!("Validating stack file: {}", args.stack_file.display());
    let namespace = args.namespace.as_deref().unwrap_or(&args.project);

    println!("📋 Loading configuration...");
    let topology = load_topology(&args.stack_file, namespace)?;

    println!("🔍 Validating records...");
    let result = TopologyValidator::validate(&topology);
    for warning in &result.warnings {
        println!("   ⚠️  {}", warning);
    }
    if !result.valid {
        println!("   ❌ Record validation failed:");
        for error in &result.errors {
            println!("      - {}", error);
        }
        anyhow::bail!("Validation failed with {} errors", result.errors.len());
    }
    println!("   ✅ Record validation passed");

    if !args.skip_references {
        println!("🔗 Resolving references...");
        let report = resolve_references(&args, &topology).await?;
        println!(
            "   ✅ All references resolved ({} resources, {} records bound)",
            report.resources.len(),
            report.steps.len() - report.resources.len()
        );
    }

    println!();
    println!("✅ All validations passed!");
    Ok(())
}

/// Bind every reference by running the topology against the preview engine.
pub async fn resolve_references(
    args: &ValidateArgs,
    topology: &TopologyConfig,
) -> Result<DeploymentReport> {
    let stack = args
        .stack
        .clone()
        .unwrap_or_else(|| stack_name(&args.stack_file));
    let engine = PreviewEngine::new(&args.project, stack);
    let report = Deployment::new(Arc::new(engine)).run(topology).await?;
    Ok(report)
}
