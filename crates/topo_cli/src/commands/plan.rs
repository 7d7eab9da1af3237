//! Plan command - Declare a topology against the preview engine.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use tracing::info;

use topo_core::{Deployment, DeploymentReport, StepAction};
use topo_engine::PreviewEngine;

use super::{load_topology, stack_name, DEFAULT_PROJECT};

#[derive(Args)]
pub struct PlanArgs {
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

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(args: PlanArgs) -> Result<()> {
    let report = plan(&args).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

/// Run the deployment against the preview engine.
pub async fn plan(args: &PlanArgs) -> Result<DeploymentReport> {
    let stack = args
        .stack
        .clone()
        .unwrap_or_else(|| stack_name(&args.stack_file));
    let namespace = args.namespace.as_deref().unwrap_or(&args.project);

    info!("Planning {}/{} from namespace {}", args.project, stack, namespace);
    let topology = load_topology(&args.stack_file, namespace)?;

    let engine = PreviewEngine::new(&args.project, &stack);
    let report = Deployment::new(Arc::new(engine)).run(&topology).await?;
    Ok(report)
}

fn print_report(report: &DeploymentReport) {
    println!("📋 Plan for {}/{} (run {})", report.project, report.stack, report.run_id);
    println!();

    for step in &report.steps {
        let marker = match step.action {
            StepAction::Declared => "+",
            StepAction::Bound => "~",
        };
        println!("  {:>3}  {} {:<36} {}", step.index + 1, marker, step.kind, step.name);
    }

    let bound = report.steps.len() - report.resources.len();
    println!();
    println!(
        "✅ {} resources to declare, {} records bound inline ({} ms)",
        report.resources.len(),
        bound,
        report.duration_ms()
    );

    if !report.resources.is_empty() {
        println!();
        println!("Resource ids:");
        for resource in &report.resources {
            println!("  {}", resource.id);
        }
    }
}
