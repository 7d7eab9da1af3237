//! Deployment orchestration.
//!
//! A deployment walks the topology in a fixed dependency order, one stage per
//! category. Every stage reads the bindings of earlier stages and produces
//! its own. The first missing reference or engine error stops the run; nothing
//! is retried and nothing already declared is rolled back.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use topo_config::TopologyConfig;
use topo_engine::ResourceEngine;

use crate::components::{
    app_security_group, bastion, compute, load_balancer, network, public_ip, resource_group,
    Profiles,
};
use crate::context::DeployContext;
use crate::error::CoreResult;

/// Deployment stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    ResourceGroup,
    AppSecurityGroups,
    SecurityRules,
    SecurityGroups,
    Subnets,
    VirtualNetworks,
    AvailabilitySets,
    Profiles,
    VirtualMachines,
    PublicIps,
    LoadBalancers,
    BastionHosts,
    Settle,
}

impl Stage {
    pub const ALL: [Stage; 13] = [
        Self::ResourceGroup,
        Self::AppSecurityGroups,
        Self::SecurityRules,
        Self::SecurityGroups,
        Self::Subnets,
        Self::VirtualNetworks,
        Self::AvailabilitySets,
        Self::Profiles,
        Self::VirtualMachines,
        Self::PublicIps,
        Self::LoadBalancers,
        Self::BastionHosts,
        Self::Settle,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ResourceGroup => "resource-group",
            Self::AppSecurityGroups => "app-security-groups",
            Self::SecurityRules => "security-rules",
            Self::SecurityGroups => "security-groups",
            Self::Subnets => "subnets",
            Self::VirtualNetworks => "virtual-networks",
            Self::AvailabilitySets => "availability-sets",
            Self::Profiles => "profiles",
            Self::VirtualMachines => "virtual-machines",
            Self::PublicIps => "public-ips",
            Self::LoadBalancers => "load-balancers",
            Self::BastionHosts => "bastion-hosts",
            Self::Settle => "settle",
        }
    }

    fn position(&self) -> usize {
        Self::ALL.iter().position(|s| s == self).unwrap_or_default() + 1
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What happened to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepAction {
    /// Handed to the engine as a resource of its own.
    Declared,
    /// Resolved and carried inline by a later declaration.
    Bound,
}

impl fmt::Display for StepAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Declared => write!(f, "declared"),
            Self::Bound => write!(f, "bound"),
        }
    }
}

/// One entry of the ordered step log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentStep {
    pub index: usize,
    pub action: StepAction,
    pub kind: String,
    pub name: String,
    pub urn: Option<String>,
}

/// A declared resource and its settled id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployedResource {
    pub kind: String,
    pub name: String,
    pub urn: String,
    pub id: String,
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentReport {
    pub run_id: Uuid,
    pub project: String,
    pub stack: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Every declared and bound record, in order.
    pub steps: Vec<DeploymentStep>,
    /// Declared resources with their ids, in declaration order.
    pub resources: Vec<DeployedResource>,
}

impl DeploymentReport {
    /// Steps that reached the engine.
    pub fn declared(&self) -> impl Iterator<Item = &DeploymentStep> {
        self.steps.iter().filter(|s| s.action == StepAction::Declared)
    }

    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

/// Runs a topology against an engine.
pub struct Deployment {
    engine: Arc<dyn ResourceEngine>,
}

impl Deployment {
    pub fn new(engine: Arc<dyn ResourceEngine>) -> Self {
        Self { engine }
    }

    /// Declare the whole topology and wait for every id.
    pub async fn run(&self, topology: &TopologyConfig) -> CoreResult<DeploymentReport> {
        let mut cx = DeployContext::new(self.engine.as_ref());
        let started_at = Utc::now();

        info!(
            "Starting deployment: {}/{} ({})",
            cx.project(),
            cx.stack(),
            cx.run_id()
        );

        let outcome = Self::run_stages(&mut cx, topology).await;
        match outcome {
            Ok(resources) => {
                let report = DeploymentReport {
                    run_id: cx.run_id(),
                    project: cx.project().to_string(),
                    stack: cx.stack().to_string(),
                    started_at,
                    finished_at: Utc::now(),
                    steps: cx.into_steps(),
                    resources,
                };
                info!(
                    "Deployment {} completed: {} resources declared",
                    report.run_id,
                    report.resources.len()
                );
                Ok(report)
            }
            Err(e) => {
                error!("Deployment {} failed: {}", cx.run_id(), e);
                Err(e)
            }
        }
    }

    async fn run_stages(
        cx: &mut DeployContext<'_>,
        topology: &TopologyConfig,
    ) -> CoreResult<Vec<DeployedResource>> {
        enter(Stage::ResourceGroup);
        let group = resource_group::declare(cx, &topology.resource_group).await?;

        enter(Stage::AppSecurityGroups);
        let app_security_groups =
            app_security_group::declare(cx, &group, &topology.app_security_groups).await?;

        enter(Stage::SecurityRules);
        let rules =
            network::bind_rules(cx, &topology.network_security_rules, &app_security_groups)?;

        enter(Stage::SecurityGroups);
        let security_groups = network::declare_security_groups(
            cx,
            &group,
            &topology.network_security_groups,
            &rules,
        )
        .await?;

        enter(Stage::Subnets);
        let subnets = network::bind_subnets(cx, &topology.subnets, &security_groups)?;

        enter(Stage::VirtualNetworks);
        let networks =
            network::declare_virtual_networks(cx, &group, &topology.virtual_networks, &subnets)
                .await?;

        enter(Stage::AvailabilitySets);
        let availability_sets =
            compute::declare_availability_sets(cx, &group, &topology.availability_sets).await?;

        enter(Stage::Profiles);
        let profiles = Profiles::bind(cx, topology)?;

        enter(Stage::VirtualMachines);
        let machines = compute::declare_virtual_machines(
            cx,
            &group,
            &topology.virtual_machines,
            &networks,
            &app_security_groups,
            &availability_sets,
            &profiles,
        )
        .await?;

        enter(Stage::PublicIps);
        let public_ips = public_ip::declare(cx, &group, &topology.public_ips).await?;

        enter(Stage::LoadBalancers);
        load_balancer::declare(
            cx,
            &group,
            &topology.load_balancers,
            &public_ips,
            &networks,
            &machines,
        )
        .await?;

        enter(Stage::BastionHosts);
        bastion::declare(cx, &group, &topology.bastion_hosts, &public_ips, &networks).await?;

        enter(Stage::Settle);
        let ids = cx.pending_ids().resolve().await?;

        Ok(cx
            .declared()
            .iter()
            .zip(ids)
            .map(|(handle, id)| DeployedResource {
                kind: handle.kind.to_string(),
                name: handle.name.clone(),
                urn: handle.urn.clone(),
                id,
            })
            .collect())
    }
}

fn enter(stage: Stage) {
    info!("Executing stage [{}/{}]: {}", stage.position(), Stage::ALL.len(), stage);
}
