//! Resource engine trait and types.

use std::fmt;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{EngineError, EngineResult, OutputError};
use crate::input::ResourceArgs;
use crate::output::Output;

/// Resource types the topology declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    ResourceGroup,
    ApplicationSecurityGroup,
    NetworkSecurityGroup,
    VirtualNetwork,
    AvailabilitySet,
    NetworkInterface,
    NetworkInterfaceSecurityGroupAssociation,
    VirtualMachine,
    PublicIp,
    LoadBalancer,
    BackendAddressPool,
    NetworkInterfacePoolAssociation,
    Probe,
    LoadBalancerRule,
    BastionHost,
}

impl ResourceKind {
    /// Engine type token.
    pub fn type_token(&self) -> &'static str {
        match self {
            Self::ResourceGroup => "azure:core/resourceGroup:ResourceGroup",
            Self::ApplicationSecurityGroup => {
                "azure:network/applicationSecurityGroup:ApplicationSecurityGroup"
            }
            Self::NetworkSecurityGroup => "azure:network/networkSecurityGroup:NetworkSecurityGroup",
            Self::VirtualNetwork => "azure:network/virtualNetwork:VirtualNetwork",
            Self::AvailabilitySet => "azure:compute/availabilitySet:AvailabilitySet",
            Self::NetworkInterface => "azure:network/networkInterface:NetworkInterface",
            Self::NetworkInterfaceSecurityGroupAssociation => {
                "azure:network/networkInterfaceApplicationSecurityGroupAssociation:NetworkInterfaceApplicationSecurityGroupAssociation"
            }
            Self::VirtualMachine => "azure:compute/virtualMachine:VirtualMachine",
            Self::PublicIp => "azure:network/publicIp:PublicIp",
            Self::LoadBalancer => "azure:lb/loadBalancer:LoadBalancer",
            Self::BackendAddressPool => "azure:lb/backendAddressPool:BackendAddressPool",
            Self::NetworkInterfacePoolAssociation => {
                "azure:network/networkInterfaceBackendAddressPoolAssociation:NetworkInterfaceBackendAddressPoolAssociation"
            }
            Self::Probe => "azure:lb/probe:Probe",
            Self::LoadBalancerRule => "azure:lb/rule:Rule",
            Self::BastionHost => "azure:compute/bastionHost:BastionHost",
        }
    }

    /// Sub-resources and associations carry no tags of their own.
    pub fn supports_tags(&self) -> bool {
        !matches!(
            self,
            Self::NetworkInterfaceSecurityGroupAssociation
                | Self::BackendAddressPool
                | Self::NetworkInterfacePoolAssociation
                | Self::Probe
                | Self::LoadBalancerRule
        )
    }

    /// Azure resource provider namespace and type.
    pub fn provider_type(&self) -> &'static str {
        match self {
            Self::ResourceGroup => "Microsoft.Resources/resourceGroups",
            Self::ApplicationSecurityGroup => "Microsoft.Network/applicationSecurityGroups",
            Self::NetworkSecurityGroup => "Microsoft.Network/networkSecurityGroups",
            Self::VirtualNetwork => "Microsoft.Network/virtualNetworks",
            Self::AvailabilitySet => "Microsoft.Compute/availabilitySets",
            Self::NetworkInterface
            | Self::NetworkInterfaceSecurityGroupAssociation
            | Self::NetworkInterfacePoolAssociation => "Microsoft.Network/networkInterfaces",
            Self::VirtualMachine => "Microsoft.Compute/virtualMachines",
            Self::PublicIp => "Microsoft.Network/publicIPAddresses",
            Self::LoadBalancer => "Microsoft.Network/loadBalancers",
            Self::BackendAddressPool => "Microsoft.Network/loadBalancers/backendAddressPools",
            Self::Probe => "Microsoft.Network/loadBalancers/probes",
            Self::LoadBalancerRule => "Microsoft.Network/loadBalancers/loadBalancingRules",
            Self::BastionHost => "Microsoft.Network/bastionHosts",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ResourceGroup => "resource group",
            Self::ApplicationSecurityGroup => "application security group",
            Self::NetworkSecurityGroup => "network security group",
            Self::VirtualNetwork => "virtual network",
            Self::AvailabilitySet => "availability set",
            Self::NetworkInterface => "network interface",
            Self::NetworkInterfaceSecurityGroupAssociation => {
                "network interface security group association"
            }
            Self::VirtualMachine => "virtual machine",
            Self::PublicIp => "public IP",
            Self::LoadBalancer => "load balancer",
            Self::BackendAddressPool => "backend address pool",
            Self::NetworkInterfacePoolAssociation => "network interface pool association",
            Self::Probe => "probe",
            Self::LoadBalancerRule => "load balancer rule",
            Self::BastionHost => "bastion host",
        };
        f.write_str(name)
    }
}

/// Unique resource name within a project and stack.
pub fn urn(project: &str, stack: &str, kind: ResourceKind, name: &str) -> String {
    format!("urn:pulumi:{}::{}::{}::{}", stack, project, kind.type_token(), name)
}

/// Handle returned for an accepted declaration.
///
/// The id and provider state are deferred; they resolve once the engine has
/// processed the declaration and everything it depends on.
#[derive(Debug, Clone)]
pub struct ResourceHandle {
    pub kind: ResourceKind,
    pub name: String,
    pub urn: String,
    id: Output<String>,
    state: Output<Map<String, Value>>,
}

impl ResourceHandle {
    pub fn new(
        kind: ResourceKind,
        name: impl Into<String>,
        urn: impl Into<String>,
        id: Output<String>,
        state: Output<Map<String, Value>>,
    ) -> Self {
        Self {
            kind,
            name: name.into(),
            urn: urn.into(),
            id,
            state,
        }
    }

    pub fn id(&self) -> Output<String> {
        self.id.clone()
    }

    pub fn state(&self) -> Output<Map<String, Value>> {
        self.state.clone()
    }

    /// One field of the provider state.
    pub fn output(&self, field: &str) -> Output<Value> {
        let resource = self.name.clone();
        let field = field.to_string();
        self.state.apply(move |mut state| {
            state
                .remove(&field)
                .ok_or(OutputError::MissingField { resource, field })
        })
    }

    /// One string field of the provider state.
    pub fn string_output(&self, field: &str) -> Output<String> {
        let name = field.to_string();
        self.output(field).apply(move |value| match value {
            Value::String(s) => Ok(s),
            _ => Err(OutputError::TypeMismatch {
                field: name,
                expected: "a string".to_string(),
            }),
        })
    }
}

/// A declaration as the engine received it.
#[derive(Debug, Clone)]
pub struct Declaration {
    pub kind: ResourceKind,
    pub name: String,
    pub urn: String,
    pub args: ResourceArgs,
}

/// Orchestration engine the topology is declared against.
///
/// `declare` returns as soon as the declaration is accepted. Provider
/// failures that happen later surface through the handle's outputs.
#[async_trait]
pub trait ResourceEngine: Send + Sync {
    /// Project the run belongs to.
    fn project(&self) -> &str;

    /// Stack the run belongs to.
    fn stack(&self) -> &str;

    /// Declare a resource.
    async fn declare(
        &self,
        kind: ResourceKind,
        name: &str,
        args: ResourceArgs,
    ) -> EngineResult<ResourceHandle>;
}

/// Ordered record of accepted declarations, shared by the in-process engines.
#[derive(Debug, Default)]
pub(crate) struct DeclarationLog {
    entries: RwLock<Vec<Declaration>>,
}

impl DeclarationLog {
    /// Record `declaration`, rejecting a second declaration of the same URN.
    pub(crate) fn record(&self, declaration: Declaration) -> EngineResult<()> {
        let mut entries = self.entries.write();
        if entries.iter().any(|d| d.urn == declaration.urn) {
            return Err(EngineError::DuplicateResource {
                kind: declaration.kind.to_string(),
                name: declaration.name,
            });
        }
        entries.push(declaration);
        Ok(())
    }

    pub(crate) fn snapshot(&self) -> Vec<Declaration> {
        self.entries.read().clone()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub(crate) fn clear(&self) {
        self.entries.write().clear();
    }
}

/// Handle whose state echoes the resolved arguments plus a synthetic `id`.
pub(crate) fn echo_handle<F>(declaration: &Declaration, make_id: F) -> ResourceHandle
where
    F: FnOnce(&Map<String, Value>) -> String + Send + 'static,
{
    let args = declaration.args.clone();
    let state = Output::from_future(async move {
        let mut state = args.resolve().await?;
        let id = make_id(&state);
        state.insert("id".to_string(), Value::String(id));
        Ok(state)
    });

    let resource = declaration.name.clone();
    let id = state.apply(move |state| match state.get("id") {
        Some(Value::String(id)) => Ok(id.clone()),
        _ => Err(OutputError::MissingField {
            resource,
            field: "id".to_string(),
        }),
    });

    ResourceHandle::new(
        declaration.kind,
        declaration.name.clone(),
        declaration.urn.clone(),
        id,
        state,
    )
}
