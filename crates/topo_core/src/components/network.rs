//! Security rules, network security groups, subnets and virtual networks.
//!
//! Rules and subnets have no resource of their own: a rule is declared
//! inline in every security group that lists it, and a subnet inline in the
//! virtual network that owns it. They are still bound by name, in order,
//! before their owners.

use serde_json::Value;
use topo_config::{
    NetworkSecurityGroupInput, NetworkSecurityRuleInput, SubnetInput, VirtualNetworkInput,
};
use topo_engine::{Output, OutputError, ResourceArgs, ResourceHandle, ResourceKind};

use crate::components::ResourceGroupBinding;
use crate::context::DeployContext;
use crate::error::{CoreError, CoreResult};
use crate::resolver::{Bindings, ReferenceKind};

/// A rule bound to the application security groups it targets.
#[derive(Debug, Clone)]
pub struct BoundRule {
    pub input: NetworkSecurityRuleInput,
    /// Targets, in the order the rule lists them.
    pub app_security_groups: Vec<ResourceHandle>,
}

impl BoundRule {
    /// Inline rule arguments of a security group.
    pub fn args(&self) -> ResourceArgs {
        let rule = &self.input;
        let group_ids: Vec<Output<String>> =
            self.app_security_groups.iter().map(ResourceHandle::id).collect();

        ResourceArgs::new()
            .set("name", &rule.name)
            .set("access", &rule.access)
            .set_opt("description", rule.description.as_ref())
            .set("direction", &rule.direction)
            .set("priority", rule.priority)
            .set("protocol", &rule.protocol)
            .set_opt("sourceAddressPrefix", rule.source_address_prefix.as_ref())
            .set_opt("sourcePortRange", rule.source_port_range.as_ref())
            .set_opt("destinationAddressPrefix", rule.destination_address_prefix.as_ref())
            .set("destinationPortRanges", rule.destination_port_ranges.clone())
            .set("destinationApplicationSecurityGroupIds", group_ids)
    }
}

/// A subnet bound to the security group guarding it.
#[derive(Debug, Clone)]
pub struct BoundSubnet {
    pub input: SubnetInput,
    pub security_group: Option<ResourceHandle>,
}

impl BoundSubnet {
    /// Inline subnet arguments of a virtual network.
    pub fn args(&self) -> ResourceArgs {
        ResourceArgs::new()
            .set("name", &self.input.name)
            .set("addressPrefix", &self.input.address_prefix)
            .set_opt("securityGroup", self.security_group.as_ref().map(ResourceHandle::id))
    }
}

/// How a subnet of a virtual network is picked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubnetMatch {
    /// The subnet with exactly this name.
    Exact(String),
    /// The first subnet whose name contains this text.
    Containing(String),
}

impl SubnetMatch {
    fn matches(&self, subnet: &str) -> bool {
        match self {
            Self::Exact(name) => subnet == name,
            Self::Containing(text) => subnet.contains(text.as_str()),
        }
    }

    fn pattern(&self) -> &str {
        match self {
            Self::Exact(s) | Self::Containing(s) => s,
        }
    }
}

/// Declared virtual network and the names of its subnets.
#[derive(Debug, Clone)]
pub struct VirtualNetworkBinding {
    pub handle: ResourceHandle,
    pub subnets: Vec<String>,
}

impl VirtualNetworkBinding {
    /// Name of the first subnet picked by `pattern`.
    pub fn find_subnet(&self, pattern: &SubnetMatch) -> CoreResult<&str> {
        self.subnets
            .iter()
            .map(|s| s.as_str())
            .find(|s| pattern.matches(s))
            .ok_or_else(|| CoreError::missing(pattern.pattern(), ReferenceKind::Subnet))
    }

    /// Deferred id of the subnet picked by `pattern`.
    ///
    /// The id reported in the network's `subnets` output is used when there
    /// is one, otherwise it is derived from the network id.
    pub fn subnet_id(&self, pattern: &SubnetMatch) -> CoreResult<Output<String>> {
        let subnet = self.find_subnet(pattern)?.to_string();
        let reported = self.handle.state();

        Ok(reported.zip(&self.handle.id()).apply(move |(state, network_id)| {
            let entry = state
                .get("subnets")
                .and_then(Value::as_array)
                .and_then(|entries| {
                    entries
                        .iter()
                        .find(|e| e.get("name").and_then(Value::as_str) == Some(subnet.as_str()))
                });

            match entry {
                Some(entry) => match entry.get("id") {
                    Some(Value::String(id)) => Ok(id.clone()),
                    Some(_) => Err(OutputError::TypeMismatch {
                        field: format!("subnets[{}].id", subnet),
                        expected: "a string".to_string(),
                    }),
                    None => Ok(format!("{}/subnets/{}", network_id, subnet)),
                },
                None => Err(OutputError::missing_reference(subnet, ReferenceKind::Subnet.label())),
            }
        }))
    }
}

/// Bind every rule to the application security groups it targets.
pub fn bind_rules(
    cx: &mut DeployContext<'_>,
    inputs: &[NetworkSecurityRuleInput],
    app_security_groups: &Bindings<ResourceHandle>,
) -> CoreResult<Bindings<BoundRule>> {
    let mut rules = Bindings::new(ReferenceKind::NetworkSecurityRule);
    for input in inputs {
        let targets = app_security_groups
            .resolve_all(&input.destination_app_security_groups)?
            .into_iter()
            .cloned()
            .collect();

        rules.bind(
            &input.name,
            BoundRule {
                input: input.clone(),
                app_security_groups: targets,
            },
        )?;
        cx.bound(ReferenceKind::NetworkSecurityRule, &input.name);
    }
    Ok(rules)
}

pub async fn declare_security_groups(
    cx: &mut DeployContext<'_>,
    group: &ResourceGroupBinding,
    inputs: &[NetworkSecurityGroupInput],
    rules: &Bindings<BoundRule>,
) -> CoreResult<Bindings<ResourceHandle>> {
    let mut groups = Bindings::new(ReferenceKind::NetworkSecurityGroup);
    for input in inputs {
        let security_rules: Vec<ResourceArgs> = rules
            .resolve_all(&input.security_rules)?
            .into_iter()
            .map(BoundRule::args)
            .collect();

        let handle = cx
            .declare(
                ResourceKind::NetworkSecurityGroup,
                &input.name,
                group
                    .placed()
                    .set("name", &input.name)
                    .set("securityRules", security_rules),
            )
            .await?;
        groups.bind(&input.name, handle)?;
    }
    Ok(groups)
}

/// Bind every subnet to its security group.
pub fn bind_subnets(
    cx: &mut DeployContext<'_>,
    inputs: &[SubnetInput],
    security_groups: &Bindings<ResourceHandle>,
) -> CoreResult<Bindings<BoundSubnet>> {
    let mut subnets = Bindings::new(ReferenceKind::Subnet);
    for input in inputs {
        let security_group = security_groups
            .resolve_opt(input.security_group.as_deref())?
            .cloned();

        subnets.bind(
            &input.name,
            BoundSubnet {
                input: input.clone(),
                security_group,
            },
        )?;
        cx.bound(ReferenceKind::Subnet, &input.name);
    }
    Ok(subnets)
}

pub async fn declare_virtual_networks(
    cx: &mut DeployContext<'_>,
    group: &ResourceGroupBinding,
    inputs: &[VirtualNetworkInput],
    subnets: &Bindings<BoundSubnet>,
) -> CoreResult<Bindings<VirtualNetworkBinding>> {
    let mut networks = Bindings::new(ReferenceKind::VirtualNetwork);
    for input in inputs {
        let owned: Vec<ResourceArgs> = subnets
            .resolve_all(&input.subnets)?
            .into_iter()
            .map(BoundSubnet::args)
            .collect();

        let handle = cx
            .declare(
                ResourceKind::VirtualNetwork,
                &input.name,
                group
                    .placed()
                    .set("name", &input.name)
                    .set("addressSpaces", vec![input.cidr.clone()])
                    .set("subnets", owned),
            )
            .await?;

        networks.bind(
            &input.name,
            VirtualNetworkBinding {
                handle,
                subnets: input.subnets.clone(),
            },
        )?;
    }
    Ok(networks)
}
