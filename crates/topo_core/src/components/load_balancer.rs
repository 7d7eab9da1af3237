//! Load balancers and their backend pools.
//!
//! Each load balancer is declared as a chain: the balancer with its frontend
//! configuration, a backend pool, a probe and a rule. Members join the pool
//! through one association per network interface.

use topo_config::LoadBalancerInput;
use topo_engine::{ResourceArgs, ResourceHandle, ResourceKind};
use tracing::debug;

use crate::components::compute::VirtualMachineBinding;
use crate::components::network::{SubnetMatch, VirtualNetworkBinding};
use crate::components::ResourceGroupBinding;
use crate::context::DeployContext;
use crate::error::CoreResult;
use crate::resolver::{Bindings, ReferenceKind};

/// Declared load balancer chain.
#[derive(Debug, Clone)]
pub struct LoadBalancerBinding {
    pub handle: ResourceHandle,
    pub backend_pool: ResourceHandle,
    pub probe: ResourceHandle,
    pub rule: ResourceHandle,
    /// Network interfaces in the backend pool.
    pub members: Vec<ResourceHandle>,
}

/// Derived resource names of one load balancer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadBalancerNames {
    pub frontend: String,
    pub backend_pool: String,
    pub probe: String,
    pub rule: String,
    pub network_interface: String,
    pub association: String,
}

impl LoadBalancerNames {
    pub fn new(name: &str) -> Self {
        Self {
            frontend: format!("{}-frontend-config", name),
            backend_pool: format!("{}-backend-pool", name),
            probe: format!("{}-probe-web", name),
            rule: format!("{}-rule-web", name),
            network_interface: format!("{}-netinf", name),
            association: format!("{}-backend-network-interface", name),
        }
    }

    /// Association name for a backend host instance.
    pub fn host_association(&self, instance: &str) -> String {
        format!("{}-{}", self.association, instance)
    }
}

/// Pool member before its association is declared.
struct Member {
    association: String,
    network_interface: ResourceHandle,
    ip_configuration: String,
}

pub async fn declare(
    cx: &mut DeployContext<'_>,
    group: &ResourceGroupBinding,
    inputs: &[LoadBalancerInput],
    public_ips: &Bindings<ResourceHandle>,
    networks: &Bindings<VirtualNetworkBinding>,
    machines: &Bindings<VirtualMachineBinding>,
) -> CoreResult<Bindings<LoadBalancerBinding>> {
    let mut balancers = Bindings::new(ReferenceKind::LoadBalancer);
    for input in inputs {
        let public_ip = public_ips.resolve(&input.public_ip)?;
        let network = networks.resolve(&input.virtual_network)?;
        let subnet_id = network.subnet_id(&SubnetMatch::Containing(input.subnet.clone()))?;
        let hosts = machines.resolve_all(&input.backend_hosts)?;
        let names = LoadBalancerNames::new(&input.name);

        let handle = cx
            .declare(
                ResourceKind::LoadBalancer,
                &input.name,
                group
                    .placed()
                    .set("name", &input.name)
                    .set_opt("sku", input.sku.as_ref())
                    .set(
                        "frontendIpConfigurations",
                        vec![ResourceArgs::new()
                            .set("name", &names.frontend)
                            .set("publicIpAddressId", public_ip.id())],
                    ),
            )
            .await?;

        let backend_pool = cx
            .declare(
                ResourceKind::BackendAddressPool,
                &names.backend_pool,
                group
                    .scoped()
                    .set("name", &names.backend_pool)
                    .set("loadbalancerId", handle.id()),
            )
            .await?;

        let probe = cx
            .declare(
                ResourceKind::Probe,
                &names.probe,
                group
                    .scoped()
                    .set("name", &names.probe)
                    .set("loadbalancerId", handle.id())
                    .set("port", input.probe_port)
                    .set("protocol", &input.probe_protocol)
                    .set_opt("requestPath", input.probe_request_path.as_ref()),
            )
            .await?;

        let rule = cx
            .declare(
                ResourceKind::LoadBalancerRule,
                &names.rule,
                group
                    .scoped()
                    .set("name", &names.rule)
                    .set("loadbalancerId", handle.id())
                    .set("backendAddressPoolId", backend_pool.id())
                    .set("frontendIpConfigurationName", &names.frontend)
                    .set("frontendPort", input.frontend_port)
                    .set("backendPort", input.backend_port)
                    .set("probeId", probe.id())
                    .set("protocol", &input.protocol),
            )
            .await?;

        let pending = if hosts.is_empty() {
            let network_interface = cx
                .declare(
                    ResourceKind::NetworkInterface,
                    &names.network_interface,
                    group.placed().set("name", &names.network_interface).set(
                        "ipConfigurations",
                        vec![ResourceArgs::new()
                            .set("name", &names.network_interface)
                            .set("primary", true)
                            .set("privateIpAddressAllocation", "Dynamic")
                            .set("privateIpAddressVersion", "IPv4")
                            .set("subnetId", subnet_id)],
                    ),
                )
                .await?;
            vec![Member {
                association: names.association.clone(),
                network_interface,
                ip_configuration: names.network_interface.clone(),
            }]
        } else {
            hosts
                .iter()
                .flat_map(|vm| vm.instances.iter())
                .map(|bound| Member {
                    association: names.host_association(&bound.instance.name),
                    network_interface: bound.network_interface.clone(),
                    ip_configuration: bound.instance.ip_configuration_name(),
                })
                .collect()
        };
        debug!("Load balancer {} has {} pool members", input.name, pending.len());

        let mut members = Vec::with_capacity(pending.len());
        for member in pending {
            cx.declare(
                ResourceKind::NetworkInterfacePoolAssociation,
                &member.association,
                ResourceArgs::new()
                    .set("backendAddressPoolId", backend_pool.id())
                    .set("ipConfigurationName", member.ip_configuration)
                    .set("networkInterfaceId", member.network_interface.id()),
            )
            .await?;
            members.push(member.network_interface);
        }

        balancers.bind(
            &input.name,
            LoadBalancerBinding {
                handle,
                backend_pool,
                probe,
                rule,
                members,
            },
        )?;
    }
    Ok(balancers)
}
