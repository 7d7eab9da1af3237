//! Bastion hosts.

use topo_config::BastionHostInput;
use topo_engine::{ResourceArgs, ResourceHandle, ResourceKind};

use crate::components::network::{SubnetMatch, VirtualNetworkBinding};
use crate::components::ResourceGroupBinding;
use crate::context::DeployContext;
use crate::error::CoreResult;
use crate::resolver::{Bindings, ReferenceKind};

/// Azure only accepts bastion hosts in a subnet with this name.
pub const BASTION_SUBNET: &str = "AzureBastionSubnet";

pub async fn declare(
    cx: &mut DeployContext<'_>,
    group: &ResourceGroupBinding,
    inputs: &[BastionHostInput],
    public_ips: &Bindings<ResourceHandle>,
    networks: &Bindings<VirtualNetworkBinding>,
) -> CoreResult<Bindings<ResourceHandle>> {
    let mut hosts = Bindings::new(ReferenceKind::BastionHost);
    for input in inputs {
        let public_ip = public_ips.resolve(&input.public_ip)?;
        let network = networks.resolve(&input.virtual_network)?;
        let subnet_id = network.subnet_id(&SubnetMatch::Containing(BASTION_SUBNET.to_string()))?;

        let handle = cx
            .declare(
                ResourceKind::BastionHost,
                &input.name,
                group.placed().set("name", &input.name).set(
                    "ipConfiguration",
                    ResourceArgs::new()
                        .set("name", &input.name)
                        .set("publicIpAddressId", public_ip.id())
                        .set("subnetId", subnet_id),
                ),
            )
            .await?;
        hosts.bind(&input.name, handle)?;
    }
    Ok(hosts)
}
