//! Public IP addresses.

use topo_config::PublicIpInput;
use topo_engine::{ResourceHandle, ResourceKind};

use crate::components::ResourceGroupBinding;
use crate::context::DeployContext;
use crate::error::CoreResult;
use crate::resolver::{Bindings, ReferenceKind};

pub async fn declare(
    cx: &mut DeployContext<'_>,
    group: &ResourceGroupBinding,
    inputs: &[PublicIpInput],
) -> CoreResult<Bindings<ResourceHandle>> {
    let mut addresses = Bindings::new(ReferenceKind::PublicIp);
    for input in inputs {
        let handle = cx
            .declare(
                ResourceKind::PublicIp,
                &input.name,
                group
                    .placed()
                    .set("name", &input.name)
                    .set("allocationMethod", &input.allocation_method)
                    .set("ipVersion", &input.ip_version)
                    .set_opt("sku", input.sku.as_ref()),
            )
            .await?;
        addresses.bind(&input.name, handle)?;
    }
    Ok(addresses)
}
