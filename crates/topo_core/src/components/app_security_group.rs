//! Application security groups.

use topo_config::ApplicationSecurityGroupInput;
use topo_engine::{ResourceHandle, ResourceKind};

use crate::components::ResourceGroupBinding;
use crate::context::DeployContext;
use crate::error::CoreResult;
use crate::resolver::{Bindings, ReferenceKind};

pub async fn declare(
    cx: &mut DeployContext<'_>,
    group: &ResourceGroupBinding,
    inputs: &[ApplicationSecurityGroupInput],
) -> CoreResult<Bindings<ResourceHandle>> {
    let mut groups = Bindings::new(ReferenceKind::ApplicationSecurityGroup);
    for input in inputs {
        let handle = cx
            .declare(
                ResourceKind::ApplicationSecurityGroup,
                &input.name,
                group.placed().set("name", &input.name),
            )
            .await?;
        groups.bind(&input.name, handle)?;
    }
    Ok(groups)
}
