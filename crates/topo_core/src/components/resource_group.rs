//! The resource group every other resource is placed in.

use topo_config::ResourceGroupInput;
use topo_engine::{Output, ResourceArgs, ResourceHandle, ResourceKind};

use crate::context::DeployContext;
use crate::error::CoreResult;

/// Declared resource group. Later declarations take its name and location
/// as deferred outputs.
#[derive(Debug, Clone)]
pub struct ResourceGroupBinding {
    pub handle: ResourceHandle,
    pub name: Output<String>,
    pub location: Output<String>,
}

impl ResourceGroupBinding {
    /// Arguments every resource placed in the group starts from.
    pub fn placed(&self) -> ResourceArgs {
        ResourceArgs::new()
            .set("location", &self.location)
            .set("resourceGroupName", &self.name)
    }

    /// Arguments for sub-resources, which take the group but no location.
    pub fn scoped(&self) -> ResourceArgs {
        ResourceArgs::new().set("resourceGroupName", &self.name)
    }
}

pub async fn declare(
    cx: &mut DeployContext<'_>,
    input: &ResourceGroupInput,
) -> CoreResult<ResourceGroupBinding> {
    let handle = cx
        .declare(
            ResourceKind::ResourceGroup,
            &input.name,
            ResourceArgs::new()
                .set("name", &input.name)
                .set("location", &input.location),
        )
        .await?;

    Ok(ResourceGroupBinding {
        name: handle.string_output("name"),
        location: handle.string_output("location"),
        handle,
    })
}
