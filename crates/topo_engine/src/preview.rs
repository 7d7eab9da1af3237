//! Dry-run resource engine.
//!
//! Nothing is provisioned. Each declaration is logged and recorded, and its
//! handle resolves to an Azure-style resource id built from the arguments,
//! so the whole dependency graph can be walked and printed.

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::error::EngineResult;
use crate::input::ResourceArgs;
use crate::resource::{
    echo_handle, urn, Declaration, DeclarationLog, ResourceEngine, ResourceHandle, ResourceKind,
};

/// Subscription used in synthesized ids unless one is configured.
pub const PREVIEW_SUBSCRIPTION: &str = "00000000-0000-0000-0000-000000000000";

/// Dry-run engine.
#[derive(Debug)]
pub struct PreviewEngine {
    project: String,
    stack: String,
    subscription: String,
    log: DeclarationLog,
}

impl PreviewEngine {
    pub fn new(project: impl Into<String>, stack: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            stack: stack.into(),
            subscription: PREVIEW_SUBSCRIPTION.to_string(),
            log: DeclarationLog::default(),
        }
    }

    pub fn with_subscription(mut self, subscription: impl Into<String>) -> Self {
        self.subscription = subscription.into();
        self
    }

    /// Declarations accepted so far, in order.
    pub fn declarations(&self) -> Vec<Declaration> {
        self.log.snapshot()
    }
}

/// Azure resource id for a declaration whose arguments resolved to `args`.
fn resource_id(
    subscription: &str,
    kind: ResourceKind,
    name: &str,
    args: &Map<String, Value>,
) -> String {
    let prefix = format!("/subscriptions/{}", subscription);
    if kind == ResourceKind::ResourceGroup {
        return format!("{}/resourceGroups/{}", prefix, name);
    }

    match args.get("resourceGroupName").and_then(Value::as_str) {
        Some(group) => format!(
            "{}/resourceGroups/{}/providers/{}/{}",
            prefix,
            group,
            kind.provider_type(),
            name
        ),
        None => format!("{}/providers/{}/{}", prefix, kind.provider_type(), name),
    }
}

#[async_trait]
impl ResourceEngine for PreviewEngine {
    fn project(&self) -> &str {
        &self.project
    }

    fn stack(&self) -> &str {
        &self.stack
    }

    async fn declare(
        &self,
        kind: ResourceKind,
        name: &str,
        args: ResourceArgs,
    ) -> EngineResult<ResourceHandle> {
        let declaration = Declaration {
            kind,
            name: name.to_string(),
            urn: urn(&self.project, &self.stack, kind, name),
            args,
        };

        info!("[PREVIEW] Would create {}: {}", kind, name);
        debug!("URN: {}", declaration.urn);
        self.log.record(declaration.clone())?;

        let subscription = self.subscription.clone();
        let resource = name.to_string();
        Ok(echo_handle(&declaration, move |args| {
            resource_id(&subscription, kind, &resource, args)
        }))
    }
}
