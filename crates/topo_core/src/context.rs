//! Deployment context threaded through every stage.

use std::collections::BTreeMap;

use tracing::{debug, info};
use uuid::Uuid;

use topo_engine::{Input, Output, ResourceArgs, ResourceEngine, ResourceHandle, ResourceKind};

use crate::deployment::{DeploymentStep, StepAction};
use crate::error::CoreResult;
use crate::resolver::ReferenceKind;

/// Tag keys every taggable resource carries.
pub const TAG_PROJECT: &str = "project";
pub const TAG_STACK: &str = "stack";

/// Run identity, the ordered step log, and the ids to settle.
pub struct DeployContext<'a> {
    engine: &'a dyn ResourceEngine,
    run_id: Uuid,
    tags: BTreeMap<String, String>,
    steps: Vec<DeploymentStep>,
    declared: Vec<ResourceHandle>,
}

impl<'a> DeployContext<'a> {
    pub fn new(engine: &'a dyn ResourceEngine) -> Self {
        let mut tags = BTreeMap::new();
        tags.insert(TAG_PROJECT.to_string(), engine.project().to_string());
        tags.insert(TAG_STACK.to_string(), engine.stack().to_string());

        Self {
            engine,
            run_id: Uuid::new_v4(),
            tags,
            steps: Vec::new(),
            declared: Vec::new(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn project(&self) -> &str {
        self.engine.project()
    }

    pub fn stack(&self) -> &str {
        self.engine.stack()
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    /// Declare a resource, tagging it when its kind takes tags.
    pub async fn declare(
        &mut self,
        kind: ResourceKind,
        name: &str,
        args: ResourceArgs,
    ) -> CoreResult<ResourceHandle> {
        let args = if kind.supports_tags() {
            args.set("tags", Input::from(self.tags.clone()))
        } else {
            args
        };

        info!("Declaring {} {}", kind, name);
        let handle = self.engine.declare(kind, name, args).await?;

        self.steps.push(DeploymentStep {
            index: self.steps.len(),
            action: StepAction::Declared,
            kind: kind.to_string(),
            name: name.to_string(),
            urn: Some(handle.urn.clone()),
        });
        self.declared.push(handle.clone());
        Ok(handle)
    }

    /// Record a record bound inline into a later declaration.
    pub fn bound(&mut self, kind: ReferenceKind, name: &str) {
        debug!("Bound {} {}", kind, name);
        self.steps.push(DeploymentStep {
            index: self.steps.len(),
            action: StepAction::Bound,
            kind: kind.to_string(),
            name: name.to_string(),
            urn: None,
        });
    }

    pub fn steps(&self) -> &[DeploymentStep] {
        &self.steps
    }

    pub fn declared(&self) -> &[ResourceHandle] {
        &self.declared
    }

    /// Every declared id, in declaration order.
    pub fn pending_ids(&self) -> Output<Vec<String>> {
        Output::all(self.declared.iter().map(ResourceHandle::id))
    }

    pub(crate) fn into_steps(self) -> Vec<DeploymentStep> {
        self.steps
    }
}
