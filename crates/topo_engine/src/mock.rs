//! Mock resource engine for testing.
//!
//! Accepts every declaration, records it, and answers with a handle whose id
//! is `<name>_id` and whose state echoes the resolved arguments. Failures can
//! be injected per resource name, either at declaration time or later through
//! the handle's outputs.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use crate::error::{EngineError, EngineResult, OutputError};
use crate::input::ResourceArgs;
use crate::output::Output;
use crate::resource::{
    echo_handle, urn, Declaration, DeclarationLog, ResourceEngine, ResourceHandle, ResourceKind,
};

/// When an injected failure fires.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Failure {
    /// `declare` returns an error.
    Declare(String),
    /// `declare` succeeds, the handle's outputs fail.
    Deferred(String),
}

/// Mock engine for testing.
#[derive(Clone)]
pub struct MockEngine {
    project: String,
    stack: String,
    /// Accepted declarations, in order.
    log: Arc<DeclarationLog>,
    /// Failures to inject, by resource name.
    failures: Arc<RwLock<HashMap<String, Failure>>>,
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new("project", "stack")
    }
}

impl MockEngine {
    pub fn new(project: impl Into<String>, stack: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            stack: stack.into(),
            log: Arc::new(DeclarationLog::default()),
            failures: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Reject the declaration of `name`.
    pub fn fail_on(self, name: impl Into<String>, message: impl Into<String>) -> Self {
        self.failures
            .write()
            .insert(name.into(), Failure::Declare(message.into()));
        self
    }

    /// Accept the declaration of `name` but fail its outputs.
    pub fn fail_outputs_of(self, name: impl Into<String>, message: impl Into<String>) -> Self {
        self.failures
            .write()
            .insert(name.into(), Failure::Deferred(message.into()));
        self
    }

    /// Clear all recorded declarations.
    pub fn clear(&self) {
        self.log.clear();
    }

    /// All recorded declarations.
    pub fn declarations(&self) -> Vec<Declaration> {
        self.log.snapshot()
    }

    /// Number of recorded declarations.
    pub fn declaration_count(&self) -> usize {
        self.log.len()
    }

    /// `(kind, name)` of every recorded declaration, in order.
    pub fn declared(&self) -> Vec<(ResourceKind, String)> {
        self.log
            .snapshot()
            .into_iter()
            .map(|d| (d.kind, d.name))
            .collect()
    }

    /// Names of the recorded declarations of one kind.
    pub fn names_of(&self, kind: ResourceKind) -> Vec<String> {
        self.log
            .snapshot()
            .into_iter()
            .filter(|d| d.kind == kind)
            .map(|d| d.name)
            .collect()
    }

    /// Check if a resource was declared.
    pub fn was_declared(&self, kind: ResourceKind, name: &str) -> bool {
        self.find(kind, name).is_some()
    }

    /// The recorded declaration of one resource.
    pub fn find(&self, kind: ResourceKind, name: &str) -> Option<Declaration> {
        self.log
            .snapshot()
            .into_iter()
            .find(|d| d.kind == kind && d.name == name)
    }
}

#[async_trait]
impl ResourceEngine for MockEngine {
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
        let failure = self.failures.read().get(name).cloned();
        if let Some(Failure::Declare(message)) = &failure {
            return Err(EngineError::DeclareFailed {
                kind: kind.to_string(),
                name: name.to_string(),
                message: message.clone(),
            });
        }

        let declaration = Declaration {
            kind,
            name: name.to_string(),
            urn: urn(&self.project, &self.stack, kind, name),
            args,
        };
        self.log.record(declaration.clone())?;
        debug!("Mock declared {} {}", kind, name);

        if let Some(Failure::Deferred(message)) = failure {
            let err = OutputError::Failed(format!("{} '{}': {}", kind, name, message));
            return Ok(ResourceHandle::new(
                kind,
                name,
                declaration.urn,
                Output::failed(err.clone()),
                Output::failed(err),
            ));
        }

        let id = format!("{}_id", name);
        Ok(echo_handle(&declaration, move |_| id))
    }
}
