//! Error types for the core module.

use thiserror::Error;
use topo_engine::OutputError;

use crate::resolver::ReferenceKind;

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that abort a deployment run.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Missing {kind}: '{name}'")]
    MissingReference { name: String, kind: ReferenceKind },

    #[error("Duplicate {kind}: '{name}'")]
    DuplicateBinding { name: String, kind: ReferenceKind },

    #[error("Virtual network '{0}' has no subnets to place instances in")]
    NoSubnets(String),

    #[error("Config error: {0}")]
    Config(#[from] topo_config::ConfigError),

    #[error("Engine error: {0}")]
    Engine(#[from] topo_engine::EngineError),

    #[error("Output error: {0}")]
    Output(OutputError),
}

impl CoreError {
    pub fn missing(name: impl Into<String>, kind: ReferenceKind) -> Self {
        Self::MissingReference {
            name: name.into(),
            kind,
        }
    }

    pub fn is_missing_reference(&self) -> bool {
        matches!(self, Self::MissingReference { .. })
    }
}

/// A missing reference raised inside a deferred continuation is the same
/// failure as one raised while binding.
impl From<OutputError> for CoreError {
    fn from(err: OutputError) -> Self {
        if let OutputError::MissingReference { name, kind } = &err {
            if let Some(kind) = ReferenceKind::from_label(kind) {
                return Self::missing(name.clone(), kind);
            }
        }
        Self::Output(err)
    }
}
