//! Error types for the engine module.

use thiserror::Error;

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors raised while declaring a resource.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Declaration of {kind} '{name}' failed: {message}")]
    DeclareFailed {
        kind: String,
        name: String,
        message: String,
    },

    #[error("Resource {kind} '{name}' is already declared")]
    DuplicateResource { kind: String, name: String },

    #[error(transparent)]
    Output(#[from] OutputError),
}

/// Failure carried by a deferred output.
///
/// Outputs are read by any number of consumers, so the error is `Clone`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OutputError {
    #[error("Missing {kind}: '{name}'")]
    MissingReference { name: String, kind: String },

    #[error("Resource '{resource}' has no output field '{field}'")]
    MissingField { resource: String, field: String },

    #[error("Output field '{field}' is not {expected}")]
    TypeMismatch { field: String, expected: String },

    #[error("Output was dropped before it resolved")]
    Dropped,

    #[error("{0}")]
    Failed(String),
}

impl OutputError {
    pub fn missing_reference(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self::MissingReference {
            name: name.into(),
            kind: kind.into(),
        }
    }
}
