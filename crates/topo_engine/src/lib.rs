//! # topo_engine
//!
//! The seam between topology binding and the orchestration engine that owns
//! resource lifecycle.
//!
//! Binding code hands each resource to a [`ResourceEngine`] as a kind, a name
//! and a tree of [`ResourceArgs`], and gets back a [`ResourceHandle`] whose id
//! and provider state are deferred [`Output`]s. Arguments may themselves hold
//! outputs of earlier declarations, which is how the dependency graph forms.
//!
//! # Engines
//!
//! - **MockEngine**: records declarations, `<name>_id` ids, injectable failures
//! - **PreviewEngine**: dry run with Azure-style ids
//!
//! # Example
//!
//! ```rust,no_run
//! use topo_engine::{PreviewEngine, ResourceArgs, ResourceEngine, ResourceKind};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = PreviewEngine::new("topo", "dev");
//!
//!     let rg = engine
//!         .declare(
//!             ResourceKind::ResourceGroup,
//!             "rg1",
//!             ResourceArgs::new().set("name", "rg1").set("location", "uswest"),
//!         )
//!         .await?;
//!
//!     println!("Resource group id: {}", rg.id().resolve().await?);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod input;
pub mod mock;
pub mod output;
pub mod preview;
pub mod resource;

pub use error::{EngineError, EngineResult, OutputError};
pub use input::{Input, ResourceArgs};
pub use mock::MockEngine;
pub use output::{Output, OutputSender};
pub use preview::{PreviewEngine, PREVIEW_SUBSCRIPTION};
pub use resource::{urn, Declaration, ResourceEngine, ResourceHandle, ResourceKind};
