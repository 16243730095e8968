//! Domain models and types for Octoform.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Resource kinds** ([`ResourceKind`], [`ProcessScope`]) used as registry namespaces
//! - **Export modes** ([`ExportMode`]): create, lookup or stateless
//! - **Domain models** ([`Project`], [`Process`], [`Step`], [`Action`], ...) read from the
//!   source platform
//! - **Error types** ([`OctoformError`], [`SourceError`])
//! - **Result type alias** ([`Result`])
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, OctoformError>`]:
//!
//! ```rust
//! use octoform::domain::{OctoformError, Result};
//!
//! fn example() -> Result<()> {
//!     Err(OctoformError::Validation("space_id is empty".to_string()))
//! }
//! ```

pub mod errors;
pub mod kind;
pub mod mode;
pub mod models;
pub mod result;

// Re-export commonly used types for convenience
pub use errors::{OctoformError, SourceError};
pub use kind::{DataSource, ProcessScope, ResourceKind};
pub use mode::ExportMode;
pub use models::{
    Account, Action, Environment, Feed, GitCredential, Lifecycle, PackageReference, Phase,
    Process, Project, ProjectGroup, PropertyBag, PropertyValue, Runbook, Step, StepTemplate,
    WorkerPool,
};
pub use result::Result;
