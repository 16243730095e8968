//! Core business logic for Octoform.
//!
//! This module contains the core business logic and orchestration for Octoform exports.
//!
//! # Modules
//!
//! - [`registry`] - Two-phase resource registry (register, freeze, render)
//! - [`convert`] - Converter contract and per-kind converters
//! - [`process`] - Process flattening and property rewriting
//! - [`export`] - Export orchestration, output files and summary
//!
//! # Export Workflow
//!
//! 1. **Register**: converters walk the space and register a descriptor per entity
//! 2. **Freeze**: the registry becomes read-only
//! 3. **Render**: every descriptor renders its blocks against the frozen registry
//! 4. **Write**: files are written under `<output_dir>/space_population/`
//! 5. **Report**: generate the export summary
//!
//! # Example
//!
//! ```rust,no_run
//! use octoform::config::load_config;
//! use octoform::core::export::{ExportCoordinator, ExportTarget};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Load configuration
//! let config = load_config("octoform.toml")?;
//!
//! // Create shutdown signal
//! let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//!
//! // Create export coordinator
//! let coordinator = ExportCoordinator::connect(config, shutdown_rx)?;
//!
//! // Execute export
//! let summary = coordinator.execute_export(&ExportTarget::Space, false).await?;
//!
//! println!("Registered: {}", summary.total_registered());
//! println!("Files: {}", summary.files.len());
//! # Ok(())
//! # }
//! ```

pub mod convert;
pub mod export;
pub mod process;
pub mod registry;
