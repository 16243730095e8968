// Octoform - Deployment space to Terraform exporter
// Copyright (c) 2025 Octoform Contributors
// Licensed under the MIT License

//! # Octoform - Deployment space to Terraform exporter
//!
//! Octoform reads a space from a deployment platform over its REST API and writes Terraform
//! configuration for the `octopusdeploy` provider that recreates it.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Reading** environments, feeds, accounts, projects, processes and runbooks from the
//!   source server (or an offline JSON snapshot)
//! - **Registering** one descriptor per entity in a concurrency-safe registry, exactly once
//! - **Rendering** HCL against the frozen registry so references resolve regardless of the
//!   order entities were visited in
//! - **Writing** the files under `space_population/`
//!
//! ## Architecture
//!
//! Octoform follows a layered architecture:
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (registry, converters, process flattening, export)
//! - [`adapters`] - External integrations (source server, HCL writer, naming)
//! - [`domain`] - Core domain types and models
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging and observability
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use octoform::config::load_config;
//! use octoform::core::export::{ExportCoordinator, ExportTarget};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("octoform.toml")?;
//!     let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//!
//!     let coordinator = ExportCoordinator::connect(config, shutdown_rx)?;
//!     let summary = coordinator.execute_export(&ExportTarget::Space, false).await?;
//!
//!     println!("Exported {} resources", summary.total_registered());
//!     Ok(())
//! }
//! ```
//!
//! ## Export Modes
//!
//! - **Create**: resource blocks that create the entity
//! - **Lookup**: data blocks that find an entity already present in the target space
//! - **Stateless**: a data block plus a resource created only when the lookup is empty
//!
//! ## Error Handling
//!
//! Octoform uses the [`domain::OctoformError`] type for all errors:
//!
//! ```rust,no_run
//! use octoform::domain::OctoformError;
//!
//! fn example() -> Result<(), OctoformError> {
//!     let config = octoform::config::load_config("octoform.toml")?;
//!     Ok(())
//! }
//! ```
//!
//! ## Logging
//!
//! Octoform uses structured logging with the `tracing` crate:
//!
//! ```rust,no_run
//! use tracing::{info, warn};
//!
//! info!("Starting export");
//! warn!(kind = "Feeds", id = "Feeds-3", "Unsupported feed type");
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
