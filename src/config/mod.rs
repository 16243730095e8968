//! Configuration management for Octoform.
//!
//! This module provides TOML-based configuration loading, parsing, and validation.
//!
//! # Overview
//!
//! Octoform uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `OCTOFORM_<SECTION>_<KEY>` environment overrides
//! - Default values for optional settings
//! - Validation on load
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use octoform::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("octoform.toml")?;
//!
//! println!("Source: {}", config.source.base_url);
//! println!("Export mode: {}", config.export.mode);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Application settings (log level)
//! - [`SourceConfig`] - Source server connection and paging
//! - [`ExportConfig`] - Export modes, secrets, truncation, exclusions
//! - [`LoggingConfig`] - Local file logging
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [source]
//! base_url = "https://deploy.example.com"
//! api_key = "${OCTOFORM_API_KEY}"
//! space_id = "Spaces-1"
//!
//! [export]
//! output_dir = "./terraform"
//! mode = "create"
//! dummy_secrets = true
//!
//! [export.exclusions.Projects]
//! regex = ["^Sandbox"]
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{load_config, parse_config};
pub use schema::{
    ApplicationConfig, ExclusionRule, ExportConfig, LoggingConfig, OctoformConfig, SourceConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
