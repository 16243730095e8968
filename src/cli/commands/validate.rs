//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the Octoform configuration file.

use super::{EXIT_CONFIGURATION, EXIT_OK};
use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    ///
    /// Loading already validates, so any error here is a configuration error.
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("Validating configuration file: {config_path}");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("Configuration is invalid");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIGURATION);
            }
        };

        println!("Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Server: {}", config.source.base_url);
        println!("  Space: {}", config.source.space_id);
        println!("  Output Directory: {}", config.export.output_dir);
        println!("  Export Mode: {}", config.export.mode);
        println!("  Dependency Mode: {}", config.export.dependency_mode);
        println!("  Dummy Secrets: {}", config.export.dummy_secrets);
        println!("  Strict References: {}", config.export.strict_references);
        if let Some(limit) = config.export.max_property_length {
            println!("  Max Property Length: {limit}");
        }
        if !config.export.exclusions.is_empty() {
            let kinds: Vec<&str> = config.export.exclusions.keys().map(String::as_str).collect();
            println!("  Exclusions: {}", kinds.join(", "));
        }
        println!();
        Ok(EXIT_OK)
    }
}
