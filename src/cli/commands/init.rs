//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use super::{EXIT_CONFIGURATION, EXIT_FATAL, EXIT_OK};
use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "octoform.toml")]
    pub output: String,

    /// Include example values and comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        if Path::new(&self.output).exists() && !self.force {
            println!("Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(EXIT_CONFIGURATION);
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your server URL and space", self.output);
                println!("  2. Set OCTOFORM_API_KEY in your environment or a .env file");
                println!("  3. Validate configuration: octoform validate-config");
                println!("  4. Run export: octoform export --dry-run");
                println!();
                Ok(EXIT_OK)
            }
            Err(e) => {
                println!("Failed to write configuration file");
                println!("   Error: {e}");
                Ok(EXIT_FATAL)
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# Octoform Configuration File

[application]
log_level = "info"

[source]
base_url = "https://deploy.example.com"
api_key = "${OCTOFORM_API_KEY}"
space_id = "Spaces-1"

[export]
output_dir = "./terraform"
mode = "create"
dependency_mode = "create"
dummy_secrets = false

[logging]
local_enabled = false
"#
        .to_string()
    }

    /// Generate configuration with examples and comments
    fn generate_config_with_examples() -> String {
        r#"# Octoform Configuration File
# Exports a deployment space as Terraform configuration

# ============================================================================
# Application Configuration
# ============================================================================
[application]
# Log level: trace, debug, info, warn, error
log_level = "info"

# ============================================================================
# Source Server Configuration
# ============================================================================
[source]
# Base URL of the server (without /api)
base_url = "https://deploy.example.com"

# API key sent as X-Octopus-ApiKey (use environment variable)
api_key = "${OCTOFORM_API_KEY}"

# Space to export
space_id = "Spaces-1"

# Request timeout in seconds
timeout_seconds = 60

# Items requested per collection page (1-1000)
page_size = 100

# TLS/SSL verification
tls_verify = true

# ============================================================================
# Export Configuration
# ============================================================================
[export]
# Directory the Terraform files are written to
output_dir = "./terraform"

# Mode for requested projects: "create", "lookup" or "stateless"
# - create: resource blocks that create the entity
# - lookup: data blocks that find an entity already in the target space
# - stateless: data block plus a resource created only when the lookup is empty
mode = "create"

# Mode for the dependencies of requested projects
dependency_mode = "create"

# Write "Change Me!" instead of a sensitive variable for every secret
dummy_secrets = false

# Truncate step property values longer than this many characters
# max_property_length = 10000

# Stop exporting a kind in bulk after this many entities
# resource_limit = 100

# Export template-linked steps as plain steps
detach_step_templates = false

# Fail the run when a reference cannot be resolved
strict_references = false

# Version constraint for the octopusdeploy provider
provider_version = "~> 0.22"

# Exclusion rules per resource kind
# [export.exclusions.Projects]
# names = ["Scratch"]
# regex = ["^Sandbox"]
#
# [export.exclusions.Accounts]
# all = true

# ============================================================================
# Logging Configuration
# ============================================================================
[logging]
# Enable local JSON file logging
local_enabled = false

# Local log directory
local_path = "./logs"

# Log rotation: daily, hourly or never
local_rotation = "daily"
"#
        .to_string()
    }
}
