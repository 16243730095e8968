//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for Octoform using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Octoform - export a deployment space as Terraform configuration
#[derive(Parser, Debug)]
#[command(name = "octoform")]
#[command(version, about, long_about = None)]
#[command(author = "Octoform Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "octoform.toml", env = "OCTOFORM_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "OCTOFORM_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export the configured space (or selected projects) as Terraform configuration
    Export(commands::export::ExportArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}
