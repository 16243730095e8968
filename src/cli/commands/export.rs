//! Export command implementation
//!
//! This module implements the `export` command, which reads the configured space (or a
//! snapshot of it) and writes Terraform configuration.

use super::{EXIT_CONFIGURATION, EXIT_FATAL, EXIT_INTERRUPTED, EXIT_OK, EXIT_SOURCE};
use crate::adapters::source::SnapshotSourceClient;
use crate::config::{load_config, OctoformConfig};
use crate::core::export::{ExportCoordinator, ExportSummary, ExportTarget};
use crate::domain::{ExportMode, OctoformError};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;

/// Arguments for the export command
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Export only this project and what it references (repeatable)
    #[arg(long, value_name = "ID")]
    pub project: Vec<String>,

    /// Override the mode for requested projects (create, lookup, stateless)
    #[arg(long)]
    pub mode: Option<ExportMode>,

    /// Override the output directory
    #[arg(short, long)]
    pub output: Option<String>,

    /// Read the space from a JSON snapshot instead of the server
    #[arg(long, value_name = "FILE")]
    pub snapshot: Option<PathBuf>,

    /// Render everything but write nothing
    #[arg(long)]
    pub dry_run: bool,
}

impl ExportArgs {
    /// Execute the export command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting export command");

        let mut config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("Failed to load configuration: {e}");
                return Ok(EXIT_CONFIGURATION);
            }
        };
        self.apply_overrides(&mut config);

        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "Configuration validation failed");
            eprintln!("Configuration validation failed: {e}");
            return Ok(EXIT_CONFIGURATION);
        }

        if self.dry_run {
            tracing::info!("Dry run mode enabled - no files will be written");
            println!("DRY RUN MODE - no files will be written");
            println!();
        }

        let coordinator = match self.coordinator(config, shutdown_signal) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to create export coordinator");
                eprintln!("Failed to initialize export: {e}");
                return Ok(exit_code_for(&e));
            }
        };

        let target = self.target();
        let summary = match coordinator.execute_export(&target, self.dry_run).await {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Export failed");
                eprintln!("Export failed: {e}");
                return Ok(exit_code_for(&e));
            }
        };

        print_summary(&summary);

        if summary.interrupted {
            println!("Export interrupted. Nothing was written.");
            tracing::info!("Export interrupted by user signal");
            return Ok(EXIT_INTERRUPTED);
        }
        Ok(EXIT_OK)
    }

    fn apply_overrides(&self, config: &mut OctoformConfig) {
        if let Some(mode) = self.mode {
            tracing::info!(mode = %mode, "Overriding export mode from CLI");
            config.export.mode = mode;
        }
        if let Some(output) = &self.output {
            tracing::info!(output = %output, "Overriding output directory from CLI");
            config.export.output_dir = output.clone();
        }
    }

    fn target(&self) -> ExportTarget {
        if self.project.is_empty() {
            ExportTarget::Space
        } else {
            ExportTarget::Projects(self.project.clone())
        }
    }

    fn coordinator(
        &self,
        config: OctoformConfig,
        shutdown_signal: watch::Receiver<bool>,
    ) -> crate::domain::Result<ExportCoordinator> {
        match &self.snapshot {
            Some(path) => {
                let client = SnapshotSourceClient::from_file(path)?
                    .with_page_size(config.source.page_size);
                Ok(ExportCoordinator::new(config, Arc::new(client), shutdown_signal))
            }
            None => ExportCoordinator::connect(config, shutdown_signal),
        }
    }
}

fn exit_code_for(error: &OctoformError) -> i32 {
    match error {
        OctoformError::Configuration(_) => EXIT_CONFIGURATION,
        e if e.is_source_error() => EXIT_SOURCE,
        _ => EXIT_FATAL,
    }
}

fn print_summary(summary: &ExportSummary) {
    println!();
    println!("Export Summary:");
    for (kind, count) in &summary.registered {
        println!("  {kind}: {count}");
    }
    println!("  Total resources: {}", summary.total_registered());
    println!(
        "  Files {}: {}",
        if summary.dry_run { "rendered" } else { "written" },
        summary.files.len()
    );
    println!("  Started: {}", summary.started_at.to_rfc3339());
    println!("  Duration: {:.2}s", summary.duration.as_secs_f64());
    println!();

    if !summary.warnings.is_empty() {
        println!("Warnings:");
        for warning in &summary.warnings {
            println!("  - {warning}");
        }
        println!();
    }

    if !summary.unresolved.is_empty() {
        println!("Unresolved references (rendered as placeholders):");
        for (kind, id) in &summary.unresolved {
            println!("  - {kind} {id}");
        }
        println!();
    }
}
