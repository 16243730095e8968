//! Export coordinator - main orchestrator for the export process
//!
//! This module drives one export run end to end: it wires the converters, runs the
//! registration phase, freezes the registry, renders every descriptor and finally writes
//! the output files. A failure anywhere before the write step leaves the output directory
//! untouched.

use crate::adapters::hcl::{CodeEmitter, HclWriter};
use crate::adapters::source::{HttpSourceClient, SourceClient};
use crate::config::OctoformConfig;
use crate::core::convert::{
    export_with_mode, ConverterSet, ExclusionFilter, ExportContext, ExportOptions,
};
use crate::core::export::summary::ExportSummary;
use crate::core::export::writer::{provider_file, provider_path, RenderedFiles};
use crate::core::registry::{FrozenRegistry, RenderContext};
use crate::domain::{ExportMode, OctoformError, Result};
use chrono::Utc;
use futures::future::try_join_all;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

/// What a run exports
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportTarget {
    /// Every top-level entity of the space
    Space,
    /// The given projects and everything they reference
    Projects(Vec<String>),
}

/// Export coordinator
pub struct ExportCoordinator {
    config: OctoformConfig,
    client: Arc<dyn SourceClient>,
    emitter: Arc<dyn CodeEmitter>,
    shutdown_signal: watch::Receiver<bool>,
}

impl ExportCoordinator {
    /// Create a coordinator reading from the given source
    pub fn new(
        config: OctoformConfig,
        client: Arc<dyn SourceClient>,
        shutdown_signal: watch::Receiver<bool>,
    ) -> Self {
        Self {
            config,
            client,
            emitter: Arc::new(HclWriter::new()),
            shutdown_signal,
        }
    }

    /// Create a coordinator reading from the configured server
    pub fn connect(config: OctoformConfig, shutdown_signal: watch::Receiver<bool>) -> Result<Self> {
        let client = Arc::new(HttpSourceClient::new(&config.source)?);
        Ok(Self::new(config, client, shutdown_signal))
    }

    /// Replace the default HCL writer
    pub fn with_emitter(mut self, emitter: Arc<dyn CodeEmitter>) -> Self {
        self.emitter = emitter;
        self
    }

    /// Execute the export
    ///
    /// With `dry_run`, everything is rendered but nothing is written; the summary still
    /// lists the files that would have been produced.
    pub async fn execute_export(&self, target: &ExportTarget, dry_run: bool) -> Result<ExportSummary> {
        let started_at = Utc::now();
        let start_time = Instant::now();
        let export = &self.config.export;

        crate::log_export_start!(self.config.source.space_id, export.mode);
        tracing::debug!(
            target = ?target,
            dependency_mode = %export.dependency_mode,
            dry_run = dry_run,
            "Export settings"
        );

        let mut options = ExportOptions::from(export);
        if *target == ExportTarget::Space {
            // everything is exported anyway, so dependencies are always created
            options.dependency_mode = ExportMode::Create;
        }
        let exclusions = ExclusionFilter::from_config(export)?;
        let ctx = Arc::new(ExportContext::new(self.client.clone(), options, exclusions));
        let converters = ConverterSet::new(ctx.clone())?;

        let mut shutdown = self.shutdown_signal.clone();
        tokio::select! {
            biased;
            _ = shutdown_requested(&mut shutdown) => {
                tracing::warn!("Shutdown requested, discarding export before writing");
                return Ok(ExportSummary::interrupted().with_timing(started_at, start_time.elapsed()));
            }
            result = self.register(&converters, target) => result?,
        }

        let frozen = ctx.registry.freeze();
        tracing::info!(
            registered = frozen.descriptors().len(),
            "Registration complete, rendering"
        );
        let files = self.render(&frozen)?;

        let mut summary = ExportSummary::from_registry(&frozen);
        summary.dry_run = dry_run;
        summary.files = if dry_run {
            files.paths()
        } else {
            files.write_to(Path::new(&export.output_dir))?
        };

        let summary = summary.with_timing(started_at, start_time.elapsed());
        summary.log_summary();
        Ok(summary)
    }

    /// Phase one: populate the registry
    async fn register(&self, converters: &ConverterSet, target: &ExportTarget) -> Result<()> {
        match target {
            ExportTarget::Space => {
                let bulk = converters.bulk();
                try_join_all(bulk.iter().map(|converter| async move {
                    let kind = converter.kind();
                    let count = converter.export_all().await?;
                    tracing::info!(kind = %kind, count = count, "Exported collection");
                    Ok::<_, OctoformError>(())
                }))
                .await?;
            }
            ExportTarget::Projects(project_ids) => {
                for project_id in project_ids {
                    export_with_mode(
                        converters.projects.as_ref(),
                        project_id,
                        self.config.export.mode,
                    )
                    .await?;
                }
            }
        }
        Ok(())
    }

    /// Phase two: render every descriptor into its output file
    fn render(&self, registry: &FrozenRegistry) -> Result<RenderedFiles> {
        let rctx = RenderContext::new(
            registry,
            self.emitter.as_ref(),
            self.config.export.strict_references,
        );

        let mut files = RenderedFiles::new();
        files.append(
            provider_path(),
            &provider_file(&self.config.export.provider_version),
        );

        for descriptor in registry.descriptors() {
            let Some(path) = descriptor.output_path.as_ref() else {
                continue;
            };
            let body = descriptor.render(&rctx).map_err(|e| match e {
                OctoformError::UnresolvedReference { .. } | OctoformError::Render { .. } => e,
                other => OctoformError::Render {
                    kind: descriptor.kind,
                    id: descriptor.source_id.clone(),
                    message: other.to_string(),
                },
            })?;
            files.append(path, &body);
        }
        Ok(files)
    }
}

/// Resolves once the shutdown flag is set; never resolves if the sender is gone
async fn shutdown_requested(signal: &mut watch::Receiver<bool>) {
    loop {
        if *signal.borrow() {
            return;
        }
        if signal.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
