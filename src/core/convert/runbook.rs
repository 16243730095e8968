//! Runbook converter
//!
//! Runbooks belong to a project and are exported with it. A runbook's block label is
//! prefixed with its project's label, and it inherits the project's `count` guard.

use super::environment::EnvironmentConverter;
use super::process::{ProcessConverter, ProcessOwner};
use super::{export_with_mode, Address, Converter, ExportContext};
use crate::adapters::hcl::{HclBlock, HclValue};
use crate::adapters::source::fetch_children;
use crate::core::registry::{ExportWarning, ResourceDescriptor};
use crate::domain::{ResourceKind, Result, Runbook};
use std::sync::Arc;

const RUNBOOK: &str = "octopusdeploy_runbook";

pub struct RunbookConverter {
    ctx: Arc<ExportContext>,
    environments: Arc<EnvironmentConverter>,
    processes: Arc<ProcessConverter>,
}

impl Converter for RunbookConverter {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Runbooks
    }
}

impl RunbookConverter {
    pub fn new(
        ctx: Arc<ExportContext>,
        environments: Arc<EnvironmentConverter>,
        processes: Arc<ProcessConverter>,
    ) -> Self {
        Self {
            ctx,
            environments,
            processes,
        }
    }

    /// Exports every runbook of a project
    pub async fn export_project_runbooks(
        &self,
        project_id: &str,
        project_label: &str,
        count: Option<String>,
    ) -> Result<()> {
        let runbooks: Vec<Runbook> = fetch_children(
            self.ctx.client.as_ref(),
            ResourceKind::Projects,
            project_id,
            ResourceKind::Runbooks,
        )
        .await?;

        for runbook in runbooks {
            self.export_runbook(runbook, project_label, count.clone())
                .await?;
        }
        Ok(())
    }

    async fn export_runbook(
        &self,
        runbook: Runbook,
        project_label: &str,
        count: Option<String>,
    ) -> Result<()> {
        let ctx = &self.ctx;
        let Some(claim) = ctx.registry.claim(ResourceKind::Runbooks, &runbook.id) else {
            return Ok(());
        };

        if ctx.exclusions.is_excluded(ResourceKind::Runbooks, &runbook.name) {
            ctx.registry.warn(ExportWarning::Excluded {
                kind: ResourceKind::Runbooks,
                id: runbook.id.clone(),
                name: runbook.name.clone(),
            });
            claim.skip();
            return Ok(());
        }

        let mode = ctx.options.dependency_mode;
        for environment in &runbook.environments {
            export_with_mode(self.environments.as_ref(), environment, mode).await?;
        }

        let address = Address::new(
            RUNBOOK,
            ctx.label(
                ResourceKind::Runbooks,
                &runbook.id,
                &format!("{project_label} {}", runbook.name),
            ),
            count,
        );
        let owner = ProcessOwner {
            kind: ResourceKind::Runbooks,
            id: runbook.id.clone(),
            label: address.label.clone(),
            count: address.count.clone(),
        };
        let process_id = runbook.runbook_process_id.clone();

        let descriptor = ResourceDescriptor::new(ResourceKind::Runbooks, &runbook.id, address.lookup())
            .with_dependency(Some(address.dependency()))
            .with_display_name(&runbook.name)
            .with_output_path(address.output_path())
            .with_parent_id(&runbook.project_id)
            .with_render(move |rctx| {
                let block = HclBlock::resource(address.resource_type, &address.label)
                    .attr("name", HclValue::literal(&runbook.name))
                    .attr(
                        "project_id",
                        HclValue::template(rctx.resolve(ResourceKind::Projects, &runbook.project_id)?),
                    )
                    .attr(
                        "description",
                        HclValue::optional_literal(runbook.description.as_deref()),
                    )
                    .attr(
                        "environment_scope",
                        HclValue::literal(
                            runbook.environment_scope.as_deref().unwrap_or("All"),
                        ),
                    )
                    .attr(
                        "environments",
                        HclValue::template_list(
                            rctx.resolve_many(ResourceKind::Environments, &runbook.environments)?,
                        ),
                    )
                    .attr(
                        "multi_tenancy_mode",
                        HclValue::optional_literal(runbook.multi_tenancy_mode.as_deref()),
                    )
                    .attr(
                        "default_guided_failure_mode",
                        HclValue::optional_literal(runbook.default_guided_failure_mode.as_deref()),
                    );
                rctx.emit_all(&address.finish(vec![block]))
            });
        claim.register(descriptor)?;

        if let Some(process_id) = process_id {
            self.processes.export_process(&owner, &process_id).await?;
        }
        Ok(())
    }
}
