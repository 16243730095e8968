//! Project converter
//!
//! A project owns its deployment process and its runbooks, which are exported as children
//! once the project itself is registered.

use super::lifecycle::LifecycleConverter;
use super::process::{ProcessConverter, ProcessOwner};
use super::project_group::ProjectGroupConverter;
use super::runbook::RunbookConverter;
use super::{export_with_mode, EntityConverter, ExportContext, ExportOptions, Placement};
use crate::adapters::hcl::{HclBlock, HclValue};
use crate::core::registry::RenderContext;
use crate::domain::{Project, ResourceKind, Result};
use async_trait::async_trait;
use std::sync::Arc;

pub struct ProjectConverter {
    ctx: Arc<ExportContext>,
    project_groups: Arc<ProjectGroupConverter>,
    lifecycles: Arc<LifecycleConverter>,
    processes: Arc<ProcessConverter>,
    runbooks: Arc<RunbookConverter>,
}

impl ProjectConverter {
    pub fn new(
        ctx: Arc<ExportContext>,
        project_groups: Arc<ProjectGroupConverter>,
        lifecycles: Arc<LifecycleConverter>,
        processes: Arc<ProcessConverter>,
        runbooks: Arc<RunbookConverter>,
    ) -> Self {
        Self {
            ctx,
            project_groups,
            lifecycles,
            processes,
            runbooks,
        }
    }
}

entity_exports!(ProjectConverter, ResourceKind::Projects);

#[async_trait]
impl EntityConverter for ProjectConverter {
    type Entity = Project;

    fn context(&self) -> &ExportContext {
        &self.ctx
    }

    fn entity_id(entity: &Project) -> &str {
        &entity.id
    }

    fn entity_name(entity: &Project) -> &str {
        &entity.name
    }

    fn resource_type(_entity: &Project) -> std::result::Result<&'static str, String> {
        Ok("octopusdeploy_project")
    }

    async fn export_dependencies(&self, entity: &Project) -> Result<()> {
        let mode = self.ctx.options.dependency_mode;
        export_with_mode(self.project_groups.as_ref(), &entity.project_group_id, mode).await?;
        export_with_mode(self.lifecycles.as_ref(), &entity.lifecycle_id, mode).await
    }

    async fn export_children(&self, entity: &Project, placement: &Placement) -> Result<()> {
        if let Some(process_id) = entity.deployment_process_id.as_deref() {
            let owner = ProcessOwner {
                kind: ResourceKind::Projects,
                id: entity.id.clone(),
                label: placement.label.clone(),
                count: placement.count(),
            };
            self.processes.export_process(&owner, process_id).await?;
        }
        self.runbooks
            .export_project_runbooks(&entity.id, &placement.label, placement.count())
            .await
    }

    fn resource_blocks(
        entity: &Project,
        placement: &Placement,
        _options: &ExportOptions,
        ctx: &RenderContext<'_>,
    ) -> Result<Vec<HclBlock>> {
        Ok(vec![HclBlock::resource(placement.resource_type, &placement.label)
            .attr("name", HclValue::literal(&entity.name))
            .attr(
                "description",
                HclValue::optional_literal(entity.description.as_deref()),
            )
            .attr(
                "project_group_id",
                HclValue::template(ctx.resolve(ResourceKind::ProjectGroups, &entity.project_group_id)?),
            )
            .attr(
                "lifecycle_id",
                HclValue::template(ctx.resolve(ResourceKind::Lifecycles, &entity.lifecycle_id)?),
            )
            .attr("is_disabled", HclValue::Bool(entity.is_disabled))
            .attr("auto_create_release", HclValue::Bool(entity.auto_create_release))
            .attr(
                "tenanted_deployment_participation",
                HclValue::optional_literal(entity.tenanted_deployment_mode.as_deref()),
            )
            .attr(
                "default_guided_failure_mode",
                HclValue::optional_literal(entity.default_guided_failure_mode.as_deref()),
            )])
    }
}
