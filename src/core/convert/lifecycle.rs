//! Lifecycle converter

use super::environment::EnvironmentConverter;
use super::{export_with_mode, EntityConverter, ExportContext, ExportOptions, Placement};
use crate::adapters::hcl::{HclBlock, HclValue};
use crate::core::registry::RenderContext;
use crate::domain::{Lifecycle, ResourceKind, Result};
use async_trait::async_trait;
use std::sync::Arc;

const DEFAULT_LIFECYCLE: &str = "Default Lifecycle";

pub struct LifecycleConverter {
    ctx: Arc<ExportContext>,
    environments: Arc<EnvironmentConverter>,
}

impl LifecycleConverter {
    pub fn new(ctx: Arc<ExportContext>, environments: Arc<EnvironmentConverter>) -> Self {
        Self { ctx, environments }
    }
}

entity_exports!(LifecycleConverter, ResourceKind::Lifecycles);

#[async_trait]
impl EntityConverter for LifecycleConverter {
    type Entity = Lifecycle;

    fn context(&self) -> &ExportContext {
        &self.ctx
    }

    fn entity_id(entity: &Lifecycle) -> &str {
        &entity.id
    }

    fn entity_name(entity: &Lifecycle) -> &str {
        &entity.name
    }

    fn resource_type(_entity: &Lifecycle) -> std::result::Result<&'static str, String> {
        Ok("octopusdeploy_lifecycle")
    }

    fn is_builtin(entity: &Lifecycle) -> bool {
        entity.name == DEFAULT_LIFECYCLE
    }

    async fn export_dependencies(&self, entity: &Lifecycle) -> Result<()> {
        let mode = self.ctx.options.dependency_mode;
        for phase in &entity.phases {
            for environment in phase
                .automatic_deployment_targets
                .iter()
                .chain(&phase.optional_deployment_targets)
            {
                export_with_mode(self.environments.as_ref(), environment, mode).await?;
            }
        }
        Ok(())
    }

    fn resource_blocks(
        entity: &Lifecycle,
        placement: &Placement,
        _options: &ExportOptions,
        ctx: &RenderContext<'_>,
    ) -> Result<Vec<HclBlock>> {
        let mut resource = HclBlock::resource(placement.resource_type, &placement.label)
            .attr("name", HclValue::literal(&entity.name))
            .attr(
                "description",
                HclValue::optional_literal(entity.description.as_deref()),
            );

        for phase in &entity.phases {
            resource = resource.block(
                HclBlock::nested("phase")
                    .attr("name", HclValue::literal(&phase.name))
                    .attr(
                        "automatic_deployment_targets",
                        HclValue::template_list(ctx.resolve_many(
                            ResourceKind::Environments,
                            &phase.automatic_deployment_targets,
                        )?),
                    )
                    .attr(
                        "optional_deployment_targets",
                        HclValue::template_list(ctx.resolve_many(
                            ResourceKind::Environments,
                            &phase.optional_deployment_targets,
                        )?),
                    )
                    .attr(
                        "minimum_environments_before_promotion",
                        HclValue::Number(i64::from(phase.minimum_environments_before_promotion)),
                    )
                    .attr("is_optional_phase", HclValue::Bool(phase.is_optional_phase)),
            );
        }

        Ok(vec![resource])
    }
}
