//! Environment converter

use super::{EntityConverter, ExportContext, ExportOptions, Placement};
use crate::adapters::hcl::{HclBlock, HclValue};
use crate::core::registry::RenderContext;
use crate::domain::{Environment, ResourceKind, Result};
use std::sync::Arc;

pub struct EnvironmentConverter {
    ctx: Arc<ExportContext>,
}

impl EnvironmentConverter {
    pub fn new(ctx: Arc<ExportContext>) -> Self {
        Self { ctx }
    }
}

entity_exports!(EnvironmentConverter, ResourceKind::Environments);

impl EntityConverter for EnvironmentConverter {
    type Entity = Environment;

    fn context(&self) -> &ExportContext {
        &self.ctx
    }

    fn entity_id(entity: &Environment) -> &str {
        &entity.id
    }

    fn entity_name(entity: &Environment) -> &str {
        &entity.name
    }

    fn resource_type(_entity: &Environment) -> std::result::Result<&'static str, String> {
        Ok("octopusdeploy_environment")
    }

    fn resource_blocks(
        entity: &Environment,
        placement: &Placement,
        _options: &ExportOptions,
        _ctx: &RenderContext<'_>,
    ) -> Result<Vec<HclBlock>> {
        Ok(vec![HclBlock::resource(placement.resource_type, &placement.label)
            .attr("name", HclValue::literal(&entity.name))
            .attr(
                "description",
                HclValue::optional_literal(entity.description.as_deref()),
            )
            .attr("sort_order", HclValue::Number(i64::from(entity.sort_order)))
            .attr("use_guided_failure", HclValue::Bool(entity.use_guided_failure))
            .attr(
                "allow_dynamic_infrastructure",
                HclValue::Bool(entity.allow_dynamic_infrastructure),
            )])
    }
}
