//! Project group converter

use super::{EntityConverter, ExportContext, ExportOptions, Placement};
use crate::adapters::hcl::{HclBlock, HclValue};
use crate::core::registry::RenderContext;
use crate::domain::{ProjectGroup, ResourceKind, Result};
use std::sync::Arc;

const DEFAULT_PROJECT_GROUP: &str = "Default Project Group";

pub struct ProjectGroupConverter {
    ctx: Arc<ExportContext>,
}

impl ProjectGroupConverter {
    pub fn new(ctx: Arc<ExportContext>) -> Self {
        Self { ctx }
    }
}

entity_exports!(ProjectGroupConverter, ResourceKind::ProjectGroups);

impl EntityConverter for ProjectGroupConverter {
    type Entity = ProjectGroup;

    fn context(&self) -> &ExportContext {
        &self.ctx
    }

    fn entity_id(entity: &ProjectGroup) -> &str {
        &entity.id
    }

    fn entity_name(entity: &ProjectGroup) -> &str {
        &entity.name
    }

    fn resource_type(_entity: &ProjectGroup) -> std::result::Result<&'static str, String> {
        Ok("octopusdeploy_project_group")
    }

    fn is_builtin(entity: &ProjectGroup) -> bool {
        entity.name == DEFAULT_PROJECT_GROUP
    }

    fn resource_blocks(
        entity: &ProjectGroup,
        placement: &Placement,
        _options: &ExportOptions,
        _ctx: &RenderContext<'_>,
    ) -> Result<Vec<HclBlock>> {
        Ok(vec![HclBlock::resource(placement.resource_type, &placement.label)
            .attr("name", HclValue::literal(&entity.name))
            .attr(
                "description",
                HclValue::optional_literal(entity.description.as_deref()),
            )])
    }
}
