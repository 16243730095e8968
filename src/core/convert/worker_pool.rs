//! Worker pool converter
//!
//! Dynamic pools are hosted by the platform and can only be referenced.

use super::{EntityConverter, ExportContext, ExportOptions, Placement};
use crate::adapters::hcl::{HclBlock, HclValue};
use crate::core::registry::RenderContext;
use crate::domain::{ResourceKind, Result, WorkerPool};
use std::sync::Arc;

pub struct WorkerPoolConverter {
    ctx: Arc<ExportContext>,
}

impl WorkerPoolConverter {
    pub fn new(ctx: Arc<ExportContext>) -> Self {
        Self { ctx }
    }
}

entity_exports!(WorkerPoolConverter, ResourceKind::WorkerPools);

impl EntityConverter for WorkerPoolConverter {
    type Entity = WorkerPool;

    fn context(&self) -> &ExportContext {
        &self.ctx
    }

    fn entity_id(entity: &WorkerPool) -> &str {
        &entity.id
    }

    fn entity_name(entity: &WorkerPool) -> &str {
        &entity.name
    }

    fn resource_type(entity: &WorkerPool) -> std::result::Result<&'static str, String> {
        match entity.worker_pool_type.as_str() {
            "StaticWorkerPool" => Ok("octopusdeploy_static_worker_pool"),
            "DynamicWorkerPool" => Ok("octopusdeploy_dynamic_worker_pool"),
            other => Err(other.to_string()),
        }
    }

    fn is_builtin(entity: &WorkerPool) -> bool {
        entity.worker_pool_type == "DynamicWorkerPool"
    }

    fn resource_blocks(
        entity: &WorkerPool,
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
            .attr("is_default", HclValue::Bool(entity.is_default))
            .attr("sort_order", HclValue::Number(i64::from(entity.sort_order)))])
    }
}
