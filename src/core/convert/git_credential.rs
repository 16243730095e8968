//! Git credential converter

use super::{secret_value, EntityConverter, ExportContext, ExportOptions, Placement};
use crate::adapters::hcl::{HclBlock, HclValue};
use crate::core::registry::RenderContext;
use crate::domain::{GitCredential, ResourceKind, Result};
use std::sync::Arc;

pub struct GitCredentialConverter {
    ctx: Arc<ExportContext>,
}

impl GitCredentialConverter {
    pub fn new(ctx: Arc<ExportContext>) -> Self {
        Self { ctx }
    }
}

entity_exports!(GitCredentialConverter, ResourceKind::GitCredentials);

impl EntityConverter for GitCredentialConverter {
    type Entity = GitCredential;

    fn context(&self) -> &ExportContext {
        &self.ctx
    }

    fn entity_id(entity: &GitCredential) -> &str {
        &entity.id
    }

    fn entity_name(entity: &GitCredential) -> &str {
        &entity.name
    }

    fn resource_type(_entity: &GitCredential) -> std::result::Result<&'static str, String> {
        Ok("octopusdeploy_git_credential")
    }

    fn resource_blocks(
        entity: &GitCredential,
        placement: &Placement,
        options: &ExportOptions,
        _ctx: &RenderContext<'_>,
    ) -> Result<Vec<HclBlock>> {
        let mut blocks = Vec::new();
        // the password is write-only, so it is always a variable or a placeholder
        let password = secret_value(
            options,
            placement.resource_type,
            &placement.label,
            "password",
            &mut blocks,
        );

        blocks.push(
            HclBlock::resource(placement.resource_type, &placement.label)
                .attr("name", HclValue::literal(&entity.name))
                .attr(
                    "description",
                    HclValue::optional_literal(entity.description.as_deref()),
                )
                .attr(
                    "username",
                    HclValue::optional_literal(entity.details.username.as_deref()),
                )
                .attr("password", password),
        );
        Ok(blocks)
    }
}
