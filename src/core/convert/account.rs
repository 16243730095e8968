//! Account converter

use super::environment::EnvironmentConverter;
use super::{
    export_with_mode, secret_value, EntityConverter, ExportContext, ExportOptions, Placement,
};
use crate::adapters::hcl::{HclBlock, HclValue};
use crate::core::registry::RenderContext;
use crate::domain::{Account, ResourceKind, Result};
use async_trait::async_trait;
use std::sync::Arc;

pub struct AccountConverter {
    ctx: Arc<ExportContext>,
    environments: Arc<EnvironmentConverter>,
}

impl AccountConverter {
    pub fn new(ctx: Arc<ExportContext>, environments: Arc<EnvironmentConverter>) -> Self {
        Self { ctx, environments }
    }
}

entity_exports!(AccountConverter, ResourceKind::Accounts);

#[async_trait]
impl EntityConverter for AccountConverter {
    type Entity = Account;

    fn context(&self) -> &ExportContext {
        &self.ctx
    }

    fn entity_id(entity: &Account) -> &str {
        &entity.id
    }

    fn entity_name(entity: &Account) -> &str {
        &entity.name
    }

    fn resource_type(entity: &Account) -> std::result::Result<&'static str, String> {
        match entity.account_type.as_str() {
            "UsernamePassword" => Ok("octopusdeploy_username_password_account"),
            "Token" => Ok("octopusdeploy_token_account"),
            "AmazonWebServicesAccount" => Ok("octopusdeploy_aws_account"),
            "AzureServicePrincipal" => Ok("octopusdeploy_azure_service_principal"),
            other => Err(other.to_string()),
        }
    }

    async fn export_dependencies(&self, entity: &Account) -> Result<()> {
        let mode = self.ctx.options.dependency_mode;
        for environment in &entity.environment_ids {
            export_with_mode(self.environments.as_ref(), environment, mode).await?;
        }
        Ok(())
    }

    fn resource_blocks(
        entity: &Account,
        placement: &Placement,
        options: &ExportOptions,
        ctx: &RenderContext<'_>,
    ) -> Result<Vec<HclBlock>> {
        let mut blocks = Vec::new();
        let secret = |field: &str, blocks: &mut Vec<HclBlock>| {
            secret_value(options, placement.resource_type, &placement.label, field, blocks)
        };

        let mut resource = HclBlock::resource(placement.resource_type, &placement.label)
            .attr("name", HclValue::literal(&entity.name))
            .attr(
                "description",
                HclValue::optional_literal(entity.description.as_deref()),
            )
            .attr(
                "environments",
                HclValue::template_list(
                    ctx.resolve_many(ResourceKind::Environments, &entity.environment_ids)?,
                ),
            )
            .attr(
                "tenanted_deployment_participation",
                HclValue::optional_literal(entity.tenanted_deployment_participation.as_deref()),
            );

        match entity.account_type.as_str() {
            "UsernamePassword" => {
                resource.set(
                    "username",
                    HclValue::optional_literal(entity.username.as_deref()),
                );
                resource.set("password", secret("password", &mut blocks));
            }
            "Token" => {
                resource.set("token", secret("token", &mut blocks));
            }
            "AmazonWebServicesAccount" => {
                resource.set(
                    "access_key",
                    HclValue::optional_literal(entity.access_key.as_deref()),
                );
                resource.set("secret_key", secret("secret_key", &mut blocks));
            }
            "AzureServicePrincipal" => {
                resource.set(
                    "application_id",
                    HclValue::optional_literal(entity.client_id.as_deref()),
                );
                resource.set(
                    "tenant_id",
                    HclValue::optional_literal(entity.tenant_id.as_deref()),
                );
                resource.set(
                    "subscription_id",
                    HclValue::optional_literal(entity.subscription_number.as_deref()),
                );
                resource.set("password", secret("password", &mut blocks));
            }
            _ => {}
        }

        blocks.push(resource);
        Ok(blocks)
    }
}
