//! Feed converter
//!
//! The built-in package repository and the project release feed exist in every space and
//! are always looked up. Other feed types map to their own provider resource.

use super::{secret_value, EntityConverter, ExportContext, ExportOptions, Placement};
use crate::adapters::hcl::{HclBlock, HclValue};
use crate::core::registry::RenderContext;
use crate::domain::{Feed, ResourceKind, Result};
use std::sync::Arc;

const BUILTIN_FEED_TYPES: [&str; 2] = ["BuiltIn", "OctopusProject"];

pub struct FeedConverter {
    ctx: Arc<ExportContext>,
}

impl FeedConverter {
    pub fn new(ctx: Arc<ExportContext>) -> Self {
        Self { ctx }
    }
}

entity_exports!(FeedConverter, ResourceKind::Feeds);

impl EntityConverter for FeedConverter {
    type Entity = Feed;

    fn context(&self) -> &ExportContext {
        &self.ctx
    }

    fn entity_id(entity: &Feed) -> &str {
        &entity.id
    }

    fn entity_name(entity: &Feed) -> &str {
        &entity.name
    }

    fn resource_type(entity: &Feed) -> std::result::Result<&'static str, String> {
        match entity.feed_type.as_str() {
            "BuiltIn" | "OctopusProject" => Ok("octopusdeploy_feed"),
            "NuGet" => Ok("octopusdeploy_nuget_feed"),
            "Docker" => Ok("octopusdeploy_docker_container_registry"),
            "Helm" => Ok("octopusdeploy_helm_feed"),
            "Maven" => Ok("octopusdeploy_maven_feed"),
            "GitHub" => Ok("octopusdeploy_github_repository_feed"),
            other => Err(other.to_string()),
        }
    }

    fn is_builtin(entity: &Feed) -> bool {
        BUILTIN_FEED_TYPES.contains(&entity.feed_type.as_str())
    }

    fn resource_blocks(
        entity: &Feed,
        placement: &Placement,
        options: &ExportOptions,
        _ctx: &RenderContext<'_>,
    ) -> Result<Vec<HclBlock>> {
        let mut blocks = Vec::new();
        let mut resource = HclBlock::resource(placement.resource_type, &placement.label)
            .attr("name", HclValue::literal(&entity.name))
            .attr(
                "feed_uri",
                HclValue::optional_literal(entity.feed_uri.as_deref()),
            );

        if entity.feed_type == "Docker" {
            resource.set("api_version", HclValue::literal("v2"));
        }
        if let Some(username) = entity.username.as_deref().filter(|u| !u.is_empty()) {
            resource.set("username", HclValue::literal(username));
        }
        if entity.password.as_ref().is_some_and(|p| p.has_value) {
            let password = secret_value(
                options,
                placement.resource_type,
                &placement.label,
                "password",
                &mut blocks,
            );
            resource.set("password", password);
        }
        if !entity.package_acquisition_location_options.is_empty() {
            resource.set(
                "package_acquisition_location_options",
                HclValue::literal_list(&entity.package_acquisition_location_options),
            );
        }

        blocks.push(resource);
        Ok(blocks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::SensitiveValue;

    fn feed(feed_type: &str) -> Feed {
        Feed {
            id: "Feeds-1".to_string(),
            name: "Main".to_string(),
            feed_type: feed_type.to_string(),
            feed_uri: Some("https://example.org/nuget".to_string()),
            username: Some("deployer".to_string()),
            password: Some(SensitiveValue { has_value: true }),
            package_acquisition_location_options: vec![],
        }
    }

    #[test]
    fn test_feed_type_mapping() {
        assert_eq!(
            FeedConverter::resource_type(&feed("NuGet")),
            Ok("octopusdeploy_nuget_feed")
        );
        assert_eq!(
            FeedConverter::resource_type(&feed("Docker")),
            Ok("octopusdeploy_docker_container_registry")
        );
        assert_eq!(
            FeedConverter::resource_type(&feed("AwsElasticContainerRegistry")),
            Err("AwsElasticContainerRegistry".to_string())
        );
    }

    #[test]
    fn test_builtin_feeds_are_lookups() {
        assert!(FeedConverter::is_builtin(&feed("BuiltIn")));
        assert!(FeedConverter::is_builtin(&feed("OctopusProject")));
        assert!(!FeedConverter::is_builtin(&feed("Helm")));
    }
}
