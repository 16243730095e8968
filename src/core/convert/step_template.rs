//! Step template converter
//!
//! Templated steps pin the template version, so descriptors expose a `version` attribute
//! next to the id. Community templates are installed from the shared library under their
//! own name and are always looked up.

use super::{secret_value, EntityConverter, ExportContext, ExportOptions, Placement};
use crate::adapters::hcl::{HclBlock, HclValue};
use crate::core::registry::RenderContext;
use crate::domain::{PropertyValue, ResourceKind, Result, StepTemplate};
use std::sync::Arc;

pub struct StepTemplateConverter {
    ctx: Arc<ExportContext>,
}

impl StepTemplateConverter {
    pub fn new(ctx: Arc<ExportContext>) -> Self {
        Self { ctx }
    }
}

entity_exports!(StepTemplateConverter, ResourceKind::StepTemplates);

impl EntityConverter for StepTemplateConverter {
    type Entity = StepTemplate;

    fn context(&self) -> &ExportContext {
        &self.ctx
    }

    fn entity_id(entity: &StepTemplate) -> &str {
        &entity.id
    }

    fn entity_name(entity: &StepTemplate) -> &str {
        &entity.name
    }

    fn resource_type(_entity: &StepTemplate) -> std::result::Result<&'static str, String> {
        Ok("octopusdeploy_step_template")
    }

    fn is_builtin(entity: &StepTemplate) -> bool {
        entity.is_community()
    }

    fn attributes() -> &'static [&'static str] {
        &["version"]
    }

    fn resource_blocks(
        entity: &StepTemplate,
        placement: &Placement,
        options: &ExportOptions,
        _ctx: &RenderContext<'_>,
    ) -> Result<Vec<HclBlock>> {
        let mut blocks = Vec::new();

        let mut properties = Vec::with_capacity(entity.properties.len());
        for (key, value) in &entity.properties {
            let value = match value {
                PropertyValue::Text(text) => HclValue::literal(text),
                PropertyValue::Sensitive { .. } => secret_value(
                    options,
                    placement.resource_type,
                    &placement.label,
                    key,
                    &mut blocks,
                ),
            };
            properties.push((key.clone(), value));
        }

        let mut parameters = Vec::with_capacity(entity.parameters.len());
        for parameter in &entity.parameters {
            let default_value = match &parameter.default_value {
                Some(PropertyValue::Text(text)) => HclValue::literal(text),
                Some(PropertyValue::Sensitive { .. }) => secret_value(
                    options,
                    placement.resource_type,
                    &placement.label,
                    &parameter.name,
                    &mut blocks,
                ),
                None => HclValue::Null,
            };
            let display_settings = parameter
                .display_settings
                .iter()
                .map(|(key, value)| (key.clone(), HclValue::literal(value)))
                .collect();

            parameters.push(HclValue::Map(vec![
                (
                    "id".to_string(),
                    HclValue::optional_literal(parameter.id.as_deref()),
                ),
                ("name".to_string(), HclValue::literal(&parameter.name)),
                (
                    "label".to_string(),
                    HclValue::optional_literal(parameter.label.as_deref()),
                ),
                (
                    "help_text".to_string(),
                    HclValue::optional_literal(parameter.help_text.as_deref()),
                ),
                ("default_value".to_string(), default_value),
                ("display_settings".to_string(), HclValue::Map(display_settings)),
            ]));
        }

        blocks.push(
            HclBlock::resource(placement.resource_type, &placement.label)
                .attr("name", HclValue::literal(&entity.name))
                .attr(
                    "description",
                    HclValue::optional_literal(entity.description.as_deref()),
                )
                .attr("action_type", HclValue::literal(&entity.action_type))
                .attr("step_package_id", HclValue::literal("Octopus.Script"))
                .attr("properties", HclValue::Map(properties))
                .attr("parameters", HclValue::List(parameters)),
        );
        Ok(blocks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_community_templates_are_lookups() {
        let template: StepTemplate = serde_json::from_value(serde_json::json!({
            "Id": "ActionTemplates-1",
            "Name": "HTTP - Test URL",
            "ActionType": "Octopus.Script",
            "CommunityActionTemplateId": "CommunityActionTemplates-21"
        }))
        .unwrap();
        assert!(StepTemplateConverter::is_builtin(&template));
        assert_eq!(StepTemplateConverter::attributes(), &["version"]);
    }
}
