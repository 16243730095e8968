//! Domain models read from the source platform
//!
//! These mirror the JSON documents served by the platform's REST API (PascalCase field
//! names). Only the fields the converters map are modelled; unknown fields are ignored.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Property key linking an action to a reusable step template
pub const TEMPLATE_ID_PROPERTY: &str = "Octopus.Action.Template.Id";

/// Property key carrying the linked step template's version
pub const TEMPLATE_VERSION_PROPERTY: &str = "Octopus.Action.Template.Version";

/// A value in an open property bag
///
/// Plain properties are strings; sensitive properties are served as an object that never
/// carries the secret itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Text(String),
    #[serde(rename_all = "PascalCase")]
    Sensitive {
        #[serde(default)]
        has_value: bool,
        #[serde(default)]
        new_value: Option<String>,
    },
}

impl PropertyValue {
    /// The plain text of the property, if it is not sensitive
    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(text) => Some(text),
            PropertyValue::Sensitive { .. } => None,
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Text(value.to_string())
    }
}

/// Open, string-keyed configuration bag of a step or action
pub type PropertyBag = BTreeMap<String, PropertyValue>;

/// A write-only secret as served by the API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SensitiveValue {
    #[serde(default)]
    pub has_value: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Environment {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default)]
    pub use_guided_failure: bool,
    #[serde(default)]
    pub allow_dynamic_infrastructure: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Feed {
    pub id: String,
    pub name: String,
    pub feed_type: String,
    #[serde(default)]
    pub feed_uri: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<SensitiveValue>,
    #[serde(default)]
    pub package_acquisition_location_options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Account {
    pub id: String,
    pub name: String,
    pub account_type: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub environment_ids: Vec<String>,
    #[serde(default)]
    pub tenanted_deployment_participation: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub access_key: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub subscription_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GitCredentialDetails {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<SensitiveValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GitCredential {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub details: GitCredentialDetails,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WorkerPool {
    pub id: String,
    pub name: String,
    pub worker_pool_type: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default)]
    pub worker_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Phase {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub automatic_deployment_targets: Vec<String>,
    #[serde(default)]
    pub optional_deployment_targets: Vec<String>,
    #[serde(default)]
    pub minimum_environments_before_promotion: i32,
    #[serde(default)]
    pub is_optional_phase: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Lifecycle {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub phases: Vec<Phase>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProjectGroup {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub project_group_id: String,
    pub lifecycle_id: String,
    #[serde(default)]
    pub deployment_process_id: Option<String>,
    #[serde(default)]
    pub is_disabled: bool,
    #[serde(default)]
    pub auto_create_release: bool,
    #[serde(default)]
    pub tenanted_deployment_mode: Option<String>,
    #[serde(default)]
    pub default_guided_failure_mode: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TemplateParameter {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub help_text: Option<String>,
    #[serde(default)]
    pub default_value: Option<PropertyValue>,
    #[serde(default)]
    pub display_settings: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StepTemplate {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub action_type: String,
    #[serde(default)]
    pub version: i32,
    #[serde(default)]
    pub community_action_template_id: Option<String>,
    #[serde(default)]
    pub properties: PropertyBag,
    #[serde(default)]
    pub parameters: Vec<TemplateParameter>,
    #[serde(default)]
    pub packages: Vec<PackageReference>,
}

impl StepTemplate {
    /// Community templates are installed from a shared library and exist by name
    pub fn is_community(&self) -> bool {
        self.community_action_template_id
            .as_deref()
            .is_some_and(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PackageReference {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub package_id: String,
    pub feed_id: String,
    #[serde(default)]
    pub acquisition_location: Option<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl PackageReference {
    /// The primary package of an action has no name
    pub fn is_primary(&self) -> bool {
        self.name.as_deref().map_or(true, str::is_empty)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Action {
    pub id: String,
    pub name: String,
    pub action_type: String,
    #[serde(default)]
    pub is_disabled: bool,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub worker_pool_id: Option<String>,
    #[serde(default)]
    pub worker_pool_variable: Option<String>,
    #[serde(default)]
    pub environments: Vec<String>,
    #[serde(default)]
    pub excluded_environments: Vec<String>,
    #[serde(default)]
    pub tenant_tags: Vec<String>,
    #[serde(default)]
    pub packages: Vec<PackageReference>,
    #[serde(default)]
    pub properties: PropertyBag,
    /// Set for actions using the newer step framework, which is not exportable
    #[serde(default)]
    pub step_package_version: Option<String>,
}

impl Action {
    /// Whether the action uses the newer step framework
    pub fn is_step_package(&self) -> bool {
        self.step_package_version
            .as_deref()
            .is_some_and(|v| !v.trim().is_empty())
    }

    /// Text of a plain property
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(PropertyValue::as_text)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Step {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub start_trigger: Option<String>,
    #[serde(default)]
    pub package_requirement: Option<String>,
    #[serde(default)]
    pub properties: PropertyBag,
    #[serde(default)]
    pub actions: Vec<Action>,
}

/// A deployment process or a runbook process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Process {
    pub id: String,
    pub project_id: String,
    #[serde(default)]
    pub runbook_id: Option<String>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Runbook {
    pub id: String,
    pub name: String,
    pub project_id: String,
    #[serde(default)]
    pub runbook_process_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub environment_scope: Option<String>,
    #[serde(default)]
    pub environments: Vec<String>,
    #[serde(default)]
    pub multi_tenancy_mode: Option<String>,
    #[serde(default)]
    pub default_guided_failure_mode: Option<String>,
}
