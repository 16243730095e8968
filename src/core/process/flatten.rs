//! Process flattening
//!
//! The platform nests actions inside steps; the provider models every action as its own
//! resource with explicit ordering records. [`flatten`] produces that shape:
//!
//! - a step with one action becomes one step entry carrying the action's fields
//! - a step with several actions becomes a step entry (the step's shared fields plus its
//!   first action), one child step per remaining action, and a child steps order listing
//!   the children
//! - one steps order lists every retained top-level step
//!
//! Source order is preserved verbatim.

use crate::domain::models::{TEMPLATE_ID_PROPERTY, TEMPLATE_VERSION_PROPERTY};
use crate::domain::{Action, Process, Step};

/// Link from an action to the step template it was created from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateLink {
    pub template_id: String,
    pub version: Option<String>,
}

impl TemplateLink {
    fn of(action: &Action) -> Option<Self> {
        let template_id = action.property(TEMPLATE_ID_PROPERTY)?.trim();
        if template_id.is_empty() {
            return None;
        }
        Some(Self {
            template_id: template_id.to_string(),
            version: action
                .property(TEMPLATE_VERSION_PROPERTY)
                .map(str::to_string),
        })
    }
}

/// An action rendered as a child of a multi-action step
#[derive(Debug, Clone, PartialEq)]
pub struct FlatChild {
    pub key: String,
    pub action: Action,
    pub template: Option<TemplateLink>,
}

/// A top-level step entry
#[derive(Debug, Clone, PartialEq)]
pub struct FlatStep {
    pub key: String,
    /// The step's shared fields; `actions` is emptied
    pub step: Step,
    /// The action whose fields the step entry carries
    pub primary: Action,
    pub template: Option<TemplateLink>,
    pub children: Vec<FlatChild>,
    /// Set when the step has children
    pub children_order_key: Option<String>,
}

/// An action left out of the export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedAction {
    pub step_name: String,
    pub action_id: String,
    pub action_name: String,
}

/// Output of [`flatten`]
#[derive(Debug, Clone, PartialEq)]
pub struct FlattenedProcess {
    pub steps: Vec<FlatStep>,
    pub steps_order_key: String,
    pub dropped: Vec<DroppedAction>,
}

impl FlattenedProcess {
    /// Every retained action, step entries first within each step
    pub fn actions(&self) -> impl Iterator<Item = &Action> {
        self.steps.iter().flat_map(|step| {
            std::iter::once(&step.primary).chain(step.children.iter().map(|child| &child.action))
        })
    }

    /// Every template link, in source order
    pub fn templates(&self) -> impl Iterator<Item = &TemplateLink> {
        self.steps.iter().flat_map(|step| {
            step.template
                .iter()
                .chain(step.children.iter().filter_map(|child| child.template.as_ref()))
        })
    }

    pub fn step_keys(&self) -> Vec<&str> {
        self.steps.iter().map(|step| step.key.as_str()).collect()
    }
}

/// Flattens a process owned by `owner_id`
///
/// Correlation keys are `owner/process/action`, falling back to the step id when an action
/// has no id. Actions on the newer step framework are dropped, and a step left with no
/// action is dropped from the steps order. With `detach_templates`, template-linked actions
/// are exported as plain steps.
pub fn flatten(owner_id: &str, process: &Process, detach_templates: bool) -> FlattenedProcess {
    let prefix = format!("{owner_id}/{}", process.id);
    let template_of = |action: &Action| {
        if detach_templates {
            None
        } else {
            TemplateLink::of(action)
        }
    };

    let mut steps = Vec::with_capacity(process.steps.len());
    let mut dropped = Vec::new();

    for step in &process.steps {
        let mut actions = Vec::with_capacity(step.actions.len());
        for action in &step.actions {
            if action.is_step_package() {
                dropped.push(DroppedAction {
                    step_name: step.name.clone(),
                    action_id: action.id.clone(),
                    action_name: action.name.clone(),
                });
            } else {
                actions.push(action.clone());
            }
        }

        let mut actions = actions.into_iter();
        let Some(primary) = actions.next() else {
            tracing::debug!(step = %step.name, "Dropping step with no exportable action");
            continue;
        };

        let key = action_key(&prefix, &primary, &step.id);
        let children: Vec<FlatChild> = actions
            .enumerate()
            .map(|(index, action)| FlatChild {
                key: if action.id.is_empty() {
                    format!("{prefix}/{}/{}", step.id, index + 1)
                } else {
                    format!("{prefix}/{}", action.id)
                },
                template: template_of(&action),
                action,
            })
            .collect();
        let children_order_key = (!children.is_empty()).then(|| format!("{prefix}/{}", step.id));

        steps.push(FlatStep {
            key,
            step: Step {
                actions: Vec::new(),
                ..step.clone()
            },
            template: template_of(&primary),
            primary,
            children,
            children_order_key,
        });
    }

    FlattenedProcess {
        steps,
        steps_order_key: prefix,
        dropped,
    }
}

fn action_key(prefix: &str, action: &Action, step_id: &str) -> String {
    if action.id.is_empty() {
        format!("{prefix}/{step_id}")
    } else {
        format!("{prefix}/{}", action.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn process(steps: serde_json::Value) -> Process {
        serde_json::from_value(json!({
            "Id": "deploymentprocess-Projects-1",
            "ProjectId": "Projects-1",
            "Steps": steps
        }))
        .unwrap()
    }

    fn action(id: &str, name: &str) -> serde_json::Value {
        json!({"Id": id, "Name": name, "ActionType": "Octopus.Script"})
    }

    #[test]
    fn test_single_action_step() {
        let flat = flatten(
            "Projects-1",
            &process(json!([{"Id": "s1", "Name": "Run", "Actions": [action("a1", "Run")]}])),
            false,
        );

        assert_eq!(flat.steps.len(), 1);
        assert_eq!(flat.steps[0].key, "Projects-1/deploymentprocess-Projects-1/a1");
        assert!(flat.steps[0].children.is_empty());
        assert!(flat.steps[0].children_order_key.is_none());
        assert_eq!(flat.steps_order_key, "Projects-1/deploymentprocess-Projects-1");
    }

    #[test]
    fn test_multi_action_step_becomes_children() {
        let flat = flatten(
            "Projects-1",
            &process(json!([{
                "Id": "s1",
                "Name": "Deploy",
                "Actions": [action("a1", "First"), action("a2", "Second"), action("a3", "Third")]
            }])),
            false,
        );

        let step = &flat.steps[0];
        assert_eq!(step.primary.name, "First");
        assert!(step.step.actions.is_empty());
        let child_names: Vec<_> = step.children.iter().map(|c| c.action.name.as_str()).collect();
        assert_eq!(child_names, ["Second", "Third"]);
        assert_eq!(
            step.children_order_key.as_deref(),
            Some("Projects-1/deploymentprocess-Projects-1/s1")
        );
    }

    #[test]
    fn test_empty_action_id_falls_back_to_step_id() {
        let flat = flatten(
            "Projects-1",
            &process(json!([{"Id": "s9", "Name": "Run", "Actions": [action("", "Run")]}])),
            false,
        );
        assert_eq!(flat.steps[0].key, "Projects-1/deploymentprocess-Projects-1/s9");
    }

    #[test]
    fn test_step_package_actions_are_dropped() {
        let flat = flatten(
            "Projects-1",
            &process(json!([
                {"Id": "s1", "Name": "Modern", "Actions": [{
                    "Id": "a1", "Name": "Modern", "ActionType": "Octopus.AzureWebApp",
                    "StepPackageVersion": "1.0.0"
                }]},
                {"Id": "s2", "Name": "Classic", "Actions": [action("a2", "Classic")]}
            ])),
            false,
        );

        assert_eq!(flat.step_keys(), ["Projects-1/deploymentprocess-Projects-1/a2"]);
        assert_eq!(flat.dropped.len(), 1);
        assert_eq!(flat.dropped[0].action_id, "a1");
    }

    fn step_package(id: &str, name: &str) -> serde_json::Value {
        json!({
            "Id": id, "Name": name, "ActionType": "Octopus.AzureWebApp",
            "StepPackageVersion": "1.0.0"
        })
    }

    #[test]
    fn test_dropped_middle_step_leaves_neighbours_in_order() {
        let flat = flatten(
            "Projects-1",
            &process(json!([
                {"Id": "s1", "Name": "First", "Actions": [action("a1", "First")]},
                {"Id": "s2", "Name": "Modern", "Actions": [step_package("a2", "Modern")]},
                {"Id": "s3", "Name": "Last", "Actions": [action("a3", "Last")]}
            ])),
            false,
        );

        assert_eq!(
            flat.step_keys(),
            [
                "Projects-1/deploymentprocess-Projects-1/a1",
                "Projects-1/deploymentprocess-Projects-1/a3",
            ]
        );
        assert_eq!(flat.dropped.len(), 1);
        assert_eq!(flat.dropped[0].step_name, "Modern");
    }

    #[test]
    fn test_dropped_first_action_promotes_the_next() {
        let flat = flatten(
            "Projects-1",
            &process(json!([{
                "Id": "s1",
                "Name": "Deploy",
                "Actions": [step_package("a1", "Modern"), action("a2", "Second"), action("a3", "Third")]
            }])),
            false,
        );

        let step = &flat.steps[0];
        assert_eq!(step.key, "Projects-1/deploymentprocess-Projects-1/a2");
        assert_eq!(step.primary.name, "Second");
        let child_keys: Vec<_> = step.children.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(child_keys, ["Projects-1/deploymentprocess-Projects-1/a3"]);
        assert_eq!(flat.dropped[0].action_id, "a1");
    }

    #[test]
    fn test_template_links_respect_detach() {
        let steps = json!([{"Id": "s1", "Name": "Tpl", "Actions": [{
            "Id": "a1", "Name": "Tpl", "ActionType": "Octopus.Script",
            "Properties": {
                "Octopus.Action.Template.Id": "ActionTemplates-1",
                "Octopus.Action.Template.Version": "3"
            }
        }]}]);

        let linked = flatten("Projects-1", &process(steps.clone()), false);
        assert_eq!(
            linked.steps[0].template,
            Some(TemplateLink {
                template_id: "ActionTemplates-1".to_string(),
                version: Some("3".to_string()),
            })
        );
        assert_eq!(linked.templates().count(), 1);

        let detached = flatten("Projects-1", &process(steps), true);
        assert!(detached.steps[0].template.is_none());
    }

    #[test]
    fn test_actions_iterates_in_source_order() {
        let flat = flatten(
            "Projects-1",
            &process(json!([
                {"Id": "s1", "Name": "A", "Actions": [action("a1", "A1"), action("a2", "A2")]},
                {"Id": "s2", "Name": "B", "Actions": [action("b1", "B1")]}
            ])),
            false,
        );
        let ids: Vec<_> = flat.actions().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, ["a1", "a2", "b1"]);
    }
}
