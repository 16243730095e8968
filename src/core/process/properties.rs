//! Property rewriting
//!
//! Step and action properties are free text that may embed ids of other entities, such as
//! a feed id inside a package reference or an account id inside a script parameter. The
//! [`PropertyRewriter`] turns such text into a safe HCL string:
//!
//! 1. optional truncation, keeping any `#{...}` variable references of the original value
//! 2. escaping of `${` and `%{`
//! 3. substitution of registered ids with their lookup expressions
//!
//! Substitution runs per kind in a fixed order, and each id pattern only matches a whole
//! token, so `Feeds-12` never rewrites part of `Feeds-123`.

use crate::adapters::hcl::escape_interpolation;
use crate::domain::models::{TEMPLATE_ID_PROPERTY, TEMPLATE_VERSION_PROPERTY};
use crate::domain::{OctoformError, PropertyBag, ResourceKind, Result};
use regex::{Captures, Regex};

/// Kinds whose ids are substituted, in substitution order
pub const REFERENCE_KINDS: [ResourceKind; 7] = [
    ResourceKind::Feeds,
    ResourceKind::Accounts,
    ResourceKind::GitCredentials,
    ResourceKind::Projects,
    ResourceKind::StepTemplates,
    ResourceKind::WorkerPools,
    ResourceKind::Environments,
];

/// Keys made redundant by a package block
pub const PACKAGE_PROPERTIES: [&str; 2] = [
    "Octopus.Action.Package.PackageId",
    "Octopus.Action.Package.FeedId",
];

const VARIABLE_PATTERN: &str = r"#\{[^}]+\}";

/// Compiled id and variable patterns
#[derive(Debug)]
pub struct PropertyRewriter {
    patterns: Vec<(ResourceKind, Regex)>,
    variable: Regex,
    max_length: Option<usize>,
}

impl PropertyRewriter {
    pub fn new(max_length: Option<usize>) -> Result<Self> {
        let patterns = REFERENCE_KINDS
            .iter()
            .map(|kind| Ok((*kind, compile(&format!(r"\b{}-\d+\b", kind.as_str()))?)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            patterns,
            variable: compile(VARIABLE_PATTERN)?,
            max_length,
        })
    }

    /// Ids of other entities mentioned in a value, in substitution order, without repeats
    pub fn find_references(&self, value: &str) -> Vec<(ResourceKind, String)> {
        let mut found: Vec<(ResourceKind, String)> = Vec::new();
        for (kind, pattern) in &self.patterns {
            for m in pattern.find_iter(value) {
                let reference = (*kind, m.as_str().to_string());
                if !found.contains(&reference) {
                    found.push(reference);
                }
            }
        }
        found
    }

    /// Truncates, escapes and substitutes a value
    ///
    /// `resolve` returns the lookup expression of a registered id; ids it does not know are
    /// left as they are.
    pub fn rewrite<F>(&self, value: &str, resolve: F) -> String
    where
        F: Fn(ResourceKind, &str) -> Option<String>,
    {
        let truncated = self.truncate(value);
        self.substitute(&escape_interpolation(&truncated), resolve)
    }

    /// Cuts the value to the configured length in characters
    ///
    /// An id split by the cut is dropped entirely, so `Feeds-123` never survives as
    /// `Feeds-12`. Variable references found anywhere in the original value are appended
    /// after the cut, separated by spaces.
    pub fn truncate(&self, value: &str) -> String {
        let Some(max_length) = self.max_length else {
            return value.to_string();
        };
        if value.chars().count() <= max_length {
            return value.to_string();
        }

        let cut = value
            .char_indices()
            .nth(max_length)
            .map_or(value.len(), |(index, _)| index);
        let cut = self.partial_id_start(value, cut).unwrap_or(cut);

        let mut truncated = value[..cut].to_string();
        for variable in self.variable.find_iter(value) {
            truncated.push(' ');
            truncated.push_str(variable.as_str());
        }
        truncated
    }

    /// Start of an id that the cut at `cut` would shorten into a different id
    fn partial_id_start(&self, value: &str, cut: usize) -> Option<usize> {
        let continues_token = value[cut..]
            .chars()
            .next()
            .is_some_and(|c| c.is_alphanumeric() || c == '_');
        if !continues_token {
            return None;
        }

        let head = &value[..cut];
        self.patterns
            .iter()
            .filter_map(|(_, pattern)| pattern.find_iter(head).last())
            .filter(|m| m.end() == cut)
            .map(|m| m.start())
            .min()
    }

    /// Replaces whole id tokens with lookup expressions
    pub fn substitute<F>(&self, text: &str, resolve: F) -> String
    where
        F: Fn(ResourceKind, &str) -> Option<String>,
    {
        let mut text = text.to_string();
        for (kind, pattern) in &self.patterns {
            if !pattern.is_match(&text) {
                continue;
            }
            text = pattern
                .replace_all(&text, |caps: &Captures<'_>| {
                    let id = &caps[0];
                    resolve(*kind, id).unwrap_or_else(|| id.to_string())
                })
                .into_owned();
        }
        text
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| OctoformError::Other(format!("Invalid pattern '{pattern}': {e}")))
}

/// Drops keys the provider derives from other attributes
pub fn remove_unnecessary(
    properties: &PropertyBag,
    has_package_block: bool,
    templated: bool,
) -> PropertyBag {
    properties
        .iter()
        .filter(|(key, _)| {
            let key = key.as_str();
            !(has_package_block && PACKAGE_PROPERTIES.contains(&key))
                && !(templated && (key == TEMPLATE_ID_PROPERTY || key == TEMPLATE_VERSION_PROPERTY))
        })
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PropertyValue;

    fn rewriter(max_length: Option<usize>) -> PropertyRewriter {
        PropertyRewriter::new(max_length).unwrap()
    }

    fn registered(kind: ResourceKind, id: &str) -> Option<String> {
        match (kind, id) {
            (ResourceKind::Feeds, "Feeds-12") => Some("${octopusdeploy_nuget_feed.main.id}".to_string()),
            (ResourceKind::Environments, "Environments-1") => {
                Some("${octopusdeploy_environment.production.id}".to_string())
            }
            _ => None,
        }
    }

    #[test]
    fn test_substitution_is_boundary_aware() {
        let text = rewriter(None).substitute("Feeds-12,Feeds-123", registered);
        assert_eq!(text, "${octopusdeploy_nuget_feed.main.id},Feeds-123");
    }

    fn both_feeds(kind: ResourceKind, id: &str) -> Option<String> {
        match (kind, id) {
            (ResourceKind::Feeds, "Feeds-12") => Some("${octopusdeploy_nuget_feed.f12.id}".to_string()),
            (ResourceKind::Feeds, "Feeds-123") => Some("${octopusdeploy_nuget_feed.f123.id}".to_string()),
            _ => None,
        }
    }

    #[test]
    fn test_similar_ids_are_substituted_independently() {
        let text = rewriter(None).substitute("use Feeds-12 and Feeds-123", both_feeds);
        assert_eq!(
            text,
            "use ${octopusdeploy_nuget_feed.f12.id} and ${octopusdeploy_nuget_feed.f123.id}"
        );
    }

    #[test]
    fn test_truncation_never_shortens_an_id_into_another() {
        let text = rewriter(Some(12)).rewrite("pkg Feeds-123 rest", both_feeds);
        assert_eq!(text, "pkg ");
        assert!(!text.contains("f12"));
    }

    #[test]
    fn test_truncation_keeps_an_id_ending_at_the_cut() {
        let text = rewriter(Some(12)).rewrite("pkg Feeds-12 rest", both_feeds);
        assert_eq!(text, "pkg ${octopusdeploy_nuget_feed.f12.id}");
    }

    #[test]
    fn test_truncation_drops_split_id_before_variables() {
        let text = rewriter(Some(14)).truncate("run Feeds-12345 #{Tag}");
        assert_eq!(text, "run  #{Tag}");
    }

    #[test]
    fn test_unregistered_ids_are_kept() {
        let text = rewriter(None).substitute("Accounts-7 and Environments-1", registered);
        assert_eq!(
            text,
            "Accounts-7 and ${octopusdeploy_environment.production.id}"
        );
    }

    #[test]
    fn test_rewrite_escapes_before_substituting() {
        let text = rewriter(None).rewrite("echo ${HOME} %{x} Feeds-12", registered);
        assert_eq!(
            text,
            "echo $${HOME} %%{x} ${octopusdeploy_nuget_feed.main.id}"
        );
    }

    #[test]
    fn test_truncation_keeps_variables() {
        let text = rewriter(Some(10)).truncate("a very long literal #{MyVar} and #{Other}");
        assert_eq!(text, "a very lon #{MyVar} #{Other}");
    }

    #[test]
    fn test_truncation_counts_characters() {
        let text = rewriter(Some(3)).truncate("ééééé");
        assert_eq!(text, "ééé");
        assert_eq!(rewriter(Some(10)).truncate("short"), "short");
    }

    #[test]
    fn test_find_references() {
        let found = rewriter(None).find_references(
            "Environments-1 Feeds-2 Feeds-2 ActionTemplates-4 xFeeds-3",
        );
        assert_eq!(
            found,
            vec![
                (ResourceKind::Feeds, "Feeds-2".to_string()),
                (ResourceKind::StepTemplates, "ActionTemplates-4".to_string()),
                (ResourceKind::Environments, "Environments-1".to_string()),
            ]
        );
    }

    #[test]
    fn test_remove_unnecessary() {
        let mut bag = PropertyBag::new();
        bag.insert("Octopus.Action.Package.PackageId".to_string(), PropertyValue::from("app"));
        bag.insert("Octopus.Action.Package.FeedId".to_string(), PropertyValue::from("Feeds-1"));
        bag.insert(TEMPLATE_ID_PROPERTY.to_string(), PropertyValue::from("ActionTemplates-1"));
        bag.insert("Octopus.Action.Script.ScriptBody".to_string(), PropertyValue::from("echo"));

        let kept = remove_unnecessary(&bag, true, true);
        assert_eq!(kept.len(), 1);
        assert!(kept.contains_key("Octopus.Action.Script.ScriptBody"));

        assert_eq!(remove_unnecessary(&bag, false, false).len(), 4);
    }
}
