//! Exclusion rules

use crate::config::ExportConfig;
use crate::domain::{OctoformError, ResourceKind, Result};
use regex::Regex;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Default)]
struct CompiledRule {
    names: HashSet<String>,
    patterns: Vec<Regex>,
    all: bool,
}

impl CompiledRule {
    fn matches(&self, name: &str) -> bool {
        self.all || self.names.contains(name) || self.patterns.iter().any(|re| re.is_match(name))
    }
}

/// Decides which entities are left out of the export, by kind and name
#[derive(Debug, Default)]
pub struct ExclusionFilter {
    rules: HashMap<ResourceKind, CompiledRule>,
}

impl ExclusionFilter {
    /// A filter that excludes nothing
    pub fn none() -> Self {
        Self::default()
    }

    /// Compiles the `[export.exclusions.<Kind>]` tables
    pub fn from_config(config: &ExportConfig) -> Result<Self> {
        let mut rules = HashMap::new();
        for (kind, rule) in config.exclusion_rules() {
            let patterns = rule
                .regex
                .iter()
                .map(|pattern| {
                    Regex::new(pattern).map_err(|e| {
                        OctoformError::Configuration(format!(
                            "Invalid exclusion regex '{pattern}' for {kind}: {e}"
                        ))
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            rules.insert(
                kind,
                CompiledRule {
                    names: rule.names.iter().cloned().collect(),
                    patterns,
                    all: rule.all,
                },
            );
        }
        Ok(Self { rules })
    }

    pub fn is_excluded(&self, kind: ResourceKind, name: &str) -> bool {
        self.rules.get(&kind).is_some_and(|rule| rule.matches(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExclusionRule;

    fn filter(kind: &str, rule: ExclusionRule) -> ExclusionFilter {
        let mut config = ExportConfig::default();
        config.exclusions.insert(kind.to_string(), rule);
        ExclusionFilter::from_config(&config).unwrap()
    }

    #[test]
    fn test_exact_names() {
        let filter = filter(
            "Feeds",
            ExclusionRule {
                names: vec!["Legacy".to_string()],
                ..ExclusionRule::default()
            },
        );
        assert!(filter.is_excluded(ResourceKind::Feeds, "Legacy"));
        assert!(!filter.is_excluded(ResourceKind::Feeds, "legacy"));
        assert!(!filter.is_excluded(ResourceKind::Accounts, "Legacy"));
    }

    #[test]
    fn test_regex_and_all() {
        let projects = filter(
            "Projects",
            ExclusionRule {
                regex: vec!["^Sandbox".to_string()],
                ..ExclusionRule::default()
            },
        );
        assert!(projects.is_excluded(ResourceKind::Projects, "Sandbox API"));
        assert!(!projects.is_excluded(ResourceKind::Projects, "API Sandbox"));

        let environments = filter(
            "Environments",
            ExclusionRule {
                all: true,
                ..ExclusionRule::default()
            },
        );
        assert!(environments.is_excluded(ResourceKind::Environments, "anything"));
    }

    #[test]
    fn test_none_excludes_nothing() {
        assert!(!ExclusionFilter::none().is_excluded(ResourceKind::Feeds, "x"));
    }
}
