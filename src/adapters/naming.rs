//! Name sanitizer
//!
//! Maps display names to identifiers that are valid HCL block labels. Allocations are
//! stable per `(scope, source id)` and unique per scope: a second entity
//! whose name sanitizes to an already-taken identifier gets a numeric suffix.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// Converts arbitrary text to a lowercase identifier
///
/// Runs of characters outside `[a-z0-9]` collapse into one underscore, and a leading digit
/// is prefixed with an underscore.
///
/// # Examples
///
/// ```
/// use octoform::adapters::naming::sanitize_name;
///
/// assert_eq!(sanitize_name("Deploy to IIS (prod)"), "deploy_to_iis_prod");
/// assert_eq!(sanitize_name("2nd step"), "_2nd_step");
/// ```
pub fn sanitize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_separator = false;

    for c in name.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !out.is_empty() {
                out.push('_');
            }
            pending_separator = false;
            out.push(c);
        } else {
            pending_separator = true;
        }
    }

    if out.is_empty() {
        return "unnamed".to_string();
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

#[derive(Default)]
struct Allocations {
    by_source: HashMap<(String, String), String>,
    taken: HashSet<(String, String)>,
}

/// Stable, collision-avoiding identifier allocator shared by all converters of a run
#[derive(Default)]
pub struct NameSanitizer {
    allocations: Mutex<Allocations>,
}

impl NameSanitizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the identifier for an entity, allocating one on first use
    ///
    /// `prefix` is prepended before sanitizing (e.g. `"environment"`), `scope` is the
    /// namespace in which identifiers must be unique (normally the resource kind).
    pub fn allocate(&self, scope: &str, source_id: &str, prefix: &str, display_name: &str) -> String {
        let mut allocations = self
            .allocations
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let source_key = (scope.to_string(), source_id.to_string());
        if let Some(existing) = allocations.by_source.get(&source_key) {
            return existing.clone();
        }

        let base = if prefix.is_empty() {
            sanitize_name(display_name)
        } else {
            sanitize_name(&format!("{prefix} {display_name}"))
        };

        let mut candidate = base.clone();
        let mut suffix = 2;
        while allocations
            .taken
            .contains(&(scope.to_string(), candidate.clone()))
        {
            candidate = format!("{base}_{suffix}");
            suffix += 1;
        }

        allocations
            .taken
            .insert((scope.to_string(), candidate.clone()));
        allocations.by_source.insert(source_key, candidate.clone());
        candidate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("Production", "production")]
    #[test_case("  Dev / Test  ", "dev_test")]
    #[test_case("Deploy.Web-App", "deploy_web_app")]
    #[test_case("123", "_123")]
    #[test_case("!!!", "unnamed")]
    fn test_sanitize_name(input: &str, expected: &str) {
        assert_eq!(sanitize_name(input), expected);
    }

    #[test]
    fn test_allocate_is_stable_per_source() {
        let sanitizer = NameSanitizer::new();
        let first = sanitizer.allocate("octopusdeploy_environment", "Environments-1", "environment", "Prod");
        let second = sanitizer.allocate("octopusdeploy_environment", "Environments-1", "environment", "Prod");
        assert_eq!(first, "environment_prod");
        assert_eq!(first, second);
    }

    #[test]
    fn test_allocate_avoids_collisions() {
        let sanitizer = NameSanitizer::new();
        let a = sanitizer.allocate("t", "Environments-1", "", "Prod");
        let b = sanitizer.allocate("t", "Environments-2", "", "prod");
        let c = sanitizer.allocate("t", "Environments-3", "", "PROD!");
        assert_eq!(a, "prod");
        assert_eq!(b, "prod_2");
        assert_eq!(c, "prod_3");
    }

    #[test]
    fn test_allocate_scopes_are_independent() {
        let sanitizer = NameSanitizer::new();
        let a = sanitizer.allocate("feed", "Feeds-1", "", "main");
        let b = sanitizer.allocate("account", "Accounts-1", "", "main");
        assert_eq!(a, b);
    }
}
