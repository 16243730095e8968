//! Configuration schema types
//!
//! This module defines the configuration structure for Octoform.

use crate::config::SecretString;
use crate::domain::{ExportMode, ResourceKind};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Main Octoform configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OctoformConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Source platform connection
    pub source: SourceConfig,

    /// Export settings
    #[serde(default)]
    pub export: ExportConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl OctoformConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.source.validate()?;
        self.export.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Source platform configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Server URL, e.g. `https://deploy.example.com`
    pub base_url: String,

    /// API key sent as `X-Octopus-ApiKey`
    /// Stored securely in memory and automatically zeroized on drop
    pub api_key: SecretString,

    /// Space to export
    #[serde(default = "default_space_id")]
    pub space_id: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Items requested per collection page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Verify TLS certificates
    #[serde(default = "default_true")]
    pub tls_verify: bool,
}

impl SourceConfig {
    fn validate(&self) -> Result<(), String> {
        use secrecy::ExposeSecret;

        if self.base_url.is_empty() {
            return Err("source.base_url cannot be empty".to_string());
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err("source.base_url must start with http:// or https://".to_string());
        }

        if self.api_key.expose_secret().is_empty() {
            return Err("source.api_key cannot be empty".to_string());
        }

        if self.space_id.trim().is_empty() {
            return Err("source.space_id cannot be empty".to_string());
        }

        if self.timeout_seconds == 0 {
            return Err("source.timeout_seconds must be > 0".to_string());
        }

        if self.page_size == 0 || self.page_size > 1000 {
            return Err("source.page_size must be between 1 and 1000".to_string());
        }

        Ok(())
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            api_key: crate::config::secret_string(String::new()),
            space_id: default_space_id(),
            timeout_seconds: default_timeout_seconds(),
            page_size: default_page_size(),
            tls_verify: true,
        }
    }
}

/// Exclusion rule for one resource kind
///
/// An entity is excluded when its name is listed in `names`, matches any of `regex`, or
/// `all` is set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExclusionRule {
    /// Exact names to exclude
    #[serde(default)]
    pub names: Vec<String>,

    /// Name patterns to exclude
    #[serde(default)]
    pub regex: Vec<String>,

    /// Exclude every entity of the kind
    #[serde(default)]
    pub all: bool,
}

/// Export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Directory the configuration files are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Mode for explicitly requested projects (create, lookup, stateless)
    #[serde(default)]
    pub mode: ExportMode,

    /// Mode for the dependencies of explicitly requested projects
    #[serde(default)]
    pub dependency_mode: ExportMode,

    /// Write a placeholder value instead of a sensitive variable for secrets
    #[serde(default)]
    pub dummy_secrets: bool,

    /// Truncate step property values longer than this many characters
    #[serde(default)]
    pub max_property_length: Option<usize>,

    /// Stop exporting a kind in bulk after this many entities
    #[serde(default)]
    pub resource_limit: Option<usize>,

    /// Export template-linked steps as plain steps
    #[serde(default)]
    pub detach_step_templates: bool,

    /// Fail the run on references that cannot be resolved
    #[serde(default)]
    pub strict_references: bool,

    /// Version constraint written to `required_providers`
    #[serde(default = "default_provider_version")]
    pub provider_version: String,

    /// Exclusion rules keyed by resource kind (e.g. `Feeds`, `Projects`)
    #[serde(default)]
    pub exclusions: BTreeMap<String, ExclusionRule>,
}

impl ExportConfig {
    fn validate(&self) -> Result<(), String> {
        if self.output_dir.trim().is_empty() {
            return Err("export.output_dir cannot be empty".to_string());
        }

        if self.max_property_length == Some(0) {
            return Err("export.max_property_length must be > 0 when set".to_string());
        }

        if self.resource_limit == Some(0) {
            return Err("export.resource_limit must be > 0 when set".to_string());
        }

        if self.provider_version.trim().is_empty() {
            return Err("export.provider_version cannot be empty".to_string());
        }

        for (kind, rule) in &self.exclusions {
            ResourceKind::from_str(kind)
                .map_err(|e| format!("export.exclusions.{kind}: {e}"))?;
            for pattern in &rule.regex {
                Regex::new(pattern).map_err(|e| {
                    format!("export.exclusions.{kind}: invalid regex '{pattern}': {e}")
                })?;
            }
        }

        Ok(())
    }

    /// Exclusion rules with their kinds parsed
    ///
    /// Keys that do not name a kind are skipped; [`OctoformConfig::validate`] rejects them.
    pub fn exclusion_rules(&self) -> Vec<(ResourceKind, &ExclusionRule)> {
        self.exclusions
            .iter()
            .filter_map(|(kind, rule)| ResourceKind::from_str(kind).ok().map(|k| (k, rule)))
            .collect()
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            mode: ExportMode::Create,
            dependency_mode: ExportMode::Create,
            dummy_secrets: false,
            max_property_length: None,
            resource_limit: None,
            detach_step_templates: false,
            strict_references: false,
            provider_version: default_provider_version(),
            exclusions: BTreeMap::new(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy (daily, hourly, never)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when local logging is enabled".to_string());
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_space_id() -> String {
    "Spaces-1".to_string()
}

fn default_timeout_seconds() -> u64 {
    60
}

fn default_page_size() -> usize {
    100
}

fn default_true() -> bool {
    true
}

fn default_output_dir() -> String {
    "./terraform".to_string()
}

fn default_provider_version() -> String {
    "~> 0.22".to_string()
}

fn default_local_path() -> String {
    "./logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret_string;

    fn source() -> SourceConfig {
        SourceConfig {
            base_url: "https://deploy.example.com".to_string(),
            api_key: secret_string("API-123".to_string()),
            ..SourceConfig::default()
        }
    }

    #[test]
    fn test_application_config_validation() {
        let mut config = ApplicationConfig {
            log_level: "info".to_string(),
        };

        assert!(config.validate().is_ok());

        config.log_level = "invalid".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_source_config_validation() {
        let mut config = source();
        assert!(config.validate().is_ok());

        config.base_url = "deploy.example.com".to_string();
        assert!(config.validate().is_err());

        let mut config = source();
        config.api_key = secret_string(String::new());
        assert!(config.validate().is_err());

        let mut config = source();
        config.page_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_export_config_rejects_unknown_exclusion_kind() {
        let mut config = ExportConfig::default();
        config
            .exclusions
            .insert("Tenants".to_string(), ExclusionRule::default());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_export_config_rejects_bad_exclusion_regex() {
        let mut config = ExportConfig::default();
        config.exclusions.insert(
            "Feeds".to_string(),
            ExclusionRule {
                regex: vec!["(".to_string()],
                ..ExclusionRule::default()
            },
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_exclusion_rules_parse_kinds() {
        let mut config = ExportConfig::default();
        config.exclusions.insert(
            "worker-pools".to_string(),
            ExclusionRule {
                all: true,
                ..ExclusionRule::default()
            },
        );

        let rules = config.exclusion_rules();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].0, ResourceKind::WorkerPools);
        assert!(rules[0].1.all);
    }

    #[test]
    fn test_export_config_zero_limits_rejected() {
        let config = ExportConfig {
            max_property_length: Some(0),
            ..ExportConfig::default()
        };
        assert!(config.validate().is_err());

        let config = ExportConfig {
            resource_limit: Some(0),
            ..ExportConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_logging_config_validation() {
        let mut config = LoggingConfig::default();
        assert!(config.validate().is_ok());

        config.local_rotation = "weekly".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let config: OctoformConfig = toml::from_str(
            r#"
[source]
base_url = "https://deploy.example.com"
api_key = "API-123"
"#,
        )
        .unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(config.source.space_id, "Spaces-1");
        assert_eq!(config.export.mode, ExportMode::Create);
        assert_eq!(config.export.output_dir, "./terraform");
        assert!(!config.logging.local_enabled);
    }

    #[test]
    fn test_export_mode_parses_from_toml() {
        let config: OctoformConfig = toml::from_str(
            r#"
[source]
base_url = "https://deploy.example.com"
api_key = "API-123"

[export]
mode = "stateless"
dependency_mode = "lookup"

[export.exclusions.Feeds]
names = ["Legacy"]
"#,
        )
        .unwrap();

        assert_eq!(config.export.mode, ExportMode::Stateless);
        assert_eq!(config.export.dependency_mode, ExportMode::Lookup);
        assert_eq!(config.export.exclusions["Feeds"].names, vec!["Legacy"]);
    }
}
