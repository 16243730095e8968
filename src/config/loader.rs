//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::OctoformConfig;
use crate::config::secret_string;
use crate::domain::errors::OctoformError;
use crate::domain::result::Result;
use crate::domain::ExportMode;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into OctoformConfig
/// 4. Applies environment variable overrides (OCTOFORM_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - A referenced environment variable is not set
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use octoform::config::loader::load_config;
///
/// let config = load_config("octoform.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<OctoformConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(OctoformError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        OctoformError::Configuration(format!(
            "Failed to read configuration file {}: {e}",
            path.display()
        ))
    })?;

    parse_config(&contents)
}

/// Parses configuration text, applying substitution, overrides and validation
pub fn parse_config(contents: &str) -> Result<OctoformConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: OctoformConfig = toml::from_str(&contents)
        .map_err(|e| OctoformError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        OctoformError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left untouched. Every missing variable is reported at once.
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| OctoformError::Other(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let processed = re.replace_all(line, |caps: &regex::Captures| {
            let var_name = &caps[1];
            match std::env::var(var_name) {
                Ok(value) => value,
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                    caps[0].to_string()
                }
            }
        });
        result.push_str(&processed);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(OctoformError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    value.trim().parse().map_err(|_| {
        OctoformError::Configuration(format!("{name} must be true or false, got '{value}'"))
    })
}

fn parse_number<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        OctoformError::Configuration(format!("{name} must be a number, got '{value}'"))
    })
}

fn parse_mode(name: &str, value: &str) -> Result<ExportMode> {
    ExportMode::from_str(value).map_err(|e| OctoformError::Configuration(format!("{name}: {e}")))
}

/// Applies environment variable overrides using OCTOFORM_* prefix
///
/// Environment variables follow the pattern: OCTOFORM_<SECTION>_<KEY>
/// For example: OCTOFORM_SOURCE_API_KEY, OCTOFORM_EXPORT_MODE
fn apply_env_overrides(config: &mut OctoformConfig) -> Result<()> {
    let var = |name: &str| std::env::var(name).ok();

    // Application overrides
    if let Some(val) = var("OCTOFORM_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Source overrides
    if let Some(val) = var("OCTOFORM_SOURCE_BASE_URL") {
        config.source.base_url = val;
    }
    if let Some(val) = var("OCTOFORM_SOURCE_API_KEY") {
        config.source.api_key = secret_string(val);
    }
    if let Some(val) = var("OCTOFORM_SOURCE_SPACE_ID") {
        config.source.space_id = val;
    }
    if let Some(val) = var("OCTOFORM_SOURCE_TIMEOUT_SECONDS") {
        config.source.timeout_seconds = parse_number("OCTOFORM_SOURCE_TIMEOUT_SECONDS", &val)?;
    }
    if let Some(val) = var("OCTOFORM_SOURCE_PAGE_SIZE") {
        config.source.page_size = parse_number("OCTOFORM_SOURCE_PAGE_SIZE", &val)?;
    }
    if let Some(val) = var("OCTOFORM_SOURCE_TLS_VERIFY") {
        config.source.tls_verify = parse_bool("OCTOFORM_SOURCE_TLS_VERIFY", &val)?;
    }

    // Export overrides
    if let Some(val) = var("OCTOFORM_EXPORT_OUTPUT_DIR") {
        config.export.output_dir = val;
    }
    if let Some(val) = var("OCTOFORM_EXPORT_MODE") {
        config.export.mode = parse_mode("OCTOFORM_EXPORT_MODE", &val)?;
    }
    if let Some(val) = var("OCTOFORM_EXPORT_DEPENDENCY_MODE") {
        config.export.dependency_mode = parse_mode("OCTOFORM_EXPORT_DEPENDENCY_MODE", &val)?;
    }
    if let Some(val) = var("OCTOFORM_EXPORT_DUMMY_SECRETS") {
        config.export.dummy_secrets = parse_bool("OCTOFORM_EXPORT_DUMMY_SECRETS", &val)?;
    }
    if let Some(val) = var("OCTOFORM_EXPORT_MAX_PROPERTY_LENGTH") {
        config.export.max_property_length =
            Some(parse_number("OCTOFORM_EXPORT_MAX_PROPERTY_LENGTH", &val)?);
    }
    if let Some(val) = var("OCTOFORM_EXPORT_RESOURCE_LIMIT") {
        config.export.resource_limit = Some(parse_number("OCTOFORM_EXPORT_RESOURCE_LIMIT", &val)?);
    }
    if let Some(val) = var("OCTOFORM_EXPORT_DETACH_STEP_TEMPLATES") {
        config.export.detach_step_templates =
            parse_bool("OCTOFORM_EXPORT_DETACH_STEP_TEMPLATES", &val)?;
    }
    if let Some(val) = var("OCTOFORM_EXPORT_STRICT_REFERENCES") {
        config.export.strict_references = parse_bool("OCTOFORM_EXPORT_STRICT_REFERENCES", &val)?;
    }

    // Logging overrides
    if let Some(val) = var("OCTOFORM_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = parse_bool("OCTOFORM_LOGGING_LOCAL_ENABLED", &val)?;
    }
    if let Some(val) = var("OCTOFORM_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }

    Ok(())
}
