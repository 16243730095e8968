//! Logging and observability
//!
//! This module provides structured logging with support for:
//! - Human-readable console output on stderr
//! - Configurable log levels, overridable with `RUST_LOG`
//! - JSON file logging with rotation
//!
//! # Example
//!
//! ```no_run
//! use octoform::logging::init_logging;
//! use octoform::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

pub use structured::{init_logging, parse_log_level, LoggingGuard};

/// Log the start of an export run
///
/// # Example
///
/// ```no_run
/// use octoform::log_export_start;
///
/// log_export_start!("Spaces-1", "create");
/// ```
#[macro_export]
macro_rules! log_export_start {
    ($space_id:expr, $mode:expr) => {
        tracing::info!(
            space_id = %$space_id,
            mode = %$mode,
            "Starting export"
        );
    };
}

/// Log a resource that was registered with the registry
///
/// # Example
///
/// ```no_run
/// use octoform::domain::{ExportMode, ResourceKind};
/// use octoform::log_registered;
///
/// log_registered!(ResourceKind::Environments, "Environments-1", ExportMode::Create);
/// ```
#[macro_export]
macro_rules! log_registered {
    ($kind:expr, $id:expr, $mode:expr) => {
        tracing::debug!(
            kind = %$kind,
            id = %$id,
            mode = %$mode,
            "Registered resource"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use octoform::log_error_with_context;
/// use octoform::domain::OctoformError;
///
/// let error = OctoformError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}

/// Log a page fetched from a paged collection
///
/// # Example
///
/// ```no_run
/// use octoform::log_page_fetched;
///
/// log_page_fetched!("projects", 100, 250);
/// ```
#[macro_export]
macro_rules! log_page_fetched {
    ($collection:expr, $fetched:expr, $total:expr) => {
        tracing::debug!(
            collection = %$collection,
            fetched = $fetched,
            total = $total,
            progress_pct = ($fetched as f64 / ($total as f64).max(1.0) * 100.0),
            "Fetched page"
        );
    };
}
