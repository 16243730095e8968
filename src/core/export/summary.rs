//! Export summary and reporting
//!
//! This module defines the structure reported at the end of a run.

use crate::core::registry::{ExportWarning, FrozenRegistry};
use crate::domain::ResourceKind;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Summary of an export operation
#[derive(Debug, Clone, Default)]
pub struct ExportSummary {
    /// Registered descriptors per kind tag
    pub registered: BTreeMap<String, usize>,

    /// Files written (or that would be written on a dry run), relative to the output directory
    pub files: Vec<PathBuf>,

    /// Non-fatal problems met while exporting
    pub warnings: Vec<ExportWarning>,

    /// References that rendered as a sentinel
    pub unresolved: Vec<(ResourceKind, String)>,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// Duration of the export
    pub duration: Duration,

    /// Nothing was written
    pub dry_run: bool,

    /// A shutdown signal stopped the run before anything was written
    pub interrupted: bool,
}

impl ExportSummary {
    /// Create a new empty export summary
    pub fn new() -> Self {
        Self::default()
    }

    /// Summary of an interrupted run
    pub fn interrupted() -> Self {
        Self {
            interrupted: true,
            ..Self::default()
        }
    }

    /// Collects counts, warnings and unresolved references after rendering
    pub fn from_registry(registry: &FrozenRegistry) -> Self {
        let mut registered = BTreeMap::new();
        for descriptor in registry.descriptors() {
            *registered
                .entry(descriptor.kind.as_str().to_string())
                .or_insert(0) += 1;
        }

        Self {
            registered,
            warnings: registry.warnings().to_vec(),
            unresolved: registry.unresolved_references(),
            ..Self::default()
        }
    }

    /// Set the start time and the duration measured from it
    pub fn with_timing(mut self, started_at: DateTime<Utc>, duration: Duration) -> Self {
        self.started_at = started_at;
        self.duration = duration;
        self
    }

    /// Total number of registered descriptors
    pub fn total_registered(&self) -> usize {
        self.registered.values().sum()
    }

    /// Whether every reference resolved
    pub fn is_successful(&self) -> bool {
        !self.interrupted && self.unresolved.is_empty()
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            registered = self.total_registered(),
            files = self.files.len(),
            warnings = self.warnings.len(),
            unresolved = self.unresolved.len(),
            dry_run = self.dry_run,
            started_at = %self.started_at.to_rfc3339(),
            duration_secs = self.duration.as_secs(),
            "Export completed"
        );

        for (kind, count) in &self.registered {
            tracing::debug!(kind = %kind, count = count, "Registered resources");
        }

        if !self.unresolved.is_empty() {
            tracing::warn!(
                count = self.unresolved.len(),
                "Export completed with unresolved references"
            );
            for (kind, id) in &self.unresolved {
                tracing::warn!(kind = %kind, id = %id, "Unresolved reference");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::registry::{ResourceDescriptor, ResourceRegistry};

    #[test]
    fn test_export_summary_creation() {
        let summary = ExportSummary::new();

        assert_eq!(summary.total_registered(), 0);
        assert!(summary.files.is_empty());
        assert!(summary.warnings.is_empty());
        assert_eq!(summary.duration, Duration::from_secs(0));
        assert!(summary.is_successful());
    }

    #[test]
    fn test_export_summary_with_timing() {
        let started_at = Utc::now();
        let summary = ExportSummary::new().with_timing(started_at, Duration::from_secs(120));

        assert_eq!(summary.started_at, started_at);
        assert_eq!(summary.duration, Duration::from_secs(120));
    }

    #[test]
    fn test_interrupted_is_not_successful() {
        assert!(!ExportSummary::interrupted().is_successful());
    }

    #[test]
    fn test_from_registry_counts_per_kind() {
        let registry = ResourceRegistry::new();
        for id in ["Environments-1", "Environments-2"] {
            registry.register(ResourceDescriptor::new(ResourceKind::Environments, id, "x"));
        }
        registry.register(ResourceDescriptor::new(ResourceKind::Feeds, "Feeds-1", "y"));
        registry.warn(ExportWarning::Missing {
            kind: ResourceKind::Accounts,
            id: "Accounts-1".to_string(),
        });

        let summary = ExportSummary::from_registry(&registry.freeze());
        assert_eq!(summary.registered["Environments"], 2);
        assert_eq!(summary.registered["Feeds"], 1);
        assert_eq!(summary.total_registered(), 3);
        assert_eq!(summary.warnings.len(), 1);
    }
}
