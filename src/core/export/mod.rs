//! Export orchestration
//!
//! This module provides the top-level export logic for Octoform, including:
//! - Export coordination and orchestration
//! - Buffered output files
//! - Summary and reporting

pub mod coordinator;
pub mod summary;
pub mod writer;

pub use coordinator::{ExportCoordinator, ExportTarget};
pub use summary::ExportSummary;
pub use writer::RenderedFiles;
