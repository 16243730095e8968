//! Deployment and runbook processes
//!
//! - [`flatten`] reshapes a nested process into step, child step and ordering records
//! - [`properties`] rewrites free-text step properties into safe, cross-referenced HCL

pub mod flatten;
pub mod properties;

pub use flatten::{flatten, DroppedAction, FlatChild, FlatStep, FlattenedProcess, TemplateLink};
pub use properties::{remove_unnecessary, PropertyRewriter, REFERENCE_KINDS};
