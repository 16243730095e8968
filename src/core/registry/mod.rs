//! Resource registry
//!
//! Export runs in two explicit phases:
//!
//! 1. **Registration.** Converters walk the source graph and register one
//!    [`ResourceDescriptor`] per exported entity into a shared [`ResourceRegistry`]. Each
//!    descriptor carries its final lookup expression, so any later descriptor can embed it.
//! 2. **Rendering.** [`ResourceRegistry::freeze`] turns the registry into a
//!    [`FrozenRegistry`], and each descriptor's deferred render function runs against a
//!    [`RenderContext`]. Bodies only depend on other entities' addresses, never on their
//!    rendered text, so render order does not matter.

pub mod descriptor;
pub mod resolve;
pub mod store;

pub use descriptor::{RenderFn, ResourceDescriptor};
pub use resolve::{unresolved_sentinel, FrozenRegistry, RenderContext, Resolution};
pub use store::{Claim, ResourceRegistry};

use crate::domain::ResourceKind;
use serde::Serialize;
use std::fmt;

/// A non-fatal problem met while exporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExportWarning {
    /// An action built on the newer step framework, which cannot be exported
    StepPackageSkipped {
        owner_id: String,
        action_id: String,
        action_name: String,
    },
    /// An entity whose subtype has no mapping
    UnsupportedType {
        kind: ResourceKind,
        id: String,
        type_name: String,
    },
    /// An entity removed by an exclusion rule
    Excluded {
        kind: ResourceKind,
        id: String,
        name: String,
    },
    /// A referenced entity the source does not have
    Missing { kind: ResourceKind, id: String },
}

impl fmt::Display for ExportWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportWarning::StepPackageSkipped {
                owner_id,
                action_id,
                action_name,
            } => write!(
                f,
                "step '{action_name}' ({action_id}) of {owner_id} uses the step package framework and was skipped"
            ),
            ExportWarning::UnsupportedType {
                kind,
                id,
                type_name,
            } => write!(f, "{kind} '{id}' has unsupported type '{type_name}'"),
            ExportWarning::Excluded { kind, id, name } => {
                write!(f, "{kind} '{name}' ({id}) is excluded")
            }
            ExportWarning::Missing { kind, id } => {
                write!(f, "{kind} '{id}' was referenced but does not exist")
            }
        }
    }
}
