//! Resource descriptors

use super::resolve::RenderContext;
use crate::domain::{ResourceKind, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Deferred body renderer, run once every descriptor of the export is registered
pub type RenderFn = Arc<dyn Fn(&RenderContext<'_>) -> Result<String> + Send + Sync>;

/// Registry record for one exported entity
///
/// The `lookup` expression is fixed when the descriptor is built, so dependents can embed it
/// before this entity's body has been rendered.
#[derive(Clone)]
pub struct ResourceDescriptor {
    pub source_id: String,
    pub kind: ResourceKind,
    /// Expression resolving to the entity's id in the generated configuration
    pub lookup: String,
    /// Bare address of the creatable block, for `depends_on`
    pub dependency: Option<String>,
    pub display_name: String,
    /// File the rendered body is written to, relative to the output directory
    pub output_path: Option<PathBuf>,
    pub parent_id: Option<String>,
    /// Secondary id a consumer may know this entity by (e.g. a process's owner id)
    pub alternate_id: Option<String>,
    /// Extra named expressions, e.g. a step template's `version`
    pub attribute_lookups: BTreeMap<String, String>,
    render: RenderFn,
}

impl ResourceDescriptor {
    /// Descriptor with an empty body
    pub fn new(kind: ResourceKind, source_id: impl Into<String>, lookup: impl Into<String>) -> Self {
        let source_id = source_id.into();
        Self {
            display_name: source_id.clone(),
            source_id,
            kind,
            lookup: lookup.into(),
            dependency: None,
            output_path: None,
            parent_id: None,
            alternate_id: None,
            attribute_lookups: BTreeMap::new(),
            render: Arc::new(empty_body),
        }
    }

    pub fn with_dependency(mut self, dependency: Option<String>) -> Self {
        self.dependency = dependency;
        self
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    pub fn with_parent_id(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_alternate_id(mut self, alternate_id: impl Into<String>) -> Self {
        self.alternate_id = Some(alternate_id.into());
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, lookup: impl Into<String>) -> Self {
        self.attribute_lookups.insert(name.into(), lookup.into());
        self
    }

    pub fn with_render<F>(mut self, render: F) -> Self
    where
        F: Fn(&RenderContext<'_>) -> Result<String> + Send + Sync + 'static,
    {
        self.render = Arc::new(render);
        self
    }

    /// Runs the deferred renderer
    pub fn render(&self, ctx: &RenderContext<'_>) -> Result<String> {
        (self.render)(ctx)
    }
}

fn empty_body(_: &RenderContext<'_>) -> Result<String> {
    Ok(String::new())
}

impl fmt::Debug for ResourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceDescriptor")
            .field("source_id", &self.source_id)
            .field("kind", &self.kind)
            .field("lookup", &self.lookup)
            .field("dependency", &self.dependency)
            .field("display_name", &self.display_name)
            .field("output_path", &self.output_path)
            .field("parent_id", &self.parent_id)
            .field("alternate_id", &self.alternate_id)
            .finish_non_exhaustive()
    }
}
