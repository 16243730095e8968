//! Phase two: resolving references while rendering

use super::descriptor::ResourceDescriptor;
use super::store::Key;
use super::ExportWarning;
use crate::adapters::hcl::{CodeEmitter, HclBlock};
use crate::domain::{OctoformError, ResourceKind, Result};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// Outcome of resolving a reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(String),
    Unresolved { kind: ResourceKind, id: String },
}

impl Resolution {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }

    pub fn resolved(self) -> Option<String> {
        match self {
            Resolution::Resolved(text) => Some(text),
            Resolution::Unresolved { .. } => None,
        }
    }
}

/// Text written in place of a reference that could not be resolved
pub fn unresolved_sentinel(kind: ResourceKind, id: &str) -> String {
    format!("unresolved:{kind}/{id}")
}

/// Immutable snapshot of every registered descriptor
pub struct FrozenRegistry {
    descriptors: Vec<Arc<ResourceDescriptor>>,
    by_key: HashMap<Key, Arc<ResourceDescriptor>>,
    by_alternate: HashMap<Key, Arc<ResourceDescriptor>>,
    skipped: HashSet<Key>,
    warnings: Vec<ExportWarning>,
    unresolved: Mutex<BTreeSet<(ResourceKind, String)>>,
}

impl FrozenRegistry {
    pub(super) fn new(
        descriptors: Vec<Arc<ResourceDescriptor>>,
        skipped: HashSet<Key>,
        warnings: Vec<ExportWarning>,
    ) -> Self {
        let mut by_key = HashMap::with_capacity(descriptors.len());
        let mut by_alternate = HashMap::new();
        for descriptor in &descriptors {
            by_key.insert(
                (descriptor.kind, descriptor.source_id.clone()),
                Arc::clone(descriptor),
            );
            if let Some(alternate) = &descriptor.alternate_id {
                by_alternate
                    .entry((descriptor.kind, alternate.clone()))
                    .or_insert_with(|| Arc::clone(descriptor));
            }
        }

        Self {
            descriptors,
            by_key,
            by_alternate,
            skipped,
            warnings,
            unresolved: Mutex::new(BTreeSet::new()),
        }
    }

    /// Descriptors in registration order
    pub fn descriptors(&self) -> &[Arc<ResourceDescriptor>] {
        &self.descriptors
    }

    pub fn get(&self, kind: ResourceKind, source_id: &str) -> Option<&ResourceDescriptor> {
        self.by_key
            .get(&(kind, source_id.to_string()))
            .map(Arc::as_ref)
    }

    pub fn contains(&self, kind: ResourceKind, source_id: &str) -> bool {
        self.get(kind, source_id).is_some()
    }

    /// Whether the key was visited but deliberately not exported
    pub fn is_skipped(&self, kind: ResourceKind, source_id: &str) -> bool {
        self.skipped.contains(&(kind, source_id.to_string()))
    }

    pub fn warnings(&self) -> &[ExportWarning] {
        &self.warnings
    }

    /// Lookup expression of a registered entity
    pub fn resolve(&self, kind: ResourceKind, source_id: &str) -> Resolution {
        match self.get(kind, source_id) {
            Some(descriptor) => Resolution::Resolved(descriptor.lookup.clone()),
            None => unresolved(kind, source_id),
        }
    }

    /// Named extra expression of a registered entity
    pub fn resolve_attribute(&self, kind: ResourceKind, source_id: &str, name: &str) -> Resolution {
        self.get(kind, source_id)
            .and_then(|d| d.attribute_lookups.get(name).cloned())
            .map_or_else(|| unresolved(kind, source_id), Resolution::Resolved)
    }

    /// Lookup expression of the entity registered with the given alternate id
    pub fn resolve_by_alternate_id(&self, kind: ResourceKind, alternate_id: &str) -> Resolution {
        match self.by_alternate.get(&(kind, alternate_id.to_string())) {
            Some(descriptor) => Resolution::Resolved(descriptor.lookup.clone()),
            None => unresolved(kind, alternate_id),
        }
    }

    /// Bare address of the creatable block, `None` for lookups and unknown keys
    pub fn dependency(&self, kind: ResourceKind, source_id: &str) -> Option<&str> {
        self.get(kind, source_id)
            .and_then(|d| d.dependency.as_deref())
    }

    fn record_unresolved(&self, kind: ResourceKind, id: &str) {
        self.unresolved
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert((kind, id.to_string()));
    }

    /// References that failed to resolve during rendering, sorted
    pub fn unresolved_references(&self) -> Vec<(ResourceKind, String)> {
        self.unresolved
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .cloned()
            .collect()
    }
}

fn unresolved(kind: ResourceKind, id: &str) -> Resolution {
    Resolution::Unresolved {
        kind,
        id: id.to_string(),
    }
}

/// What render functions see
///
/// Wraps the frozen registry with the unresolved-reference policy: in strict mode an
/// unresolved reference is an error, otherwise it is logged, recorded for the summary and
/// replaced by [`unresolved_sentinel`].
pub struct RenderContext<'a> {
    registry: &'a FrozenRegistry,
    emitter: &'a dyn CodeEmitter,
    strict: bool,
}

impl<'a> RenderContext<'a> {
    pub fn new(registry: &'a FrozenRegistry, emitter: &'a dyn CodeEmitter, strict: bool) -> Self {
        Self {
            registry,
            emitter,
            strict,
        }
    }

    pub fn registry(&self) -> &FrozenRegistry {
        self.registry
    }

    fn settle(&self, resolution: Resolution) -> Result<String> {
        match resolution {
            Resolution::Resolved(text) => Ok(text),
            Resolution::Unresolved { kind, id } => {
                self.registry.record_unresolved(kind, &id);
                if self.strict {
                    return Err(OctoformError::UnresolvedReference { kind, id });
                }
                tracing::error!(kind = %kind, id = %id, "Unresolved reference");
                Ok(unresolved_sentinel(kind, &id))
            }
        }
    }

    pub fn resolve(&self, kind: ResourceKind, source_id: &str) -> Result<String> {
        self.settle(self.registry.resolve(kind, source_id))
    }

    /// `None` for a missing or empty id
    pub fn resolve_optional(&self, kind: ResourceKind, source_id: Option<&str>) -> Result<Option<String>> {
        match source_id.filter(|id| !id.is_empty()) {
            Some(id) => self.resolve(kind, id).map(Some),
            None => Ok(None),
        }
    }

    /// Resolves a list field
    ///
    /// Ids that were deliberately skipped (excluded, absent or unsupported) are dropped
    /// from the list; any other unresolved id follows the usual policy.
    pub fn resolve_many<S: AsRef<str>>(&self, kind: ResourceKind, ids: &[S]) -> Result<Vec<String>> {
        let mut resolved = Vec::with_capacity(ids.len());
        for id in ids {
            let id = id.as_ref();
            if self.registry.is_skipped(kind, id) {
                tracing::debug!(kind = %kind, id = %id, "Dropping reference to skipped entity");
                continue;
            }
            resolved.push(self.resolve(kind, id)?);
        }
        Ok(resolved)
    }

    pub fn resolve_attribute(&self, kind: ResourceKind, source_id: &str, name: &str) -> Result<String> {
        self.settle(self.registry.resolve_attribute(kind, source_id, name))
    }

    pub fn resolve_by_alternate_id(&self, kind: ResourceKind, alternate_id: &str) -> Result<String> {
        self.settle(self.registry.resolve_by_alternate_id(kind, alternate_id))
    }

    /// Bare `depends_on` address, `None` when the entity is a lookup or unknown
    pub fn resolve_dependency(&self, kind: ResourceKind, source_id: &str) -> Option<String> {
        self.registry.dependency(kind, source_id).map(str::to_string)
    }

    pub fn emit(&self, block: &HclBlock) -> Result<String> {
        self.emitter.emit(block)
    }

    /// Emits blocks separated by a blank line
    pub fn emit_all(&self, blocks: &[HclBlock]) -> Result<String> {
        let texts = blocks
            .iter()
            .map(|block| self.emitter.emit(block))
            .collect::<Result<Vec<_>>>()?;
        Ok(texts.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::super::{ExportWarning, ResourceRegistry};
    use super::*;
    use crate::adapters::hcl::{HclValue, HclWriter};

    fn registry() -> ResourceRegistry {
        let registry = ResourceRegistry::new();
        registry.register(
            ResourceDescriptor::new(
                ResourceKind::StepTemplates,
                "ActionTemplates-1",
                "${octopusdeploy_step_template.restart.id}",
            )
            .with_dependency(Some("octopusdeploy_step_template.restart".to_string()))
            .with_attribute("version", "${octopusdeploy_step_template.restart.version}"),
        );
        registry.register(
            ResourceDescriptor::new(
                ResourceKind::Process(crate::domain::ProcessScope::Deployment),
                "deploymentprocess-Projects-1",
                "${octopusdeploy_process.web.id}",
            )
            .with_alternate_id("Projects-1"),
        );
        registry
            .claim(ResourceKind::Environments, "Environments-9")
            .unwrap()
            .skip();
        registry
    }

    #[test]
    fn test_resolution_variants() {
        let frozen = registry().freeze();
        assert_eq!(
            frozen.resolve(ResourceKind::StepTemplates, "ActionTemplates-1"),
            Resolution::Resolved("${octopusdeploy_step_template.restart.id}".to_string())
        );
        assert_eq!(
            frozen.resolve(ResourceKind::StepTemplates, "ActionTemplates-2"),
            Resolution::Unresolved {
                kind: ResourceKind::StepTemplates,
                id: "ActionTemplates-2".to_string()
            }
        );
    }

    #[test]
    fn test_attribute_alternate_and_dependency() {
        let frozen = registry().freeze();
        assert_eq!(
            frozen
                .resolve_attribute(ResourceKind::StepTemplates, "ActionTemplates-1", "version")
                .resolved()
                .unwrap(),
            "${octopusdeploy_step_template.restart.version}"
        );
        assert!(!frozen
            .resolve_attribute(ResourceKind::StepTemplates, "ActionTemplates-1", "name")
            .is_resolved());
        assert_eq!(
            frozen
                .resolve_by_alternate_id(
                    ResourceKind::Process(crate::domain::ProcessScope::Deployment),
                    "Projects-1"
                )
                .resolved()
                .unwrap(),
            "${octopusdeploy_process.web.id}"
        );
        assert_eq!(
            frozen.dependency(ResourceKind::StepTemplates, "ActionTemplates-1"),
            Some("octopusdeploy_step_template.restart")
        );
    }

    #[test]
    fn test_lenient_context_writes_sentinel_and_records() {
        let frozen = registry().freeze();
        let writer = HclWriter::new();
        let ctx = RenderContext::new(&frozen, &writer, false);

        let text = ctx.resolve(ResourceKind::Feeds, "Feeds-4").unwrap();
        assert_eq!(text, "unresolved:Feeds/Feeds-4");
        assert_eq!(
            frozen.unresolved_references(),
            vec![(ResourceKind::Feeds, "Feeds-4".to_string())]
        );
    }

    #[test]
    fn test_strict_context_fails() {
        let frozen = registry().freeze();
        let writer = HclWriter::new();
        let ctx = RenderContext::new(&frozen, &writer, true);

        let err = ctx.resolve(ResourceKind::Feeds, "Feeds-4").unwrap_err();
        assert!(matches!(err, OctoformError::UnresolvedReference { .. }));
    }

    #[test]
    fn test_resolve_many_drops_skipped_ids() {
        let frozen = registry().freeze();
        let writer = HclWriter::new();
        let ctx = RenderContext::new(&frozen, &writer, true);

        let refs = ctx
            .resolve_many(ResourceKind::Environments, &["Environments-9"])
            .unwrap();
        assert!(refs.is_empty());
        assert!(frozen.unresolved_references().is_empty());
    }

    #[test]
    fn test_resolve_optional_empty_is_none() {
        let frozen = registry().freeze();
        let writer = HclWriter::new();
        let ctx = RenderContext::new(&frozen, &writer, true);

        assert_eq!(ctx.resolve_optional(ResourceKind::WorkerPools, None).unwrap(), None);
        assert_eq!(ctx.resolve_optional(ResourceKind::WorkerPools, Some("")).unwrap(), None);
    }

    #[test]
    fn test_render_embeds_lookup_of_other_descriptor() {
        let registry = registry();
        registry.register(
            ResourceDescriptor::new(ResourceKind::Projects, "Projects-1", "${octopusdeploy_project.web.id}")
                .with_render(|ctx| {
                    let block = crate::adapters::hcl::HclBlock::output("template").attr(
                        "value",
                        HclValue::template(ctx.resolve(ResourceKind::StepTemplates, "ActionTemplates-1")?),
                    );
                    ctx.emit(&block)
                }),
        );
        registry.warn(ExportWarning::Excluded {
            kind: ResourceKind::Environments,
            id: "Environments-9".to_string(),
            name: "Sandbox".to_string(),
        });

        let frozen = registry.freeze();
        let writer = HclWriter::new();
        let ctx = RenderContext::new(&frozen, &writer, true);
        let project = frozen.get(ResourceKind::Projects, "Projects-1").unwrap();

        let text = project.render(&ctx).unwrap();
        assert!(text.contains("value = \"${octopusdeploy_step_template.restart.id}\""));
        assert_eq!(frozen.warnings().len(), 1);
    }
}
