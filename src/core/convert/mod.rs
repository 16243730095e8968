//! Converter contract
//!
//! A converter turns one kind of source entity into registered [`ResourceDescriptor`]s. Each
//! capability is a separate trait so callers only depend on what they use:
//!
//! - [`ExportById`]: create the entity and, recursively, what it references
//! - [`ExportLookupById`]: reference an entity that already exists in the target space
//! - [`ExportStateless`]: look up by name and create only when the lookup is empty
//! - [`ExportAll`]: bulk export every entity of the kind
//!
//! [`export_with_mode`] dispatches a dependency export on an [`ExportMode`] value.
//!
//! Top-level kinds share one conversion pipeline, [`EntityConverter`], which implements the
//! per-key state machine `unvisited -> pending -> registered` on top of
//! [`ResourceRegistry::claim`]:
//!
//! 1. claim the key; an already visited key returns immediately
//! 2. fetch the entity; absent entities are skipped with a warning
//! 3. apply exclusions and subtype support
//! 4. export dependencies in the configured dependency mode
//! 5. register a descriptor whose body is rendered later
//! 6. export owned children (processes, runbooks)

macro_rules! entity_exports {
    ($converter:ty, $kind:expr) => {
        impl $crate::core::convert::Converter for $converter {
            fn kind(&self) -> $crate::domain::ResourceKind {
                $kind
            }
        }

        #[async_trait::async_trait]
        impl $crate::core::convert::ExportById for $converter {
            async fn export_by_id(&self, id: &str) -> $crate::domain::Result<()> {
                $crate::core::convert::export_entity(self, id, $crate::domain::ExportMode::Create)
                    .await
            }
        }

        #[async_trait::async_trait]
        impl $crate::core::convert::ExportLookupById for $converter {
            async fn export_lookup_by_id(&self, id: &str) -> $crate::domain::Result<()> {
                $crate::core::convert::export_entity(self, id, $crate::domain::ExportMode::Lookup)
                    .await
            }
        }

        #[async_trait::async_trait]
        impl $crate::core::convert::ExportStateless for $converter {
            async fn export_stateless_by_id(&self, id: &str) -> $crate::domain::Result<()> {
                $crate::core::convert::export_entity(
                    self,
                    id,
                    $crate::domain::ExportMode::Stateless,
                )
                .await
            }
        }

        #[async_trait::async_trait]
        impl $crate::core::convert::ExportAll for $converter {
            async fn export_all(&self) -> $crate::domain::Result<usize> {
                $crate::core::convert::export_all_entities(self).await
            }
        }
    };
}

pub mod account;
pub mod environment;
pub mod feed;
pub mod filter;
pub mod git_credential;
pub mod lifecycle;
pub mod placement;
pub mod process;
pub mod project;
pub mod project_group;
pub mod runbook;
pub mod step_template;
pub mod worker_pool;

pub use filter::ExclusionFilter;
pub use placement::{Address, Placement};

use crate::adapters::hcl::{HclBlock, HclValue};
use crate::adapters::naming::{sanitize_name, NameSanitizer};
use crate::adapters::source::{fetch_all, fetch_typed, SourceClient};
use crate::config::ExportConfig;
use crate::core::registry::{
    Claim, ExportWarning, RenderContext, ResourceDescriptor, ResourceRegistry,
};
use crate::domain::{ExportMode, OctoformError, ProcessScope, ResourceKind, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Placeholder written for secrets when `dummy_secrets` is enabled
pub const DUMMY_SECRET: &str = "Change Me!";

/// Export settings every converter reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    pub dummy_secrets: bool,
    pub max_property_length: Option<usize>,
    pub detach_step_templates: bool,
    pub strict_references: bool,
    /// Mode used for entities reached as a dependency of another one
    pub dependency_mode: ExportMode,
    pub resource_limit: Option<usize>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            dummy_secrets: false,
            max_property_length: None,
            detach_step_templates: false,
            strict_references: false,
            dependency_mode: ExportMode::Create,
            resource_limit: None,
        }
    }
}

impl From<&ExportConfig> for ExportOptions {
    fn from(config: &ExportConfig) -> Self {
        Self {
            dummy_secrets: config.dummy_secrets,
            max_property_length: config.max_property_length,
            detach_step_templates: config.detach_step_templates,
            strict_references: config.strict_references,
            dependency_mode: config.dependency_mode,
            resource_limit: config.resource_limit,
        }
    }
}

/// State shared by every converter of one run
pub struct ExportContext {
    pub client: Arc<dyn SourceClient>,
    pub registry: ResourceRegistry,
    pub names: NameSanitizer,
    pub options: ExportOptions,
    pub exclusions: ExclusionFilter,
}

impl ExportContext {
    pub fn new(
        client: Arc<dyn SourceClient>,
        options: ExportOptions,
        exclusions: ExclusionFilter,
    ) -> Self {
        Self {
            client,
            registry: ResourceRegistry::new(),
            names: NameSanitizer::new(),
            options,
            exclusions,
        }
    }

    /// Block label for an entity, unique per kind
    pub fn label(&self, kind: ResourceKind, source_id: &str, display_name: &str) -> String {
        self.names.allocate(kind.as_str(), source_id, "", display_name)
    }

    /// Block label for an owned record, unique per resource type
    ///
    /// Deployment and runbook processes share resource types, so their labels share a scope.
    pub fn record_label(&self, resource_type: &str, key: &str, display_name: &str) -> String {
        self.names.allocate(resource_type, key, "", display_name)
    }
}

/// Base of every capability trait
pub trait Converter: Send + Sync {
    fn kind(&self) -> ResourceKind;
}

#[async_trait]
pub trait ExportById: Converter {
    async fn export_by_id(&self, id: &str) -> Result<()>;
}

#[async_trait]
pub trait ExportLookupById: Converter {
    async fn export_lookup_by_id(&self, id: &str) -> Result<()>;
}

#[async_trait]
pub trait ExportStateless: Converter {
    async fn export_stateless_by_id(&self, id: &str) -> Result<()>;
}

#[async_trait]
pub trait ExportAll: Converter {
    /// Returns the number of entities this call registered
    async fn export_all(&self) -> Result<usize>;
}

/// Exports one entity in the given mode
///
/// Empty ids and platform variable expressions (`#{...}`) are not entity references and
/// are ignored.
pub async fn export_with_mode<C>(converter: &C, id: &str, mode: ExportMode) -> Result<()>
where
    C: ExportById + ExportLookupById + ExportStateless + ?Sized,
{
    if id.is_empty() || id.contains("#{") {
        return Ok(());
    }
    match mode {
        ExportMode::Create => converter.export_by_id(id).await,
        ExportMode::Lookup => converter.export_lookup_by_id(id).await,
        ExportMode::Stateless => converter.export_stateless_by_id(id).await,
    }
}

/// Conversion pipeline of a top-level kind
#[async_trait]
pub trait EntityConverter: Converter + 'static {
    type Entity: DeserializeOwned + Clone + Send + Sync + 'static;

    fn context(&self) -> &ExportContext;

    fn entity_id(entity: &Self::Entity) -> &str;

    fn entity_name(entity: &Self::Entity) -> &str;

    /// Provider resource type, or `Err(type name)` for an unsupported subtype
    fn resource_type(entity: &Self::Entity) -> std::result::Result<&'static str, String>;

    /// Entities that exist in every space are always looked up
    fn is_builtin(_entity: &Self::Entity) -> bool {
        false
    }

    /// Attributes other than `id` that dependents may reference
    fn attributes() -> &'static [&'static str] {
        &[]
    }

    async fn export_dependencies(&self, _entity: &Self::Entity) -> Result<()> {
        Ok(())
    }

    /// Runs after registration for created and stateless entities
    async fn export_children(&self, _entity: &Self::Entity, _placement: &Placement) -> Result<()> {
        Ok(())
    }

    /// Blocks describing the entity when it is created
    fn resource_blocks(
        entity: &Self::Entity,
        placement: &Placement,
        options: &ExportOptions,
        ctx: &RenderContext<'_>,
    ) -> Result<Vec<HclBlock>>;
}

/// Claims, fetches and converts one entity
pub async fn export_entity<C: EntityConverter>(
    converter: &C,
    id: &str,
    mode: ExportMode,
) -> Result<()> {
    if id.is_empty() {
        return Ok(());
    }
    let ctx = converter.context();
    let kind = converter.kind();
    let Some(claim) = ctx.registry.claim(kind, id) else {
        return Ok(());
    };

    match fetch_typed::<C::Entity>(ctx.client.as_ref(), kind, id).await? {
        Some(entity) => convert_claimed(converter, claim, entity, mode)
            .await
            .map(|_| ()),
        None => {
            ctx.registry.warn(ExportWarning::Missing {
                kind,
                id: id.to_string(),
            });
            claim.skip();
            Ok(())
        }
    }
}

/// Bulk export of a kind in create mode
pub async fn export_all_entities<C: EntityConverter>(converter: &C) -> Result<usize> {
    let ctx = converter.context();
    let kind = converter.kind();
    let entities: Vec<C::Entity> = fetch_all(ctx.client.as_ref(), kind).await?;
    let limit = ctx.options.resource_limit.unwrap_or(usize::MAX);

    tracing::info!(kind = %kind, count = entities.len(), "Exporting collection");

    let mut exported = 0;
    for entity in entities {
        if exported >= limit {
            tracing::info!(kind = %kind, limit = limit, "Resource limit reached");
            break;
        }
        let Some(claim) = ctx.registry.claim(kind, C::entity_id(&entity)) else {
            continue;
        };
        if convert_claimed(converter, claim, entity, ExportMode::Create).await? {
            exported += 1;
        }
    }
    Ok(exported)
}

/// Converts an entity whose key is already claimed
///
/// Returns `false` when the entity was skipped.
async fn convert_claimed<C: EntityConverter>(
    converter: &C,
    claim: Claim<'_>,
    entity: C::Entity,
    mode: ExportMode,
) -> Result<bool> {
    let ctx = converter.context();
    let kind = converter.kind();
    let id = C::entity_id(&entity).to_string();
    let name = C::entity_name(&entity).to_string();

    if ctx.exclusions.is_excluded(kind, &name) {
        ctx.registry.warn(ExportWarning::Excluded { kind, id, name });
        claim.skip();
        return Ok(false);
    }

    let resource_type = match C::resource_type(&entity) {
        Ok(resource_type) => resource_type,
        Err(type_name) => {
            ctx.registry.warn(ExportWarning::UnsupportedType {
                kind,
                id,
                type_name,
            });
            claim.skip();
            return Ok(false);
        }
    };

    let builtin = C::is_builtin(&entity);
    let mode = if builtin { ExportMode::Lookup } else { mode };
    let data_source = kind
        .data_source()
        .ok_or_else(|| OctoformError::Registry(format!("{kind} has no data source")))?;

    // built-ins exist in every target space together with what they reference
    if !builtin {
        converter.export_dependencies(&entity).await?;
    }

    let placement = Placement::new(mode, resource_type, data_source, ctx.label(kind, &id, &name));
    let mut descriptor = ResourceDescriptor::new(kind, &id, placement.lookup())
        .with_dependency(placement.dependency())
        .with_display_name(&name)
        .with_output_path(placement.output_path());
    for attribute in C::attributes() {
        descriptor = descriptor.with_attribute(*attribute, placement.attribute(attribute));
    }

    let options = ctx.options.clone();
    let render_placement = placement.clone();
    let render_entity = entity.clone();
    descriptor = descriptor.with_render(move |rctx| {
        let blocks = match render_placement.mode {
            ExportMode::Lookup => Vec::new(),
            ExportMode::Create | ExportMode::Stateless => {
                C::resource_blocks(&render_entity, &render_placement, &options, rctx)?
            }
        };
        rctx.emit_all(&render_placement.finish(&name, blocks))
    });

    claim.register(descriptor)?;
    crate::log_registered!(kind, id, mode);

    if mode != ExportMode::Lookup {
        converter.export_children(&entity, &placement).await?;
    }
    Ok(true)
}

/// Value for a write-only secret field
///
/// Unless dummy secrets are enabled, a sensitive `variable` block is pushed onto `blocks`
/// and the returned value references it.
pub fn secret_value(
    options: &ExportOptions,
    resource_type: &str,
    label: &str,
    field: &str,
    blocks: &mut Vec<HclBlock>,
) -> HclValue {
    if options.dummy_secrets {
        return HclValue::literal(DUMMY_SECRET);
    }

    let name = format!("{resource_type}_{label}_{}", sanitize_name(field));
    blocks.push(
        HclBlock::variable(&name)
            .attr("type", HclValue::expression("string"))
            .attr("nullable", HclValue::Bool(false))
            .attr("sensitive", HclValue::Bool(true))
            .attr(
                "description",
                HclValue::literal(format!("The secret {field} of {label}")),
            ),
    );
    HclValue::template(format!("${{var.{name}}}"))
}

/// Every converter of a run, wired along the acyclic kind graph
pub struct ConverterSet {
    pub environments: Arc<environment::EnvironmentConverter>,
    pub feeds: Arc<feed::FeedConverter>,
    pub accounts: Arc<account::AccountConverter>,
    pub git_credentials: Arc<git_credential::GitCredentialConverter>,
    pub worker_pools: Arc<worker_pool::WorkerPoolConverter>,
    pub lifecycles: Arc<lifecycle::LifecycleConverter>,
    pub project_groups: Arc<project_group::ProjectGroupConverter>,
    pub step_templates: Arc<step_template::StepTemplateConverter>,
    pub projects: Arc<project::ProjectConverter>,
}

impl ConverterSet {
    pub fn new(ctx: Arc<ExportContext>) -> Result<Self> {
        let environments = Arc::new(environment::EnvironmentConverter::new(ctx.clone()));
        let feeds = Arc::new(feed::FeedConverter::new(ctx.clone()));
        let accounts = Arc::new(account::AccountConverter::new(
            ctx.clone(),
            environments.clone(),
        ));
        let git_credentials = Arc::new(git_credential::GitCredentialConverter::new(ctx.clone()));
        let worker_pools = Arc::new(worker_pool::WorkerPoolConverter::new(ctx.clone()));
        let lifecycles = Arc::new(lifecycle::LifecycleConverter::new(
            ctx.clone(),
            environments.clone(),
        ));
        let project_groups = Arc::new(project_group::ProjectGroupConverter::new(ctx.clone()));
        let step_templates = Arc::new(step_template::StepTemplateConverter::new(ctx.clone()));

        let process_dependencies = process::ProcessDependencies {
            environments: environments.clone(),
            feeds: feeds.clone(),
            accounts: accounts.clone(),
            git_credentials: git_credentials.clone(),
            worker_pools: worker_pools.clone(),
            step_templates: step_templates.clone(),
        };
        let deployment_processes = Arc::new(process::ProcessConverter::new(
            ctx.clone(),
            ProcessScope::Deployment,
            process_dependencies.clone(),
        )?);
        let runbook_processes = Arc::new(process::ProcessConverter::new(
            ctx.clone(),
            ProcessScope::Runbook,
            process_dependencies,
        )?);
        let runbooks = Arc::new(runbook::RunbookConverter::new(
            ctx.clone(),
            environments.clone(),
            runbook_processes,
        ));
        let projects = Arc::new(project::ProjectConverter::new(
            ctx,
            project_groups.clone(),
            lifecycles.clone(),
            deployment_processes,
            runbooks,
        ));

        Ok(Self {
            environments,
            feeds,
            accounts,
            git_credentials,
            worker_pools,
            lifecycles,
            project_groups,
            step_templates,
            projects,
        })
    }

    /// Bulk exporters, one per top-level kind
    pub fn bulk(&self) -> Vec<Arc<dyn ExportAll>> {
        vec![
            self.environments.clone(),
            self.feeds.clone(),
            self.accounts.clone(),
            self.git_credentials.clone(),
            self.worker_pools.clone(),
            self.lifecycles.clone(),
            self.project_groups.clone(),
            self.step_templates.clone(),
            self.projects.clone(),
        ]
    }
}
