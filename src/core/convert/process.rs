//! Process converter
//!
//! Exports a deployment or runbook process as the flattened records the provider expects.
//! Every record of one process shares the process's output file. Records are keyed by
//! correlation keys (`owner/process/action`), never by position, so ordering resources
//! reference steps through the registry like any other entity.

use super::account::AccountConverter;
use super::environment::EnvironmentConverter;
use super::feed::FeedConverter;
use super::git_credential::GitCredentialConverter;
use super::step_template::StepTemplateConverter;
use super::worker_pool::WorkerPoolConverter;
use super::{export_with_mode, secret_value, Address, Converter, ExportContext, ExportOptions};
use crate::adapters::hcl::{HclBlock, HclValue};
use crate::adapters::source::fetch_typed;
use crate::core::process::{
    flatten, remove_unnecessary, FlatChild, FlatStep, FlattenedProcess, PropertyRewriter,
    TemplateLink,
};
use crate::core::registry::{Claim, ExportWarning, RenderContext, ResourceDescriptor};
use crate::domain::{
    Action, ExportMode, PackageReference, Process, ProcessScope, PropertyBag, PropertyValue,
    ResourceKind, Result,
};
use std::sync::Arc;

const PROCESS: &str = "octopusdeploy_process";
const STEP: &str = "octopusdeploy_process_step";
const TEMPLATED_STEP: &str = "octopusdeploy_process_templated_step";
const CHILD_STEP: &str = "octopusdeploy_process_child_step";
const TEMPLATED_CHILD_STEP: &str = "octopusdeploy_process_templated_child_step";
const CHILD_STEPS_ORDER: &str = "octopusdeploy_process_child_steps_order";
const STEPS_ORDER: &str = "octopusdeploy_process_steps_order";

/// Converters a process may reference
#[derive(Clone)]
pub struct ProcessDependencies {
    pub environments: Arc<EnvironmentConverter>,
    pub feeds: Arc<FeedConverter>,
    pub accounts: Arc<AccountConverter>,
    pub git_credentials: Arc<GitCredentialConverter>,
    pub worker_pools: Arc<WorkerPoolConverter>,
    pub step_templates: Arc<StepTemplateConverter>,
}

/// The project or runbook a process belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOwner {
    /// [`ResourceKind::Projects`] or [`ResourceKind::Runbooks`]
    pub kind: ResourceKind,
    pub id: String,
    /// Owner's block label, used as the prefix of every record label
    pub label: String,
    /// Owner's `count` expression when it is exported statelessly
    pub count: Option<String>,
}

pub struct ProcessConverter {
    ctx: Arc<ExportContext>,
    scope: ProcessScope,
    rewriter: Arc<PropertyRewriter>,
    dependencies: ProcessDependencies,
}

impl Converter for ProcessConverter {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Process(self.scope)
    }
}

impl ProcessConverter {
    pub fn new(
        ctx: Arc<ExportContext>,
        scope: ProcessScope,
        dependencies: ProcessDependencies,
    ) -> Result<Self> {
        let rewriter = Arc::new(PropertyRewriter::new(ctx.options.max_property_length)?);
        Ok(Self {
            ctx,
            scope,
            rewriter,
            dependencies,
        })
    }

    /// Claims, fetches, flattens and registers a process
    pub async fn export_process(&self, owner: &ProcessOwner, process_id: &str) -> Result<()> {
        if process_id.is_empty() {
            return Ok(());
        }
        let kind = self.kind();
        let Some(claim) = self.ctx.registry.claim(kind, process_id) else {
            return Ok(());
        };

        let Some(process) =
            fetch_typed::<Process>(self.ctx.client.as_ref(), kind, process_id).await?
        else {
            self.ctx.registry.warn(ExportWarning::Missing {
                kind,
                id: process_id.to_string(),
            });
            claim.skip();
            return Ok(());
        };

        let flat = flatten(&owner.id, &process, self.ctx.options.detach_step_templates);
        for dropped in &flat.dropped {
            self.ctx.registry.warn(ExportWarning::StepPackageSkipped {
                owner_id: owner.id.clone(),
                action_id: dropped.action_id.clone(),
                action_name: dropped.action_name.clone(),
            });
        }

        self.export_dependencies(&flat).await?;
        self.register_records(claim, owner, &process, flat)?;

        tracing::debug!(kind = %kind, id = %process_id, owner = %owner.id, "Registered process");
        Ok(())
    }

    async fn export_dependencies(&self, flat: &FlattenedProcess) -> Result<()> {
        let mode = self.ctx.options.dependency_mode;
        let deps = &self.dependencies;

        for action in flat.actions() {
            for environment in action
                .environments
                .iter()
                .chain(&action.excluded_environments)
            {
                export_with_mode(deps.environments.as_ref(), environment, mode).await?;
            }
            if let Some(pool) = action.worker_pool_id.as_deref() {
                export_with_mode(deps.worker_pools.as_ref(), pool, mode).await?;
            }
            for package in &action.packages {
                export_with_mode(deps.feeds.as_ref(), &package.feed_id, mode).await?;
            }
            self.export_property_references(&action.properties, mode)
                .await?;
        }
        for step in &flat.steps {
            self.export_property_references(&step.step.properties, mode)
                .await?;
        }
        for link in flat.templates() {
            export_with_mode(deps.step_templates.as_ref(), &link.template_id, mode).await?;
        }
        Ok(())
    }

    async fn export_property_references(&self, properties: &PropertyBag, mode: ExportMode) -> Result<()> {
        let deps = &self.dependencies;
        for value in properties.values().filter_map(PropertyValue::as_text) {
            for (kind, id) in self.rewriter.find_references(value) {
                match kind {
                    ResourceKind::Feeds => {
                        export_with_mode(deps.feeds.as_ref(), &id, mode).await?
                    }
                    ResourceKind::Accounts => {
                        export_with_mode(deps.accounts.as_ref(), &id, mode).await?
                    }
                    ResourceKind::GitCredentials => {
                        export_with_mode(deps.git_credentials.as_ref(), &id, mode).await?
                    }
                    ResourceKind::WorkerPools => {
                        export_with_mode(deps.worker_pools.as_ref(), &id, mode).await?
                    }
                    ResourceKind::Environments => {
                        export_with_mode(deps.environments.as_ref(), &id, mode).await?
                    }
                    ResourceKind::StepTemplates => {
                        export_with_mode(deps.step_templates.as_ref(), &id, mode).await?
                    }
                    // projects are only substituted when something else exported them
                    _ => {}
                }
            }
        }
        Ok(())
    }

    fn register_records(
        &self,
        claim: Claim<'_>,
        owner: &ProcessOwner,
        process: &Process,
        flat: FlattenedProcess,
    ) -> Result<()> {
        let ctx = &self.ctx;
        let scope = self.scope;
        let rendering = Arc::new(StepRendering {
            scope,
            rewriter: self.rewriter.clone(),
            options: ctx.options.clone(),
        });

        let process_kind = ResourceKind::Process(scope);
        let process_address = Address::new(
            PROCESS,
            ctx.record_label(PROCESS, &process.id, &owner.label),
            owner.count.clone(),
        );
        let output_path = process_address.output_path();
        let describe = |kind: ResourceKind, key: &str, name: &str, address: &Address| {
            ResourceDescriptor::new(kind, key, address.lookup())
                .with_dependency(Some(address.dependency()))
                .with_display_name(name)
                .with_output_path(output_path.clone())
                .with_parent_id(&process.id)
        };

        {
            let address = process_address.clone();
            let owner = owner.clone();
            let project_id = process.project_id.clone();
            claim.register(
                describe(process_kind, &process.id, &owner.label, &process_address)
                    .with_alternate_id(&owner.id)
                    .with_render(move |rctx| {
                        let mut block = HclBlock::resource(address.resource_type, &address.label)
                            .attr(
                                "project_id",
                                HclValue::template(rctx.resolve(ResourceKind::Projects, &project_id)?),
                            );
                        if owner.kind == ResourceKind::Runbooks {
                            block.set(
                                "runbook_id",
                                HclValue::template(rctx.resolve(ResourceKind::Runbooks, &owner.id)?),
                            );
                        }
                        rctx.emit_all(&address.finish(vec![block]))
                    }),
            )?;
        }

        let mut child_orders = Vec::new();
        for step in &flat.steps {
            let step_kind = ResourceKind::Step(scope);
            let step_type = if step.template.is_some() {
                TEMPLATED_STEP
            } else {
                STEP
            };
            let address = Address::new(
                step_type,
                ctx.record_label(step_type, &step.key, &format!("{} {}", owner.label, step.step.name)),
                owner.count.clone(),
            );
            let descriptor = describe(step_kind, &step.key, &step.step.name, &address);
            let render_step = step.clone();
            let process_id = process.id.clone();
            let renderer = rendering.clone();
            ctx.registry.register(descriptor.with_render(move |rctx| {
                renderer.render_step(&address, &process_id, &render_step, rctx)
            }));

            for child in &step.children {
                let child_kind = ResourceKind::ChildStep(scope);
                let child_type = if child.template.is_some() {
                    TEMPLATED_CHILD_STEP
                } else {
                    CHILD_STEP
                };
                let address = Address::new(
                    child_type,
                    ctx.record_label(
                        child_type,
                        &child.key,
                        &format!("{} {}", owner.label, child.action.name),
                    ),
                    owner.count.clone(),
                );
                let descriptor = describe(child_kind, &child.key, &child.action.name, &address);
                let render_child = child.clone();
                let parent_key = step.key.clone();
                let process_id = process.id.clone();
                let renderer = rendering.clone();
                ctx.registry.register(descriptor.with_render(move |rctx| {
                    renderer.render_child(&address, &process_id, &parent_key, &render_child, rctx)
                }));
            }

            if let Some(order_key) = &step.children_order_key {
                let order_kind = ResourceKind::ChildStepsOrder(scope);
                let address = Address::new(
                    CHILD_STEPS_ORDER,
                    ctx.record_label(
                        CHILD_STEPS_ORDER,
                        order_key,
                        &format!("{} {}", owner.label, step.step.name),
                    ),
                    owner.count.clone(),
                );
                let descriptor = describe(order_kind, order_key, &step.step.name, &address);
                let children: Vec<String> = step.children.iter().map(|c| c.key.clone()).collect();
                let parent_key = step.key.clone();
                let process_id = process.id.clone();
                ctx.registry.register(descriptor.with_render(move |rctx| {
                    let block = HclBlock::resource(address.resource_type, &address.label)
                        .attr(
                            "process_id",
                            HclValue::template(rctx.resolve(process_kind, &process_id)?),
                        )
                        .attr(
                            "parent_id",
                            HclValue::template(rctx.resolve(ResourceKind::Step(scope), &parent_key)?),
                        )
                        .attr(
                            "children",
                            HclValue::template_list(
                                rctx.resolve_many(ResourceKind::ChildStep(scope), &children)?,
                            ),
                        );
                    rctx.emit_all(&address.finish(vec![block]))
                }));
                child_orders.push(order_key.clone());
            }
        }

        if flat.steps.is_empty() {
            return Ok(());
        }

        let order_kind = ResourceKind::StepsOrder(scope);
        let address = Address::new(
            STEPS_ORDER,
            ctx.record_label(STEPS_ORDER, &flat.steps_order_key, &owner.label),
            owner.count.clone(),
        );
        let descriptor = describe(order_kind, &flat.steps_order_key, &owner.label, &address);
        let steps: Vec<String> = flat.step_keys().into_iter().map(str::to_string).collect();
        let process_id = process.id.clone();
        ctx.registry.register(descriptor.with_render(move |rctx| {
            let mut block = HclBlock::resource(address.resource_type, &address.label)
                .attr(
                    "process_id",
                    HclValue::template(rctx.resolve(process_kind, &process_id)?),
                )
                .attr(
                    "steps",
                    HclValue::template_list(rctx.resolve_many(ResourceKind::Step(scope), &steps)?),
                );
            let depends_on: Vec<HclValue> = child_orders
                .iter()
                .filter_map(|key| rctx.resolve_dependency(ResourceKind::ChildStepsOrder(scope), key))
                .map(HclValue::expression)
                .collect();
            if !depends_on.is_empty() {
                block.set("depends_on", HclValue::List(depends_on));
            }
            rctx.emit_all(&address.finish(vec![block]))
        }));

        Ok(())
    }
}

/// Render-time settings shared by the step records of one process
struct StepRendering {
    scope: ProcessScope,
    rewriter: Arc<PropertyRewriter>,
    options: ExportOptions,
}

impl StepRendering {
    fn render_step(
        &self,
        address: &Address,
        process_id: &str,
        step: &FlatStep,
        rctx: &RenderContext<'_>,
    ) -> Result<String> {
        let mut blocks = Vec::new();
        let shared = &step.step;
        let block = HclBlock::resource(address.resource_type, &address.label)
            .attr(
                "process_id",
                HclValue::template(rctx.resolve(ResourceKind::Process(self.scope), process_id)?),
            )
            .attr("name", HclValue::literal(&shared.name))
            .attr(
                "condition",
                HclValue::literal(shared.condition.as_deref().unwrap_or("Success")),
            )
            .attr(
                "start_trigger",
                HclValue::literal(
                    shared
                        .start_trigger
                        .as_deref()
                        .unwrap_or("StartAfterPrevious"),
                ),
            )
            .attr(
                "package_requirement",
                HclValue::literal(
                    shared
                        .package_requirement
                        .as_deref()
                        .unwrap_or("LetOctopusDecide"),
                ),
            );

        let mut block = self.apply_action(
            block,
            address,
            &step.primary,
            step.template.as_ref(),
            rctx,
            &mut blocks,
        )?;
        if !shared.properties.is_empty() {
            let properties = self.properties(address, &shared.properties, rctx, &mut blocks);
            block.set("properties", properties);
        }

        blocks.push(block);
        rctx.emit_all(&address.finish(blocks))
    }

    fn render_child(
        &self,
        address: &Address,
        process_id: &str,
        parent_key: &str,
        child: &FlatChild,
        rctx: &RenderContext<'_>,
    ) -> Result<String> {
        let mut blocks = Vec::new();
        let action = &child.action;
        let block = HclBlock::resource(address.resource_type, &address.label)
            .attr(
                "process_id",
                HclValue::template(rctx.resolve(ResourceKind::Process(self.scope), process_id)?),
            )
            .attr(
                "parent_id",
                HclValue::template(rctx.resolve(ResourceKind::Step(self.scope), parent_key)?),
            )
            .attr("name", HclValue::literal(&action.name))
            .attr(
                "condition",
                HclValue::literal(action.condition.as_deref().unwrap_or("Success")),
            );

        let block = self.apply_action(
            block,
            address,
            action,
            child.template.as_ref(),
            rctx,
            &mut blocks,
        )?;
        blocks.push(block);
        rctx.emit_all(&address.finish(blocks))
    }

    /// Fields every step and child step takes from its action
    fn apply_action(
        &self,
        mut block: HclBlock,
        address: &Address,
        action: &Action,
        template: Option<&TemplateLink>,
        rctx: &RenderContext<'_>,
        blocks: &mut Vec<HclBlock>,
    ) -> Result<HclBlock> {
        if template.is_none() {
            block.set("type", HclValue::literal(&action.action_type));
        }
        block.set("is_disabled", HclValue::Bool(action.is_disabled));
        block.set("is_required", HclValue::Bool(action.is_required));
        if let Some(notes) = action.notes.as_deref().filter(|n| !n.is_empty()) {
            block.set("notes", HclValue::literal(notes));
        }

        if let Some(pool) =
            rctx.resolve_optional(ResourceKind::WorkerPools, action.worker_pool_id.as_deref())?
        {
            block.set("worker_pool_id", HclValue::template(pool));
        }
        if let Some(variable) = action.worker_pool_variable.as_deref().filter(|v| !v.is_empty()) {
            block.set("worker_pool_variable", HclValue::literal(variable));
        }
        if !action.environments.is_empty() {
            block.set(
                "environments",
                HclValue::template_list(
                    rctx.resolve_many(ResourceKind::Environments, &action.environments)?,
                ),
            );
        }
        if !action.excluded_environments.is_empty() {
            block.set(
                "excluded_environments",
                HclValue::template_list(
                    rctx.resolve_many(ResourceKind::Environments, &action.excluded_environments)?,
                ),
            );
        }
        if !action.tenant_tags.is_empty() {
            block.set("tenant_tags", HclValue::literal_list(&action.tenant_tags));
        }

        let mut named_packages = Vec::new();
        for package in &action.packages {
            let value = package_value(package, rctx)?;
            if package.is_primary() {
                block.set("primary_package", value);
            } else {
                named_packages.push((package.name.clone().unwrap_or_default(), value));
            }
        }
        if !named_packages.is_empty() {
            block.set("packages", HclValue::Map(named_packages));
        }

        let properties =
            remove_unnecessary(&action.properties, !action.packages.is_empty(), template.is_some());

        let execution = match template {
            Some(link) => {
                block.set(
                    "template_id",
                    HclValue::template(rctx.resolve(ResourceKind::StepTemplates, &link.template_id)?),
                );
                let version = match link.version.as_deref() {
                    // the template is not exported, so pin the version the action was built from
                    Some(version)
                        if !rctx
                            .registry()
                            .contains(ResourceKind::StepTemplates, &link.template_id) =>
                    {
                        HclValue::literal(version)
                    }
                    _ => HclValue::template(rctx.resolve_attribute(
                        ResourceKind::StepTemplates,
                        &link.template_id,
                        "version",
                    )?),
                };
                block.set("template_version", version);

                // template parameters are stored next to the platform's own properties
                let (platform, parameters): (PropertyBag, PropertyBag) = properties
                    .into_iter()
                    .partition(|(key, _)| key.starts_with("Octopus."));
                let parameters = self.properties(address, &parameters, rctx, blocks);
                block.set("parameters", parameters);
                platform
            }
            None => properties,
        };

        let execution = self.properties(address, &execution, rctx, blocks);
        block.set("execution_properties", execution);
        Ok(block)
    }

    fn properties(
        &self,
        address: &Address,
        bag: &PropertyBag,
        rctx: &RenderContext<'_>,
        blocks: &mut Vec<HclBlock>,
    ) -> HclValue {
        let entries = bag
            .iter()
            .map(|(key, value)| {
                let value = match value {
                    PropertyValue::Text(text) => HclValue::template(self.rewriter.rewrite(
                        text,
                        |kind, id| rctx.registry().resolve(kind, id).resolved(),
                    )),
                    PropertyValue::Sensitive { .. } => secret_value(
                        &self.options,
                        address.resource_type,
                        &address.label,
                        key,
                        blocks,
                    ),
                };
                (key.clone(), value)
            })
            .collect();
        HclValue::Map(entries)
    }
}

fn package_value(package: &PackageReference, rctx: &RenderContext<'_>) -> Result<HclValue> {
    let feed_id = if package.feed_id.contains("#{") {
        HclValue::literal(&package.feed_id)
    } else {
        HclValue::template(rctx.resolve(ResourceKind::Feeds, &package.feed_id)?)
    };
    let properties = package
        .properties
        .iter()
        .map(|(key, value)| (key.clone(), HclValue::literal(value)))
        .collect();

    Ok(HclValue::Map(vec![
        ("package_id".to_string(), HclValue::literal(&package.package_id)),
        ("feed_id".to_string(), feed_id),
        (
            "acquisition_location".to_string(),
            HclValue::literal(package.acquisition_location.as_deref().unwrap_or("Server")),
        ),
        ("properties".to_string(), HclValue::Map(properties)),
    ]))
}
