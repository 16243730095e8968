//! Resource kinds
//!
//! A [`ResourceKind`] is the namespace half of a registry key. Each kind maps to a tag
//! string (`"Environments"`, `"DeploymentProcesses/Steps"`, ...), an API collection path on
//! the source platform, and, where the provider offers one, a data source used for lookups.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which kind of process a flattened entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ProcessScope {
    /// A project's deployment process
    Deployment,
    /// A runbook's process
    Runbook,
}

/// Namespace tag for registry entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Environments,
    Feeds,
    Accounts,
    GitCredentials,
    WorkerPools,
    Lifecycles,
    ProjectGroups,
    Projects,
    StepTemplates,
    Runbooks,
    Process(ProcessScope),
    Step(ProcessScope),
    ChildStep(ProcessScope),
    StepsOrder(ProcessScope),
    ChildStepsOrder(ProcessScope),
}

/// Data source used to look an entity up by name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataSource {
    /// Provider data source type, e.g. `octopusdeploy_environments`
    pub data_type: &'static str,
    /// Attribute holding the result list, e.g. `environments`
    pub collection: &'static str,
}

impl ResourceKind {
    /// Kinds that are exported in bulk as top-level entities
    pub const TOP_LEVEL: [ResourceKind; 9] = [
        ResourceKind::Environments,
        ResourceKind::Feeds,
        ResourceKind::Accounts,
        ResourceKind::GitCredentials,
        ResourceKind::WorkerPools,
        ResourceKind::Lifecycles,
        ResourceKind::ProjectGroups,
        ResourceKind::StepTemplates,
        ResourceKind::Projects,
    ];

    /// Tag string used in registry keys and logs
    pub fn as_str(&self) -> &'static str {
        use ProcessScope::{Deployment, Runbook};
        match self {
            ResourceKind::Environments => "Environments",
            ResourceKind::Feeds => "Feeds",
            ResourceKind::Accounts => "Accounts",
            ResourceKind::GitCredentials => "GitCredentials",
            ResourceKind::WorkerPools => "WorkerPools",
            ResourceKind::Lifecycles => "Lifecycles",
            ResourceKind::ProjectGroups => "ProjectGroups",
            ResourceKind::Projects => "Projects",
            ResourceKind::StepTemplates => "ActionTemplates",
            ResourceKind::Runbooks => "Runbooks",
            ResourceKind::Process(Deployment) => "DeploymentProcesses",
            ResourceKind::Process(Runbook) => "RunbookProcesses",
            ResourceKind::Step(Deployment) => "DeploymentProcesses/Steps",
            ResourceKind::Step(Runbook) => "RunbookProcesses/Steps",
            ResourceKind::ChildStep(Deployment) => "DeploymentProcesses/ChildSteps",
            ResourceKind::ChildStep(Runbook) => "RunbookProcesses/ChildSteps",
            ResourceKind::StepsOrder(Deployment) => "DeploymentProcesses/StepsOrder",
            ResourceKind::StepsOrder(Runbook) => "RunbookProcesses/StepsOrder",
            ResourceKind::ChildStepsOrder(Deployment) => "DeploymentProcesses/ChildStepsOrder",
            ResourceKind::ChildStepsOrder(Runbook) => "RunbookProcesses/ChildStepsOrder",
        }
    }

    /// Path segment of the collection on the source platform API
    ///
    /// Flattened process parts have no API collection of their own.
    pub fn api_path(&self) -> Option<&'static str> {
        match self {
            ResourceKind::Environments => Some("environments"),
            ResourceKind::Feeds => Some("feeds"),
            ResourceKind::Accounts => Some("accounts"),
            ResourceKind::GitCredentials => Some("git-credentials"),
            ResourceKind::WorkerPools => Some("workerpools"),
            ResourceKind::Lifecycles => Some("lifecycles"),
            ResourceKind::ProjectGroups => Some("projectgroups"),
            ResourceKind::Projects => Some("projects"),
            ResourceKind::StepTemplates => Some("actiontemplates"),
            ResourceKind::Runbooks => Some("runbooks"),
            ResourceKind::Process(ProcessScope::Deployment) => Some("deploymentprocesses"),
            ResourceKind::Process(ProcessScope::Runbook) => Some("runbookprocesses"),
            _ => None,
        }
    }

    /// Data source used for lookup and stateless exports
    pub fn data_source(&self) -> Option<DataSource> {
        let (data_type, collection) = match self {
            ResourceKind::Environments => ("octopusdeploy_environments", "environments"),
            ResourceKind::Feeds => ("octopusdeploy_feeds", "feeds"),
            ResourceKind::Accounts => ("octopusdeploy_accounts", "accounts"),
            ResourceKind::GitCredentials => ("octopusdeploy_git_credentials", "git_credentials"),
            ResourceKind::WorkerPools => ("octopusdeploy_worker_pools", "worker_pools"),
            ResourceKind::Lifecycles => ("octopusdeploy_lifecycles", "lifecycles"),
            ResourceKind::ProjectGroups => ("octopusdeploy_project_groups", "project_groups"),
            ResourceKind::Projects => ("octopusdeploy_projects", "projects"),
            ResourceKind::StepTemplates => ("octopusdeploy_step_templates", "step_templates"),
            _ => return None,
        };
        Some(DataSource {
            data_type,
            collection,
        })
    }

    /// Process scope of a flattened process part, if any
    pub fn process_scope(&self) -> Option<ProcessScope> {
        match self {
            ResourceKind::Process(scope)
            | ResourceKind::Step(scope)
            | ResourceKind::ChildStep(scope)
            | ResourceKind::StepsOrder(scope)
            | ResourceKind::ChildStepsOrder(scope) => Some(*scope),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', '_'], "");
        let kind = match normalized.as_str() {
            "environments" => ResourceKind::Environments,
            "feeds" => ResourceKind::Feeds,
            "accounts" => ResourceKind::Accounts,
            "gitcredentials" => ResourceKind::GitCredentials,
            "workerpools" => ResourceKind::WorkerPools,
            "lifecycles" => ResourceKind::Lifecycles,
            "projectgroups" => ResourceKind::ProjectGroups,
            "projects" => ResourceKind::Projects,
            "actiontemplates" | "steptemplates" => ResourceKind::StepTemplates,
            "runbooks" => ResourceKind::Runbooks,
            "deploymentprocesses" => ResourceKind::Process(ProcessScope::Deployment),
            "runbookprocesses" => ResourceKind::Process(ProcessScope::Runbook),
            _ => return Err(format!("Unknown resource kind: {s}")),
        };
        Ok(kind)
    }
}
