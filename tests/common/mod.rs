//! Shared fixtures for integration tests

#![allow(dead_code)]

use octoform::adapters::source::SnapshotSourceClient;
use octoform::config::OctoformConfig;
use octoform::core::export::{ExportCoordinator, ExportSummary, ExportTarget};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;

/// A small space: two projects sharing environments, a feed referenced from script text,
/// a templated step, a multi-action step, a step package action and a runbook
pub fn space() -> Value {
    json!({
        "Environments": [
            {"Id": "Environments-1", "Name": "Development", "SortOrder": 1},
            {"Id": "Environments-2", "Name": "Production", "SortOrder": 2, "UseGuidedFailure": true}
        ],
        "Feeds": [
            {"Id": "Feeds-1", "Name": "Built-In", "FeedType": "BuiltIn"},
            {
                "Id": "Feeds-2",
                "Name": "NuGet Public",
                "FeedType": "NuGet",
                "FeedUri": "https://api.nuget.org/v3/index.json",
                "Username": "deployer",
                "Password": {"HasValue": true}
            },
            {"Id": "Feeds-20", "Name": "Charts", "FeedType": "Helm", "FeedUri": "https://charts.example.com"},
            {"Id": "Feeds-3", "Name": "Generic", "FeedType": "ArtifactoryGeneric"}
        ],
        "Accounts": [
            {
                "Id": "Accounts-1",
                "Name": "Azure Prod",
                "AccountType": "AzureServicePrincipal",
                "EnvironmentIds": ["Environments-2"],
                "ClientId": "client",
                "TenantId": "tenant",
                "SubscriptionNumber": "subscription"
            }
        ],
        "GitCredentials": [
            {"Id": "GitCredentials-1", "Name": "GitHub", "Details": {"Username": "bot", "Password": {"HasValue": true}}}
        ],
        "WorkerPools": [
            {"Id": "WorkerPools-1", "Name": "Default Worker Pool", "WorkerPoolType": "StaticWorkerPool", "IsDefault": true},
            {"Id": "WorkerPools-2", "Name": "Hosted Ubuntu", "WorkerPoolType": "DynamicWorkerPool", "WorkerType": "Ubuntu2204"}
        ],
        "Lifecycles": [
            {"Id": "Lifecycles-1", "Name": "Default Lifecycle"},
            {
                "Id": "Lifecycles-2",
                "Name": "Release",
                "Phases": [
                    {"Name": "Dev", "AutomaticDeploymentTargets": ["Environments-1"]},
                    {"Name": "Prod", "OptionalDeploymentTargets": ["Environments-2"]}
                ]
            }
        ],
        "ProjectGroups": [
            {"Id": "ProjectGroups-1", "Name": "Default Project Group"},
            {"Id": "ProjectGroups-2", "Name": "Web"}
        ],
        "ActionTemplates": [
            {
                "Id": "ActionTemplates-1",
                "Name": "Notify Slack",
                "ActionType": "Octopus.Script",
                "Version": 3,
                "Properties": {"Octopus.Action.Script.ScriptBody": "curl $HookUrl"},
                "Parameters": [{"Name": "Channel", "Label": "Channel"}]
            }
        ],
        "Projects": [
            {
                "Id": "Projects-1",
                "Name": "Web App",
                "ProjectGroupId": "ProjectGroups-2",
                "LifecycleId": "Lifecycles-2",
                "DeploymentProcessId": "deploymentprocess-Projects-1"
            },
            {
                "Id": "Projects-2",
                "Name": "Api",
                "ProjectGroupId": "ProjectGroups-1",
                "LifecycleId": "Lifecycles-1",
                "DeploymentProcessId": "deploymentprocess-Projects-2"
            }
        ],
        "DeploymentProcesses": [
            {
                "Id": "deploymentprocess-Projects-1",
                "ProjectId": "Projects-1",
                "Steps": [
                    {
                        "Id": "Steps-1",
                        "Name": "Deploy Package",
                        "Actions": [{
                            "Id": "Actions-1",
                            "Name": "Deploy Package",
                            "ActionType": "Octopus.TentaclePackage",
                            "Environments": ["Environments-2"],
                            "WorkerPoolId": "WorkerPools-1",
                            "Packages": [{"PackageId": "webapp", "FeedId": "Feeds-2"}],
                            "Properties": {
                                "Octopus.Action.Package.PackageId": "webapp",
                                "Octopus.Action.Script.ScriptBody": "deploy --feed Feeds-2 --charts Feeds-20 --account Accounts-1 --env #{Octopus.Environment.Name}"
                            }
                        }]
                    },
                    {
                        "Id": "Steps-2",
                        "Name": "Verify",
                        "Actions": [
                            {
                                "Id": "Actions-2",
                                "Name": "Smoke Test",
                                "ActionType": "Octopus.Script",
                                "Properties": {"Octopus.Action.Script.ScriptBody": "curl https://web.example.com"}
                            },
                            {
                                "Id": "Actions-3",
                                "Name": "Notify",
                                "ActionType": "Octopus.Script",
                                "Properties": {
                                    "Octopus.Action.Template.Id": "ActionTemplates-1",
                                    "Octopus.Action.Template.Version": "3",
                                    "Channel": "#deploys"
                                }
                            },
                            {
                                "Id": "Actions-4",
                                "Name": "Cleanup",
                                "ActionType": "Octopus.Script",
                                "Properties": {"Octopus.Action.Script.ScriptBody": "rm -rf tmp"}
                            }
                        ]
                    },
                    {
                        "Id": "Steps-3",
                        "Name": "New Framework",
                        "Actions": [{
                            "Id": "Actions-5",
                            "Name": "Kubernetes Deploy",
                            "ActionType": "Octopus.KubernetesDeployRawYaml",
                            "StepPackageVersion": "1.0.0"
                        }]
                    }
                ]
            },
            {
                "Id": "deploymentprocess-Projects-2",
                "ProjectId": "Projects-2",
                "Steps": [{
                    "Id": "Steps-10",
                    "Name": "Run Script",
                    "Actions": [{
                        "Id": "Actions-10",
                        "Name": "Run Script",
                        "ActionType": "Octopus.Script",
                        "WorkerPoolId": "WorkerPools-2",
                        "Properties": {
                            "Octopus.Action.Script.ScriptBody": "echo deployed after Projects-1 with GitCredentials-1"
                        }
                    }]
                }]
            }
        ],
        "Runbooks": [
            {
                "Id": "Runbooks-1",
                "Name": "Restart",
                "ProjectId": "Projects-1",
                "RunbookProcessId": "RunbookProcess-Runbooks-1",
                "EnvironmentScope": "Specified",
                "Environments": ["Environments-1"]
            }
        ],
        "RunbookProcesses": [
            {
                "Id": "RunbookProcess-Runbooks-1",
                "ProjectId": "Projects-1",
                "RunbookId": "Runbooks-1",
                "Steps": [{
                    "Id": "Steps-20",
                    "Name": "Restart Service",
                    "Actions": [{
                        "Id": "Actions-20",
                        "Name": "Restart Service",
                        "ActionType": "Octopus.Script",
                        "Properties": {"Octopus.Action.Script.ScriptBody": "systemctl restart web"}
                    }]
                }]
            }
        ]
    })
}

/// Configuration writing to `output_dir`; `extra` is appended to the `[export]` table
pub fn config(output_dir: &Path, extra: &str) -> OctoformConfig {
    let text = format!(
        r#"
[source]
base_url = "https://deploy.example.com"
api_key = "API-TEST"

[export]
output_dir = "{}"
{extra}
"#,
        output_dir.display().to_string().replace('\\', "/")
    );
    let config: OctoformConfig = toml::from_str(&text).expect("test configuration parses");
    config.validate().expect("test configuration is valid");
    config
}

pub fn client(snapshot: Value) -> Arc<SnapshotSourceClient> {
    Arc::new(SnapshotSourceClient::from_value(snapshot).expect("snapshot is valid"))
}

pub async fn run(
    config: OctoformConfig,
    snapshot: Value,
    target: ExportTarget,
    dry_run: bool,
) -> octoform::domain::Result<ExportSummary> {
    let (_tx, rx) = watch::channel(false);
    ExportCoordinator::new(config, client(snapshot), rx)
        .execute_export(&target, dry_run)
        .await
}

/// Every file under `dir`, keyed by path relative to it
pub fn read_tree(dir: &Path) -> BTreeMap<String, String> {
    let mut files = BTreeMap::new();
    collect(dir, dir, &mut files);
    files
}

fn collect(root: &Path, dir: &Path, files: &mut BTreeMap<String, String>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect(root, &path, files);
        } else {
            let relative = path
                .strip_prefix(root)
                .expect("path under root")
                .to_string_lossy()
                .replace('\\', "/");
            files.insert(relative, std::fs::read_to_string(&path).expect("utf-8 output"));
        }
    }
}

pub fn file<'a>(files: &'a BTreeMap<String, String>, name: &str) -> &'a str {
    files
        .get(&format!("space_population/{name}"))
        .map(String::as_str)
        .unwrap_or_else(|| panic!("missing {name}; have {:?}", files.keys().collect::<Vec<_>>()))
}
