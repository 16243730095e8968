//! Export against a mocked server over HTTP

use octoform::config::OctoformConfig;
use octoform::core::export::{ExportCoordinator, ExportTarget};
use octoform::domain::{OctoformError, SourceError};
use std::path::Path;
use tempfile::TempDir;
use tokio::sync::watch;

fn config(base_url: &str, output_dir: &Path) -> OctoformConfig {
    let text = format!(
        r#"
[source]
base_url = "{base_url}"
api_key = "API-MOCK"
space_id = "Spaces-1"
timeout_seconds = 5

[export]
output_dir = "{}"
"#,
        output_dir.display().to_string().replace('\\', "/")
    );
    toml::from_str(&text).unwrap()
}

async fn mock_json(server: &mut mockito::ServerGuard, path: &str, body: &str) -> mockito::Mock {
    server
        .mock("GET", path)
        .match_query(mockito::Matcher::Any)
        .match_header("X-Octopus-ApiKey", "API-MOCK")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create_async()
        .await
}

#[tokio::test]
async fn test_project_export_over_http() {
    let mut server = mockito::Server::new_async().await;
    let project = mock_json(
        &mut server,
        "/api/Spaces-1/projects/Projects-1",
        r#"{"Id": "Projects-1", "Name": "Web", "ProjectGroupId": "ProjectGroups-1", "LifecycleId": "Lifecycles-1"}"#,
    )
    .await;
    let group = mock_json(
        &mut server,
        "/api/Spaces-1/projectgroups/ProjectGroups-1",
        r#"{"Id": "ProjectGroups-1", "Name": "Default Project Group"}"#,
    )
    .await;
    let lifecycle = mock_json(
        &mut server,
        "/api/Spaces-1/lifecycles/Lifecycles-1",
        r#"{"Id": "Lifecycles-1", "Name": "Default Lifecycle", "Phases": []}"#,
    )
    .await;
    let runbooks = mock_json(
        &mut server,
        "/api/Spaces-1/projects/Projects-1/runbooks",
        r#"{"Items": [], "TotalResults": 0}"#,
    )
    .await;

    let dir = TempDir::new().unwrap();
    let (_tx, rx) = watch::channel(false);
    let summary = ExportCoordinator::connect(config(&server.url(), dir.path()), rx)
        .unwrap()
        .execute_export(&ExportTarget::Projects(vec!["Projects-1".to_string()]), false)
        .await
        .unwrap();

    project.assert_async().await;
    group.assert_async().await;
    lifecycle.assert_async().await;
    runbooks.assert_async().await;

    assert_eq!(summary.registered.get("Projects"), Some(&1));
    assert!(summary.unresolved.is_empty());

    let contents = std::fs::read_to_string(
        dir.path()
            .join("space_population")
            .join("octopusdeploy_project_web.tf"),
    )
    .unwrap();
    assert!(contents.contains("resource \"octopusdeploy_project\" \"web\""));
    assert!(contents.contains(
        "project_group_id = \"${data.octopusdeploy_project_groups.default_project_group.project_groups[0].id}\""
    ));
}

#[tokio::test]
async fn test_unauthorized_fails_the_run_before_writing() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/Spaces-1/projects/Projects-1")
        .with_status(401)
        .create_async()
        .await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out");
    let (_tx, rx) = watch::channel(false);
    let result = ExportCoordinator::connect(config(&server.url(), &output), rx)
        .unwrap()
        .execute_export(&ExportTarget::Projects(vec!["Projects-1".to_string()]), false)
        .await;

    match result {
        Err(error @ OctoformError::Source(SourceError::AuthenticationFailed(_))) => {
            assert!(error.is_source_error());
        }
        other => panic!("expected an authentication failure, got {other:?}"),
    }
    assert!(!output.exists());
}
