//! Integration tests for graceful shutdown
//!
//! These tests verify that:
//! - Shutdown signals propagate to every receiver
//! - A signal raised while entities are still being registered discards the run
//! - Nothing is written for an interrupted run
//! - A dropped sender never interrupts an export

mod common;

use async_trait::async_trait;
use common::{client, config, read_tree, space};
use octoform::adapters::source::{Page, PageParams, SnapshotSourceClient, SourceClient};
use octoform::core::export::{ExportCoordinator, ExportSummary, ExportTarget};
use octoform::domain::{ResourceKind, Result};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::watch;

/// Snapshot client that answers every request after a delay
struct SlowClient {
    inner: Arc<SnapshotSourceClient>,
    delay: Duration,
}

#[async_trait]
impl SourceClient for SlowClient {
    async fn fetch_collection(&self, kind: ResourceKind, page: PageParams) -> Result<Page> {
        tokio::time::sleep(self.delay).await;
        self.inner.fetch_collection(kind, page).await
    }

    async fn fetch_by_id(&self, kind: ResourceKind, id: &str) -> Result<Option<Value>> {
        tokio::time::sleep(self.delay).await;
        self.inner.fetch_by_id(kind, id).await
    }

    async fn fetch_by_parent(
        &self,
        parent_kind: ResourceKind,
        parent_id: &str,
        kind: ResourceKind,
    ) -> Result<Vec<Value>> {
        tokio::time::sleep(self.delay).await;
        self.inner.fetch_by_parent(parent_kind, parent_id, kind).await
    }
}

#[tokio::test]
async fn test_shutdown_signal_propagation() {
    let (shutdown_tx, shutdown_rx1) = watch::channel(false);
    let shutdown_rx2 = shutdown_rx1.clone();

    assert!(!*shutdown_rx1.borrow());
    assert!(!*shutdown_rx2.borrow());

    shutdown_tx.send(true).unwrap();

    assert!(*shutdown_rx1.borrow());
    assert!(*shutdown_rx2.borrow());
}

#[test]
fn test_interrupted_summary() {
    let summary = ExportSummary::interrupted();

    assert!(summary.interrupted);
    assert!(!summary.is_successful());
    assert_eq!(summary.total_registered(), 0);
    assert!(summary.files.is_empty());
}

#[tokio::test]
async fn test_signal_during_registration_discards_run() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out");
    let slow = Arc::new(SlowClient {
        inner: client(space()),
        delay: Duration::from_millis(200),
    });

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        let _ = shutdown_tx.send(true);
    });

    let summary = ExportCoordinator::new(config(&output, ""), slow, shutdown_rx)
        .execute_export(&ExportTarget::Space, false)
        .await
        .unwrap();

    assert!(summary.interrupted);
    assert!(!output.exists());
}

#[tokio::test]
async fn test_dropped_sender_does_not_interrupt() {
    let dir = TempDir::new().unwrap();
    let slow = Arc::new(SlowClient {
        inner: client(space()),
        delay: Duration::from_millis(1),
    });

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    drop(shutdown_tx);

    let summary = ExportCoordinator::new(config(dir.path(), ""), slow, shutdown_rx)
        .execute_export(&ExportTarget::Projects(vec!["Projects-2".to_string()]), false)
        .await
        .unwrap();

    assert!(!summary.interrupted);
    assert!(read_tree(dir.path()).contains_key("space_population/octopusdeploy_project_api.tf"));
}

#[tokio::test]
async fn test_signal_after_completion_keeps_output() {
    let dir = TempDir::new().unwrap();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let _keep_rx = shutdown_rx.clone();

    let summary = ExportCoordinator::new(config(dir.path(), ""), client(space()), shutdown_rx)
        .execute_export(&ExportTarget::Projects(vec!["Projects-1".to_string()]), false)
        .await
        .unwrap();
    shutdown_tx.send(true).unwrap();

    assert!(!summary.interrupted);
    assert_eq!(read_tree(dir.path()).len(), summary.files.len());
}
