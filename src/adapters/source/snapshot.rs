//! Offline source client backed by a JSON snapshot
//!
//! The snapshot is a single JSON object keyed by resource kind tag, each holding the
//! array of documents the API would serve:
//!
//! ```json
//! {
//!   "Environments": [{"Id": "Environments-1", "Name": "Production"}],
//!   "Projects": [{"Id": "Projects-1", "Name": "Web", "ProjectGroupId": "ProjectGroups-1", "LifecycleId": "Lifecycles-1"}]
//! }
//! ```

use super::{Page, PageParams, SourceClient};
use crate::domain::{OctoformError, ResourceKind, Result, SourceError};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Source client serving documents from memory
pub struct SnapshotSourceClient {
    collections: HashMap<String, Vec<Value>>,
    page_size: usize,
    collection_requests: AtomicUsize,
    id_requests: AtomicUsize,
}

impl SnapshotSourceClient {
    /// Builds a client from a parsed snapshot document
    pub fn from_value(snapshot: Value) -> Result<Self> {
        let Value::Object(map) = snapshot else {
            return Err(OctoformError::Validation(
                "Snapshot must be a JSON object keyed by resource kind".to_string(),
            ));
        };

        let mut collections = HashMap::new();
        for (kind, items) in map {
            let Value::Array(items) = items else {
                return Err(OctoformError::Validation(format!(
                    "Snapshot entry '{kind}' must be an array"
                )));
            };
            collections.insert(kind, items);
        }

        Ok(Self {
            collections,
            page_size: 100,
            collection_requests: AtomicUsize::new(0),
            id_requests: AtomicUsize::new(0),
        })
    }

    /// Reads a snapshot file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            OctoformError::Io(format!("Failed to read snapshot {}: {e}", path.display()))
        })?;
        let value: Value = serde_json::from_str(&contents)?;
        tracing::info!(path = %path.display(), "Loaded source snapshot");
        Self::from_value(value)
    }

    /// Overrides the page size reported to paging helpers
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Number of collection pages served so far
    pub fn collection_requests(&self) -> usize {
        self.collection_requests.load(Ordering::SeqCst)
    }

    /// Number of by-id lookups served so far
    pub fn id_requests(&self) -> usize {
        self.id_requests.load(Ordering::SeqCst)
    }

    fn items(&self, kind: ResourceKind) -> &[Value] {
        self.collections
            .get(kind.as_str())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Field on a child document pointing at its parent
fn parent_field(parent_kind: ResourceKind) -> Result<&'static str> {
    match parent_kind {
        ResourceKind::Projects => Ok("ProjectId"),
        ResourceKind::Runbooks => Ok("RunbookId"),
        ResourceKind::ProjectGroups => Ok("ProjectGroupId"),
        other => Err(SourceError::InvalidResponse(format!(
            "{other} has no child collections"
        ))
        .into()),
    }
}

#[async_trait]
impl SourceClient for SnapshotSourceClient {
    async fn fetch_collection(&self, kind: ResourceKind, page: PageParams) -> Result<Page> {
        self.collection_requests.fetch_add(1, Ordering::SeqCst);
        let items = self.items(kind);
        Ok(Page {
            items: items.iter().skip(page.skip).take(page.take).cloned().collect(),
            total_results: items.len(),
        })
    }

    async fn fetch_by_id(&self, kind: ResourceKind, id: &str) -> Result<Option<Value>> {
        self.id_requests.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .items(kind)
            .iter()
            .find(|item| item.get("Id").and_then(Value::as_str) == Some(id))
            .cloned())
    }

    async fn fetch_by_parent(
        &self,
        parent_kind: ResourceKind,
        parent_id: &str,
        kind: ResourceKind,
    ) -> Result<Vec<Value>> {
        let field = parent_field(parent_kind)?;
        Ok(self
            .items(kind)
            .iter()
            .filter(|item| item.get(field).and_then(Value::as_str) == Some(parent_id))
            .cloned()
            .collect())
    }

    fn page_size(&self) -> usize {
        self.page_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_fetch_by_parent_filters_on_parent_field() {
        let client = SnapshotSourceClient::from_value(json!({
            "Runbooks": [
                {"Id": "Runbooks-1", "Name": "a", "ProjectId": "Projects-1"},
                {"Id": "Runbooks-2", "Name": "b", "ProjectId": "Projects-2"}
            ]
        }))
        .unwrap();

        let children = client
            .fetch_by_parent(ResourceKind::Projects, "Projects-1", ResourceKind::Runbooks)
            .await
            .unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0]["Id"], "Runbooks-1");
    }

    #[tokio::test]
    async fn test_unknown_kind_is_empty_collection() {
        let client = SnapshotSourceClient::from_value(json!({})).unwrap();
        let page = client
            .fetch_collection(ResourceKind::Feeds, PageParams::first(10))
            .await
            .unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total_results, 0);
    }

    #[test]
    fn test_rejects_non_object_snapshot() {
        assert!(SnapshotSourceClient::from_value(json!([1, 2])).is_err());
        assert!(SnapshotSourceClient::from_value(json!({"Feeds": {}})).is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"Feeds": [{"Id": "Feeds-1"}]}"#).unwrap();
        file.flush().unwrap();

        let client = SnapshotSourceClient::from_file(file.path()).unwrap();
        assert_eq!(client.items(ResourceKind::Feeds).len(), 1);
    }
}
