//! Source platform clients
//!
//! The [`SourceClient`] trait is the only way converters read the space being exported.
//! Two implementations are provided: [`HttpSourceClient`] talks to a live server and
//! [`SnapshotSourceClient`] serves a JSON snapshot for offline exports and tests.
//!
//! A missing entity is `Ok(None)`; an `Err` is always fatal for the run.

pub mod http;
pub mod snapshot;

pub use http::HttpSourceClient;
pub use snapshot::SnapshotSourceClient;

use crate::domain::{ResourceKind, Result, SourceError};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Paging window for collection requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub skip: usize,
    pub take: usize,
}

impl PageParams {
    pub fn first(take: usize) -> Self {
        Self { skip: 0, take }
    }

    /// The window following one that returned `received` items
    ///
    /// Servers may cap a page below `take`, so the offset moves by what actually arrived.
    pub fn advance(self, received: usize) -> Self {
        Self {
            skip: self.skip + received,
            take: self.take,
        }
    }
}

/// One page of a collection
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub items: Vec<Value>,
    pub total_results: usize,
}

/// Read access to the source platform
#[async_trait]
pub trait SourceClient: Send + Sync {
    /// Fetch one page of a collection
    async fn fetch_collection(&self, kind: ResourceKind, page: PageParams) -> Result<Page>;

    /// Fetch a single entity, `None` when it does not exist
    async fn fetch_by_id(&self, kind: ResourceKind, id: &str) -> Result<Option<Value>>;

    /// Fetch every child of `kind` belonging to a parent entity
    async fn fetch_by_parent(
        &self,
        parent_kind: ResourceKind,
        parent_id: &str,
        kind: ResourceKind,
    ) -> Result<Vec<Value>>;

    /// Page size used by [`fetch_all`]
    fn page_size(&self) -> usize {
        100
    }
}

/// Fetches and deserializes a single entity
pub async fn fetch_typed<T: DeserializeOwned>(
    client: &dyn SourceClient,
    kind: ResourceKind,
    id: &str,
) -> Result<Option<T>> {
    match client.fetch_by_id(kind, id).await? {
        Some(value) => Ok(Some(decode(kind, value)?)),
        None => Ok(None),
    }
}

/// Walks every page of a collection and deserializes the items
pub async fn fetch_all<T: DeserializeOwned>(
    client: &dyn SourceClient,
    kind: ResourceKind,
) -> Result<Vec<T>> {
    let mut items = Vec::new();
    let mut page = PageParams::first(client.page_size().max(1));

    loop {
        let result = client.fetch_collection(kind, page).await?;
        let received = result.items.len();
        for value in result.items {
            items.push(decode(kind, value)?);
        }

        crate::log_page_fetched!(kind, page.skip + received, result.total_results);

        if received == 0 || page.skip + received >= result.total_results {
            break;
        }
        page = page.advance(received);
    }

    Ok(items)
}

/// Fetches and deserializes the children of a parent entity
pub async fn fetch_children<T: DeserializeOwned>(
    client: &dyn SourceClient,
    parent_kind: ResourceKind,
    parent_id: &str,
    kind: ResourceKind,
) -> Result<Vec<T>> {
    client
        .fetch_by_parent(parent_kind, parent_id, kind)
        .await?
        .into_iter()
        .map(|value| decode(kind, value))
        .collect()
}

fn decode<T: DeserializeOwned>(kind: ResourceKind, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| {
        SourceError::InvalidFormat(format!("Unexpected {kind} document: {e}")).into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Environment;
    use serde_json::json;

    fn environments(count: usize) -> Value {
        let items: Vec<Value> = (1..=count)
            .map(|i| json!({"Id": format!("Environments-{i}"), "Name": format!("Env {i}")}))
            .collect();
        json!({ "Environments": items })
    }

    #[tokio::test]
    async fn test_fetch_all_walks_every_page() {
        let client = SnapshotSourceClient::from_value(environments(5))
            .unwrap()
            .with_page_size(2);

        let all: Vec<Environment> = fetch_all(&client, ResourceKind::Environments)
            .await
            .unwrap();

        assert_eq!(all.len(), 5);
        assert_eq!(all[4].id, "Environments-5");
        assert_eq!(client.collection_requests(), 3);
    }

    #[tokio::test]
    async fn test_fetch_typed_missing_is_none() {
        let client = SnapshotSourceClient::from_value(environments(1)).unwrap();
        let missing: Option<Environment> =
            fetch_typed(&client, ResourceKind::Environments, "Environments-9")
                .await
                .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_fetch_typed_rejects_malformed_document() {
        let client =
            SnapshotSourceClient::from_value(json!({"Environments": [{"Id": "Environments-1"}]}))
                .unwrap();
        let result: Result<Option<Environment>> =
            fetch_typed(&client, ResourceKind::Environments, "Environments-1").await;
        assert!(result.is_err());
    }

    #[test]
    fn test_page_params_advance_by_received() {
        let page = PageParams::first(50).advance(50);
        assert_eq!(page, PageParams { skip: 50, take: 50 });

        let page = PageParams::first(50).advance(20);
        assert_eq!(page, PageParams { skip: 20, take: 50 });
    }

    /// Serves at most `cap` items per page, whatever `take` asks for
    struct CappedClient {
        inner: SnapshotSourceClient,
        cap: usize,
    }

    #[async_trait]
    impl SourceClient for CappedClient {
        async fn fetch_collection(&self, kind: ResourceKind, page: PageParams) -> Result<Page> {
            let capped = PageParams {
                skip: page.skip,
                take: page.take.min(self.cap),
            };
            self.inner.fetch_collection(kind, capped).await
        }

        async fn fetch_by_id(&self, kind: ResourceKind, id: &str) -> Result<Option<Value>> {
            self.inner.fetch_by_id(kind, id).await
        }

        async fn fetch_by_parent(
            &self,
            parent_kind: ResourceKind,
            parent_id: &str,
            kind: ResourceKind,
        ) -> Result<Vec<Value>> {
            self.inner.fetch_by_parent(parent_kind, parent_id, kind).await
        }

        fn page_size(&self) -> usize {
            5
        }
    }

    #[tokio::test]
    async fn test_fetch_all_survives_server_page_cap() {
        let client = CappedClient {
            inner: SnapshotSourceClient::from_value(environments(7)).unwrap(),
            cap: 2,
        };

        let all: Vec<Environment> = fetch_all(&client, ResourceKind::Environments)
            .await
            .unwrap();

        let ids: Vec<_> = all.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(
            ids,
            [
                "Environments-1",
                "Environments-2",
                "Environments-3",
                "Environments-4",
                "Environments-5",
                "Environments-6",
                "Environments-7",
            ]
        );
    }
}
