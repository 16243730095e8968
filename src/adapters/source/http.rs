//! HTTP source client for a live server
//!
//! Talks to the platform's REST API, scoped to one space:
//!
//! - collections: `GET {base}/api/{space}/{path}?skip={n}&take={n}` returning
//!   `{"Items": [...], "TotalResults": n}`
//! - single entities: `GET {base}/api/{space}/{path}/{id}`
//! - children: `GET {base}/api/{space}/{parent path}/{parent id}/{path}?skip={n}&take={n}`,
//!   paged like collections
//!
//! Requests authenticate with the `X-Octopus-ApiKey` header. There is no retry; a failed
//! request fails the run.

use super::{Page, PageParams, SourceClient};
use crate::config::SourceConfig;
use crate::domain::{OctoformError, ResourceKind, Result, SourceError};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, Response, StatusCode};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use url::Url;

const API_KEY_HEADER: &str = "X-Octopus-ApiKey";

/// Collection response envelope
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Envelope {
    #[serde(default)]
    items: Vec<Value>,
    #[serde(default)]
    total_results: usize,
}

/// Source client backed by the platform's REST API
///
/// # Example
///
/// ```no_run
/// use octoform::adapters::source::{HttpSourceClient, SourceClient};
/// use octoform::config::SourceConfig;
/// use octoform::domain::ResourceKind;
///
/// # async fn example() -> octoform::domain::Result<()> {
/// let config = SourceConfig::default();
/// let client = HttpSourceClient::new(&config)?;
/// let project = client.fetch_by_id(ResourceKind::Projects, "Projects-1").await?;
/// # Ok(())
/// # }
/// ```
pub struct HttpSourceClient {
    client: Client,
    space_root: Url,
    api_key: String,
    page_size: usize,
}

impl HttpSourceClient {
    /// Create a client from the `[source]` configuration section
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let mut builder = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(30));

        if !config.tls_verify {
            tracing::warn!("TLS certificate verification is disabled for the source server");
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder.build().map_err(|e| {
            OctoformError::Configuration(format!("Failed to build HTTP client: {e}"))
        })?;

        Ok(Self {
            client,
            space_root: space_root(&config.base_url, &config.space_id)?,
            api_key: config.api_key.expose_secret().to_string(),
            page_size: config.page_size,
        })
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.space_root.clone();
        url.path_segments_mut()
            .map_err(|_| {
                OctoformError::Configuration(format!("Invalid base URL: {}", self.space_root))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Sends a GET request, `None` on 404
    async fn get(&self, url: Url) -> Result<Option<Value>> {
        tracing::debug!(url = %url, "GET");

        let response = self
            .client
            .get(url.clone())
            .header(API_KEY_HEADER, &self.api_key)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SourceError::Timeout(format!("{url}: {e}"))
                } else {
                    SourceError::ConnectionFailed(format!("{url}: {e}"))
                }
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                tracing::debug!(url = %url, "Entity not found");
                Ok(None)
            }
            status if status.is_success() => {
                let body = response.json::<Value>().await.map_err(|e| {
                    SourceError::InvalidResponse(format!("{url} returned invalid JSON: {e}"))
                })?;
                Ok(Some(body))
            }
            _ => Err(status_error(&url, response).await.into()),
        }
    }
}

/// Maps a non-success response to a source error
async fn status_error(url: &Url, response: Response) -> SourceError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = format!("{url}: {body}");

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SourceError::AuthenticationFailed(
            format!("{url} returned {status}; check source.api_key and its space permissions"),
        ),
        s if s.is_server_error() => SourceError::ServerError {
            status: s.as_u16(),
            message,
        },
        s => SourceError::ClientError {
            status: s.as_u16(),
            message,
        },
    }
}

/// `{base}/api/{space}`
fn space_root(base_url: &str, space_id: &str) -> Result<Url> {
    let mut url = Url::parse(base_url).map_err(|e| {
        OctoformError::Configuration(format!("Invalid source.base_url '{base_url}': {e}"))
    })?;
    url.path_segments_mut()
        .map_err(|_| {
            OctoformError::Configuration(format!("source.base_url '{base_url}' cannot be a base"))
        })?
        .pop_if_empty()
        .extend(["api", space_id]);
    Ok(url)
}

/// Appends the `skip`/`take` window to a collection URL
fn paged(url: &Url, page: PageParams) -> Url {
    let mut url = url.clone();
    url.query_pairs_mut()
        .append_pair("skip", &page.skip.to_string())
        .append_pair("take", &page.take.to_string());
    url
}

fn api_path(kind: ResourceKind) -> Result<&'static str> {
    kind.api_path().ok_or_else(|| {
        SourceError::InvalidResponse(format!("{kind} has no API collection")).into()
    })
}

#[async_trait]
impl SourceClient for HttpSourceClient {
    async fn fetch_collection(&self, kind: ResourceKind, page: PageParams) -> Result<Page> {
        let url = paged(&self.url(&[api_path(kind)?])?, page);

        let Some(body) = self.get(url.clone()).await? else {
            return Err(SourceError::ClientError {
                status: 404,
                message: format!("{url}: collection not found"),
            }
            .into());
        };

        let envelope: Envelope = serde_json::from_value(body).map_err(|e| {
            SourceError::InvalidFormat(format!("{url} is not a collection page: {e}"))
        })?;

        Ok(Page {
            items: envelope.items,
            total_results: envelope.total_results,
        })
    }

    async fn fetch_by_id(&self, kind: ResourceKind, id: &str) -> Result<Option<Value>> {
        let url = self.url(&[api_path(kind)?, id])?;
        self.get(url).await
    }

    async fn fetch_by_parent(
        &self,
        parent_kind: ResourceKind,
        parent_id: &str,
        kind: ResourceKind,
    ) -> Result<Vec<Value>> {
        let base = self.url(&[api_path(parent_kind)?, parent_id, api_path(kind)?])?;
        let mut children = Vec::new();
        let mut page = PageParams::first(self.page_size.max(1));

        loop {
            let url = paged(&base, page);
            let body = match self.get(url.clone()).await? {
                None => break,
                // plain list endpoints are not paged
                Some(Value::Array(items)) => {
                    children.extend(items);
                    break;
                }
                Some(body) => body,
            };

            let envelope: Envelope = serde_json::from_value(body).map_err(|e| {
                SourceError::InvalidFormat(format!("{url} is not a list of children: {e}"))
            })?;
            let received = envelope.items.len();
            children.extend(envelope.items);

            crate::log_page_fetched!(kind, page.skip + received, envelope.total_results);

            if received == 0 || page.skip + received >= envelope.total_results {
                break;
            }
            page = page.advance(received);
        }

        Ok(children)
    }

    fn page_size(&self) -> usize {
        self.page_size
    }
}
