//! External system integrations for Octoform.
//!
//! This module provides adapters for the systems the exporter talks to:
//!
//! - [`source`] - Reading a space from the deployment platform (HTTP or JSON snapshot)
//! - [`hcl`] - Turning populated block records into configuration text
//! - [`naming`] - Mapping display names to valid block labels
//!
//! # Design Pattern
//!
//! Adapters follow the **Adapter Pattern** to isolate external dependencies and
//! enable testing with substitute implementations. Converters only see the
//! [`source::SourceClient`] and [`hcl::CodeEmitter`] traits.
//!
//! # Source Adapter
//!
//! ```rust,no_run
//! use octoform::adapters::source::{fetch_all, HttpSourceClient};
//! use octoform::config::{secret_string, SourceConfig};
//! use octoform::domain::{Environment, ResourceKind};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SourceConfig {
//!     base_url: "https://deploy.example.com".to_string(),
//!     api_key: secret_string("API-XXXXXXXX".to_string()),
//!     space_id: "Spaces-1".to_string(),
//!     timeout_seconds: 30,
//!     page_size: 100,
//!     tls_verify: true,
//! };
//!
//! let client = HttpSourceClient::new(&config)?;
//! let environments: Vec<Environment> = fetch_all(&client, ResourceKind::Environments).await?;
//! # Ok(())
//! # }
//! ```

pub mod hcl;
pub mod naming;
pub mod source;
