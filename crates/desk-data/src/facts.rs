//! Outbound client for the remote fact API.
//!
//! The body is treated as opaque JSON: it must parse, nothing else is checked.

use async_trait::async_trait;
use serde_json::Value;

use desk_core::error::{DeskError, Result};

/// Fixed endpoint the shell reads its fact from.
pub const FACT_ENDPOINT: &str = "https://catfact.ninja/fact";

/// Anything that can produce one fact payload.
#[async_trait]
pub trait FactSource: Send + Sync {
    /// Perform one fetch. No retry.
    async fn fetch_fact(&self) -> Result<Value>;
}

/// `reqwest`-backed [`FactSource`] issuing a single unauthenticated GET.
#[derive(Debug, Clone)]
pub struct CatFactClient {
    http: reqwest::Client,
    endpoint: String,
}

impl CatFactClient {
    /// Client for [`FACT_ENDPOINT`].
    pub fn new() -> Self {
        Self::with_endpoint(FACT_ENDPOINT)
    }

    /// Client for an arbitrary URL; used by tests to target a local listener.
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Default for CatFactClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FactSource for CatFactClient {
    async fn fetch_fact(&self) -> Result<Value> {
        tracing::debug!(endpoint = %self.endpoint, "fetching fact");

        let response = self
            .http
            .get(&self.endpoint)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(network)?;

        let body = response.json::<Value>().await.map_err(network)?;
        tracing::debug!(?body, "fact received");
        Ok(body)
    }
}

fn network(e: reqwest::Error) -> DeskError {
    DeskError::Network(e.to_string())
}
