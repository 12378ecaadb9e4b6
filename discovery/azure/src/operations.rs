use crate::{token::TokenProvider, DataActionSource, Error};
use dataaction_discovery_core::{ClusterType, Operation};
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Lists the data actions a resource provider publishes for a cluster type.
#[derive(Clone)]
pub struct OperationsClient {
    http: reqwest::Client,
    endpoint: String,
    cluster_type: ClusterType,
    scope: String,
    tokens: Arc<dyn TokenProvider>,
    max_pages: usize,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperationList {
    #[serde(default)]
    value: Vec<WireOperation>,

    #[serde(default)]
    next_link: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireOperation {
    name: String,

    #[serde(default)]
    display: Option<OperationDisplay>,

    /// Providers omit this field, or set it to null, for control-plane
    /// operations.
    #[serde(default)]
    is_data_action: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct OperationDisplay {
    #[serde(default)]
    provider: String,

    #[serde(default)]
    resource: String,

    #[serde(default)]
    operation: String,

    #[serde(default)]
    description: String,
}

/// Identifies this client, its platform, and its version.
pub fn user_agent() -> String {
    format!(
        "dataaction-discovery/{} ({}; {})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH,
    )
}

// === impl OperationsClient ===

impl OperationsClient {
    pub fn new(
        http: reqwest::Client,
        endpoint: impl Into<String>,
        cluster_type: ClusterType,
        scope: impl Into<String>,
        tokens: Arc<dyn TokenProvider>,
    ) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            cluster_type,
            scope: scope.into(),
            tokens,
            max_pages: 1,
        }
    }

    /// Follows `nextLink` until `max_pages` pages have been read. By default,
    /// only the first page is read.
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    #[instrument(skip(self), fields(endpoint = %self.endpoint, cluster_type = %self.cluster_type))]
    pub async fn fetch_data_actions(&self) -> Result<Vec<Operation>, Error> {
        let token = self.tokens.acquire(&self.scope).await?;

        let mut operations = Vec::new();
        let mut next = Some(self.endpoint.clone());
        let mut pages = 0;
        while let Some(url) = next.take() {
            if pages == self.max_pages {
                warn!(next_link = %url, pages, "Page limit reached; ignoring remaining operations");
                break;
            }
            let page = self.fetch_page(&url, &token.token).await?;
            pages += 1;

            operations.extend(
                page.value
                    .into_iter()
                    .filter_map(|op| op.into_data_action(self.cluster_type)),
            );
            next = page.next_link.filter(|link| !link.is_empty());
        }

        if tracing::enabled!(tracing::Level::DEBUG) {
            if let Ok(json) = serde_json::to_string(&operations) {
                debug!(pages, operations = %json, "Fetched data actions");
            }
        }

        Ok(operations)
    }

    async fn fetch_page(&self, url: &str, token: &str) -> Result<OperationList, Error> {
        debug!(%url, "Listing operations");
        let rsp = self
            .http
            .get(url)
            .bearer_auth(token)
            .header(CONTENT_TYPE, "application/json")
            .header(USER_AGENT, user_agent())
            .send()
            .await
            .map_err(Error::Request)?;

        let status = rsp.status();
        let body = rsp.bytes().await.map_err(Error::Request)?;
        if !status.is_success() {
            return Err(Error::Response {
                status,
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        serde_json::from_slice(&body).map_err(Error::Decode)
    }
}

#[async_trait::async_trait]
impl DataActionSource for OperationsClient {
    async fn data_actions(&self) -> Result<Vec<Operation>, Error> {
        self.fetch_data_actions().await
    }
}

impl std::fmt::Debug for OperationsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationsClient")
            .field("endpoint", &self.endpoint)
            .field("cluster_type", &self.cluster_type)
            .field("scope", &self.scope)
            .field("max_pages", &self.max_pages)
            .finish_non_exhaustive()
    }
}

// === impl WireOperation ===

impl WireOperation {
    /// Keeps data actions that belong to the cluster type.
    fn into_data_action(self, cluster_type: ClusterType) -> Option<Operation> {
        let is_data_action = self.is_data_action.unwrap_or(false);
        if !is_data_action || !self.name.contains(cluster_type.as_str()) {
            return None;
        }
        if let Some(desc) = &self.display {
            tracing::trace!(
                name = %self.name,
                provider = %desc.provider,
                resource = %desc.resource,
                operation = %desc.operation,
                description = %desc.description,
                "Data action",
            );
        }
        Some(Operation {
            name: self.name,
            is_data_action,
        })
    }
}
