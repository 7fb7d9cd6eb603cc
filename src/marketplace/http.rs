//! Gallery API client.

use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use super::Marketplace;
use super::models::{MarketplaceExtension, PackageManifest, QueryResponse};
use crate::constants::{
    DEFAULT_REQUEST_TIMEOUT, FILTER_TYPE_EXTENSION_NAME, QUERY_FLAGS, QUERY_PAGE_SIZE, USER_AGENT,
};
use crate::core::VsixError;
use crate::models::ExtensionRef;

/// Build the HTTP client shared by marketplace lookups and downloads.
///
/// `idle_timeout` bounds connecting and each wait for data, not the whole
/// transfer: a slow download that keeps receiving bytes is never cut off.
///
/// # Errors
///
/// [`VsixError::Other`] if the TLS backend cannot be initialized.
pub fn build_client(idle_timeout: Duration) -> Result<Client, VsixError> {
    Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(idle_timeout)
        .read_timeout(idle_timeout)
        .build()
        .map_err(|e| VsixError::Other {
            message: format!("Failed to initialize HTTP client: {e}"),
        })
}

/// [`Marketplace`] backed by the public gallery `extensionquery` endpoint.
#[derive(Debug, Clone)]
pub struct HttpMarketplace {
    client: Client,
    endpoint: String,
    api_version: String,
    request_timeout: Duration,
}

impl HttpMarketplace {
    /// Create a client for `endpoint`, sending `api_version` in the `Accept`
    /// header. The `reqwest` client is shared with the fetcher so connections
    /// are pooled across lookups and downloads.
    pub fn new(client: Client, endpoint: impl Into<String>, api_version: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_version: api_version.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Deadline for each lookup and manifest request, body included.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Configured query endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn query_payload(reference: &ExtensionRef) -> serde_json::Value {
        json!({
            "assetTypes": null,
            "filters": [{
                "criteria": [{
                    "filterType": FILTER_TYPE_EXTENSION_NAME,
                    "value": reference.key(),
                }],
                "direction": 2,
                "pageSize": QUERY_PAGE_SIZE,
                "pageNumber": 1,
                "sortBy": 0,
                "sortOrder": 0,
                "pagingToken": null,
            }],
            "flags": QUERY_FLAGS,
        })
    }
}

impl Marketplace for HttpMarketplace {
    async fn query(
        &self,
        reference: &ExtensionRef,
    ) -> Result<Option<MarketplaceExtension>, VsixError> {
        let key = reference.key();
        debug!("Querying marketplace for {}", key);

        let query_error = |reason: String| VsixError::MarketplaceQuery {
            key: key.clone(),
            reason,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, format!("application/json;api-version={}", self.api_version))
            .json(&Self::query_payload(reference))
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| query_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(query_error(format!("HTTP {status}")));
        }

        let body: QueryResponse =
            response.json().await.map_err(|e| query_error(format!("invalid response: {e}")))?;

        Ok(body.into_first_extension())
    }

    async fn fetch_manifest(
        &self,
        reference: &ExtensionRef,
        url: &str,
    ) -> Result<PackageManifest, VsixError> {
        debug!("Fetching manifest for {} from {}", reference, url);

        let unavailable = |reason: String| VsixError::ManifestUnavailable {
            key: reference.key(),
            reason,
        };

        let response = self
            .client
            .get(url)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(unavailable(format!("HTTP {status}")));
        }

        response.json().await.map_err(|e| unavailable(format!("invalid manifest: {e}")))
    }
}
