//! Fetching templates over HTTP.

use super::{HttpGetter, HttpResponse, ResolverTools};
use crate::core::{FlattenError, Result};
use crate::models::{FetchedTemplate, TemplateDocument};
use anyhow::Context;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// GET `uri` and decode the body as a devfile, DevWorkspace or DevWorkspaceTemplate.
pub async fn fetch_by_uri(uri: &str, tools: &ResolverTools) -> Result<FetchedTemplate> {
    let getter = tools.http_getter.as_ref().ok_or_else(|| FlattenError::Config {
        message: format!("no HTTP client configured to fetch {uri}"),
    })?;

    debug!("Fetching template from {}", uri);
    let response = getter.get(uri).await.map_err(|e| FlattenError::Fetch {
        location: uri.to_string(),
        reason: format!("{e:#}"),
    })?;

    if response.status != 200 {
        return Err(FlattenError::Fetch {
            location: uri.to_string(),
            reason: format!("got status {}", response.status),
        });
    }

    let document = TemplateDocument::from_slice(&response.body).map_err(|e| FlattenError::Fetch {
        location: uri.to_string(),
        reason: e.to_string(),
    })?;
    Ok(document.into_fetched())
}

/// [`HttpGetter`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestGetter {
    client: reqwest::Client,
}

impl ReqwestGetter {
    /// Build a client whose requests fail after `timeout`.
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
        })
    }
}

#[async_trait]
impl HttpGetter for ReqwestGetter {
    async fn get(&self, url: &str) -> anyhow::Result<HttpResponse> {
        let response = self.client.get(url).send().await.with_context(|| format!("Failed to fetch {url}"))?;
        let status = response.status().as_u16();
        let body = response.bytes().await.with_context(|| format!("Failed to read response body from {url}"))?;
        Ok(HttpResponse {
            status,
            body: body.to_vec(),
        })
    }
}
