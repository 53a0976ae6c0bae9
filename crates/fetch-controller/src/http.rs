//! # HTTP Data Source
//!
//! [`HttpSource`] serves descriptors over HTTP with a shared
//! [`reqwest::Client`]. Each request is raced against its cancellation token;
//! when the token fires first the in-flight future is dropped, which aborts
//! the connection, and [`SourceError::Cancelled`] is returned.
//!
//! Non-2xx statuses are not errors at this layer. They come back as a normal
//! [`SourceResponse`] and the controller decides what they mean.

use crate::config::SourceConfig;
use crate::descriptor::{Method, RequestDescriptor};
use crate::error::SourceError;
use crate::source::{DataSource, SourceResponse};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};
use url::Url;

/// Data source backed by a reqwest client.
#[derive(Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    base_url: Option<Url>,
    default_headers: BTreeMap<String, String>,
}

impl HttpSource {
    pub fn new(config: &SourceConfig) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| SourceError::Network(format!("Failed to create HTTP client: {}", e)))?;

        let base_url = config
            .base_url
            .as_deref()
            .map(Url::parse)
            .transpose()
            .map_err(|e| SourceError::InvalidRequest(format!("Invalid base URL: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            default_headers: config.default_headers.clone(),
        })
    }

    /// Resolves `resource` to an absolute URL, joining relative paths onto
    /// the base URL.
    pub fn resolve(&self, resource: &str) -> Result<Url, SourceError> {
        match Url::parse(resource) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => match &self.base_url {
                Some(base) => base.join(resource).map_err(|e| {
                    SourceError::InvalidRequest(format!("Cannot join {}: {}", resource, e))
                }),
                None => Err(SourceError::InvalidRequest(format!(
                    "Relative resource {} without a base URL",
                    resource
                ))),
            },
            Err(e) => Err(SourceError::InvalidRequest(format!(
                "Invalid resource {}: {}",
                resource, e
            ))),
        }
    }

    async fn send(
        &self,
        url: Url,
        descriptor: &RequestDescriptor,
    ) -> Result<SourceResponse, SourceError> {
        let method = descriptor.method();
        trace!(%url, %method, "HTTP request starting");

        let mut request = self.client.request(to_reqwest_method(method), url.clone());
        for (name, value) in &self.default_headers {
            if !descriptor.options.headers.contains_key(name) {
                request = request.header(name.as_str(), value.as_str());
            }
        }
        for (name, value) in &descriptor.options.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &descriptor.options.body {
            request = request.body(body.clone());
        }

        let response = match request.send().await {
            Ok(resp) => {
                debug!(%url, status = resp.status().as_u16(), "HTTP response received");
                resp
            }
            Err(e) => {
                warn!(
                    %url,
                    error = %e,
                    is_connect = e.is_connect(),
                    is_request = e.is_request(),
                    "HTTP request failed"
                );
                return Err(SourceError::Network(format!("Request failed: {}", e)));
            }
        };

        let status = response.status().as_u16();
        match response.bytes().await {
            Ok(bytes) => {
                trace!(%url, bytes = bytes.len(), "HTTP response body read");
                Ok(SourceResponse::new(status, bytes.to_vec()))
            }
            Err(e) => {
                warn!(%url, error = %e, "Failed to read response body");
                Err(SourceError::Network(format!(
                    "Failed to read response: {}",
                    e
                )))
            }
        }
    }
}

#[async_trait]
impl DataSource for HttpSource {
    async fn fetch(
        &self,
        descriptor: &RequestDescriptor,
        cancel: CancellationToken,
    ) -> Result<SourceResponse, SourceError> {
        let url = self.resolve(&descriptor.resource)?;
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(%url, "HTTP request cancelled");
                Err(SourceError::Cancelled)
            }
            result = self.send(url.clone(), descriptor) => result,
        }
    }
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}
