//! # Request Descriptors
//!
//! A [`RequestDescriptor`] names the resource a controller loads and the
//! options it sends with it. Consumers build one per data need and may swap it
//! between activations; the controller compares descriptors to decide whether
//! a change warrants a new request.

use crate::error::FetchError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;

/// HTTP method used for a request. Defaults to `GET`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request parameters that travel with a resource.
///
/// `skip` is not sent anywhere: it only tells the controller not to activate
/// automatically.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestOptions {
    pub method: Option<Method>,
    pub headers: BTreeMap<String, String>,
    pub body: Option<String>,
    pub skip: bool,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Marks the options so the controller never activates on its own.
    pub fn skipped(mut self) -> Self {
        self.skip = true;
        self
    }

    /// Layers `overrides` on top of these options.
    ///
    /// Override headers replace base headers of the same name; `method` and
    /// `body` are taken from the override when set. `skip` always stays with
    /// the base options.
    pub fn merged(&self, overrides: &RequestOptions) -> RequestOptions {
        let mut merged = self.clone();
        if overrides.method.is_some() {
            merged.method = overrides.method;
        }
        if overrides.body.is_some() {
            merged.body = overrides.body.clone();
        }
        for (name, value) in &overrides.headers {
            merged.headers.insert(name.clone(), value.clone());
        }
        merged
    }
}

/// The resource a controller loads plus its options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestDescriptor {
    pub resource: String,
    #[serde(default)]
    pub options: RequestOptions,
}

impl RequestDescriptor {
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            options: RequestOptions::default(),
        }
    }

    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    pub fn method(&self) -> Method {
        self.options.method.unwrap_or_default()
    }

    pub fn is_skipped(&self) -> bool {
        self.options.skip
    }

    /// Builds the descriptor a refetch runs with.
    pub fn with_overrides(
        &self,
        resource: Option<String>,
        options: Option<&RequestOptions>,
    ) -> RequestDescriptor {
        RequestDescriptor {
            resource: resource.unwrap_or_else(|| self.resource.clone()),
            options: match options {
                Some(overrides) => self.options.merged(overrides),
                None => self.options.clone(),
            },
        }
    }
}

/// Rejects resource identifiers no data source could ever serve.
pub fn validate_resource(resource: &str) -> Result<(), FetchError> {
    if resource.trim().is_empty() {
        return Err(FetchError::InvalidResource(
            "resource must not be empty".to_string(),
        ));
    }
    if resource.chars().any(char::is_whitespace) {
        return Err(FetchError::InvalidResource(format!(
            "resource contains whitespace: {resource:?}"
        )));
    }
    Ok(())
}
