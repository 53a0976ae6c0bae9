//! # Data Sources
//!
//! The [`DataSource`] trait is the seam between a controller and whatever
//! actually serves the bytes. The controller only needs a status code and a
//! body; status checking and JSON decoding stay in the controller so every
//! source gets identical failure semantics.
//!
//! Implementations should stop work once the token is cancelled and return
//! [`SourceError::Cancelled`]. A source that ignores the token is still safe:
//! the controller discards results from superseded generations.

use crate::descriptor::RequestDescriptor;
use crate::error::SourceError;
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Raw answer from a data source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl SourceResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// A `200` response carrying `value` as JSON.
    pub fn json(value: &serde_json::Value) -> Self {
        Self::new(200, value.to_string())
    }

    /// An empty response with the given status.
    pub fn status(status: u16) -> Self {
        Self::new(status, Vec::new())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Something a controller can load resources from.
#[async_trait]
pub trait DataSource: Send + Sync + 'static {
    async fn fetch(
        &self,
        descriptor: &RequestDescriptor,
        cancel: CancellationToken,
    ) -> Result<SourceResponse, SourceError>;
}

#[async_trait]
impl<S: DataSource + ?Sized> DataSource for Arc<S> {
    async fn fetch(
        &self,
        descriptor: &RequestDescriptor,
        cancel: CancellationToken,
    ) -> Result<SourceResponse, SourceError> {
        (**self).fetch(descriptor, cancel).await
    }
}
