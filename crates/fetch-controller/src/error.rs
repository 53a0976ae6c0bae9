//! # Fetch Errors
//!
//! Error types shared by the controller, its handle and the data sources.
//!
//! [`FetchError`] is what consumers see: it lives inside the published
//! [`RequestState`](crate::RequestState), so it is `Clone + PartialEq`.
//! [`SourceError`] is the transport-level error a [`DataSource`](crate::DataSource)
//! returns; the controller converts it. [`SourceError::Cancelled`] for a
//! request the controller cancelled itself is never surfaced.

/// Errors reported by a fetch controller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The remote answered with a non-2xx status.
    #[error("Request failed: {status}")]
    Status { status: u16, resource: String },

    /// Connectivity or transport failure.
    #[error("Network error: {0}")]
    Network(String),

    /// The response body could not be decoded into the expected type.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The resource identifier is malformed.
    #[error("Invalid resource: {0}")]
    InvalidResource(String),

    /// The controller task has shut down.
    #[error("Controller closed")]
    ControllerClosed,
}

impl FetchError {
    /// Returns the HTTP status for [`FetchError::Status`].
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors returned by a [`DataSource`](crate::DataSource).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    /// The request was aborted through its cancellation token.
    #[error("Request cancelled")]
    Cancelled,

    #[error("Network error: {0}")]
    Network(String),

    /// The descriptor could not be turned into a request.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}
