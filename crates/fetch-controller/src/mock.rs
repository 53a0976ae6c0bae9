//! # Mock Sources & Testing Guide
//!
//! Two in-memory [`DataSource`]s for testing controllers and the code built on
//! them without a network.
//!
//! ## When to use which
//!
//! | Feature | ScriptedSource | MockSource |
//! |---------|----------------|------------|
//! | **Completion order** | Immediate, oldest answer per resource | Whatever order the test responds in |
//! | **Setup** | Queue canned answers up front | Drive each request by hand |
//! | **Use Case** | Page and consumer logic | Races, supersession, teardown |
//!
//! ## Pattern 1: Scripted answers
//!
//! ```rust
//! use fetch_controller::mock::ScriptedSource;
//! use fetch_controller::{ControllerConfig, FetchController, RequestDescriptor};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let source = ScriptedSource::new();
//!     source.expect_fetch("https://api.test/missing").return_status(404);
//!
//!     let handle = FetchController::<serde_json::Value>::spawn(
//!         Arc::new(source.clone()),
//!         RequestDescriptor::new("https://api.test/missing"),
//!         ControllerConfig::default(),
//!     );
//!
//!     let state = handle.wait_settled().await;
//!     assert!(state.data.is_none());
//!     assert_eq!(state.error.and_then(|e| e.status()), Some(404));
//! }
//! ```
//!
//! ## Pattern 2: Hand-driven requests
//!
//! [`create_mock_source`] returns a source plus the receiving end of every
//! fetch it sees. Each fetch arrives as a [`PendingFetch`] that stays open
//! until the test answers it, so a test can hold one generation open, start
//! another, and then finish them in any order.
//!
//! ```rust
//! use fetch_controller::mock::{create_mock_source, expect_fetch};
//! use fetch_controller::{ControllerConfig, FetchController, RequestDescriptor};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let (source, mut fetches) = create_mock_source();
//!     let handle = FetchController::<serde_json::Value>::spawn(
//!         Arc::new(source),
//!         RequestDescriptor::new("https://api.test/a"),
//!         ControllerConfig::default(),
//!     );
//!
//!     let first = expect_fetch(&mut fetches).await.expect("first fetch");
//!
//!     let refetch = tokio::spawn({
//!         let handle = handle.clone();
//!         async move { handle.refetch(Some("https://api.test/b"), None).await }
//!     });
//!     let second = expect_fetch(&mut fetches).await.expect("second fetch");
//!     assert!(first.is_cancelled());
//!
//!     second.respond_json(json!({"from": "b"}));
//!     first.respond_json(json!({"from": "a"}));
//!     refetch.await.unwrap().unwrap();
//!
//!     assert_eq!(handle.state().data, Some(json!({"from": "b"})));
//! }
//! ```
//!
//! By default a [`MockSource`] ignores cancellation and waits for the test's
//! answer, modelling a transport that delivers late results. That leaves the
//! controller's generation check as the only thing keeping stale data out.
//! [`MockSource::honoring_cancellation`] makes it return
//! [`SourceError::Cancelled`] as soon as the token fires instead.

use crate::descriptor::RequestDescriptor;
use crate::error::SourceError;
use crate::source::{DataSource, SourceResponse};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

// =============================================================================
// HAND-DRIVEN SOURCE
// =============================================================================

/// A fetch waiting for the test to answer it.
///
/// Dropping it unanswered makes the fetch return [`SourceError::Cancelled`].
pub struct PendingFetch {
    pub descriptor: RequestDescriptor,
    pub cancel: CancellationToken,
    respond_to: oneshot::Sender<Result<SourceResponse, SourceError>>,
}

impl PendingFetch {
    pub fn resource(&self) -> &str {
        &self.descriptor.resource
    }

    /// Whether the controller has cancelled this request.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn respond(self, result: Result<SourceResponse, SourceError>) {
        let _ = self.respond_to.send(result);
    }

    pub fn respond_json(self, value: serde_json::Value) {
        self.respond(Ok(SourceResponse::json(&value)));
    }

    pub fn respond_status(self, status: u16) {
        self.respond(Ok(SourceResponse::status(status)));
    }

    pub fn fail(self, message: impl Into<String>) {
        self.respond(Err(SourceError::Network(message.into())));
    }
}

/// Data source whose fetches are answered by the test.
#[derive(Clone)]
pub struct MockSource {
    sender: mpsc::UnboundedSender<PendingFetch>,
    honor_cancellation: bool,
}

impl MockSource {
    /// Returns a copy that answers `Cancelled` as soon as the token fires.
    pub fn honoring_cancellation(mut self) -> Self {
        self.honor_cancellation = true;
        self
    }
}

#[async_trait]
impl DataSource for MockSource {
    async fn fetch(
        &self,
        descriptor: &RequestDescriptor,
        cancel: CancellationToken,
    ) -> Result<SourceResponse, SourceError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(PendingFetch {
                descriptor: descriptor.clone(),
                cancel: cancel.clone(),
                respond_to,
            })
            .map_err(|_| SourceError::Network("Mock receiver dropped".to_string()))?;

        if self.honor_cancellation {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(SourceError::Cancelled),
                result = response => result.unwrap_or(Err(SourceError::Cancelled)),
            }
        } else {
            response.await.unwrap_or(Err(SourceError::Cancelled))
        }
    }
}

/// Creates a hand-driven source and the receiver its fetches arrive on.
pub fn create_mock_source() -> (MockSource, mpsc::UnboundedReceiver<PendingFetch>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (
        MockSource {
            sender,
            honor_cancellation: false,
        },
        receiver,
    )
}

/// Waits for the next fetch.
pub async fn expect_fetch(
    receiver: &mut mpsc::UnboundedReceiver<PendingFetch>,
) -> Option<PendingFetch> {
    receiver.recv().await
}

// =============================================================================
// SCRIPTED SOURCE
// =============================================================================

struct Expectation {
    resource: String,
    response: Result<SourceResponse, SourceError>,
}

/// Data source that answers from a queue of expectations.
///
/// Each fetch consumes the oldest expectation queued for its resource, so
/// several controllers can share one source without agreeing on an order.
/// A fetch with no expectation left for its resource fails with a network
/// error naming it.
#[derive(Clone, Default)]
pub struct ScriptedSource {
    expectations: Arc<Mutex<VecDeque<Expectation>>>,
    calls: Arc<Mutex<Vec<RequestDescriptor>>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expects a fetch of `resource`.
    pub fn expect_fetch(&self, resource: impl Into<String>) -> FetchExpectationBuilder {
        FetchExpectationBuilder {
            resource: resource.into(),
            expectations: self.expectations.clone(),
        }
    }

    /// Every descriptor fetched so far, in order.
    pub fn calls(&self) -> Vec<RequestDescriptor> {
        self.calls.lock().unwrap().clone()
    }

    /// Panics unless every expectation was consumed.
    pub fn verify(&self) {
        let remaining = self.expectations.lock().unwrap().len();
        if remaining > 0 {
            panic!("Not all expectations were met. {} remaining", remaining);
        }
    }
}

#[async_trait]
impl DataSource for ScriptedSource {
    async fn fetch(
        &self,
        descriptor: &RequestDescriptor,
        _cancel: CancellationToken,
    ) -> Result<SourceResponse, SourceError> {
        self.calls.lock().unwrap().push(descriptor.clone());

        let mut expectations = self.expectations.lock().unwrap();
        let position = expectations
            .iter()
            .position(|expectation| expectation.resource == descriptor.resource);
        match position.and_then(|index| expectations.remove(index)) {
            Some(expectation) => expectation.response,
            None => Err(SourceError::Network(format!(
                "Unexpected fetch of {}",
                descriptor.resource
            ))),
        }
    }
}

/// Builder for fetch expectations.
pub struct FetchExpectationBuilder {
    resource: String,
    expectations: Arc<Mutex<VecDeque<Expectation>>>,
}

impl FetchExpectationBuilder {
    pub fn return_json(self, value: serde_json::Value) {
        self.push(Ok(SourceResponse::json(&value)));
    }

    pub fn return_status(self, status: u16) {
        self.push(Ok(SourceResponse::status(status)));
    }

    pub fn return_response(self, response: SourceResponse) {
        self.push(Ok(response));
    }

    pub fn return_err(self, error: SourceError) {
        self.push(Err(error));
    }

    fn push(self, response: Result<SourceResponse, SourceError>) {
        self.expectations.lock().unwrap().push_back(Expectation {
            resource: self.resource,
            response,
        });
    }
}
