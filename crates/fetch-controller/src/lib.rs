//! # Fetch Controller
//!
//! This crate manages the lifecycle of a single "current" asynchronous data
//! request: it dispatches the request, tracks `{data, loading, error}`,
//! supersedes in-flight requests when a new one starts, and offers manual
//! refetch and local data edits.
//!
//! ## Why an Actor?
//!
//! A controller is built like a small actor:
//!
//! - **Isolated state** – one Tokio task owns the state; nothing else writes it.
//! - **Sequential processing** – commands and request completions are handled
//!   one at a time, so "is this result still current?" is a plain comparison
//!   instead of a race.
//! - **Cheap handles** – consumers talk through a cloneable [`FetchHandle`] and
//!   read snapshots from a `watch` channel.
//!
//! ## Architecture Overview
//!
//! 1. **Descriptor Layer** ([`RequestDescriptor`]) – what to load and how.
//! 2. **Runtime Layer** ([`FetchController`]) – generations, cancellation,
//!    state transitions.
//! 3. **Interface Layer** ([`FetchHandle`]) – refetch, set_data, descriptor
//!    changes, snapshots.
//! 4. **Transport Layer** ([`DataSource`]) – [`HttpSource`] in production,
//!    [`mock`] sources in tests.
//!
//! ## Latest Generation Wins
//!
//! Every activation mints a new [`Generation`] and cancels the previous one's
//! token. Only the result of the most recently minted generation may change
//! state; earlier ones are discarded whether they succeeded or failed, and no
//! matter when they arrive.
//!
//! ```rust
//! use fetch_controller::mock::ScriptedSource;
//! use fetch_controller::{ControllerConfig, FetchController, Phase, RequestDescriptor};
//! use serde::Deserialize;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! #[derive(Clone, Debug, Deserialize, PartialEq)]
//! struct Post {
//!     id: u32,
//!     title: String,
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let source = ScriptedSource::new();
//!     source
//!         .expect_fetch("https://api.test/posts/1")
//!         .return_json(json!({"id": 1, "title": "hello"}));
//!     source
//!         .expect_fetch("https://api.test/posts/1")
//!         .return_status(404);
//!
//!     let handle = FetchController::<Post>::spawn(
//!         Arc::new(source),
//!         RequestDescriptor::new("https://api.test/posts/1"),
//!         ControllerConfig::default(),
//!     );
//!
//!     let state = handle.wait_settled().await;
//!     assert_eq!(state.phase(), Phase::Success);
//!     assert_eq!(state.data.unwrap().title, "hello");
//!
//!     // Failures land in state; refetch itself still succeeds.
//!     handle.refetch(None, None).await.unwrap();
//!     let state = handle.state();
//!     assert_eq!(state.phase(), Phase::Failed);
//!     assert!(state.data.is_none());
//!     assert!(state.error.unwrap().to_string().contains("404"));
//! }
//! ```
//!
//! ## Error Handling
//!
//! Request failures never propagate as `Err` from handle methods; they become
//! `state.error`. `Err` is reserved for programmer errors (malformed resource)
//! and a controller that has shut down. See [`FetchError`].
//!
//! ## Testing
//!
//! The [`mock`] module provides a scripted source for straightforward flows
//! and a hand-driven source for ordering and cancellation tests.

pub mod config;
pub mod controller;
pub mod descriptor;
pub mod error;
pub mod generation;
pub mod handle;
pub mod http;
pub mod message;
pub mod mock;
pub mod source;
pub mod state;
pub mod tracing;

// Re-export core types for convenience
pub use config::{ConfigError, ControllerConfig, SourceConfig};
pub use controller::FetchController;
pub use descriptor::{Method, RequestDescriptor, RequestOptions};
pub use error::{FetchError, SourceError};
pub use generation::Generation;
pub use handle::FetchHandle;
pub use http::HttpSource;
pub use source::{DataSource, SourceResponse};
pub use state::{Phase, RequestState};
