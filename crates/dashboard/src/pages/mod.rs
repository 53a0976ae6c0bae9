//! # Pages
//!
//! Each data-bearing page owns one [`FetchHandle`](fetch_controller::FetchHandle)
//! and turns its `{data, loading, error}` state into a view model: the thing
//! a renderer would draw. Pages never render markup themselves.
//!
//! A page is created together with its controller, the same way an actor is
//! created together with its client:
//!
//! ```rust
//! use dashboard::endpoints::Endpoints;
//! use dashboard::pages::posts::{PostsPage, PostsView};
//! use fetch_controller::mock::ScriptedSource;
//! use fetch_controller::ControllerConfig;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let endpoints = Endpoints::new("https://api.test");
//!     let source = ScriptedSource::new();
//!     source
//!         .expect_fetch(endpoints.posts())
//!         .return_json(json!([{"id": 1, "title": "hello", "body": "world"}]));
//!
//!     let (controller, page) =
//!         PostsPage::new(Arc::new(source), endpoints, ControllerConfig::default());
//!     tokio::spawn(controller.run());
//!
//!     page.handle().wait_settled().await;
//!     assert!(matches!(page.view(), PostsView::Ready { cards } if cards.len() == 1));
//! }
//! ```

pub mod post_detail;
pub mod posts;
pub mod profile;
pub mod users;

use fetch_controller::FetchError;

/// Errors returned by page actions.
///
/// Request failures are not here; they show up in the page's view.
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("User {0} is not loaded")]
    UnknownUser(u32),

    #[error("Invalid post id: {0:?}")]
    InvalidPostId(String),
}

/// The panel shown in place of content when a request failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorPanel {
    pub title: &'static str,
    pub hint: &'static str,
    /// The underlying failure, e.g. `Request failed: 404`.
    pub message: String,
}
