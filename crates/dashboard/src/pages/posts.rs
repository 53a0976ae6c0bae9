//! # Posts Page
//!
//! A grid of post cards loaded from `/posts`, with a switch that points the
//! page at a route that always fails so the error panel can be seen.

use super::{ErrorPanel, PageError};
use crate::endpoints::Endpoints;
use crate::model::Post;
use fetch_controller::{
    ControllerConfig, DataSource, FetchController, FetchHandle, RequestDescriptor,
};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Cards shown at most.
pub const POSTS_SHOWN: usize = 18;
/// Skeleton cards shown while loading.
pub const LOADING_PLACEHOLDERS: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostCard {
    pub title: String,
    pub body: String,
    /// Link behind "Read more".
    pub href: String,
}

impl From<Post> for PostCard {
    fn from(post: Post) -> Self {
        Self {
            href: format!("/posts/{}", post.id),
            title: post.title,
            body: post.body,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostsView {
    /// `cards` holds the previous result, if any, while a reload runs.
    Loading {
        placeholders: usize,
        cards: Vec<PostCard>,
    },
    Error(ErrorPanel),
    Ready { cards: Vec<PostCard> },
}

pub struct PostsPage {
    handle: FetchHandle<Vec<Post>>,
    endpoints: Endpoints,
    simulate_error: bool,
}

impl PostsPage {
    /// Creates the page and the controller behind it. The controller starts
    /// loading `/posts` as soon as it runs.
    pub fn new(
        source: Arc<dyn DataSource>,
        endpoints: Endpoints,
        config: ControllerConfig,
    ) -> (FetchController<Vec<Post>>, Self) {
        let descriptor = RequestDescriptor::new(endpoints.posts());
        let (controller, handle) = FetchController::new(source, descriptor, config);
        let page = Self {
            handle,
            endpoints,
            simulate_error: false,
        };
        (controller, page)
    }

    pub fn handle(&self) -> &FetchHandle<Vec<Post>> {
        &self.handle
    }

    pub fn is_simulating_error(&self) -> bool {
        self.simulate_error
    }

    /// Label for the error switch.
    pub fn toggle_label(&self) -> &'static str {
        if self.simulate_error {
            "Disable error"
        } else {
            "Simulate error"
        }
    }

    /// Flips between the real posts route and the failing one.
    ///
    /// Returns whether the switch started a new request.
    #[instrument(skip(self))]
    pub async fn toggle_simulated_error(&mut self) -> Result<bool, PageError> {
        let simulate_error = !self.simulate_error;
        let resource = if simulate_error {
            self.endpoints.invalid_posts()
        } else {
            self.endpoints.posts()
        };
        debug!(%resource, "Switching resource");
        let started = self.handle.set_resource(resource).await?;
        self.simulate_error = simulate_error;
        Ok(started)
    }

    /// Reloads the current resource and waits for the result.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<(), PageError> {
        debug!("Sending request");
        self.handle.refetch(None, None).await?;
        Ok(())
    }

    pub fn view(&self) -> PostsView {
        let state = self.handle.state();
        if let Some(error) = state.error {
            return PostsView::Error(ErrorPanel {
                title: "Failed to load posts.",
                hint: "Try again or disable the error.",
                message: error.to_string(),
            });
        }
        let cards = state
            .data
            .unwrap_or_default()
            .into_iter()
            .take(POSTS_SHOWN)
            .map(PostCard::from)
            .collect();
        if state.loading {
            PostsView::Loading {
                placeholders: LOADING_PLACEHOLDERS,
                cards,
            }
        } else {
            PostsView::Ready { cards }
        }
    }
}
