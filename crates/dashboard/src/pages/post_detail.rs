//! # Post Detail Page
//!
//! One post loaded from `/posts/{id}`.

use super::PageError;
use crate::endpoints::Endpoints;
use crate::model::Post;
use fetch_controller::{
    ControllerConfig, DataSource, FetchController, FetchHandle, RequestDescriptor,
};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostDetailView {
    Loading,
    /// Shown for any failure, and for an empty or id-less answer.
    NotFound,
    Ready(Post),
}

pub struct PostDetailPage {
    handle: FetchHandle<Post>,
    id: u32,
}

impl PostDetailPage {
    pub fn new(
        source: Arc<dyn DataSource>,
        endpoints: &Endpoints,
        id: u32,
        config: ControllerConfig,
    ) -> (FetchController<Post>, Self) {
        let descriptor = RequestDescriptor::new(endpoints.post(id));
        let (controller, handle) = FetchController::new(source, descriptor, config);
        (controller, Self { handle, id })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn handle(&self) -> &FetchHandle<Post> {
        &self.handle
    }

    pub fn view(&self) -> PostDetailView {
        let state = self.handle.state();
        if state.loading {
            return PostDetailView::Loading;
        }
        match (state.error, state.data) {
            (None, Some(post)) if post.id != 0 => PostDetailView::Ready(post),
            _ => PostDetailView::NotFound,
        }
    }
}

/// Parses the `{id}` segment of a `/posts/{id}` route.
pub fn parse_post_id(segment: &str) -> Result<u32, PageError> {
    segment
        .trim()
        .parse()
        .map_err(|_| PageError::InvalidPostId(segment.to_string()))
}
