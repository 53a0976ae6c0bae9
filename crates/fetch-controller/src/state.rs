//! # Request State
//!
//! The `{data, loading, error}` snapshot a controller publishes after every
//! transition.

use crate::error::FetchError;

/// Lifecycle phase derived from a [`RequestState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Never activated and holding nothing.
    Idle,
    Loading,
    Success,
    Failed,
}

/// Read-only view of a controller's current request.
///
/// Stale `data` stays visible while a new request loads. After a normal
/// settlement `data` and `error` are never both present.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestState<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<FetchError>,
}

impl<T> RequestState<T> {
    /// State of a controller that is about to dispatch its first request.
    pub fn loading() -> Self {
        Self {
            data: None,
            loading: true,
            error: None,
        }
    }

    /// State of a controller created with `skip` set.
    pub fn idle() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
        }
    }

    pub fn phase(&self) -> Phase {
        if self.loading {
            Phase::Loading
        } else if self.error.is_some() {
            Phase::Failed
        } else if self.data.is_some() {
            Phase::Success
        } else {
            Phase::Idle
        }
    }

    pub fn is_settled(&self) -> bool {
        !self.loading
    }

    pub(crate) fn begin_loading(&mut self) {
        self.loading = true;
        self.error = None;
    }

    pub(crate) fn stop_loading(&mut self) {
        self.loading = false;
    }

    pub(crate) fn succeed(&mut self, data: T) {
        self.data = Some(data);
        self.loading = false;
        self.error = None;
    }

    pub(crate) fn fail(&mut self, error: FetchError) {
        self.data = None;
        self.loading = false;
        self.error = Some(error);
    }
}
