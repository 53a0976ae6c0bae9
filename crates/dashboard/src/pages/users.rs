//! # Users Page
//!
//! A table of users from `/users`. Clicking a row opens a detail modal for
//! that user; the selection is page-local and never triggers a request.

use super::{ErrorPanel, PageError};
use crate::endpoints::Endpoints;
use crate::model::User;
use fetch_controller::{
    ControllerConfig, DataSource, FetchController, FetchHandle, RequestDescriptor,
};
use std::sync::Arc;
use tracing::{debug, instrument};

pub const USER_COLUMNS: [&str; 3] = ["Name", "Email", "Company"];
/// Skeleton rows shown while loading.
pub const LOADING_ROWS: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRow {
    pub id: u32,
    pub name: String,
    pub email: String,
    pub company: String,
}

impl From<&User> for UserRow {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            company: user.company.name.clone(),
        }
    }
}

/// Contents of the detail modal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDetail {
    pub title: String,
    pub fields: Vec<(&'static str, String)>,
}

impl From<&User> for UserDetail {
    fn from(user: &User) -> Self {
        Self {
            title: user.name.clone(),
            fields: vec![
                ("Email", user.email.clone()),
                ("Company", user.company.name.clone()),
                ("Phone", user.phone.clone()),
                ("Website", user.website.clone()),
                ("City", user.address.city.clone()),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsersView {
    Loading { rows: usize, cols: usize },
    Error(ErrorPanel),
    Ready {
        rows: Vec<UserRow>,
        detail: Option<UserDetail>,
    },
}

pub struct UsersPage {
    handle: FetchHandle<Vec<User>>,
    selected: Option<User>,
}

impl UsersPage {
    pub fn new(
        source: Arc<dyn DataSource>,
        endpoints: &Endpoints,
        config: ControllerConfig,
    ) -> (FetchController<Vec<User>>, Self) {
        let descriptor = RequestDescriptor::new(endpoints.users());
        let (controller, handle) = FetchController::new(source, descriptor, config);
        let page = Self {
            handle,
            selected: None,
        };
        (controller, page)
    }

    pub fn handle(&self) -> &FetchHandle<Vec<User>> {
        &self.handle
    }

    /// Opens the detail modal for a user in the loaded table.
    #[instrument(skip(self))]
    pub fn select(&mut self, user_id: u32) -> Result<&User, PageError> {
        let user = self
            .handle
            .state()
            .data
            .and_then(|users| users.into_iter().find(|user| user.id == user_id))
            .ok_or(PageError::UnknownUser(user_id))?;
        debug!(name = %user.name, "Opening detail");
        Ok(self.selected.insert(user))
    }

    pub fn close_detail(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<&User> {
        self.selected.as_ref()
    }

    /// Reloads the table. An open detail stays open.
    pub async fn refresh(&self) -> Result<(), PageError> {
        self.handle.refetch(None, None).await?;
        Ok(())
    }

    pub fn view(&self) -> UsersView {
        let state = self.handle.state();
        if state.loading {
            return UsersView::Loading {
                rows: LOADING_ROWS,
                cols: USER_COLUMNS.len(),
            };
        }
        if let Some(error) = state.error {
            return UsersView::Error(ErrorPanel {
                title: "Failed to load users.",
                hint: "Try refreshing or go back to the dashboard.",
                message: error.to_string(),
            });
        }
        UsersView::Ready {
            rows: state
                .data
                .unwrap_or_default()
                .iter()
                .map(UserRow::from)
                .collect(),
            detail: self.selected.as_ref().map(UserDetail::from),
        }
    }
}
