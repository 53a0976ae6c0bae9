//! # Dashboard Lifecycle
//!
//! Starts the controllers behind every page, hands out the pages, and stops
//! everything on shutdown.
//!
//! Each page comes out of its constructor together with an unstarted
//! [`FetchController`](fetch_controller::FetchController). The dashboard runs
//! each controller on its own Tokio task and keeps the join handles, so
//! shutdown can wait for every controller to finish:
//!
//! 1. **Shutdown** every page handle, which cancels in-flight requests
//! 2. **Await** all controller tasks
//!
//! A controller already shut down through its page answers
//! `ControllerClosed`, which is ignored.

use crate::endpoints::{Endpoints, DEFAULT_API_BASE_URL};
use crate::identity::menu::{sidebar, Sidebar};
use crate::identity::{IdentityError, IdentityService};
use crate::model::Post;
use crate::pages::post_detail::PostDetailPage;
use crate::pages::posts::PostsPage;
use crate::pages::users::UsersPage;
use crate::pages::PageError;
use fetch_controller::{
    ConfigError, ControllerConfig, DataSource, FetchError, FetchHandle, HttpSource, SourceConfig,
    SourceError,
};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Data source error: {0}")]
    Source(#[from] SourceError),

    #[error(transparent)]
    Page(#[from] PageError),

    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    #[error("Controller task failed: {0}")]
    TaskFailed(String),
}

/// The running dashboard: one page per view plus the identity service.
pub struct Dashboard {
    pub posts: PostsPage,
    pub users: UsersPage,
    pub identity: Arc<dyn IdentityService>,
    source: Arc<dyn DataSource>,
    endpoints: Endpoints,
    config: ControllerConfig,
    details: Vec<FetchHandle<Post>>,
    handles: Vec<JoinHandle<()>>,
}

impl Dashboard {
    /// Starts the posts and users controllers against `source`.
    pub fn new(
        source: Arc<dyn DataSource>,
        endpoints: Endpoints,
        config: ControllerConfig,
        identity: Arc<dyn IdentityService>,
    ) -> Self {
        let (posts_controller, posts) = PostsPage::new(source.clone(), endpoints.clone(), config);
        let (users_controller, users) = UsersPage::new(source.clone(), &endpoints, config);

        let handles = vec![
            tokio::spawn(posts_controller.run()),
            tokio::spawn(users_controller.run()),
        ];
        info!(base = endpoints.base(), "Dashboard started");

        Self {
            posts,
            users,
            identity,
            source,
            endpoints,
            config,
            details: Vec::new(),
            handles,
        }
    }

    /// Builds an HTTP-backed dashboard from the process environment.
    pub fn from_env(identity: Arc<dyn IdentityService>) -> Result<Self, DashboardError> {
        Self::from_lookup(|key| std::env::var(key).ok(), identity)
    }

    /// Like [`from_env`](Self::from_env), reading variables from `lookup`.
    ///
    /// Without a configured base URL the public placeholder API is used.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        identity: Arc<dyn IdentityService>,
    ) -> Result<Self, DashboardError> {
        let mut source_config = SourceConfig::from_lookup(&lookup)?;
        if source_config.base_url.is_none() {
            source_config = source_config.with_base_url(DEFAULT_API_BASE_URL)?;
        }
        let endpoints = Endpoints::new(
            source_config
                .base_url
                .as_deref()
                .unwrap_or(DEFAULT_API_BASE_URL),
        );
        let config = ControllerConfig::from_lookup(&lookup)?;
        let source = HttpSource::new(&source_config)?;
        Ok(Self::new(Arc::new(source), endpoints, config, identity))
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Opens the detail page for one post. Its controller is stopped with
    /// the rest of the dashboard.
    pub fn open_post(&mut self, id: u32) -> PostDetailPage {
        let (controller, page) =
            PostDetailPage::new(self.source.clone(), &self.endpoints, id, self.config);
        self.handles.push(tokio::spawn(controller.run()));
        self.details.push(page.handle().clone());
        page
    }

    /// The sidebar for `pathname` under the current session.
    pub async fn sidebar(&self, pathname: &str) -> Sidebar {
        sidebar(pathname, &self.identity.session().await)
    }

    /// Stops every controller and waits for their tasks to finish.
    pub async fn shutdown(self) -> Result<(), DashboardError> {
        info!("Shutting down dashboard...");

        ignore_closed(self.posts.handle().shutdown().await)?;
        ignore_closed(self.users.handle().shutdown().await)?;
        for detail in &self.details {
            ignore_closed(detail.shutdown().await)?;
        }

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Controller task failed: {:?}", e);
                return Err(DashboardError::TaskFailed(e.to_string()));
            }
        }

        info!("Dashboard shutdown complete.");
        Ok(())
    }
}

fn ignore_closed(result: Result<(), FetchError>) -> Result<(), DashboardError> {
    match result {
        Ok(()) | Err(FetchError::ControllerClosed) => Ok(()),
        Err(e) => Err(PageError::from(e).into()),
    }
}
