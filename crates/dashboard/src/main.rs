//! Walks the dashboard against the live API: loads posts and users, flips
//! the posts page into its error state and back, opens a post, and signs in
//! with the demo identity.
//!
//! ```bash
//! RUST_LOG=info cargo run -p dashboard
//! DASHBOARD_API_BASE_URL=http://localhost:3000 cargo run -p dashboard
//! ```

use dashboard::identity::menu::{AuthFooter, SIGN_IN_CALLBACK, SIGN_IN_PROVIDER};
use dashboard::identity::{InMemoryIdentity, SessionUser};
use dashboard::lifecycle::{Dashboard, DashboardError};
use dashboard::overview::metrics;
use dashboard::pages::post_detail::PostDetailView;
use dashboard::pages::posts::PostsView;
use dashboard::pages::users::UsersView;
use fetch_controller::tracing::setup_tracing;
use std::sync::Arc;
use tracing::{info, warn, Instrument};

#[tokio::main]
async fn main() -> Result<(), DashboardError> {
    setup_tracing();

    let identity = InMemoryIdentity::new().with_provider(
        SIGN_IN_PROVIDER,
        SessionUser {
            id: "demo".to_string(),
            name: Some("Demo User".to_string()),
            email: Some("demo@example.com".to_string()),
            image: None,
        },
    );
    let mut dashboard = Dashboard::from_env(Arc::new(identity))?;

    for card in metrics() {
        info!(title = card.title, value = card.value, "Metric");
    }

    let span = tracing::info_span!("posts");
    async {
        dashboard.posts.handle().wait_settled().await;
        log_posts(&dashboard.posts.view());

        dashboard.posts.toggle_simulated_error().await?;
        dashboard.posts.handle().wait_settled().await;
        log_posts(&dashboard.posts.view());

        dashboard.posts.toggle_simulated_error().await?;
        dashboard.posts.handle().wait_settled().await;
        log_posts(&dashboard.posts.view());
        Ok::<_, DashboardError>(())
    }
    .instrument(span)
    .await?;

    let detail = dashboard.open_post(1);
    detail.handle().wait_settled().await;
    match detail.view() {
        PostDetailView::Ready(post) => info!(id = post.id, title = %post.title, "Post loaded"),
        view => warn!(?view, "Post unavailable"),
    }

    dashboard.users.handle().wait_settled().await;
    if let UsersView::Ready { rows, .. } = dashboard.users.view() {
        info!(count = rows.len(), "Users loaded");
        if let Some(first) = rows.first() {
            let user = dashboard.users.select(first.id)?;
            info!(name = %user.name, city = %user.address.city, "Selected user");
        }
    }

    let redirect = dashboard
        .identity
        .sign_in(SIGN_IN_PROVIDER, SIGN_IN_CALLBACK)
        .await?;
    if let AuthFooter::SignOut { user_name, .. } =
        dashboard.sidebar(&redirect.location).await.footer
    {
        info!(user = %user_name, location = %redirect.location, "Signed in");
    }

    dashboard.shutdown().await?;
    info!("Demo completed successfully");
    Ok(())
}

fn log_posts(view: &PostsView) {
    match view {
        PostsView::Loading { .. } => info!("Posts still loading"),
        PostsView::Error(panel) => warn!(title = panel.title, message = %panel.message, "Posts failed"),
        PostsView::Ready { cards } => info!(count = cards.len(), "Posts loaded"),
    }
}
