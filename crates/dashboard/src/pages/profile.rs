//! # Profile Page
//!
//! Requires a signed-in user. While the session loads a skeleton card is
//! shown; a signed-out visitor is sent to the sign-in page.

use crate::identity::{IdentityError, IdentityService, Redirect, SessionState};

pub const SIGN_IN_ROUTE: &str = "/auth/signin";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileCard {
    pub name: String,
    pub email: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileView {
    Loading,
    Redirect(Redirect),
    Ready(ProfileCard),
}

pub fn profile_view(session: &SessionState) -> ProfileView {
    match session {
        SessionState::Loading => ProfileView::Loading,
        SessionState::Unauthenticated => ProfileView::Redirect(Redirect {
            location: SIGN_IN_ROUTE.to_string(),
        }),
        SessionState::Authenticated(user) => ProfileView::Ready(ProfileCard {
            name: user.display_name().to_string(),
            email: user.email.clone(),
            image: user.image.clone(),
        }),
    }
}

/// Signing out from the profile lands on the sign-in page.
pub async fn sign_out(identity: &dyn IdentityService) -> Result<Redirect, IdentityError> {
    identity.sign_out(SIGN_IN_ROUTE).await
}
