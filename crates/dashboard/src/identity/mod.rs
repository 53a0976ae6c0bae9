//! # Identity
//!
//! The dashboard's view of the sign-in provider: who is signed in, plus
//! sign-in and sign-out calls that answer with where to navigate next.
//! The provider itself is external; [`InMemoryIdentity`] stands in for it in
//! the demo and in tests.

pub mod memory;
pub mod menu;

pub use memory::InMemoryIdentity;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub image: Option<String>,
}

impl SessionUser {
    /// Name to show, falling back to `User`.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("User")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// The provider has not answered yet.
    Loading,
    Authenticated(SessionUser),
    Unauthenticated,
}

impl SessionState {
    pub fn user(&self) -> Option<&SessionUser> {
        match self {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }
}

/// Where the browser goes after a sign-in or sign-out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("Callback must be a local path: {0:?}")]
    InvalidCallback(String),
}

#[async_trait]
pub trait IdentityService: Send + Sync {
    async fn session(&self) -> SessionState;

    async fn sign_in(
        &self,
        provider_id: &str,
        callback_url: &str,
    ) -> Result<Redirect, IdentityError>;

    async fn sign_out(&self, callback_url: &str) -> Result<Redirect, IdentityError>;
}
