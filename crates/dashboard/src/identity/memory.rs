use super::{IdentityError, IdentityService, Redirect, SessionState, SessionUser};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::info;

/// Identity service that signs in instantly with a preset user per provider.
pub struct InMemoryIdentity {
    providers: HashMap<String, SessionUser>,
    session: RwLock<SessionState>,
}

impl Default for InMemoryIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryIdentity {
    /// Starts signed out with no providers.
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
            session: RwLock::new(SessionState::Unauthenticated),
        }
    }

    pub fn with_provider(mut self, provider_id: impl Into<String>, user: SessionUser) -> Self {
        self.providers.insert(provider_id.into(), user);
        self
    }

    pub fn with_session(self, session: SessionState) -> Self {
        Self {
            session: RwLock::new(session),
            ..self
        }
    }
}

fn check_callback(callback_url: &str) -> Result<(), IdentityError> {
    if callback_url.starts_with('/') && !callback_url.starts_with("//") {
        Ok(())
    } else {
        Err(IdentityError::InvalidCallback(callback_url.to_string()))
    }
}

#[async_trait]
impl IdentityService for InMemoryIdentity {
    async fn session(&self) -> SessionState {
        self.session.read().await.clone()
    }

    async fn sign_in(
        &self,
        provider_id: &str,
        callback_url: &str,
    ) -> Result<Redirect, IdentityError> {
        check_callback(callback_url)?;
        let user = self
            .providers
            .get(provider_id)
            .cloned()
            .ok_or_else(|| IdentityError::UnknownProvider(provider_id.to_string()))?;
        info!(provider = provider_id, user_id = %user.id, "Signed in");
        *self.session.write().await = SessionState::Authenticated(user);
        Ok(Redirect {
            location: callback_url.to_string(),
        })
    }

    async fn sign_out(&self, callback_url: &str) -> Result<Redirect, IdentityError> {
        check_callback(callback_url)?;
        *self.session.write().await = SessionState::Unauthenticated;
        info!("Signed out");
        Ok(Redirect {
            location: callback_url.to_string(),
        })
    }
}
