//! Credential and OAuth authentication

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::password::{hash_password_blocking, verify_password_blocking, HashError};
use crate::authz::Role;
use crate::common::safe_email_log;
use crate::store::{StoreError, User, UserStore};

/// Authenticated identity, the input to session issuance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub role: Role,
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role(),
        }
    }
}

/// Identity asserted by an OAuth provider after a successful code exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthIdentity {
    pub provider: String,
    pub email: String,
    pub name: Option<String>,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("user not found")]
    NotFound,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Hashing(#[from] HashError),
}

/// Verifies credentials and OAuth assertions against the store
#[derive(Debug, Clone)]
pub struct Authenticator {
    store: UserStore,
}

impl Authenticator {
    pub fn new(store: UserStore) -> Self {
        Self { store }
    }

    /// Create a credential account. The role is always `user`.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Identity, AuthError> {
        let hash = hash_password_blocking(password.to_string()).await?;
        let user = self.store.insert_credential_user(name, email, &hash).await?;
        Ok(Identity::from(&user))
    }

    /// Credential sign-in: exact email lookup, then a constant-time
    /// comparison against the stored hash.
    pub async fn authenticate_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity, AuthError> {
        let user = self.store.find_by_email(email).await?.ok_or_else(|| {
            warn!(email = %safe_email_log(email), "Sign-in failed: user not found");
            AuthError::NotFound
        })?;

        // OAuth-only accounts have nothing to compare against
        let Some(hash) = user.password_hash.clone() else {
            warn!(user_id = %user.id, "Sign-in failed: account has no password");
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password_blocking(hash, password.to_string()).await? {
            warn!(user_id = %user.id, "Sign-in failed: invalid password");
            return Err(AuthError::InvalidCredentials);
        }

        info!(user_id = %user.id, role = %user.role(), "User signed in with credentials");
        Ok(Identity::from(&user))
    }

    /// OAuth sign-in: find the account by email or create it.
    ///
    /// An existing account without a provider gets this one attached; an
    /// account already linked keeps its provider. Role is never changed here.
    pub async fn authenticate_oauth(&self, assertion: &OAuthIdentity) -> Result<Identity, AuthError> {
        let user = match self.store.find_by_email(&assertion.email).await? {
            Some(existing) => self.link_if_unlinked(existing, &assertion.provider).await?,
            None => self.create_or_reuse(assertion).await?,
        };

        info!(
            user_id = %user.id,
            provider = %assertion.provider,
            role = %user.role(),
            "User signed in with OAuth"
        );

        let mut identity = Identity::from(&user);
        if identity.name.is_none() {
            identity.name = assertion.name.clone();
        }
        Ok(identity)
    }

    async fn create_or_reuse(&self, assertion: &OAuthIdentity) -> Result<User, AuthError> {
        match self
            .store
            .insert_oauth_user(assertion.name.as_deref(), &assertion.email, &assertion.provider)
            .await
        {
            Ok(user) => Ok(user),
            Err(StoreError::DuplicateEmail) => {
                // A concurrent sign-in created the account between our lookup
                // and insert; the unique index turned that into this error.
                debug!(
                    email = %safe_email_log(&assertion.email),
                    "OAuth account created concurrently, reusing it"
                );
                let user = self
                    .store
                    .find_by_email(&assertion.email)
                    .await?
                    .ok_or(AuthError::NotFound)?;
                self.link_if_unlinked(user, &assertion.provider).await
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn link_if_unlinked(&self, mut user: User, provider: &str) -> Result<User, AuthError> {
        if user.oauth_provider.is_none() && self.store.link_oauth_provider(&user.id, provider).await? {
            info!(user_id = %user.id, provider = %provider, "Linked OAuth provider to existing account");
            user.oauth_provider = Some(provider.to_string());
        }
        Ok(user)
    }
}
