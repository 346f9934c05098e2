//! Password reset tokens

use chrono::{Duration, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use super::password::{hash_password_blocking, HashError};
use crate::common::{safe_email_log, AuthConfig};
use crate::services::email::password_reset_email;
use crate::services::Mailer;
use crate::store::{StoreError, UserStore};

#[derive(Debug, Error)]
pub enum ResetError {
    #[error("invalid or expired reset token")]
    InvalidToken,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Hashing(#[from] HashError),
}

/// Issues and redeems one-time password reset links
pub struct PasswordReset {
    store: UserStore,
    mailer: Arc<dyn Mailer>,
    base_url: String,
    ttl: Duration,
}

impl PasswordReset {
    pub fn new(store: UserStore, mailer: Arc<dyn Mailer>, config: &AuthConfig) -> Self {
        Self {
            store,
            mailer,
            base_url: config.base_url.clone(),
            ttl: Duration::seconds(config.reset_token_ttl_secs),
        }
    }

    /// Start a reset for `email`.
    ///
    /// Unknown addresses are a silent no-op so the caller's response never
    /// reveals whether an account exists. Delivery failures are logged only.
    pub async fn request_reset(&self, email: &str) -> Result<(), ResetError> {
        if self.store.find_by_email(email).await?.is_none() {
            info!(email = %safe_email_log(email), "Password reset requested for unknown email");
            return Ok(());
        }

        let token = Uuid::new_v4().simple().to_string();
        self.store
            .insert_reset_token(&token, email, Utc::now() + self.ttl)
            .await?;

        let link = format!("{}/reset/{}", self.base_url, token);
        let html = password_reset_email(&link, self.ttl.num_minutes());

        if let Err(e) = self.mailer.send(email, "Reset your password", &html).await {
            warn!(error = %e, email = %safe_email_log(email), "Failed to deliver password reset email");
        } else {
            info!(email = %safe_email_log(email), "Password reset email dispatched");
        }
        Ok(())
    }

    /// Redeem `token` and set a new password. Returns the account email.
    pub async fn complete_reset(&self, token: &str, new_password: &str) -> Result<String, ResetError> {
        let hash = hash_password_blocking(new_password.to_string()).await?;
        self.store
            .consume_reset_token(token, &hash, Utc::now())
            .await?
            .ok_or(ResetError::InvalidToken)
    }
}
