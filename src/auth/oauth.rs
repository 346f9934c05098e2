//! OAuth identity providers
//!
//! A provider turns an authorization code into a verified
//! [`OAuthIdentity`]. Google is the only shipped implementation.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error, warn};

use super::authenticator::OAuthIdentity;
use crate::common::safe_email_log;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("token exchange failed: {0}")]
    Exchange(String),

    #[error("profile request failed: {0}")]
    Profile(String),

    #[error("provider did not return an email address")]
    MissingEmail,

    #[error("provider reports the email address as unverified")]
    UnverifiedEmail,
}

#[async_trait]
pub trait OAuthProvider: Send + Sync {
    /// Provider id used in routes and stored on linked accounts
    fn name(&self) -> &str;

    /// URL the browser is sent to, carrying the anti-forgery `state`
    fn authorization_url(&self, state: &str) -> String;

    /// Exchange the callback code for the signed-in identity
    async fn exchange_code(&self, code: &str) -> Result<OAuthIdentity, OAuthError>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    email: Option<String>,
    email_verified: Option<bool>,
    name: Option<String>,
}

pub struct GoogleProvider {
    client: Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

impl GoogleProvider {
    pub fn new(client: Client, client_id: String, client_secret: String, base_url: &str) -> Self {
        Self {
            client,
            client_id,
            client_secret,
            redirect_uri: format!("{}/api/auth/callback/google", base_url),
        }
    }
}

#[async_trait]
impl OAuthProvider for GoogleProvider {
    fn name(&self) -> &str {
        "google"
    }

    fn authorization_url(&self, state: &str) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}",
            GOOGLE_AUTH_URL,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode("openid email profile"),
            urlencoding::encode(state)
        )
    }

    async fn exchange_code(&self, code: &str) -> Result<OAuthIdentity, OAuthError> {
        let params = [
            ("code", code),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];

        debug!("Exchanging Google authorization code for tokens");

        let response = self
            .client
            .post(GOOGLE_TOKEN_URL)
            .form(&params)
            .send()
            .await
            .map_err(|e| OAuthError::Exchange(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = %status, error = %error_text, "Google token exchange failed");
            return Err(OAuthError::Exchange(format!("HTTP {}", status)));
        }

        let tokens = response
            .json::<TokenResponse>()
            .await
            .map_err(|e| OAuthError::Exchange(e.to_string()))?;

        let info = self
            .client
            .get(GOOGLE_USERINFO_URL)
            .bearer_auth(&tokens.access_token)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| OAuthError::Profile(e.to_string()))?
            .json::<GoogleUserInfo>()
            .await
            .map_err(|e| OAuthError::Profile(e.to_string()))?;

        let email = info.email.ok_or(OAuthError::MissingEmail)?;

        // Accounts are matched by email, so only verified addresses may link
        if info.email_verified != Some(true) {
            warn!(email = %safe_email_log(&email), "Google account email is not verified");
            return Err(OAuthError::UnverifiedEmail);
        }

        Ok(OAuthIdentity {
            provider: self.name().to_string(),
            email,
            name: info.name,
        })
    }
}
