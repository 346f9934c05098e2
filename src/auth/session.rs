//! Session tokens
//!
//! A session is a signed HS256 JWT carried in an HTTP-only cookie. It is a
//! snapshot of the account taken at sign-in: the role inside it does not
//! change until the user signs in again.

use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::{TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::authenticator::Identity;
use crate::authz::Role;
use crate::common::AuthConfig;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "rolegate.session-token";

/// JWT claims structure
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub name: Option<String>,
    pub role: Role,
    pub iat: usize,
    pub exp: usize,
}

/// Decoded session exposed to handlers and pages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub role: Role,
    pub issued_at: i64,
    pub expires_at: i64,
}

impl Session {
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.id.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.role,
        }
    }

    pub fn expires_rfc3339(&self) -> Option<String> {
        Utc.timestamp_opt(self.expires_at, 0)
            .single()
            .map(crate::store::timestamp)
    }
}

impl From<Claims> for Session {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
            name: claims.name,
            role: claims.role,
            issued_at: claims.iat as i64,
            expires_at: claims.exp as i64,
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to sign session token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// Issues, decodes and renews session tokens
#[derive(Clone)]
pub struct SessionCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    max_age_secs: i64,
    update_age_secs: i64,
    secure_cookies: bool,
}

impl SessionCodec {
    pub fn new(secret: &str, max_age_secs: i64, update_age_secs: i64, secure_cookies: bool) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            max_age_secs,
            update_age_secs,
            secure_cookies,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(
            &config.jwt_secret,
            config.session_max_age_secs,
            config.session_update_age_secs,
            config.production,
        )
    }

    /// Sign a token for `identity`, valid from now for the configured lifetime.
    pub fn issue(&self, identity: &Identity) -> Result<(String, Session), SessionError> {
        self.issue_at(identity, Utc::now().timestamp())
    }

    pub fn issue_at(
        &self,
        identity: &Identity,
        issued_at: i64,
    ) -> Result<(String, Session), SessionError> {
        let claims = Claims {
            sub: identity.id.clone(),
            email: identity.email.clone(),
            name: identity.name.clone(),
            role: identity.role,
            iat: issued_at.max(0) as usize,
            exp: (issued_at + self.max_age_secs).max(0) as usize,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        Ok((token, claims.into()))
    }

    /// Decode a token. Bad signatures, expired tokens and tokens with a role
    /// outside the known set all come back as `None`.
    pub fn decode(&self, token: &str) -> Option<Session> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        match decode::<Claims>(token, &self.decoding, &validation) {
            Ok(data) => Some(data.claims.into()),
            Err(e) => {
                debug!(error = %e, "Session token rejected");
                None
            }
        }
    }

    /// A session becomes eligible for silent renewal once `update_age` has
    /// passed since it was issued.
    pub fn needs_renewal(&self, session: &Session, now: i64) -> bool {
        now - session.issued_at >= self.update_age_secs && now < session.expires_at
    }

    /// Reissue the same snapshot with a fresh lifetime. The role is copied
    /// from the old token, not re-read from the store.
    pub fn renew(&self, session: &Session) -> Result<(String, Session), SessionError> {
        self.issue(&session.identity())
    }

    pub fn session_cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, token))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure_cookies)
            .max_age(time::Duration::seconds(self.max_age_secs))
            .build()
    }

    /// Cookie value used to find and remove the session cookie
    pub fn removal_cookie(&self) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, "")).path("/").build()
    }

    pub fn secure_cookies(&self) -> bool {
        self.secure_cookies
    }
}
