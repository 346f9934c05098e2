//! Session extractor for Axum

use async_trait::async_trait;
use axum::{
    extract::{Extension, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;
use tracing::debug;

use super::session::{Session, SESSION_COOKIE};
use crate::common::{ApiError, AppState};

/// The caller's session, or `None` for anonymous requests.
///
/// Never rejects on a bad or expired cookie: those are anonymous. Handlers
/// decide what anonymous means for them through the authorization guard.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Option<Session>);

impl CurrentSession {
    pub fn get(&self) -> Option<&Session> {
        self.0.as_ref()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // Extract the Extension containing the AppState
        let Extension(app_state): Extension<Arc<AppState>> =
            Extension::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::InternalServer("missing app state".to_string()))?;

        let jar = CookieJar::from_headers(&parts.headers);
        let session = jar
            .get(SESSION_COOKIE)
            .and_then(|cookie| app_state.sessions.decode(cookie.value()));

        match &session {
            Some(s) => debug!(user_id = %s.id, role = %s.role, "Session resolved"),
            None => debug!("Anonymous request"),
        }

        Ok(CurrentSession(session))
    }
}
