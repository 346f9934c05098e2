// src/session_middleware.rs
//! Sliding session renewal
//!
//! A valid session older than the update age gets a freshly signed cookie
//! on the way out. The renewed token copies the role from the old one, so a
//! role change still needs a new sign-in to show up.

use axum::{
    extract::{Extension, Request},
    http::header::{HeaderValue, SET_COOKIE},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, error};

use crate::auth::SESSION_COOKIE;
use crate::common::AppState;

fn sets_session_cookie(response: &Response) -> bool {
    let prefix = format!("{}=", SESSION_COOKIE);
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.starts_with(&prefix))
}

pub async fn renew_session(
    Extension(state): Extension<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let current = CookieJar::from_headers(request.headers())
        .get(SESSION_COOKIE)
        .and_then(|cookie| state.sessions.decode(cookie.value()));

    let mut response = next.run(request).await;

    let Some(session) = current else {
        return response;
    };
    if !state.sessions.needs_renewal(&session, Utc::now().timestamp()) {
        return response;
    }
    // Sign-in and sign-out already decided what the cookie should be
    if sets_session_cookie(&response) {
        return response;
    }

    match state.sessions.renew(&session) {
        Ok((token, _)) => {
            let cookie = state.sessions.session_cookie(token).to_string();
            match HeaderValue::from_str(&cookie) {
                Ok(value) => {
                    response.headers_mut().append(SET_COOKIE, value);
                    debug!(user_id = %session.id, "Session renewed");
                }
                Err(e) => error!(error = %e, "Renewed session cookie is not a valid header"),
            }
        }
        Err(e) => error!(error = %e, user_id = %session.id, "Session renewal failed"),
    }
    response
}
