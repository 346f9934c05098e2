//! Authentication handlers

use axum::{
    extract::{Extension, Json, Path, Query},
    response::Redirect,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::extractors::CurrentSession;
use super::models::{
    CompleteResetRequest, LoginRequest, LoginValidator, OAuthCallbackParams, RegisterRequest,
    RegisterValidator, ResetRequest,
};
use crate::common::{safe_email_log, ApiError, AppState, ValidationResult, Validator};

/// Cookie carrying the OAuth anti-forgery state between sign-in and callback
pub const OAUTH_STATE_COOKIE: &str = "rolegate.oauth-state";
const OAUTH_STATE_PATH: &str = "/api/auth/callback";

/// POST /api/register
/// Creates a credential account with the `user` role
///
/// # Request Body
/// ```json
/// { "name": "Alice", "email": "a@x.com", "password": "secret1" }
/// ```
pub async fn register(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<Value>, ApiError> {
    RegisterValidator.validate(&payload).into_result()?;

    let email = payload.email.trim();
    let identity = state
        .authenticator()
        .register(payload.name.trim(), email, &payload.password)
        .await
        .map_err(|e| {
            warn!(error = %e, email = %safe_email_log(email), "Registration failed");
            ApiError::from(e)
        })?;

    info!(user_id = %identity.id, email = %safe_email_log(email), "User registered");

    Ok(Json(json!({
        "message": "User registered successfully",
        "user": identity,
    })))
}

/// POST /api/auth/login
/// Credential sign-in; sets the session cookie
///
/// # Response
/// ```json
/// { "user": { "id": "U_...", "email": "...", "name": "...", "role": "user" }, "expires": "..." }
/// ```
pub async fn login(
    Extension(state): Extension<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<Value>), ApiError> {
    LoginValidator.validate(&payload).into_result()?;

    let identity = state
        .authenticator()
        .authenticate_credentials(payload.email.trim(), &payload.password)
        .await?;

    let (token, session) = state.sessions.issue(&identity)?;

    Ok((
        jar.add(state.sessions.session_cookie(token)),
        Json(json!({
            "user": identity,
            "expires": session.expires_rfc3339(),
        })),
    ))
}

/// POST /api/auth/logout
/// Clears the session cookie
pub async fn logout(
    Extension(state): Extension<Arc<AppState>>,
    session: CurrentSession,
    jar: CookieJar,
) -> (CookieJar, Json<Value>) {
    if let Some(s) = session.get() {
        info!(user_id = %s.id, "User signed out");
    }
    (
        jar.remove(state.sessions.removal_cookie()),
        Json(json!({ "message": "Logout successful" })),
    )
}

/// GET /api/auth/session
/// Current session snapshot for conditional rendering; `null` when anonymous
pub async fn session(session: CurrentSession) -> Json<Value> {
    match session.get() {
        Some(s) => Json(json!({
            "user": s.identity(),
            "expires": s.expires_rfc3339(),
        })),
        None => Json(json!({ "user": null, "expires": null })),
    }
}

/// GET /api/auth/signin/:provider
/// Redirects to the provider's consent screen
pub async fn oauth_signin(
    Extension(state): Extension<Arc<AppState>>,
    Path(provider_name): Path<String>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), ApiError> {
    let provider = state.oauth_provider(&provider_name).ok_or_else(|| {
        warn!(provider = %provider_name, "Sign-in requested for unknown provider");
        ApiError::NotFound("Unknown sign-in provider".to_string())
    })?;

    let csrf_state = Uuid::new_v4().simple().to_string();
    let cookie = Cookie::build((OAUTH_STATE_COOKIE, csrf_state.clone()))
        .path(OAUTH_STATE_PATH)
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.sessions.secure_cookies())
        .max_age(time::Duration::minutes(10))
        .build();

    info!(provider = %provider_name, "Starting OAuth sign-in");
    Ok((
        jar.add(cookie),
        Redirect::to(&provider.authorization_url(&csrf_state)),
    ))
}

/// Error codes understood by the `/auth/error` page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SignInError {
    Configuration,
    AccessDenied,
    OAuthCallback,
}

impl SignInError {
    fn code(&self) -> &'static str {
        match self {
            SignInError::Configuration => "Configuration",
            SignInError::AccessDenied => "AccessDenied",
            SignInError::OAuthCallback => "OAuthCallback",
        }
    }
}

/// GET /api/auth/callback/:provider
/// Completes OAuth sign-in, then redirects home (or to the error page)
pub async fn oauth_callback(
    Extension(state): Extension<Arc<AppState>>,
    Path(provider_name): Path<String>,
    Query(params): Query<OAuthCallbackParams>,
    jar: CookieJar,
) -> (CookieJar, Redirect) {
    let expected_state = jar.get(OAUTH_STATE_COOKIE).map(|c| c.value().to_string());
    let jar = jar.remove(Cookie::build((OAUTH_STATE_COOKIE, "")).path(OAUTH_STATE_PATH).build());

    match complete_oauth(&state, &provider_name, params, expected_state).await {
        Ok(token) => (
            jar.add(state.sessions.session_cookie(token)),
            Redirect::to("/"),
        ),
        Err(e) => (
            jar,
            Redirect::to(&format!("/auth/error?error={}", e.code())),
        ),
    }
}

async fn complete_oauth(
    state: &AppState,
    provider_name: &str,
    params: OAuthCallbackParams,
    expected_state: Option<String>,
) -> Result<String, SignInError> {
    let provider = state
        .oauth_provider(provider_name)
        .ok_or(SignInError::Configuration)?;

    if let Some(provider_error) = params.error {
        warn!(provider = %provider_name, oauth_error = %provider_error, "Provider returned an error");
        return Err(SignInError::AccessDenied);
    }

    let (Some(code), Some(returned_state)) = (params.code, params.state) else {
        warn!(provider = %provider_name, "OAuth callback missing code or state");
        return Err(SignInError::OAuthCallback);
    };

    if expected_state.as_deref() != Some(returned_state.as_str()) {
        warn!(provider = %provider_name, "OAuth state mismatch");
        return Err(SignInError::OAuthCallback);
    }

    let assertion = provider.exchange_code(&code).await.map_err(|e| {
        error!(error = %e, provider = %provider_name, "OAuth code exchange failed");
        SignInError::OAuthCallback
    })?;

    let identity = state
        .authenticator()
        .authenticate_oauth(&assertion)
        .await
        .map_err(|e| {
            error!(error = %e, provider = %provider_name, "OAuth account resolution failed");
            SignInError::OAuthCallback
        })?;

    let (token, _) = state.sessions.issue(&identity).map_err(|e| {
        error!(error = %e, user_id = %identity.id, "Session issuance failed");
        SignInError::OAuthCallback
    })?;

    Ok(token)
}

/// POST /api/reset
/// Starts a password reset; the answer is the same whether or not the
/// account exists
pub async fn request_password_reset(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<ResetRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut validation = ValidationResult::new();
    validation.require_email("email", &payload.email);
    validation.into_result()?;

    state
        .password_reset()
        .request_reset(payload.email.trim())
        .await?;

    Ok(Json(json!({
        "message": "If an account exists for that email, a reset link has been sent."
    })))
}

/// POST /api/reset/:token
/// Sets a new password using a one-time reset token
pub async fn complete_password_reset(
    Extension(state): Extension<Arc<AppState>>,
    Path(token): Path<String>,
    Json(payload): Json<CompleteResetRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut validation = ValidationResult::new();
    validation.require_password("password", &payload.password);
    validation.into_result()?;

    let email = state
        .password_reset()
        .complete_reset(&token, &payload.password)
        .await
        .map_err(|e| {
            warn!(error = %e, token = %crate::common::safe_token_log(&token), "Password reset failed");
            ApiError::from(e)
        })?;

    info!(email = %safe_email_log(&email), "Password updated through reset link");
    Ok(Json(json!({ "message": "Password has been reset successfully" })))
}
