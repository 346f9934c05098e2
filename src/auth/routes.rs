//! Authentication routes

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;

/// Creates and returns the authentication router
///
/// # Routes
/// - `POST /api/register` - Credential registration
/// - `POST /api/auth/login` - Credential sign-in
/// - `POST /api/auth/logout` - Sign-out (clears the session cookie)
/// - `GET /api/auth/session` - Current session snapshot
/// - `GET /api/auth/signin/:provider` - Start OAuth sign-in
/// - `GET /api/auth/callback/:provider` - OAuth callback
/// - `POST /api/reset` - Request a password reset link
/// - `POST /api/reset/:token` - Complete a password reset
pub fn auth_routes() -> Router {
    Router::new()
        .route("/api/register", post(handlers::register))
        .route("/api/auth/login", post(handlers::login))
        .route("/api/auth/logout", post(handlers::logout))
        .route("/api/auth/session", get(handlers::session))
        .route("/api/auth/signin/:provider", get(handlers::oauth_signin))
        .route("/api/auth/callback/:provider", get(handlers::oauth_callback))
        .route("/api/reset", post(handlers::request_password_reset))
        .route("/api/reset/:token", post(handlers::complete_password_reset))
}
