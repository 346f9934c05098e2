//! Page routes

use axum::{routing::get, Router};

use super::handlers;

pub fn pages_routes() -> Router {
    Router::new()
        .route("/", get(handlers::home))
        .route("/login", get(handlers::login))
        .route("/auth/error", get(handlers::auth_error))
        .route("/admin", get(handlers::admin_dashboard))
        .route("/admin/users", get(handlers::admin_users))
        .route("/admin/roles", get(handlers::admin_roles))
}
