// src/admin/routes.rs

use axum::{
    routing::{get, patch, post},
    Router,
};

use super::handlers;

pub fn admin_routes() -> Router {
    Router::new()
        .route(
            "/api/admin/update-role",
            post(handlers::users::update_role_by_email),
        )
        .route("/api/admin/users", get(handlers::users::list_users))
        .route(
            "/api/admin/users/role",
            patch(handlers::users::update_role_by_id),
        )
}
