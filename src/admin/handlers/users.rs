// src/admin/handlers/users.rs

use axum::{
    extract::{rejection::JsonRejection, Extension},
    Json,
};
use std::sync::Arc;
use tracing::warn;

use crate::admin::models::{
    RoleUpdateResponse, UpdateRoleByEmailRequest, UpdateRoleByIdRequest, UsersListResponse,
};
use crate::admin::service;
use crate::auth::CurrentSession;
use crate::authz::{require_role, Role};
use crate::common::{ApiError, AppState};
use crate::store::UserSelector;

/// Run the admin guard, then unwrap the body. A caller without the admin
/// role gets 401/403 whatever the body looks like.
fn admin_body<T>(
    session: &CurrentSession,
    body: Result<Json<T>, JsonRejection>,
) -> Result<T, ApiError> {
    require_role(session.get(), Role::Admin)?;
    body.map(|Json(request)| request).map_err(|rejection| {
        warn!(error = %rejection.body_text(), "Rejected admin request body");
        ApiError::BadRequest("Invalid request body".to_string())
    })
}

/// POST /api/admin/update-role - Change a user's role by email
pub async fn update_role_by_email(
    Extension(state): Extension<Arc<AppState>>,
    session: CurrentSession,
    body: Result<Json<UpdateRoleByEmailRequest>, JsonRejection>,
) -> Result<Json<RoleUpdateResponse>, ApiError> {
    let request = admin_body(&session, body)?;
    let email = request.email.trim().to_string();
    let role = service::set_role(
        &state.store,
        session.get(),
        UserSelector::Email(email.clone()),
        &request.new_role,
    )
    .await
    .map_err(|e| {
        warn!(error = %e, "Role update by email rejected");
        ApiError::from(e)
    })?;

    Ok(Json(RoleUpdateResponse {
        success: true,
        message: format!("User {} role updated to {}", email, role),
    }))
}

/// PATCH /api/admin/users/role - Change a user's role by id
pub async fn update_role_by_id(
    Extension(state): Extension<Arc<AppState>>,
    session: CurrentSession,
    body: Result<Json<UpdateRoleByIdRequest>, JsonRejection>,
) -> Result<Json<RoleUpdateResponse>, ApiError> {
    let request = admin_body(&session, body)?;
    let role = service::set_role(
        &state.store,
        session.get(),
        UserSelector::Id(request.user_id.trim().to_string()),
        &request.new_role,
    )
    .await
    .map_err(|e| {
        warn!(error = %e, "Role update by id rejected");
        ApiError::from(e)
    })?;

    Ok(Json(RoleUpdateResponse {
        success: true,
        message: format!("User role updated to {}", role),
    }))
}

/// GET /api/admin/users - All accounts with role counts
pub async fn list_users(
    Extension(state): Extension<Arc<AppState>>,
    session: CurrentSession,
) -> Result<Json<UsersListResponse>, ApiError> {
    let (users, stats) = service::list_users(&state.store, session.get()).await?;
    Ok(Json(UsersListResponse { users, stats }))
}
