// src/admin/models.rs

use serde::{Deserialize, Serialize};

use super::service::RoleStats;
use crate::store::PublicUser;

/// POST /api/admin/update-role body
#[derive(Debug, Deserialize)]
pub struct UpdateRoleByEmailRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default, rename = "newRole")]
    pub new_role: String,
}

/// PATCH /api/admin/users/role body
#[derive(Debug, Deserialize)]
pub struct UpdateRoleByIdRequest {
    #[serde(default, rename = "userId")]
    pub user_id: String,
    #[serde(default, rename = "newRole")]
    pub new_role: String,
}

#[derive(Debug, Serialize)]
pub struct RoleUpdateResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct UsersListResponse {
    pub users: Vec<PublicUser>,
    pub stats: RoleStats,
}
