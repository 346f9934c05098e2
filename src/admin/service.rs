// src/admin/service.rs
//! Role administration

use serde::Serialize;
use std::collections::HashSet;
use thiserror::Error;
use tracing::{info, warn};

use crate::auth::Session;
use crate::authz::{require_role, Denial, Role};
use crate::common::safe_email_log;
use crate::store::{PublicUser, StoreError, UserSelector, UserStore};

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("no session")]
    Unauthenticated,

    #[error("admin role required")]
    Forbidden,

    #[error("{0}")]
    InvalidArgument(String),

    #[error("user not found")]
    NotFound,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<Denial> for AdminError {
    fn from(denial: Denial) -> Self {
        match denial {
            Denial::Unauthenticated => AdminError::Unauthenticated,
            Denial::Forbidden => AdminError::Forbidden,
        }
    }
}

/// Count of accounts per role
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct RoleStats {
    pub user: usize,
    pub moderator: usize,
    pub admin: usize,
}

impl RoleStats {
    pub fn tally(users: &[PublicUser]) -> Self {
        users.iter().fold(Self::default(), |mut stats, u| {
            match u.role {
                Role::User => stats.user += 1,
                Role::Moderator => stats.moderator += 1,
                Role::Admin => stats.admin += 1,
            }
            stats
        })
    }
}

/// Change the role of the account named by `target`.
///
/// Checks run in this order and each one aborts before any write: caller
/// must hold `admin`, arguments must be present, `new_role` must be a known
/// role, and the target must exist. The target's live sessions keep their
/// old role until they sign in again.
pub async fn set_role(
    store: &UserStore,
    caller: Option<&Session>,
    target: UserSelector,
    new_role: &str,
) -> Result<Role, AdminError> {
    let admin = require_role(caller, Role::Admin)?;

    let target_missing = match &target {
        UserSelector::Email(email) => email.trim().is_empty(),
        UserSelector::Id(id) => id.trim().is_empty(),
    };
    if target_missing || new_role.is_empty() {
        let field = match target {
            UserSelector::Email(_) => "Email",
            UserSelector::Id(_) => "User ID",
        };
        return Err(AdminError::InvalidArgument(format!(
            "{} and new role are required",
            field
        )));
    }

    let role: Role = new_role.parse().map_err(|_| {
        warn!(admin_user_id = %admin.id, requested_role = %new_role, "Rejected unknown role");
        AdminError::InvalidArgument("Invalid role. Must be user, admin, or moderator".to_string())
    })?;

    let matched = store.update_role(&target, role).await?;
    if matched == 0 {
        warn!(
            admin_user_id = %admin.id,
            target = %target.describe(),
            "Role update failed: user not found"
        );
        return Err(AdminError::NotFound);
    }

    info!(
        admin_user_id = %admin.id,
        target = %target.describe(),
        role = %role,
        "User role updated"
    );
    Ok(role)
}

/// All accounts with per-role counts. Admin only.
pub async fn list_users(
    store: &UserStore,
    caller: Option<&Session>,
) -> Result<(Vec<PublicUser>, RoleStats), AdminError> {
    let admin = require_role(caller, Role::Admin)?;

    let users: Vec<PublicUser> = store
        .list_users()
        .await?
        .iter()
        .map(|u| u.to_public())
        .collect();
    let stats = RoleStats::tally(&users);

    info!(admin_user_id = %admin.id, user_count = users.len(), "Users list fetched");
    Ok((users, stats))
}

/// Promote the configured bootstrap admins that already have accounts.
/// Returns how many accounts were updated.
pub async fn bootstrap_admins(
    store: &UserStore,
    emails: &HashSet<String>,
) -> Result<usize, StoreError> {
    let mut promoted = 0;
    for email in emails {
        let matched = store
            .update_role(&UserSelector::Email(email.clone()), Role::Admin)
            .await?;
        if matched > 0 {
            info!(email = %safe_email_log(email), "Bootstrap admin role applied");
            promoted += 1;
        } else {
            warn!(email = %safe_email_log(email), "Bootstrap admin has no account yet");
        }
    }
    Ok(promoted)
}
