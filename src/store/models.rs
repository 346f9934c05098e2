//! Store data models

use serde::Serialize;
use sqlx::FromRow;

use crate::authz::Role;

/// User database model
#[derive(FromRow, Debug, Clone)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<String>,
    pub oauth_provider: Option<String>,
    pub created_at: String,
}

impl User {
    /// Stored role, `user` when the column is empty.
    pub fn role(&self) -> Role {
        self.role
            .as_deref()
            .and_then(|r| r.parse().ok())
            .unwrap_or_default()
    }

    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            id: self.id.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.role(),
            oauth_provider: self.oauth_provider.clone(),
            created_at: self.created_at.clone(),
        }
    }
}

/// User as returned by the API; never carries the password hash.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub role: Role,
    pub oauth_provider: Option<String>,
    pub created_at: String,
}

/// How a role change names its target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserSelector {
    Email(String),
    Id(String),
}

impl UserSelector {
    pub fn describe(&self) -> String {
        match self {
            UserSelector::Email(email) => crate::common::safe_email_log(email),
            UserSelector::Id(id) => id.clone(),
        }
    }
}
