//! User record queries

use chrono::Utc;
use tracing::{debug, error, info};

use super::models::{User, UserSelector};
use super::{timestamp, StoreError, UserStore};
use crate::authz::Role;
use crate::common::{generate_user_id, safe_email_log};

/// Fields for a new user row. At least one of `password_hash` and
/// `oauth_provider` must be present; the table enforces it too.
struct NewUser<'a> {
    email: &'a str,
    name: Option<&'a str>,
    password_hash: Option<&'a str>,
    oauth_provider: Option<&'a str>,
}

/// Map an insert failure, singling out the unique email constraint.
fn map_insert_error(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() && db.message().contains("users.email") {
            return StoreError::DuplicateEmail;
        }
    }
    StoreError::Database(e)
}

impl UserStore {
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!(error = %e, email = %safe_email_log(email), "Database error looking up user by email");
                StoreError::Database(e)
            })?;
        Ok(user)
    }

    #[cfg(test)]
    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!(error = %e, user_id = %id, "Database error looking up user by id");
                StoreError::Database(e)
            })?;
        Ok(user)
    }

    /// Insert a credential account with the default role.
    pub async fn insert_credential_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, StoreError> {
        self.insert(NewUser {
            email,
            name: Some(name),
            password_hash: Some(password_hash),
            oauth_provider: None,
        })
        .await
    }

    /// Insert an account created by a first OAuth sign-in.
    pub async fn insert_oauth_user(
        &self,
        name: Option<&str>,
        email: &str,
        provider: &str,
    ) -> Result<User, StoreError> {
        self.insert(NewUser {
            email,
            name,
            password_hash: None,
            oauth_provider: Some(provider),
        })
        .await
    }

    async fn insert(&self, new_user: NewUser<'_>) -> Result<User, StoreError> {
        let id = generate_user_id();

        sqlx::query(
            "INSERT INTO users (id, email, name, password_hash, role, oauth_provider, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(new_user.email)
        .bind(new_user.name)
        .bind(new_user.password_hash)
        .bind(Role::User.as_str())
        .bind(new_user.oauth_provider)
        .bind(timestamp(Utc::now()))
        .execute(&self.pool)
        .await
        .map_err(map_insert_error)?;

        info!(
            user_id = %id,
            email = %safe_email_log(new_user.email),
            provider = new_user.oauth_provider.unwrap_or("credentials"),
            "User account created"
        );

        // fetch back
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(&id)
            .fetch_one(&self.pool)
            .await?;
        Ok(user)
    }

    /// Attach an OAuth provider to an account that has none yet.
    ///
    /// Returns `false` when the account is already linked; an existing
    /// provider is never overwritten.
    pub async fn link_oauth_provider(&self, id: &str, provider: &str) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE users SET oauth_provider = ? WHERE id = ? AND oauth_provider IS NULL",
        )
        .bind(provider)
        .bind(id)
        .execute(&self.pool)
        .await?;

        let linked = result.rows_affected() == 1;
        debug!(user_id = %id, provider = %provider, linked, "OAuth provider link attempted");
        Ok(linked)
    }

    /// Set the role of the selected user. Returns the number of matched
    /// records; SQLite counts a row whose role already had the new value.
    pub async fn update_role(
        &self,
        selector: &UserSelector,
        role: Role,
    ) -> Result<u64, StoreError> {
        let (sql, key) = match selector {
            UserSelector::Email(email) => ("UPDATE users SET role = ? WHERE email = ?", email),
            UserSelector::Id(id) => ("UPDATE users SET role = ? WHERE id = ?", id),
        };

        let result = sqlx::query(sql)
            .bind(role.as_str())
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!(error = %e, target = %selector.describe(), "Database error updating role");
                StoreError::Database(e)
            })?;

        Ok(result.rows_affected())
    }

    /// All users, newest first.
    pub async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let users =
            sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at DESC, id ASC")
                .fetch_all(&self.pool)
                .await?;
        Ok(users)
    }
}
