//! Password reset token queries

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::{timestamp, StoreError, UserStore};
use crate::common::safe_email_log;

impl UserStore {
    pub async fn insert_reset_token(
        &self,
        token: &str,
        email: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO password_reset_tokens (token, email, expires_at, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(token)
        .bind(email)
        .bind(timestamp(expires_at))
        .bind(timestamp(Utc::now()))
        .execute(&self.pool)
        .await?;

        debug!(email = %safe_email_log(email), "Password reset token stored");
        Ok(())
    }

    /// Redeem a reset token and replace the account's password hash.
    ///
    /// Runs in one transaction. The token is claimed with a conditional
    /// update first, so two concurrent redemptions cannot both succeed.
    /// Returns the account email, or `None` when the token is unknown, used
    /// or expired (nothing is written in that case).
    pub async fn consume_reset_token(
        &self,
        token: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<String>, StoreError> {
        let now = timestamp(now);
        let mut tx = self.pool.begin().await?;

        let claimed = sqlx::query(
            "UPDATE password_reset_tokens SET used_at = ? WHERE token = ? AND used_at IS NULL AND expires_at > ?",
        )
        .bind(&now)
        .bind(token)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        if claimed.rows_affected() != 1 {
            return Ok(None);
        }

        let (email,): (String,) =
            sqlx::query_as("SELECT email FROM password_reset_tokens WHERE token = ?")
                .bind(token)
                .fetch_one(&mut *tx)
                .await?;

        let updated = sqlx::query("UPDATE users SET password_hash = ? WHERE email = ?")
            .bind(password_hash)
            .bind(&email)
            .execute(&mut *tx)
            .await?;

        if updated.rows_affected() == 0 {
            // account vanished; dropping the transaction rolls the claim back
            return Ok(None);
        }

        // Any other outstanding link for this account stops working too
        sqlx::query(
            "UPDATE password_reset_tokens SET used_at = ? WHERE email = ? AND used_at IS NULL",
        )
        .bind(&now)
        .bind(&email)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(email = %safe_email_log(&email), "Password reset completed");
        Ok(Some(email))
    }
}
