// src/common/config.rs
//! Authentication and session configuration loaded from the environment

use anyhow::bail;
use std::collections::HashSet;
use std::env;
use tracing::warn;

const DEFAULT_JWT_SECRET: &str = "replace_with_strong_secret";

/// Process-wide configuration, built once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Forces the `Secure` flag on session cookies.
    pub production: bool,
    pub session_max_age_secs: i64,
    pub session_update_age_secs: i64,
    pub reset_token_ttl_secs: i64,
    pub base_url: String,
    pub google_client_id: Option<String>,
    pub google_client_secret: Option<String>,
    pub admin_emails: HashSet<String>,
    pub mail_from: Option<String>,
    pub ses_region: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            production: false,
            session_max_age_secs: 30 * 24 * 60 * 60, // 30 days
            session_update_age_secs: 24 * 60 * 60,   // renew every 24 hours
            reset_token_ttl_secs: 60 * 60,
            base_url: "http://localhost:8080".to_string(),
            google_client_id: None,
            google_client_secret: None,
            admin_emails: HashSet::new(),
            mail_from: None,
            ses_region: None,
        }
    }
}

impl AuthConfig {
    /// Load configuration from environment variables
    ///
    /// Fails in production when `JWT_SECRET` is missing or still the
    /// placeholder.
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::default();

        // APP_ENV=production turns on Secure cookies
        config.production = env::var("APP_ENV")
            .map(|v| v.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        config.jwt_secret = resolve_jwt_secret(config.production, env::var("JWT_SECRET").ok())?;

        if let Some(val) = parse_secs("SESSION_MAX_AGE_SECS") {
            config.session_max_age_secs = val;
        }
        if let Some(val) = parse_secs("SESSION_UPDATE_AGE_SECS") {
            config.session_update_age_secs = val;
        }
        if let Some(val) = parse_secs("RESET_TOKEN_TTL_SECS") {
            config.reset_token_ttl_secs = val;
        }

        if let Ok(url) = env::var("APP_BASE_URL") {
            config.base_url = url.trim_end_matches('/').to_string();
        }

        config.google_client_id = non_empty_var("GOOGLE_CLIENT_ID");
        config.google_client_secret = non_empty_var("GOOGLE_CLIENT_SECRET");
        config.mail_from = non_empty_var("MAIL_FROM");
        config.ses_region = non_empty_var("AWS_SES_REGION");

        config.admin_emails = parse_admin_emails(&env::var("ADMIN_EMAILS").unwrap_or_default());

        Ok(config)
    }

    pub fn google_enabled(&self) -> bool {
        self.google_client_id.is_some() && self.google_client_secret.is_some()
    }
}

fn resolve_jwt_secret(production: bool, raw: Option<String>) -> anyhow::Result<String> {
    match raw.filter(|v| !v.trim().is_empty()) {
        Some(secret) if secret != DEFAULT_JWT_SECRET => Ok(secret),
        _ if production => bail!("JWT_SECRET must be set to a non-placeholder value in production"),
        _ => {
            warn!("JWT_SECRET not set, using the development placeholder secret");
            Ok(DEFAULT_JWT_SECRET.to_string())
        }
    }
}

/// Parse a comma-separated list of admin emails. Entries are kept as written
/// because stored emails are matched case-sensitively.
pub fn parse_admin_emails(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_secs(key: &str) -> Option<i64> {
    let raw = env::var(key).ok()?;
    match raw.parse::<i64>() {
        Ok(val) if val > 0 => Some(val),
        _ => {
            warn!(variable = key, value = %raw, "Ignoring invalid duration, using default");
            None
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
