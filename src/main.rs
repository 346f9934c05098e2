// src/main.rs
use axum::{extract::Extension, middleware, Router};
use dotenv::dotenv;
use reqwest::Client;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::env;
use std::path::PathBuf;
use std::{net::SocketAddr, str::FromStr, sync::Arc};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

// ============================================================================
// MODULE IMPORTS
// ============================================================================

mod admin;
mod auth;
mod authz;
mod common;
mod logging_middleware;
mod pages;
mod services;
mod session_middleware;
mod store;

// ============================================================================
// COMMON IMPORTS
// ============================================================================

use auth::oauth::GoogleProvider;
use common::{AppState, AuthConfig};
use services::{LogMailer, Mailer, SesMailer};
use store::UserStore;

// ============================================================================
// MAIN APPLICATION ENTRY POINT
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    // ========================================================================
    // ENVIRONMENT CONFIGURATION
    // ========================================================================

    let database_url =
        env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://rolegate.db".to_string());
    let config = AuthConfig::from_env()?;

    info!(
        admin_email_count = config.admin_emails.len(),
        google_enabled = config.google_enabled(),
        secure_cookies = config.production,
        "Configuration loaded"
    );

    // ========================================================================
    // DATABASE SETUP
    // ========================================================================

    if let Some(path_part) = database_url.strip_prefix("sqlite://") {
        let path_without_params = path_part.split('?').next().unwrap_or("");
        if !path_without_params.is_empty() && !path_without_params.starts_with(':') {
            let db_path = PathBuf::from(path_without_params);
            if let Some(parent) = db_path.parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent).await?;
                }
            }
        }
    }

    let connect_options = SqliteConnectOptions::from_str(&database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .connect_with(connect_options)
        .await?;

    common::migrations::run_migrations(&pool).await?;

    let store = UserStore::new(pool);

    let promoted = admin::bootstrap_admins(&store, &config.admin_emails).await?;
    if promoted > 0 {
        info!(promoted, "Bootstrap admins applied");
    }

    // ========================================================================
    // SERVICE INITIALIZATION
    // ========================================================================

    let mailer: Arc<dyn Mailer> = match (config.mail_from.clone(), config.ses_region.clone()) {
        (Some(from), Some(region)) => {
            info!(region = %region, "SES mailer initialized");
            Arc::new(SesMailer::new(region, from).await)
        }
        _ => {
            warn!("MAIL_FROM or AWS_SES_REGION not set, reset emails will only be logged");
            Arc::new(LogMailer)
        }
    };

    let google = match (&config.google_client_id, &config.google_client_secret) {
        (Some(id), Some(secret)) => {
            let http_client = Client::builder().no_proxy().build()?;
            Some(Arc::new(GoogleProvider::new(
                http_client,
                id.clone(),
                secret.clone(),
                &config.base_url,
            )))
        }
        _ => {
            info!("Google OAuth not configured");
            None
        }
    };

    // ========================================================================
    // APPLICATION STATE
    // ========================================================================

    let mut app_state = AppState::new(store, config, mailer);
    if let Some(provider) = google {
        app_state = app_state.with_oauth_provider(provider);
        info!("Google OAuth provider registered");
    }

    let shared = Arc::new(app_state);

    // ========================================================================
    // ROUTER COMPOSITION
    // ========================================================================

    let app = build_router(shared)
        .layer({
            let cors_origins = env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:3000,http://localhost:8080".to_string());

            let origins: Vec<axum::http::HeaderValue> = cors_origins
                .split(',')
                .filter_map(|origin| origin.trim().parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::PATCH,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers([axum::http::header::CONTENT_TYPE])
                .allow_credentials(true)
        })
        .layer(TraceLayer::new_for_http());

    // ========================================================================
    // SERVER STARTUP
    // ========================================================================

    let port = env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

/// All routes with the shared state and session middleware attached
pub(crate) fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Registration, sign-in, sessions, OAuth and password reset
        .merge(auth::auth_routes())
        // Role administration API
        .merge(admin::admin_routes())
        // Server-rendered pages
        .merge(pages::pages_routes())
        // Request/response body logging in debug mode
        .layer(middleware::from_fn(logging_middleware::log_request_response))
        .layer(middleware::from_fn(session_middleware::renew_session))
        .layer(Extension(state))
}
