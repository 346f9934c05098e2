//! # Auth Module
//!
//! This module handles all authentication-related functionality including:
//! - Credential registration and sign-in (Argon2 password hashes)
//! - OAuth sign-in with account linking by email
//! - Session token issuance, decoding and renewal
//! - Password reset links
//! - CurrentSession extractor for handlers

pub mod authenticator;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod oauth;
pub mod password;
pub mod reset;
pub mod routes;
pub mod session;

#[cfg(test)]
mod tests;

pub use authenticator::{AuthError, Authenticator, Identity, OAuthIdentity};
pub use extractors::CurrentSession;
pub use routes::auth_routes;
pub use session::{Session, SessionCodec, SESSION_COOKIE};
