//! Tests for auth module
//!
//! These tests verify core authentication functionality including:
//! - Session token issuance, validation and renewal
//! - Password hashing
//! - Credential and OAuth sign-in, including account linking
//! - Password reset links
//! - The HTTP endpoints end to end

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::authz::Role;
    use crate::common::state::test_state;
    use crate::common::testing::send;
    use crate::services::mailer::RecordingMailer;
    use crate::services::LogMailer;
    use async_trait::async_trait;
    use axum::http::{Method, StatusCode};
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;
    use std::sync::Arc;

    use super::super::oauth::{OAuthError, OAuthProvider};
    use super::super::password::{hash_password, verify_password};
    use super::super::reset::ResetError;

    const SECRET: &str = "test_secret_key";

    fn identity(role: Role) -> Identity {
        Identity {
            id: "U_TEST0001".to_string(),
            email: "a@x.com".to_string(),
            name: Some("Alice".to_string()),
            role,
        }
    }

    fn codec() -> SessionCodec {
        SessionCodec::new(SECRET, 30 * 24 * 60 * 60, 24 * 60 * 60, false)
    }

    fn extract_reset_token(html: &str) -> String {
        let start = html.find("/reset/").expect("reset link in email") + "/reset/".len();
        html[start..]
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric())
            .collect()
    }

    struct FakeProvider;

    #[async_trait]
    impl OAuthProvider for FakeProvider {
        fn name(&self) -> &str {
            "fake"
        }

        fn authorization_url(&self, state: &str) -> String {
            format!("https://idp.test/authorize?state={}", state)
        }

        async fn exchange_code(&self, code: &str) -> Result<OAuthIdentity, OAuthError> {
            match code {
                "good" => Ok(OAuthIdentity {
                    provider: "fake".to_string(),
                    email: "o@x.com".to_string(),
                    name: Some("Olivia".to_string()),
                }),
                _ => Err(OAuthError::Exchange("bad code".to_string())),
            }
        }
    }

    // ------------------------------------------------------------------
    // Session tokens
    // ------------------------------------------------------------------

    #[test]
    fn test_session_round_trip() {
        let codec = codec();
        let (token, issued) = codec.issue(&identity(Role::Moderator)).unwrap();

        let decoded = codec.decode(&token).expect("valid token");
        assert_eq!(decoded, issued);
        assert_eq!(decoded.role, Role::Moderator);
        assert_eq!(decoded.email, "a@x.com");
        assert_eq!(decoded.expires_at - decoded.issued_at, 30 * 24 * 60 * 60);
    }

    #[test]
    fn test_tampered_token_is_rejected() {
        let codec = codec();
        let (user_token, _) = codec.issue(&identity(Role::User)).unwrap();
        let (admin_token, _) = codec.issue(&identity(Role::Admin)).unwrap();

        // Admin claims under the user token's signature
        let user_parts: Vec<&str> = user_token.split('.').collect();
        let admin_parts: Vec<&str> = admin_token.split('.').collect();
        let forged = format!("{}.{}.{}", user_parts[0], admin_parts[1], user_parts[2]);

        assert!(codec.decode(&forged).is_none());
        assert!(codec.decode("not-a-jwt").is_none());
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let other = SessionCodec::new("wrong_secret_key", 3600, 60, false);
        let (token, _) = other.issue(&identity(Role::Admin)).unwrap();
        assert!(codec().decode(&token).is_none());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let codec = SessionCodec::new(SECRET, 3600, 60, false);
        let long_ago = Utc::now().timestamp() - 7200;
        let (token, _) = codec.issue_at(&identity(Role::User), long_ago).unwrap();
        assert!(codec.decode(&token).is_none());
    }

    #[test]
    fn test_token_with_unknown_role_is_rejected() {
        let now = Utc::now().timestamp();
        let claims = json!({
            "sub": "U_TEST0001",
            "email": "a@x.com",
            "name": "Alice",
            "role": "superuser",
            "iat": now,
            "exp": now + 3600,
        });
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert!(codec().decode(&token).is_none());
    }

    #[test]
    fn test_needs_renewal_after_update_age() {
        let codec = SessionCodec::new(SECRET, 100, 10, false);
        let now = Utc::now().timestamp();

        let (_, fresh) = codec.issue_at(&identity(Role::User), now).unwrap();
        assert!(!codec.needs_renewal(&fresh, now));

        let (_, stale) = codec.issue_at(&identity(Role::User), now - 11).unwrap();
        assert!(codec.needs_renewal(&stale, now));

        let (_, expired) = codec.issue_at(&identity(Role::User), now - 200).unwrap();
        assert!(!codec.needs_renewal(&expired, now));
    }

    #[test]
    fn test_renew_keeps_the_cached_role() {
        let codec = codec();
        let (_, old) = codec
            .issue_at(&identity(Role::Admin), Utc::now().timestamp() - 100_000)
            .unwrap();

        let (token, renewed) = codec.renew(&old).unwrap();
        assert_eq!(renewed.role, Role::Admin);
        assert_eq!(renewed.id, old.id);
        assert!(renewed.issued_at > old.issued_at);
        assert_eq!(codec.decode(&token), Some(renewed));
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = SessionCodec::new(SECRET, 3600, 60, true).session_cookie("tok".to_string());
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
    }

    // ------------------------------------------------------------------
    // Password hashing
    // ------------------------------------------------------------------

    #[test]
    fn test_password_hash_verifies_only_the_original() {
        let hash = hash_password("secret1").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(&hash, "secret1"));
        assert!(!verify_password(&hash, "secret2"));
        assert!(!verify_password("not-a-phc-string", "secret1"));
    }

    #[test]
    fn test_password_hashes_are_salted() {
        let a = hash_password("secret1").unwrap();
        let b = hash_password("secret1").unwrap();
        assert_ne!(a, b);
    }

    // ------------------------------------------------------------------
    // Authenticator
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_credential_sign_in() {
        let state = test_state(Arc::new(LogMailer)).await;
        let auth = state.authenticator();

        let registered = auth.register("Alice", "a@x.com", "secret1").await.unwrap();
        assert_eq!(registered.role, Role::User);

        let signed_in = auth
            .authenticate_credentials("a@x.com", "secret1")
            .await
            .unwrap();
        assert_eq!(signed_in, registered);

        assert!(matches!(
            auth.authenticate_credentials("a@x.com", "wrong1").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.authenticate_credentials("b@x.com", "secret1").await,
            Err(AuthError::NotFound)
        ));
        assert!(matches!(
            auth.authenticate_credentials("A@X.COM", "secret1").await,
            Err(AuthError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_oauth_only_account_cannot_use_password() {
        let state = test_state(Arc::new(LogMailer)).await;
        state
            .store
            .insert_oauth_user(Some("Olivia"), "o@x.com", "google")
            .await
            .unwrap();

        let result = state
            .authenticator()
            .authenticate_credentials("o@x.com", "anything")
            .await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_oauth_creates_account_with_user_role() {
        let state = test_state(Arc::new(LogMailer)).await;
        let assertion = OAuthIdentity {
            provider: "google".to_string(),
            email: "o@x.com".to_string(),
            name: Some("Olivia".to_string()),
        };

        let identity = state.authenticator().authenticate_oauth(&assertion).await.unwrap();
        assert_eq!(identity.role, Role::User);
        assert_eq!(identity.name.as_deref(), Some("Olivia"));

        let stored = state.store.find_by_email("o@x.com").await.unwrap().unwrap();
        assert_eq!(stored.oauth_provider.as_deref(), Some("google"));
        assert!(stored.password_hash.is_none());

        // Signing in again reuses the same account
        let again = state.authenticator().authenticate_oauth(&assertion).await.unwrap();
        assert_eq!(again.id, identity.id);
        assert_eq!(state.store.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_oauth_links_existing_account_and_keeps_role() {
        let state = test_state(Arc::new(LogMailer)).await;
        let auth = state.authenticator();
        let registered = auth.register("Alice", "a@x.com", "secret1").await.unwrap();
        state
            .store
            .update_role(&crate::store::UserSelector::Email("a@x.com".to_string()), Role::Moderator)
            .await
            .unwrap();

        let identity = auth
            .authenticate_oauth(&OAuthIdentity {
                provider: "google".to_string(),
                email: "a@x.com".to_string(),
                name: Some("Alice G".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(identity.id, registered.id);
        assert_eq!(identity.role, Role::Moderator);
        // Stored name wins over the provider's
        assert_eq!(identity.name.as_deref(), Some("Alice"));

        let stored = state.store.find_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(stored.oauth_provider.as_deref(), Some("google"));
        assert!(stored.password_hash.is_some());

        // Password sign-in still works after linking
        assert!(auth.authenticate_credentials("a@x.com", "secret1").await.is_ok());
    }

    #[tokio::test]
    async fn test_oauth_does_not_relink_to_second_provider() {
        let state = test_state(Arc::new(LogMailer)).await;
        state
            .store
            .insert_oauth_user(None, "o@x.com", "google")
            .await
            .unwrap();

        let identity = state
            .authenticator()
            .authenticate_oauth(&OAuthIdentity {
                provider: "github".to_string(),
                email: "o@x.com".to_string(),
                name: Some("Olivia".to_string()),
            })
            .await
            .unwrap();

        // Missing stored name falls back to the provider's
        assert_eq!(identity.name.as_deref(), Some("Olivia"));
        let stored = state.store.find_by_email("o@x.com").await.unwrap().unwrap();
        assert_eq!(stored.oauth_provider.as_deref(), Some("google"));
    }

    #[tokio::test]
    async fn test_concurrent_oauth_sign_ins_share_one_account() {
        let state = test_state(Arc::new(LogMailer)).await;
        let auth = state.authenticator();
        let assertion = OAuthIdentity {
            provider: "google".to_string(),
            email: "new@x.com".to_string(),
            name: Some("Nora".to_string()),
        };

        let (first, second) = tokio::join!(
            auth.authenticate_oauth(&assertion),
            auth.authenticate_oauth(&assertion)
        );
        let (first, second) = (first.unwrap(), second.unwrap());
        assert_eq!(first.id, second.id);
        assert_eq!(first.role, Role::User);

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE email = ?")
            .bind("new@x.com")
            .fetch_one(state.store.pool())
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    // ------------------------------------------------------------------
    // Password reset
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_reset_link_sets_new_password_once() {
        let mailer = Arc::new(RecordingMailer::default());
        let state = test_state(mailer.clone()).await;
        state
            .authenticator()
            .register("Alice", "a@x.com", "secret1")
            .await
            .unwrap();

        state.password_reset().request_reset("a@x.com").await.unwrap();

        let messages = mailer.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].0, "a@x.com");
        let token = extract_reset_token(&messages[0].2);
        assert_eq!(token.len(), 32);

        let email = state
            .password_reset()
            .complete_reset(&token, "newpass1")
            .await
            .unwrap();
        assert_eq!(email, "a@x.com");

        let auth = state.authenticator();
        assert!(auth.authenticate_credentials("a@x.com", "newpass1").await.is_ok());
        assert!(matches!(
            auth.authenticate_credentials("a@x.com", "secret1").await,
            Err(AuthError::InvalidCredentials)
        ));

        assert!(matches!(
            state.password_reset().complete_reset(&token, "another1").await,
            Err(ResetError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn test_reset_for_unknown_email_sends_nothing() {
        let mailer = Arc::new(RecordingMailer::default());
        let state = test_state(mailer.clone()).await;

        state.password_reset().request_reset("ghost@x.com").await.unwrap();
        assert!(mailer.messages().is_empty());
    }

    // ------------------------------------------------------------------
    // HTTP endpoints
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_register_login_session_logout() {
        let app = crate::build_router(Arc::new(test_state(Arc::new(LogMailer)).await));

        let registered = send(
            &app,
            Method::POST,
            "/api/register",
            Some(json!({ "name": "Alice", "email": "a@x.com", "password": "secret1" })),
            None,
        )
        .await;
        assert_eq!(registered.status, StatusCode::OK);
        assert_eq!(registered.body["user"]["role"], "user");
        assert!(registered.body["user"].get("password_hash").is_none());

        let login = send(
            &app,
            Method::POST,
            "/api/auth/login",
            Some(json!({ "email": "a@x.com", "password": "secret1" })),
            None,
        )
        .await;
        assert_eq!(login.status, StatusCode::OK);
        assert_eq!(login.body["user"]["email"], "a@x.com");
        let cookie = login.session_cookie().expect("session cookie");

        let session = send(&app, Method::GET, "/api/auth/session", None, Some(&cookie)).await;
        assert_eq!(session.body["user"]["email"], "a@x.com");
        assert_eq!(session.body["user"]["role"], "user");
        assert!(session.body["expires"].is_string());

        let logout = send(&app, Method::POST, "/api/auth/logout", None, Some(&cookie)).await;
        assert_eq!(logout.status, StatusCode::OK);
        assert_eq!(
            logout.session_cookie().as_deref(),
            Some(format!("{}=", SESSION_COOKIE).as_str())
        );

        let anonymous = send(&app, Method::GET, "/api/auth/session", None, None).await;
        assert!(anonymous.body["user"].is_null());
    }

    #[tokio::test]
    async fn test_register_rejects_bad_input_and_duplicates() {
        let app = crate::build_router(Arc::new(test_state(Arc::new(LogMailer)).await));

        let short = send(
            &app,
            Method::POST,
            "/api/register",
            Some(json!({ "name": "Alice", "email": "a@x.com", "password": "12345" })),
            None,
        )
        .await;
        assert_eq!(short.status, StatusCode::BAD_REQUEST);

        let no_email = send(
            &app,
            Method::POST,
            "/api/register",
            Some(json!({ "name": "Alice", "password": "secret1" })),
            None,
        )
        .await;
        assert_eq!(no_email.status, StatusCode::BAD_REQUEST);

        let body = json!({ "name": "Alice", "email": "a@x.com", "password": "secret1" });
        let first = send(&app, Method::POST, "/api/register", Some(body.clone()), None).await;
        assert_eq!(first.status, StatusCode::OK);
        let second = send(&app, Method::POST, "/api/register", Some(body), None).await;
        assert_eq!(second.status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_login_failures() {
        let state = test_state(Arc::new(LogMailer)).await;
        state
            .authenticator()
            .register("Alice", "a@x.com", "secret1")
            .await
            .unwrap();
        let app = crate::build_router(Arc::new(state));

        let wrong = send(
            &app,
            Method::POST,
            "/api/auth/login",
            Some(json!({ "email": "a@x.com", "password": "nope12" })),
            None,
        )
        .await;
        assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
        assert!(wrong.session_cookie().is_none());

        let unknown = send(
            &app,
            Method::POST,
            "/api/auth/login",
            Some(json!({ "email": "b@x.com", "password": "secret1" })),
            None,
        )
        .await;
        assert_eq!(unknown.status, StatusCode::NOT_FOUND);

        let empty = send(&app, Method::POST, "/api/auth/login", Some(json!({})), None).await;
        assert_eq!(empty.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_invalid_cookie_is_anonymous() {
        let app = crate::build_router(Arc::new(test_state(Arc::new(LogMailer)).await));
        let cookie = format!("{}=garbage", SESSION_COOKIE);

        let session = send(&app, Method::GET, "/api/auth/session", None, Some(&cookie)).await;
        assert_eq!(session.status, StatusCode::OK);
        assert!(session.body["user"].is_null());
    }

    #[tokio::test]
    async fn test_stale_session_is_renewed_with_same_role() {
        let state = test_state(Arc::new(LogMailer)).await;
        let issued_at = Utc::now().timestamp() - state.config.session_update_age_secs - 5;
        let (token, old) = state
            .sessions
            .issue_at(&identity(Role::Moderator), issued_at)
            .unwrap();
        let state = Arc::new(state);
        let app = crate::build_router(state.clone());

        let response = send(
            &app,
            Method::GET,
            "/api/auth/session",
            None,
            Some(&format!("{}={}", SESSION_COOKIE, token)),
        )
        .await;
        assert_eq!(response.status, StatusCode::OK);

        let renewed_cookie = response.session_cookie().expect("renewed cookie");
        let renewed_token = renewed_cookie.split_once('=').unwrap().1;
        let renewed = state.sessions.decode(renewed_token).unwrap();
        assert_eq!(renewed.role, Role::Moderator);
        assert!(renewed.issued_at > old.issued_at);
    }

    #[tokio::test]
    async fn test_fresh_session_is_not_reissued() {
        let state = test_state(Arc::new(LogMailer)).await;
        let (token, _) = state.sessions.issue(&identity(Role::User)).unwrap();
        let app = crate::build_router(Arc::new(state));

        let response = send(
            &app,
            Method::GET,
            "/api/auth/session",
            None,
            Some(&format!("{}={}", SESSION_COOKIE, token)),
        )
        .await;
        assert!(response.session_cookie().is_none());
    }

    #[tokio::test]
    async fn test_password_reset_endpoints() {
        let mailer = Arc::new(RecordingMailer::default());
        let state = test_state(mailer.clone()).await;
        state
            .authenticator()
            .register("Alice", "a@x.com", "secret1")
            .await
            .unwrap();
        let app = crate::build_router(Arc::new(state));

        let unknown = send(
            &app,
            Method::POST,
            "/api/reset",
            Some(json!({ "email": "ghost@x.com" })),
            None,
        )
        .await;
        let known = send(
            &app,
            Method::POST,
            "/api/reset",
            Some(json!({ "email": "a@x.com" })),
            None,
        )
        .await;
        assert_eq!(unknown.status, StatusCode::OK);
        assert_eq!(known.status, StatusCode::OK);
        assert_eq!(unknown.body, known.body);

        let messages = mailer.messages();
        assert_eq!(messages.len(), 1);
        let token = extract_reset_token(&messages[0].2);

        let uri = format!("/api/reset/{}", token);
        let reset = send(
            &app,
            Method::POST,
            &uri,
            Some(json!({ "password": "newpass1" })),
            None,
        )
        .await;
        assert_eq!(reset.status, StatusCode::OK);

        let reused = send(
            &app,
            Method::POST,
            &uri,
            Some(json!({ "password": "newpass2" })),
            None,
        )
        .await;
        assert_eq!(reused.status, StatusCode::BAD_REQUEST);

        let login = send(
            &app,
            Method::POST,
            "/api/auth/login",
            Some(json!({ "email": "a@x.com", "password": "newpass1" })),
            None,
        )
        .await;
        assert_eq!(login.status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_oauth_sign_in_flow() {
        let state = test_state(Arc::new(LogMailer))
            .await
            .with_oauth_provider(Arc::new(FakeProvider));
        let app = crate::build_router(Arc::new(state));

        let start = send(&app, Method::GET, "/api/auth/signin/fake", None, None).await;
        assert_eq!(start.status, StatusCode::SEE_OTHER);
        assert!(start
            .location()
            .unwrap()
            .starts_with("https://idp.test/authorize?state="));

        let state_pair = start
            .headers
            .get_all(axum::http::header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with(handlers::OAUTH_STATE_COOKIE))
            .and_then(|v| v.split(';').next())
            .expect("state cookie")
            .to_string();
        let csrf_state = state_pair.split_once('=').unwrap().1.to_string();

        let callback = send(
            &app,
            Method::GET,
            &format!("/api/auth/callback/fake?code=good&state={}", csrf_state),
            None,
            Some(&state_pair),
        )
        .await;
        assert_eq!(callback.status, StatusCode::SEE_OTHER);
        assert_eq!(callback.location(), Some("/"));
        let cookie = callback.session_cookie().expect("session cookie");

        let session = send(&app, Method::GET, "/api/auth/session", None, Some(&cookie)).await;
        assert_eq!(session.body["user"]["email"], "o@x.com");
        assert_eq!(session.body["user"]["role"], "user");
    }

    #[tokio::test]
    async fn test_oauth_callback_failures_redirect_to_error_page() {
        let state = test_state(Arc::new(LogMailer))
            .await
            .with_oauth_provider(Arc::new(FakeProvider));
        let app = crate::build_router(Arc::new(state));
        let state_cookie = format!("{}=abc", handlers::OAUTH_STATE_COOKIE);

        let mismatch = send(
            &app,
            Method::GET,
            "/api/auth/callback/fake?code=good&state=xyz",
            None,
            Some(&state_cookie),
        )
        .await;
        assert_eq!(mismatch.location(), Some("/auth/error?error=OAuthCallback"));
        assert!(mismatch.session_cookie().is_none());

        let bad_code = send(
            &app,
            Method::GET,
            "/api/auth/callback/fake?code=bad&state=abc",
            None,
            Some(&state_cookie),
        )
        .await;
        assert_eq!(bad_code.location(), Some("/auth/error?error=OAuthCallback"));

        let denied = send(
            &app,
            Method::GET,
            "/api/auth/callback/fake?error=access_denied",
            None,
            Some(&state_cookie),
        )
        .await;
        assert_eq!(denied.location(), Some("/auth/error?error=AccessDenied"));

        let unknown = send(
            &app,
            Method::GET,
            "/api/auth/callback/nope?code=good&state=abc",
            None,
            Some(&state_cookie),
        )
        .await;
        assert_eq!(unknown.location(), Some("/auth/error?error=Configuration"));

        let signin = send(&app, Method::GET, "/api/auth/signin/nope", None, None).await;
        assert_eq!(signin.status, StatusCode::NOT_FOUND);
    }
}
