//! Page handlers

use axum::{
    extract::{Extension, Query},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use super::layout::{escape_html, guard_page, page};
use crate::admin::RoleStats;
use crate::auth::CurrentSession;
use crate::authz::Role;
use crate::common::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct LoginParams {
    #[serde(rename = "callbackUrl")]
    pub callback_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorParams {
    pub error: Option<String>,
}

/// Only same-site paths are accepted as a post sign-in destination
fn safe_callback(raw: Option<&str>) -> &str {
    match raw {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path,
        _ => "/",
    }
}

/// Quote `raw` as a JavaScript string literal safe to embed in a script tag
fn js_string(raw: &str) -> String {
    serde_json::to_string(raw)
        .unwrap_or_else(|_| "\"/\"".to_string())
        .replace("</", "<\\/")
}

fn auth_error_message(code: Option<&str>) -> &'static str {
    match code {
        Some("Configuration") => "There is a problem with the server configuration.",
        Some("AccessDenied") => "Access was denied. You may have cancelled the sign-in process.",
        Some("Verification") => "The verification token has expired or is invalid.",
        Some("OAuthCallback") => "There was an error with the OAuth provider callback.",
        _ => "An unexpected error occurred during authentication.",
    }
}

/// GET /
pub async fn home(session: CurrentSession) -> Response {
    let body = match session.get() {
        Some(s) => {
            let admin_link = if s.role == Role::Admin {
                r#"<p><a href="/admin">Admin dashboard</a></p>"#
            } else {
                ""
            };
            format!(
                r#"<h1>Welcome, {name}</h1>
<p>Signed in as {email} ({role})</p>
{admin_link}
<button onclick="fetch('/api/auth/logout', {{ method: 'POST' }}).then(() => window.location.reload())">Sign out</button>"#,
                name = escape_html(s.name.as_deref().unwrap_or(&s.email)),
                email = escape_html(&s.email),
                role = s.role,
                admin_link = admin_link
            )
        }
        None => r#"<h1>Welcome</h1>
<p><a href="/login">Sign in</a></p>"#
            .to_string(),
    };
    page("Home", &body).into_response()
}

/// GET /login
pub async fn login(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<LoginParams>,
) -> Response {
    let callback = safe_callback(params.callback_url.as_deref());
    let google = if state.oauth_provider("google").is_some() {
        r#"<p><a href="/api/auth/signin/google">Sign in with Google</a></p>"#
    } else {
        ""
    };

    let body = format!(
        r#"<h1>Sign in</h1>
<form id="login">
    <p><input type="email" name="email" placeholder="Email" required></p>
    <p><input type="password" name="password" placeholder="Password" required></p>
    <p><button type="submit">Sign in</button></p>
</form>
<p id="message" class="error"></p>
{google}
<script>
document.getElementById('login').addEventListener('submit', async (event) => {{
    event.preventDefault();
    const form = new FormData(event.target);
    const response = await fetch('/api/auth/login', {{
        method: 'POST',
        headers: {{ 'Content-Type': 'application/json' }},
        body: JSON.stringify({{ email: form.get('email'), password: form.get('password') }})
    }});
    if (response.ok) {{
        window.location = {callback};
    }} else {{
        const data = await response.json();
        document.getElementById('message').textContent = data.error;
    }}
}});
</script>"#,
        google = google,
        callback = js_string(callback)
    );
    page("Sign in", &body).into_response()
}

/// GET /auth/error
pub async fn auth_error(Query(params): Query<ErrorParams>) -> Response {
    let code = params.error.as_deref();
    let code_line = code
        .map(|c| format!("<p><strong>Error code:</strong> {}</p>", escape_html(c)))
        .unwrap_or_default();

    let body = format!(
        r#"<h1>Authentication Error</h1>
<p class="error">{message}</p>
<p><a href="/login">Try again</a> | <a href="/">Go home</a></p>
{code_line}"#,
        message = auth_error_message(code),
        code_line = code_line
    );
    page("Authentication Error", &body).into_response()
}

/// GET /admin
pub async fn admin_dashboard(session: CurrentSession) -> Response {
    let admin = match guard_page(session.get(), Role::Admin, "/admin") {
        Ok(s) => s,
        Err(redirect) => return redirect,
    };

    let body = format!(
        r#"<h1>Admin Dashboard</h1>
<p>Welcome, {name} ({role})</p>
<ul>
    <li><a href="/admin/users">User management</a></li>
    <li><a href="/admin/roles">Role management</a></li>
</ul>
<p class="notice">Only accounts with the "admin" role can use these pages.</p>"#,
        name = escape_html(admin.name.as_deref().unwrap_or(&admin.email)),
        role = admin.role
    );
    page("Admin Dashboard", &body).into_response()
}

/// GET /admin/users
pub async fn admin_users(
    Extension(state): Extension<Arc<AppState>>,
    session: CurrentSession,
) -> Result<Response, ApiError> {
    let admin = match guard_page(session.get(), Role::Admin, "/admin/users") {
        Ok(s) => s,
        Err(redirect) => return Ok(redirect),
    };

    let users: Vec<_> = state
        .store
        .list_users()
        .await?
        .iter()
        .map(|u| u.to_public())
        .collect();
    let stats = RoleStats::tally(&users);

    info!(admin_user_id = %admin.id, user_count = users.len(), "Rendering user management page");

    let rows: String = users
        .iter()
        .map(|u| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                escape_html(u.name.as_deref().unwrap_or("")),
                escape_html(&u.email),
                u.role,
                escape_html(u.oauth_provider.as_deref().unwrap_or("credentials")),
                escape_html(&u.created_at)
            )
        })
        .collect();

    let body = format!(
        r#"<h1>User Management</h1>
<p>Users: {user} | Moderators: {moderator} | Admins: {admin}</p>
<table>
<tr><th>Name</th><th>Email</th><th>Role</th><th>Sign-in</th><th>Created</th></tr>
{rows}</table>
<p><a href="/admin">Back to dashboard</a></p>"#,
        user = stats.user,
        moderator = stats.moderator,
        admin = stats.admin,
        rows = rows
    );
    Ok(page("User Management", &body).into_response())
}

/// GET /admin/roles
pub async fn admin_roles(session: CurrentSession) -> Response {
    let admin = match guard_page(session.get(), Role::Admin, "/admin/roles") {
        Ok(s) => s,
        Err(redirect) => return redirect,
    };

    let options: String = Role::ALL
        .iter()
        .map(|r| format!(r#"<option value="{0}">{0}</option>"#, r))
        .collect();

    let body = format!(
        r#"<h1>Role Management</h1>
<p>Signed in as {email} ({role})</p>
<form id="role-form">
    <p><input type="email" name="email" placeholder="User email" required></p>
    <p><select name="newRole">{options}</select></p>
    <p><button type="submit">Update role</button></p>
</form>
<p id="message"></p>
<p class="notice">A role change takes effect the next time that user signs in.</p>
<script>
document.getElementById('role-form').addEventListener('submit', async (event) => {{
    event.preventDefault();
    const form = new FormData(event.target);
    const response = await fetch('/api/admin/update-role', {{
        method: 'POST',
        headers: {{ 'Content-Type': 'application/json' }},
        body: JSON.stringify({{ email: form.get('email'), newRole: form.get('newRole') }})
    }});
    const data = await response.json();
    document.getElementById('message').textContent = response.ok ? data.message : data.error;
}});
</script>
<p><a href="/admin">Back to dashboard</a></p>"#,
        email = escape_html(&admin.email),
        role = admin.role,
        options = options
    );
    page("Role Management", &body).into_response()
}
