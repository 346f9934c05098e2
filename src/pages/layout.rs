//! HTML helpers shared by the pages

use axum::response::{Html, IntoResponse, Redirect, Response};

use crate::authz::{render_guard, GuardOutcome, Role};
use crate::auth::Session;

/// Escape text for use inside HTML element content or a quoted attribute
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Wrap page content in the shared document shell
pub fn page(title: &str, body: &str) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>{title}</title>
    <style>
        body {{ font-family: system-ui, sans-serif; margin: 0; background: #f3f4f6; }}
        main {{ max-width: 960px; margin: 2rem auto; padding: 2rem; background: white; border-radius: 8px; box-shadow: 0 2px 10px rgba(0,0,0,0.1); }}
        table {{ width: 100%; border-collapse: collapse; }}
        th, td {{ text-align: left; padding: 0.5rem; border-bottom: 1px solid #e5e7eb; }}
        .error {{ color: #dc2626; }}
        .notice {{ background: #fefce8; border: 1px solid #fde68a; padding: 1rem; border-radius: 6px; }}
    </style>
</head>
<body>
<main>
{body}
</main>
</body>
</html>"#,
        title = escape_html(title),
        body = body
    ))
}

/// Run the render guard for `path`; `Err` carries the redirect to send back
pub fn guard_page<'a>(
    session: Option<&'a Session>,
    required: Role,
    path: &str,
) -> Result<&'a Session, Response> {
    match render_guard(session, required) {
        GuardOutcome::Render(s) => Ok(s),
        GuardOutcome::RedirectToSignIn => Err(Redirect::to(&format!(
            "/login?callbackUrl={}",
            urlencoding::encode(path)
        ))
        .into_response()),
        GuardOutcome::RedirectHome => Err(Redirect::to("/").into_response()),
    }
}
