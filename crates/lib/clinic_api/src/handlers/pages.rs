//! Placeholder HTML pages.
//!
//! The portals themselves are a separate front end; these pages exist so that
//! the gate's redirects land somewhere.

use axum::http::{StatusCode, Uri};
use axum::response::{Html, IntoResponse, Response};
use clinic_core::models::auth::Role;

use crate::error::AppError;
use crate::middleware::auth::AuthenticatedUser;

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
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

fn page(title: &str, body: &str) -> Html<String> {
    Html(format!(
        "<!doctype html>\n<html><head><meta charset=\"utf-8\"><title>{t} | Dental Clinic</title></head>\
         <body><h1>{t}</h1>{body}</body></html>\n",
        t = escape_html(title),
    ))
}

/// `GET /`
pub async fn home_page() -> Html<String> {
    page(
        "Dental Clinic",
        "<p><a href=\"/auth/login\">Sign in</a> or <a href=\"/auth/register\">register</a>.</p>",
    )
}

/// `GET /auth/login`
pub async fn login_page() -> Html<String> {
    page(
        "Sign in",
        "<p>POST your email and password to <code>/api/auth/login</code>.</p>",
    )
}

/// `GET /auth/register`
pub async fn register_page() -> Html<String> {
    page(
        "Register",
        "<p>POST your details to <code>/api/auth/register</code>.</p>",
    )
}

/// Everything without an explicit route: portal pages, else 404.
pub async fn fallback(uri: Uri, user: Option<AuthenticatedUser>) -> Response {
    let path = uri.path();
    if path == "/api" || path.starts_with("/api/") {
        return AppError::NotFound(format!("no route for {path}")).into_response();
    }

    let section = path.trim_start_matches('/').split('/').next().unwrap_or("");
    match (section.parse::<Role>(), user) {
        (Ok(portal), Some(AuthenticatedUser(principal))) if principal.role == portal => {
            let body = format!(
                "<p>Signed in as {} ({}).</p><p>Page: <code>{}</code></p>",
                escape_html(&principal.name),
                escape_html(&principal.email),
                escape_html(path),
            );
            page(&format!("{} portal", capitalize(portal.as_str())), &body).into_response()
        }
        _ => (StatusCode::NOT_FOUND, page("Not found", "")).into_response(),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!("&lt;b&gt;Tom &amp; Jerry&lt;/b&gt;", escape_html("<b>Tom & Jerry</b>"));
    }

    #[test]
    fn capitalizes_role() {
        assert_eq!("Receptionist", capitalize("receptionist"));
        assert_eq!("", capitalize(""));
    }
}
