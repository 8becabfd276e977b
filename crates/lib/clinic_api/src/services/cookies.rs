//! Session cookie builders.

use axum_extra::extract::cookie::{Cookie, SameSite};
use clinic_core::auth::session::SESSION_TTL_SECS;
use time::Duration;

/// Cookie name for the session token.
pub const SESSION_COOKIE: &str = "session";

fn build(value: String, secure: bool, max_age: Duration) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, value))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(max_age)
        .build()
}

/// HTTP-only session cookie living as long as the token does.
pub fn session_cookie(token: &str, secure: bool) -> Cookie<'static> {
    build(token.to_string(), secure, Duration::seconds(SESSION_TTL_SECS))
}

/// Expired cookie that makes the browser drop the session.
pub fn clear_session_cookie(secure: bool) -> Cookie<'static> {
    build(String::new(), secure, Duration::ZERO)
}
