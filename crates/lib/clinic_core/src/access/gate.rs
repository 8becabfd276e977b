//! Per-request authorization gate.
//!
//! Classifies a request path, inspects the session token and decides whether
//! the request proceeds, is redirected, or is rejected. Nothing is persisted;
//! every request is evaluated from scratch.

use tracing::debug;

use crate::auth::session::VerificationError;
use crate::models::auth::{Principal, Role};

/// Where unauthenticated portal visitors are sent.
pub const LOGIN_PATH: &str = "/auth/login";

/// Pages rendered for anonymous visitors. Exact match.
const PUBLIC_PAGES: &[&str] = &["/", "/auth/login", "/auth/register"];

/// Routes that bypass verification entirely. Segment-prefix match.
const OPEN_PREFIXES: &[&str] = &[
    "/static",
    "/favicon.ico",
    "/api/auth/login",
    "/api/auth/register",
    "/api/auth/logout",
    "/api/health",
    "/api/seed",
];

const ALL_ROLES: &[Role] = &Role::ALL;

/// Protected API prefixes and the roles allowed through each.
const PROTECTED_API: &[(&str, &[Role])] = &[
    ("/api/users", &[Role::Admin]),
    ("/api/appointments", ALL_ROLES),
    ("/api/dashboard", ALL_ROLES),
    ("/api/treatments", ALL_ROLES),
    ("/api/inventory", ALL_ROLES),
    (
        "/api/invoices",
        &[Role::Admin, Role::Receptionist, Role::Patient],
    ),
    ("/api/auth/session", ALL_ROLES),
];

/// What kind of route a path is, as far as the gate is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Login/register/landing. Signed-in visitors get bounced to their dashboard.
    PublicPage,
    /// Never inspected.
    Open,
    /// JSON API guarded by a role allow-set.
    ProtectedApi(&'static [Role]),
    /// A role's portal, `/{role}/...`.
    Portal(Role),
    /// Not guarded; a valid session is still attached.
    Unprotected,
}

/// `path` equals `prefix` or continues it with a new segment.
fn has_segment_prefix(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

pub fn classify(path: &str) -> RouteClass {
    if PUBLIC_PAGES.contains(&path) {
        return RouteClass::PublicPage;
    }
    if OPEN_PREFIXES.iter().any(|p| has_segment_prefix(path, p)) {
        return RouteClass::Open;
    }
    if let Some((_, roles)) = PROTECTED_API
        .iter()
        .find(|(prefix, _)| has_segment_prefix(path, prefix))
    {
        return RouteClass::ProtectedApi(roles);
    }
    if has_segment_prefix(path, "/api") {
        return RouteClass::Open;
    }
    let first_segment = path.trim_start_matches('/').split('/').next().unwrap_or("");
    match first_segment.parse::<Role>() {
        Ok(role) => RouteClass::Portal(role),
        Err(_) => RouteClass::Unprotected,
    }
}

/// Gate state for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateState {
    NoToken,
    TokenInvalid(VerificationError),
    TokenValidNoRoleMatch(Principal),
    TokenValidAllowed(Principal),
}

/// Terminal result of the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// Run the handler, with the principal when one was verified.
    Proceed(Option<Principal>),
    /// Send the client elsewhere.
    Redirect(String),
    /// 401 with the generic error body.
    Reject,
}

/// Role requirement of a guarded route.
fn role_permitted(class: RouteClass, role: Role) -> bool {
    match class {
        RouteClass::ProtectedApi(allowed) => allowed.contains(&role),
        RouteClass::Portal(portal) => portal == role,
        RouteClass::PublicPage | RouteClass::Open | RouteClass::Unprotected => true,
    }
}

/// Verify the token (if any) and match the principal against the route.
pub fn session_state<V>(class: RouteClass, token: Option<&str>, verify: V) -> GateState
where
    V: FnOnce(&str) -> Result<Principal, VerificationError>,
{
    let Some(token) = token.filter(|t| !t.is_empty()) else {
        return GateState::NoToken;
    };
    match verify(token) {
        Err(e) => GateState::TokenInvalid(e),
        Ok(principal) if role_permitted(class, principal.role) => {
            GateState::TokenValidAllowed(principal)
        }
        Ok(principal) => GateState::TokenValidNoRoleMatch(principal),
    }
}

/// Decide the fate of a request for `path` carrying `token`.
pub fn evaluate<V>(path: &str, token: Option<&str>, verify: V) -> GateOutcome
where
    V: FnOnce(&str) -> Result<Principal, VerificationError>,
{
    let class = classify(path);
    if class == RouteClass::Open {
        return GateOutcome::Proceed(None);
    }

    let state = session_state(class, token, verify);
    debug!(path, ?class, ?state, "gate evaluated");

    match (class, state) {
        (RouteClass::Open, _) => GateOutcome::Proceed(None),

        (RouteClass::PublicPage, GateState::TokenValidAllowed(p)) => {
            GateOutcome::Redirect(p.role.dashboard_path())
        }
        (RouteClass::Unprotected, GateState::TokenValidAllowed(p)) => GateOutcome::Proceed(Some(p)),
        (RouteClass::PublicPage | RouteClass::Unprotected, _) => GateOutcome::Proceed(None),

        (RouteClass::ProtectedApi(_), GateState::TokenValidAllowed(p)) => {
            GateOutcome::Proceed(Some(p))
        }
        (RouteClass::ProtectedApi(_), _) => GateOutcome::Reject,

        (RouteClass::Portal(_), GateState::TokenValidAllowed(p)) => GateOutcome::Proceed(Some(p)),
        (RouteClass::Portal(_), GateState::TokenValidNoRoleMatch(p)) => {
            GateOutcome::Redirect(p.role.dashboard_path())
        }
        (RouteClass::Portal(_), GateState::NoToken | GateState::TokenInvalid(_)) => {
            GateOutcome::Redirect(LOGIN_PATH.to_string())
        }
    }
}
