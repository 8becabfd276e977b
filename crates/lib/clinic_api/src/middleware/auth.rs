//! Session gate: reads the `session` cookie and applies the route rules of
//! [`clinic_core::access::gate`] to every request.

use std::convert::Infallible;

use axum::extract::{FromRequestParts, OptionalFromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::CookieJar;
use clinic_core::access::gate::{GateOutcome, evaluate};
use clinic_core::models::auth::Principal;

use crate::AppState;
use crate::error::AppError;
use crate::services::cookies::SESSION_COOKIE;

/// Principal attached to the request by [`session_gate`].
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Principal);

impl<S: Send + Sync> FromRequestParts<S> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AppError::Unauthenticated)
    }
}

impl<S: Send + Sync> OptionalFromRequestParts<S> for AuthenticatedUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<AuthenticatedUser>().cloned())
    }
}

/// Axum middleware: evaluates the gate for the request path and either runs
/// the inner service (with `AuthenticatedUser` in the extensions when a
/// session verified), redirects, or answers 401.
pub async fn session_gate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let jar = CookieJar::from_headers(request.headers());
    let token = jar.get(SESSION_COOKIE).map(|c| c.value().to_owned());

    let outcome = evaluate(request.uri().path(), token.as_deref(), |t| state.keys.verify(t));

    match outcome {
        GateOutcome::Proceed(principal) => {
            if let Some(principal) = principal {
                request.extensions_mut().insert(AuthenticatedUser(principal));
            }
            next.run(request).await
        }
        GateOutcome::Redirect(to) => Redirect::temporary(&to).into_response(),
        GateOutcome::Reject => AppError::Unauthenticated.into_response(),
    }
}
