//! Authentication request handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum_extra::extract::CookieJar;

use crate::AppState;
use crate::error::AppResult;
use crate::extract::ApiJson;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{
    LoginRequest, MessageResponse, RegisterRequest, RegisterResponse, SessionResponse, required,
    required_text,
};
use crate::services::auth;
use crate::services::cookies::{clear_session_cookie, session_cookie};

/// `POST /api/auth/login`: check credentials and set the session cookie.
pub async fn login_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(body): ApiJson<LoginRequest>,
) -> AppResult<(CookieJar, Json<SessionResponse>)> {
    let email = required_text(body.email, "email")?;
    let password = required(body.password.filter(|p| !p.is_empty()), "password")?;

    let (user, session) = auth::login(state.store.as_ref(), &state.keys, &email, &password).await?;
    let jar = jar.add(session_cookie(&session.token, state.config.production));
    Ok((jar, Json(SessionResponse { user })))
}

/// `POST /api/auth/register`: create a patient account.
pub async fn register_handler(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<RegisterResponse>)> {
    let user = auth::register(state.store.as_ref(), body).await?;
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User created successfully".into(),
            user,
        }),
    ))
}

/// `POST /api/auth/logout`: expire the session cookie.
pub async fn logout_handler(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    (
        jar.add(clear_session_cookie(state.config.production)),
        Json(MessageResponse::new("Logged out successfully")),
    )
}

/// `GET /api/auth/session`: the principal carried by the current cookie.
pub async fn session_handler(AuthenticatedUser(user): AuthenticatedUser) -> Json<SessionResponse> {
    Json(SessionResponse { user })
}
