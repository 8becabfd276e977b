//! User administration (admin only).

use axum::Json;
use axum::extract::State;
use clinic_core::access::scope::{USER_ADMINS, permits};
use clinic_core::auth::password::hash_password;
use clinic_core::models::auth::{NewUser, Principal, Role, User, UserUpdate};
use tracing::info;
use uuid::Uuid;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{
    CreateUserRequest, MessageResponse, UpdateUserRequest, UserQuery, UserResponse, required_text,
};

fn require_admin(principal: &Principal) -> AppResult<()> {
    if permits(principal, USER_ADMINS) {
        Ok(())
    } else {
        Err(AppError::Unauthorized)
    }
}

fn normalize_email(email: String) -> String {
    email.trim().to_lowercase()
}

/// `GET /api/users?role=`
pub async fn list_handler(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> AppResult<Json<Vec<User>>> {
    require_admin(&principal)?;
    Ok(Json(state.store.list_users(query.role).await?))
}

/// `POST /api/users`
pub async fn create_handler(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    ApiJson(body): ApiJson<CreateUserRequest>,
) -> AppResult<Json<UserResponse>> {
    require_admin(&principal)?;
    let password = required_text(body.password, "password")?;

    let user = state
        .store
        .create_user(NewUser {
            email: normalize_email(required_text(body.email, "email")?),
            password_hash: hash_password(&password)?,
            first_name: required_text(body.first_name, "firstName")?,
            last_name: required_text(body.last_name, "lastName")?,
            phone: body.phone,
            role: body.role.unwrap_or(Role::Patient),
            date_of_birth: body.date_of_birth,
            address: body.address,
        })
        .await?;

    info!(user_id = %user.id, role = %user.role, by = %principal.id, "user created");
    Ok(Json(UserResponse {
        message: "User created successfully".into(),
        user,
    }))
}

/// `PUT /api/users/{id}`
pub async fn update_handler(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<UpdateUserRequest>,
) -> AppResult<Json<UserResponse>> {
    require_admin(&principal)?;
    let password_hash = match body.password.filter(|p| !p.is_empty()) {
        Some(p) => Some(hash_password(&p)?),
        None => None,
    };

    let user = state
        .store
        .update_user(
            id,
            UserUpdate {
                email: body.email.map(normalize_email),
                password_hash,
                first_name: body.first_name,
                last_name: body.last_name,
                phone: body.phone,
                role: body.role,
                date_of_birth: body.date_of_birth,
                address: body.address,
            },
        )
        .await?;

    info!(user_id = %id, by = %principal.id, "user updated");
    Ok(Json(UserResponse {
        message: "User updated successfully".into(),
        user,
    }))
}

/// `DELETE /api/users/{id}`
pub async fn delete_handler(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    require_admin(&principal)?;
    if id == principal.id {
        return Err(AppError::Validation("cannot delete your own account".into()));
    }
    state.store.delete_user(id).await?;
    info!(user_id = %id, by = %principal.id, "user deleted");
    Ok(Json(MessageResponse::new("User deleted successfully")))
}
