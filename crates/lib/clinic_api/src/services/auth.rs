//! Authentication service: login and self-registration flows.

use clinic_core::auth::password::{hash_password, verify_password};
use clinic_core::auth::session::{IssuedSession, SessionKeys};
use clinic_core::models::auth::{NewUser, Principal, Role};
use clinic_core::store::ClinicStore;
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::models::{RegisterRequest, required_text};

/// Normalise an email for lookup and storage.
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Authenticate with email + password and sign a fresh session.
///
/// Unknown email and wrong password are indistinguishable to the caller.
pub async fn login(
    store: &dyn ClinicStore,
    keys: &SessionKeys,
    email: &str,
    password: &str,
) -> AppResult<(Principal, IssuedSession)> {
    let email = normalize_email(email);
    let Some(record) = store.find_user_by_email(&email).await? else {
        warn!(%email, "login for unknown email");
        return Err(AppError::Unauthenticated);
    };
    if !verify_password(password, &record.password_hash)? {
        warn!(user_id = %record.user.id, "login with wrong password");
        return Err(AppError::Unauthenticated);
    }

    let principal = record.user.principal();
    let session = keys.issue(&principal)?;
    info!(user_id = %principal.id, role = %principal.role, "login succeeded");
    Ok((principal, session))
}

/// Create a patient account from a self-registration form.
///
/// Any requested role other than `patient`, known or not, is refused.
pub async fn register(store: &dyn ClinicStore, req: RegisterRequest) -> AppResult<Principal> {
    let email = normalize_email(&required_text(req.email, "email")?);
    let password = required_text(req.password, "password")?;
    let first_name = required_text(req.first_name, "firstName")?;
    let last_name = required_text(req.last_name, "lastName")?;

    if let Some(role) = req.role.as_deref()
        && !matches!(role.parse::<Role>(), Ok(Role::Patient))
    {
        warn!(%email, %role, "self-registration with non-patient role refused");
        return Err(AppError::Unauthorized);
    }

    if store.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict("User already exists".into()));
    }

    let user = store
        .create_user(NewUser {
            email,
            password_hash: hash_password(&password)?,
            first_name,
            last_name,
            phone: req.phone,
            role: Role::Patient,
            date_of_birth: req.date_of_birth,
            address: req.address,
        })
        .await?;

    info!(user_id = %user.id, "patient registered");
    Ok(user.principal())
}
