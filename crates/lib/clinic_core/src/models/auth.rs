//! Authentication domain models.
//!
//! These are internal domain models, distinct from the request/response
//! payloads in `clinic_api::models`.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Clinic role, stored as the `user_role` Postgres enum.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
pub enum Role {
    Admin,
    Dentist,
    Receptionist,
    Patient,
}

impl Role {
    /// Every role, in portal order.
    pub const ALL: [Role; 4] = [Role::Admin, Role::Dentist, Role::Receptionist, Role::Patient];

    /// Wire and database text representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Dentist => "dentist",
            Role::Receptionist => "receptionist",
            Role::Patient => "patient",
        }
    }

    /// Landing page of this role's portal.
    pub fn dashboard_path(&self) -> String {
        format!("/{}/dashboard", self.as_str())
    }

    /// Staff is everyone who is not a patient.
    pub fn is_staff(&self) -> bool {
        !matches!(self, Role::Patient)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not one of the four clinic roles.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "dentist" => Ok(Role::Dentist),
            "receptionist" => Ok(Role::Receptionist),
            "patient" => Ok(Role::Patient),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// The authenticated identity attached to a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: Uuid,
    pub email: String,
    /// Display name, `"{first} {last}"`.
    pub name: String,
    pub role: Role,
}

/// JWT claims embedded in the `session` cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Principal snapshot taken at login.
    pub user: Principal,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Expiry (unix timestamp).
    pub exp: i64,
}

/// Domain user. The password hash is never part of this struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: Role,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Snapshot this user as a session principal.
    pub fn principal(&self) -> Principal {
        Principal {
            id: self.id,
            email: self.email.clone(),
            name: self.display_name(),
            role: self.role,
        }
    }
}

/// User with password hash (for internal auth flows).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserWithPassword {
    #[sqlx(flatten)]
    pub user: User,
    pub password_hash: String,
}

/// Insert payload for a user; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: Role,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
}

/// Partial user update. `None` leaves the column unchanged.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub role: Option<Role>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
}
