//! Demo data for a fresh database.

use chrono::NaiveDate;
use thiserror::Error;
use tracing::info;

use crate::auth::AuthError;
use crate::auth::password::hash_password;
use crate::models::auth::{NewUser, Role};
use crate::models::clinic::NewInventoryItem;
use crate::store::{ClinicStore, StoreError};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    /// At least one user existed; nothing was written.
    AlreadySeeded,
    Seeded,
}

struct SeedUser {
    email: &'static str,
    password: &'static str,
    first_name: &'static str,
    last_name: &'static str,
    phone: &'static str,
    role: Role,
}

const USERS: &[SeedUser] = &[
    SeedUser {
        email: "admin@clinic.com",
        password: "admin123",
        first_name: "Admin",
        last_name: "User",
        phone: "+1234567890",
        role: Role::Admin,
    },
    SeedUser {
        email: "dentist@clinic.com",
        password: "dentist123",
        first_name: "Dr. Sarah",
        last_name: "Johnson",
        phone: "+1234567891",
        role: Role::Dentist,
    },
    SeedUser {
        email: "reception@clinic.com",
        password: "reception123",
        first_name: "Mike",
        last_name: "Wilson",
        phone: "+1234567892",
        role: Role::Receptionist,
    },
    SeedUser {
        email: "patient@clinic.com",
        password: "patient123",
        first_name: "John",
        last_name: "Smith",
        phone: "+1234567893",
        role: Role::Patient,
    },
];

fn inventory() -> Vec<NewInventoryItem> {
    vec![
        NewInventoryItem {
            name: "Dental Floss".into(),
            category: "Hygiene".into(),
            current_stock: 15,
            min_stock: 20,
            max_stock: 100,
            unit: "boxes".into(),
            supplier: Some("DentalCorp".into()),
            cost: 12.5,
            expiry_date: NaiveDate::from_ymd_opt(2025, 6, 15),
        },
        NewInventoryItem {
            name: "Disposable Gloves".into(),
            category: "Safety".into(),
            current_stock: 250,
            min_stock: 100,
            max_stock: 500,
            unit: "boxes".into(),
            supplier: Some("MedSupply".into()),
            cost: 25.0,
            expiry_date: NaiveDate::from_ymd_opt(2026, 12, 31),
        },
    ]
}

/// Populate an empty store with one user per role and a little inventory.
///
/// A store that already holds any user is left untouched.
pub async fn seed(store: &dyn ClinicStore) -> Result<SeedOutcome, SeedError> {
    if store.count_users().await? > 0 {
        info!("seed skipped, users already present");
        return Ok(SeedOutcome::AlreadySeeded);
    }

    for u in USERS {
        let is_patient = u.role == Role::Patient;
        store
            .create_user(NewUser {
                email: u.email.into(),
                password_hash: hash_password(u.password)?,
                first_name: u.first_name.into(),
                last_name: u.last_name.into(),
                phone: Some(u.phone.into()),
                role: u.role,
                date_of_birth: is_patient
                    .then(|| NaiveDate::from_ymd_opt(1990, 1, 1))
                    .flatten(),
                address: is_patient.then(|| "123 Main St, City, State 12345".into()),
            })
            .await?;
    }

    for item in inventory() {
        store.create_inventory_item(item).await?;
    }

    info!(users = USERS.len(), "database seeded");
    Ok(SeedOutcome::Seeded)
}
