//! Clinic record storage.
//!
//! [`ClinicStore`] is the single persistence seam. The process creates one
//! store at startup, shares it through `AppState`, and closes it on shutdown.
//! [`PgStore`] backs production; [`MemoryStore`] backs tests and local demos.

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use crate::models::auth::{NewUser, Principal, Role, User, UserUpdate, UserWithPassword};
use crate::models::clinic::{
    Appointment, AppointmentFilter, AppointmentUpdate, DashboardStats, InventoryItem,
    InventoryUpdate, Invoice, InvoiceFilter, InvoiceUpdate, NewAppointment, NewInventoryItem,
    NewInvoice, NewTreatment, Treatment, TreatmentFilter,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Db(sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => StoreError::NotFound("row not found".into()),
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                StoreError::Conflict(db.message().to_string())
            }
            other => StoreError::Db(other),
        }
    }
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Shared handle injected into request handlers.
pub type SharedStore = Arc<dyn ClinicStore>;

#[async_trait]
pub trait ClinicStore: Send + Sync {
    /// Round-trip to the backend.
    async fn ping(&self) -> Result<()>;

    /// Release backend resources. Called once from the shutdown hook.
    async fn close(&self);

    // -- users --------------------------------------------------------------

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserWithPassword>>;
    async fn get_user(&self, id: Uuid) -> Result<Option<User>>;
    async fn list_users(&self, role: Option<Role>) -> Result<Vec<User>>;
    async fn count_users(&self) -> Result<i64>;
    /// Fails with [`StoreError::Conflict`] when the email is taken.
    async fn create_user(&self, user: NewUser) -> Result<User>;
    async fn update_user(&self, id: Uuid, update: UserUpdate) -> Result<User>;
    async fn delete_user(&self, id: Uuid) -> Result<()>;

    // -- appointments -------------------------------------------------------

    async fn list_appointments(&self, filter: &AppointmentFilter) -> Result<Vec<Appointment>>;
    async fn get_appointment(&self, id: Uuid) -> Result<Option<Appointment>>;
    async fn create_appointment(&self, appointment: NewAppointment) -> Result<Appointment>;
    async fn update_appointment(&self, id: Uuid, update: AppointmentUpdate)
    -> Result<Appointment>;
    async fn delete_appointment(&self, id: Uuid) -> Result<()>;

    // -- inventory ----------------------------------------------------------

    async fn list_inventory(&self) -> Result<Vec<InventoryItem>>;
    async fn create_inventory_item(&self, item: NewInventoryItem) -> Result<InventoryItem>;
    async fn update_inventory_item(&self, id: Uuid, update: InventoryUpdate)
    -> Result<InventoryItem>;
    async fn delete_inventory_item(&self, id: Uuid) -> Result<()>;

    // -- invoices -----------------------------------------------------------

    async fn list_invoices(&self, filter: &InvoiceFilter) -> Result<Vec<Invoice>>;
    async fn create_invoice(&self, invoice: NewInvoice) -> Result<Invoice>;
    async fn update_invoice(&self, id: Uuid, update: InvoiceUpdate) -> Result<Invoice>;

    // -- treatments ---------------------------------------------------------

    async fn list_treatments(&self, filter: &TreatmentFilter) -> Result<Vec<Treatment>>;
    async fn create_treatment(&self, treatment: NewTreatment) -> Result<Treatment>;

    // -- dashboard ----------------------------------------------------------

    /// Counters for `principal`'s dashboard, relative to `today`.
    async fn dashboard_stats(&self, principal: &Principal, today: NaiveDate)
    -> Result<DashboardStats>;
}
