//! Request and response payloads.
//!
//! Request fields the client may omit are `Option` so that a missing field
//! surfaces as a `validation_error` body. Malformed bodies are rejected by
//! the extractors in [`crate::extract`] with the same body shape.

use chrono::NaiveDate;
use clinic_core::models::auth::{Principal, Role, User};
use clinic_core::models::clinic::{
    Appointment, AppointmentStatus, InventoryItem, Invoice, InvoiceStatus, Treatment,
    TreatmentStatus,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Unwrap a required request field.
pub fn required<T>(value: Option<T>, field: &str) -> AppResult<T> {
    value.ok_or_else(|| AppError::Validation(format!("{field} is required")))
}

/// Unwrap a required text field; blank counts as missing.
pub fn required_text(value: Option<String>, field: &str) -> AppResult<String> {
    required(value.filter(|v| !v.trim().is_empty()), field)
}

/// Parse an optional id filter from the query string; blank counts as absent.
pub fn parse_id(value: Option<String>, field: &str) -> AppResult<Option<Uuid>> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(|v| {
            v.trim()
                .parse::<Uuid>()
                .map_err(|_| AppError::Validation(format!("{field} is not a valid id")))
        })
        .transpose()
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    /// Kept as text so that an unknown role is refused like a privileged one.
    pub role: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub user: Principal,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user: Principal,
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct UserQuery {
    pub role: Option<Role>,
}

/// Admin-created account; unlike self-registration any role is allowed.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub role: Option<Role>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub role: Option<Role>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub message: String,
    pub user: User,
}

// ---------------------------------------------------------------------------
// Appointments
// ---------------------------------------------------------------------------

/// Owner ids stay raw until the caller's scope says whether they are used.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentQuery {
    pub patient_id: Option<String>,
    pub dentist_id: Option<String>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentRequest {
    pub patient_id: Option<Uuid>,
    pub dentist_id: Option<Uuid>,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub status: Option<AppointmentStatus>,
    pub notes: Option<String>,
    pub duration: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AppointmentResponse {
    pub message: String,
    pub appointment: Appointment,
}

// ---------------------------------------------------------------------------
// Inventory
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInventoryRequest {
    pub name: Option<String>,
    pub category: Option<String>,
    pub current_stock: Option<i32>,
    pub min_stock: Option<i32>,
    pub max_stock: Option<i32>,
    pub unit: Option<String>,
    pub supplier: Option<String>,
    pub cost: Option<f64>,
    pub expiry_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InventoryItemResponse {
    pub message: String,
    pub item: InventoryItem,
}

// ---------------------------------------------------------------------------
// Invoices
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceQuery {
    pub patient_id: Option<String>,
    pub status: Option<InvoiceStatus>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceRequest {
    pub patient_id: Option<Uuid>,
    pub appointment_id: Option<Uuid>,
    pub amount: Option<f64>,
    pub description: Option<String>,
    pub status: Option<InvoiceStatus>,
    pub due_date: Option<NaiveDate>,
    pub paid_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InvoiceResponse {
    pub message: String,
    pub invoice: Invoice,
}

// ---------------------------------------------------------------------------
// Treatments
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreatmentQuery {
    pub patient_id: Option<String>,
    pub dentist_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTreatmentRequest {
    pub patient_id: Option<Uuid>,
    pub dentist_id: Option<Uuid>,
    pub appointment_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub cost: Option<f64>,
    pub date: Option<NaiveDate>,
    pub status: Option<TreatmentStatus>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TreatmentResponse {
    pub message: String,
    pub treatment: Treatment,
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub store_connected: bool,
}
