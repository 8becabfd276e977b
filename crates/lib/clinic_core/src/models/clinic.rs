//! Clinic record models: appointments, inventory, invoices and treatments.
//!
//! Owner references (`patient_id`, `dentist_id`) are plain query keys; nothing
//! here enforces that they point at existing users.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stored as the `appointment_status` Postgres enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "kebab-case")]
#[sqlx(type_name = "appointment_status", rename_all = "kebab-case")]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    Completed,
    Cancelled,
    NoShow,
}

/// Stored as the `invoice_status` Postgres enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "invoice_status", rename_all = "lowercase")]
pub enum InvoiceStatus {
    Pending,
    Paid,
    Overdue,
    Cancelled,
}

impl InvoiceStatus {
    /// Counts towards a patient's outstanding balance.
    pub fn is_outstanding(&self) -> bool {
        matches!(self, InvoiceStatus::Pending | InvoiceStatus::Overdue)
    }
}

/// Stored as the `treatment_status` Postgres enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "kebab-case")]
#[sqlx(type_name = "treatment_status", rename_all = "kebab-case")]
pub enum TreatmentStatus {
    Planned,
    InProgress,
    Completed,
}

// ---------------------------------------------------------------------------
// Appointments
// ---------------------------------------------------------------------------

/// Appointment with the patient/dentist display names joined in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub dentist_id: Option<Uuid>,
    pub date: NaiveDate,
    /// Wall-clock slot label, e.g. `"09:30"`.
    pub time: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    /// Minutes.
    pub duration: i32,
    pub patient_name: Option<String>,
    pub dentist_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub patient_id: Uuid,
    pub dentist_id: Option<Uuid>,
    pub date: NaiveDate,
    pub time: String,
    pub kind: String,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub duration: i32,
}

/// Partial appointment update. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentUpdate {
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

/// Appointment list filter. Every set field must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppointmentFilter {
    pub patient_id: Option<Uuid>,
    pub dentist_id: Option<Uuid>,
    pub date: Option<NaiveDate>,
}

impl AppointmentFilter {
    pub fn matches(&self, appt: &Appointment) -> bool {
        self.patient_id.is_none_or(|id| appt.patient_id == id)
            && self.dentist_id.is_none_or(|id| appt.dentist_id == Some(id))
            && self.date.is_none_or(|d| appt.date == d)
    }
}

// ---------------------------------------------------------------------------
// Inventory
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub current_stock: i32,
    pub min_stock: i32,
    pub max_stock: i32,
    pub unit: String,
    pub supplier: Option<String>,
    pub cost: f64,
    pub expiry_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InventoryItem {
    pub fn is_low_stock(&self) -> bool {
        self.current_stock <= self.min_stock
    }
}

#[derive(Debug, Clone)]
pub struct NewInventoryItem {
    pub name: String,
    pub category: String,
    pub current_stock: i32,
    pub min_stock: i32,
    pub max_stock: i32,
    pub unit: String,
    pub supplier: Option<String>,
    pub cost: f64,
    pub expiry_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryUpdate {
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

// ---------------------------------------------------------------------------
// Invoices
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub appointment_id: Option<Uuid>,
    pub amount: f64,
    pub description: String,
    pub status: InvoiceStatus,
    pub due_date: NaiveDate,
    pub paid_date: Option<NaiveDate>,
    pub patient_name: Option<String>,
    pub patient_email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub patient_id: Uuid,
    pub appointment_id: Option<Uuid>,
    pub amount: f64,
    pub description: String,
    pub status: InvoiceStatus,
    pub due_date: NaiveDate,
    pub paid_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceUpdate {
    pub appointment_id: Option<Uuid>,
    pub amount: Option<f64>,
    pub description: Option<String>,
    pub status: Option<InvoiceStatus>,
    pub due_date: Option<NaiveDate>,
    pub paid_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvoiceFilter {
    pub patient_id: Option<Uuid>,
    pub status: Option<InvoiceStatus>,
}

impl InvoiceFilter {
    pub fn matches(&self, invoice: &Invoice) -> bool {
        self.patient_id.is_none_or(|id| invoice.patient_id == id)
            && self.status.is_none_or(|s| invoice.status == s)
    }
}

// ---------------------------------------------------------------------------
// Treatments
// ---------------------------------------------------------------------------

/// A treatment record, the medical-history entry shown in the portals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Treatment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub dentist_id: Uuid,
    pub appointment_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub notes: Option<String>,
    pub cost: f64,
    pub date: NaiveDate,
    pub status: TreatmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTreatment {
    pub patient_id: Uuid,
    pub dentist_id: Uuid,
    pub appointment_id: Option<Uuid>,
    pub kind: String,
    pub description: String,
    pub notes: Option<String>,
    pub cost: f64,
    pub date: NaiveDate,
    pub status: TreatmentStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreatmentFilter {
    pub patient_id: Option<Uuid>,
    pub dentist_id: Option<Uuid>,
}

impl TreatmentFilter {
    pub fn matches(&self, treatment: &Treatment) -> bool {
        self.patient_id.is_none_or(|id| treatment.patient_id == id)
            && self.dentist_id.is_none_or(|id| treatment.dentist_id == id)
    }
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

/// Role-conditional dashboard counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged, rename_all_fields = "camelCase")]
pub enum DashboardStats {
    Admin {
        total_patients: i64,
        total_staff: i64,
        today_appointments: i64,
        monthly_revenue: f64,
        low_stock_alerts: i64,
    },
    Dentist {
        today_appointments: i64,
        total_patients: i64,
        pending_reports: i64,
    },
    Receptionist {
        today_appointments: i64,
        pending_invoices: i64,
        overdue_invoices: i64,
    },
    Patient {
        upcoming_appointments: i64,
        outstanding_balance: f64,
    },
}
