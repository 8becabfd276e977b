//! Invoice handlers.

use axum::Json;
use axum::extract::State;
use chrono::NaiveDate;
use clinic_core::access::scope::{INVOICE_WRITERS, permits, scope_invoices};
use clinic_core::models::auth::Role;
use clinic_core::models::clinic::{Invoice, InvoiceFilter, InvoiceStatus, InvoiceUpdate, NewInvoice};
use tracing::info;
use uuid::Uuid;

use super::today;
use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{
    CreateInvoiceRequest, InvoiceQuery, InvoiceResponse, parse_id, required, required_text,
};

/// An invoice marked paid without a payment date is paid today.
fn stamp_paid_date(
    status: Option<InvoiceStatus>,
    paid_date: Option<NaiveDate>,
) -> Option<NaiveDate> {
    match (status, paid_date) {
        (Some(InvoiceStatus::Paid), None) => Some(today()),
        (_, given) => given,
    }
}

/// `GET /api/invoices`
pub async fn list_handler(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    ApiQuery(query): ApiQuery<InvoiceQuery>,
) -> AppResult<Json<Vec<Invoice>>> {
    let patient_id = match principal.role {
        Role::Patient => None,
        _ => parse_id(query.patient_id, "patientId")?,
    };
    let requested = InvoiceFilter {
        patient_id,
        status: query.status,
    };
    let filter = scope_invoices(&principal, requested);
    Ok(Json(state.store.list_invoices(&filter).await?))
}

/// `POST /api/invoices`
pub async fn create_handler(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    ApiJson(body): ApiJson<CreateInvoiceRequest>,
) -> AppResult<Json<InvoiceResponse>> {
    if !permits(&principal, INVOICE_WRITERS) {
        return Err(AppError::Unauthorized);
    }
    let amount = required(body.amount, "amount")?;
    if !amount.is_finite() || amount < 0.0 {
        return Err(AppError::Validation("amount must be a non-negative number".into()));
    }

    let status = body.status.unwrap_or(InvoiceStatus::Pending);
    let invoice = state
        .store
        .create_invoice(NewInvoice {
            patient_id: required(body.patient_id, "patientId")?,
            appointment_id: body.appointment_id,
            amount,
            description: required_text(body.description, "description")?,
            status,
            due_date: required(body.due_date, "dueDate")?,
            paid_date: stamp_paid_date(Some(status), body.paid_date),
        })
        .await?;

    info!(invoice_id = %invoice.id, by = %principal.id, "invoice created");
    Ok(Json(InvoiceResponse {
        message: "Invoice created successfully".into(),
        invoice,
    }))
}

/// `PUT /api/invoices/{id}`
pub async fn update_handler(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(mut update): ApiJson<InvoiceUpdate>,
) -> AppResult<Json<InvoiceResponse>> {
    if !permits(&principal, INVOICE_WRITERS) {
        return Err(AppError::Unauthorized);
    }
    if update.amount.is_some_and(|a| !a.is_finite() || a < 0.0) {
        return Err(AppError::Validation("amount must be a non-negative number".into()));
    }
    update.paid_date = stamp_paid_date(update.status, update.paid_date);

    let invoice = state.store.update_invoice(id, update).await?;
    info!(invoice_id = %id, status = ?invoice.status, by = %principal.id, "invoice updated");
    Ok(Json(InvoiceResponse {
        message: "Invoice updated successfully".into(),
        invoice,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paid_without_date_is_stamped() {
        assert_eq!(Some(today()), stamp_paid_date(Some(InvoiceStatus::Paid), None));
    }

    #[test]
    fn explicit_paid_date_is_kept() {
        let d = NaiveDate::from_ymd_opt(2026, 1, 2);
        assert_eq!(d, stamp_paid_date(Some(InvoiceStatus::Paid), d));
        assert_eq!(None, stamp_paid_date(Some(InvoiceStatus::Overdue), None));
        assert_eq!(None, stamp_paid_date(None, None));
    }
}
