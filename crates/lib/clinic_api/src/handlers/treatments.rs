//! Treatment records (medical history).

use axum::Json;
use axum::extract::State;
use clinic_core::access::scope::{TREATMENT_WRITERS, permits, scope_treatments};
use clinic_core::models::auth::Role;
use clinic_core::models::clinic::{NewTreatment, Treatment, TreatmentFilter, TreatmentStatus};
use tracing::info;

use super::today;
use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::extract::{ApiJson, ApiQuery};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{
    CreateTreatmentRequest, TreatmentQuery, TreatmentResponse, parse_id, required, required_text,
};

/// `GET /api/treatments`
pub async fn list_handler(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    ApiQuery(query): ApiQuery<TreatmentQuery>,
) -> AppResult<Json<Vec<Treatment>>> {
    let requested = match principal.role {
        Role::Patient => TreatmentFilter::default(),
        Role::Dentist => TreatmentFilter {
            patient_id: parse_id(query.patient_id, "patientId")?,
            dentist_id: None,
        },
        Role::Admin | Role::Receptionist => TreatmentFilter {
            patient_id: parse_id(query.patient_id, "patientId")?,
            dentist_id: parse_id(query.dentist_id, "dentistId")?,
        },
    };
    let filter = scope_treatments(&principal, requested);
    Ok(Json(state.store.list_treatments(&filter).await?))
}

/// `POST /api/treatments`. A dentist always records under their own name.
pub async fn create_handler(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    ApiJson(body): ApiJson<CreateTreatmentRequest>,
) -> AppResult<Json<TreatmentResponse>> {
    if !permits(&principal, TREATMENT_WRITERS) {
        return Err(AppError::Unauthorized);
    }
    let dentist_id = match principal.role {
        Role::Dentist => principal.id,
        _ => required(body.dentist_id, "dentistId")?,
    };
    let cost = body.cost.unwrap_or(0.0);
    if !cost.is_finite() || cost < 0.0 {
        return Err(AppError::Validation("cost must be a non-negative number".into()));
    }

    let treatment = state
        .store
        .create_treatment(NewTreatment {
            patient_id: required(body.patient_id, "patientId")?,
            dentist_id,
            appointment_id: body.appointment_id,
            kind: required_text(body.kind, "type")?,
            description: required_text(body.description, "description")?,
            notes: body.notes,
            cost,
            date: body.date.unwrap_or_else(today),
            status: body.status.unwrap_or(TreatmentStatus::Planned),
        })
        .await?;

    info!(treatment_id = %treatment.id, by = %principal.id, "treatment recorded");
    Ok(Json(TreatmentResponse {
        message: "Treatment created successfully".into(),
        treatment,
    }))
}
