//! Appointment handlers. Listing is scoped to the caller's role; updates and
//! deletes by patients and dentists are limited to their own appointments.

use axum::Json;
use axum::extract::State;
use clinic_core::access::scope::{
    appointment_owners, can_modify_appointment, restrict_appointment_update, scope_appointments,
};
use clinic_core::models::auth::{Principal, Role};
use clinic_core::models::clinic::{
    Appointment, AppointmentFilter, AppointmentStatus, AppointmentUpdate, NewAppointment,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{
    AppointmentQuery, AppointmentResponse, CreateAppointmentRequest, MessageResponse, parse_id,
    required, required_text,
};

const DEFAULT_DURATION_MINUTES: i32 = 30;

/// `GET /api/appointments`
pub async fn list_handler(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    ApiQuery(query): ApiQuery<AppointmentQuery>,
) -> AppResult<Json<Vec<Appointment>>> {
    // Patients and dentists are pinned to themselves; their owner params are never read.
    let requested = match principal.role {
        Role::Patient | Role::Dentist => AppointmentFilter {
            date: query.date,
            ..Default::default()
        },
        Role::Admin | Role::Receptionist => AppointmentFilter {
            patient_id: parse_id(query.patient_id, "patientId")?,
            dentist_id: parse_id(query.dentist_id, "dentistId")?,
            date: query.date,
        },
    };
    let filter = scope_appointments(&principal, requested);
    Ok(Json(state.store.list_appointments(&filter).await?))
}

/// `POST /api/appointments`
pub async fn create_handler(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    ApiJson(body): ApiJson<CreateAppointmentRequest>,
) -> AppResult<Json<AppointmentResponse>> {
    let (patient_id, dentist_id) = appointment_owners(&principal, body.patient_id, body.dentist_id);
    let duration = body.duration.unwrap_or(DEFAULT_DURATION_MINUTES);
    if duration <= 0 {
        return Err(AppError::Validation("duration must be positive".into()));
    }

    let appointment = state
        .store
        .create_appointment(NewAppointment {
            patient_id: required(patient_id, "patientId")?,
            dentist_id,
            date: required(body.date, "date")?,
            time: required_text(body.time, "time")?,
            kind: required_text(body.kind, "type")?,
            status: body.status.unwrap_or(AppointmentStatus::Scheduled),
            notes: body.notes,
            duration,
        })
        .await?;

    info!(appointment_id = %appointment.id, by = %principal.id, "appointment created");
    Ok(Json(AppointmentResponse {
        message: "Appointment created successfully".into(),
        appointment,
    }))
}

/// Load an appointment and check that `principal` may change it.
async fn load_modifiable(
    state: &AppState,
    principal: &Principal,
    id: Uuid,
) -> AppResult<Appointment> {
    let appointment = state
        .store
        .get_appointment(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("appointment {id}")))?;
    if !can_modify_appointment(principal, &appointment) {
        warn!(appointment_id = %id, user_id = %principal.id, "appointment not owned by caller");
        return Err(AppError::Unauthorized);
    }
    Ok(appointment)
}

/// `PUT /api/appointments/{id}`
pub async fn update_handler(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(mut update): ApiJson<AppointmentUpdate>,
) -> AppResult<Json<AppointmentResponse>> {
    load_modifiable(&state, &principal, id).await?;
    restrict_appointment_update(&principal, &mut update);
    if update.duration.is_some_and(|d| d <= 0) {
        return Err(AppError::Validation("duration must be positive".into()));
    }

    let appointment = state.store.update_appointment(id, update).await?;
    Ok(Json(AppointmentResponse {
        message: "Appointment updated successfully".into(),
        appointment,
    }))
}

/// `DELETE /api/appointments/{id}`
pub async fn delete_handler(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    load_modifiable(&state, &principal, id).await?;
    state.store.delete_appointment(id).await?;
    info!(appointment_id = %id, by = %principal.id, "appointment deleted");
    Ok(Json(MessageResponse::new("Appointment deleted successfully")))
}
