//! Demo data loader.

use axum::Json;
use axum::extract::State;
use clinic_core::seed::{SeedOutcome, seed};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::MessageResponse;

/// `POST /api/seed`. Refused in production.
pub async fn seed_handler(State(state): State<AppState>) -> AppResult<Json<MessageResponse>> {
    if state.config.production {
        return Err(AppError::Forbidden("Seeding is disabled in production".into()));
    }
    let message = match seed(state.store.as_ref()).await? {
        SeedOutcome::AlreadySeeded => "Database already seeded",
        SeedOutcome::Seeded => "Database seeded successfully",
    };
    Ok(Json(MessageResponse::new(message)))
}
