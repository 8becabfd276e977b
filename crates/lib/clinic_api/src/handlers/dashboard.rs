//! Dashboard counters.

use axum::Json;
use axum::extract::State;
use clinic_core::models::clinic::DashboardStats;

use super::today;
use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::AuthenticatedUser;

/// `GET /api/dashboard/stats`: counters for the caller's role.
pub async fn stats_handler(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
) -> AppResult<Json<DashboardStats>> {
    let stats = state.store.dashboard_stats(&principal, today()).await?;
    Ok(Json(stats))
}
