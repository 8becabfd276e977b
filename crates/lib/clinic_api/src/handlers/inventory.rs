//! Inventory handlers. Everyone signed in can read; only admins and
//! receptionists write.

use axum::Json;
use axum::extract::State;
use clinic_core::access::scope::{INVENTORY_WRITERS, permits};
use clinic_core::models::auth::Principal;
use clinic_core::models::clinic::{InventoryItem, InventoryUpdate, NewInventoryItem};
use tracing::info;
use uuid::Uuid;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{CreateInventoryRequest, InventoryItemResponse, MessageResponse, required_text};

const DEFAULT_UNIT: &str = "units";

fn require_writer(principal: &Principal) -> AppResult<()> {
    if permits(principal, INVENTORY_WRITERS) {
        Ok(())
    } else {
        Err(AppError::Unauthorized)
    }
}

fn check_counts(values: &[Option<i32>]) -> AppResult<()> {
    if values.iter().flatten().any(|v| *v < 0) {
        return Err(AppError::Validation("stock levels cannot be negative".into()));
    }
    Ok(())
}

/// `GET /api/inventory`
pub async fn list_handler(State(state): State<AppState>) -> AppResult<Json<Vec<InventoryItem>>> {
    Ok(Json(state.store.list_inventory().await?))
}

/// `POST /api/inventory`
pub async fn create_handler(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    ApiJson(body): ApiJson<CreateInventoryRequest>,
) -> AppResult<Json<InventoryItemResponse>> {
    require_writer(&principal)?;
    check_counts(&[body.current_stock, body.min_stock, body.max_stock])?;

    let item = state
        .store
        .create_inventory_item(NewInventoryItem {
            name: required_text(body.name, "name")?,
            category: required_text(body.category, "category")?,
            current_stock: body.current_stock.unwrap_or(0),
            min_stock: body.min_stock.unwrap_or(0),
            max_stock: body.max_stock.unwrap_or(0),
            unit: body.unit.unwrap_or_else(|| DEFAULT_UNIT.into()),
            supplier: body.supplier,
            cost: body.cost.unwrap_or(0.0),
            expiry_date: body.expiry_date,
        })
        .await?;

    info!(item_id = %item.id, by = %principal.id, "inventory item created");
    Ok(Json(InventoryItemResponse {
        message: "Item created successfully".into(),
        item,
    }))
}

/// `PUT /api/inventory/{id}`
pub async fn update_handler(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(update): ApiJson<InventoryUpdate>,
) -> AppResult<Json<InventoryItemResponse>> {
    require_writer(&principal)?;
    check_counts(&[update.current_stock, update.min_stock, update.max_stock])?;

    let item = state.store.update_inventory_item(id, update).await?;
    Ok(Json(InventoryItemResponse {
        message: "Item updated successfully".into(),
        item,
    }))
}

/// `DELETE /api/inventory/{id}`
pub async fn delete_handler(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    require_writer(&principal)?;
    state.store.delete_inventory_item(id).await?;
    info!(item_id = %id, by = %principal.id, "inventory item deleted");
    Ok(Json(MessageResponse::new("Item deleted successfully")))
}
