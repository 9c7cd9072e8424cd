use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};

use crate::controllers::inventory_controller::InventoryController;
use crate::dto::inventory_dto::{
    AdjustQuantityRequest, CreateInventoryItemRequest, RecordUsageRequest,
    UpdateInventoryItemRequest,
};
use crate::dto::{DeleteResponse, SearchQuery};
use crate::models::inventory::{InventoryItem, InventoryUsage, UsageQuery};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_inventory_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_items).post(create_item))
        .route("/low-stock", get(low_stock))
        .route("/categories", get(categories))
        .route("/category/:category", get(items_by_category))
        .route("/search/:term", get(search_items))
        .route("/usage", get(usage_log).post(record_usage))
        .route("/:id", get(get_item).put(update_item).delete(delete_item))
        .route("/:id/quantity", patch(adjust_quantity))
        .route("/:id/usage", get(item_usage))
}

async fn list_items(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<InventoryItem>>, AppError> {
    let controller = InventoryController::new(&state);
    Ok(Json(controller.list(query.term()).await?))
}

async fn create_item(
    State(state): State<AppState>,
    Json(request): Json<CreateInventoryItemRequest>,
) -> Result<(StatusCode, Json<InventoryItem>), AppError> {
    let controller = InventoryController::new(&state);
    let item = controller.create(request).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

async fn low_stock(State(state): State<AppState>) -> Result<Json<Vec<InventoryItem>>, AppError> {
    let controller = InventoryController::new(&state);
    Ok(Json(controller.low_stock().await?))
}

async fn categories(State(state): State<AppState>) -> Result<Json<Vec<String>>, AppError> {
    let controller = InventoryController::new(&state);
    Ok(Json(controller.categories().await?))
}

async fn items_by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<Json<Vec<InventoryItem>>, AppError> {
    let controller = InventoryController::new(&state);
    Ok(Json(controller.by_category(&category).await?))
}

async fn search_items(
    State(state): State<AppState>,
    Path(term): Path<String>,
) -> Result<Json<Vec<InventoryItem>>, AppError> {
    let controller = InventoryController::new(&state);
    Ok(Json(controller.list(Some(term.trim())).await?))
}

async fn usage_log(
    State(state): State<AppState>,
    Query(query): Query<UsageQuery>,
) -> Result<Json<Vec<InventoryUsage>>, AppError> {
    let controller = InventoryController::new(&state);
    Ok(Json(controller.usage_log(&query).await?))
}

async fn record_usage(
    State(state): State<AppState>,
    Json(request): Json<RecordUsageRequest>,
) -> Result<(StatusCode, Json<InventoryUsage>), AppError> {
    let controller = InventoryController::new(&state);
    let usage = controller.record_usage(request).await?;
    Ok((StatusCode::CREATED, Json(usage)))
}

async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<InventoryItem>, AppError> {
    let controller = InventoryController::new(&state);
    Ok(Json(controller.get(id).await?))
}

async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateInventoryItemRequest>,
) -> Result<Json<InventoryItem>, AppError> {
    let controller = InventoryController::new(&state);
    Ok(Json(controller.update(id, request).await?))
}

async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<DeleteResponse>, AppError> {
    let controller = InventoryController::new(&state);
    controller.delete(id).await?;
    Ok(Json(DeleteResponse::deleted("Inventory item", id)))
}

async fn adjust_quantity(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<AdjustQuantityRequest>,
) -> Result<Json<InventoryItem>, AppError> {
    let controller = InventoryController::new(&state);
    Ok(Json(controller.adjust(id, request).await?))
}

async fn item_usage(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<InventoryUsage>>, AppError> {
    let controller = InventoryController::new(&state);
    Ok(Json(controller.usage_for_item(id).await?))
}
