use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
    Json, Router,
};

use crate::controllers::work_order_controller::WorkOrderController;
use crate::dto::work_order_dto::{
    AddPartLineRequest, AddServiceLineRequest, CreateWorkOrderRequest, UpdateWorkOrderRequest,
    WorkOrderStatusRequest,
};
use crate::dto::DeleteResponse;
use crate::models::work_order::{WorkOrder, WorkOrderDetail, WorkOrderFilters};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_work_order_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_work_orders).post(create_work_order))
        .route("/vehicle/:vehicle_id", get(list_by_vehicle))
        .route(
            "/:id",
            get(get_work_order)
                .put(update_work_order)
                .delete(delete_work_order),
        )
        .route("/:id/status", patch(set_work_order_status))
        .route("/:id/services", post(add_service_line))
        .route("/:id/services/:line_id", delete(remove_service_line))
        .route("/:id/parts", post(add_part_line))
        .route("/:id/parts/:line_id", delete(remove_part_line))
}

async fn list_work_orders(
    State(state): State<AppState>,
    Query(filters): Query<WorkOrderFilters>,
) -> Result<Json<Vec<WorkOrder>>, AppError> {
    let controller = WorkOrderController::new(&state);
    Ok(Json(controller.list(&filters).await?))
}

async fn list_by_vehicle(
    State(state): State<AppState>,
    Path(vehicle_id): Path<i64>,
) -> Result<Json<Vec<WorkOrder>>, AppError> {
    let controller = WorkOrderController::new(&state);
    Ok(Json(controller.by_vehicle(vehicle_id).await?))
}

async fn create_work_order(
    State(state): State<AppState>,
    Json(request): Json<CreateWorkOrderRequest>,
) -> Result<(StatusCode, Json<WorkOrderDetail>), AppError> {
    let controller = WorkOrderController::new(&state);
    let detail = controller.create(request).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

async fn get_work_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<WorkOrderDetail>, AppError> {
    let controller = WorkOrderController::new(&state);
    Ok(Json(controller.get(id).await?))
}

async fn update_work_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateWorkOrderRequest>,
) -> Result<Json<WorkOrderDetail>, AppError> {
    let controller = WorkOrderController::new(&state);
    Ok(Json(controller.update(id, request).await?))
}

async fn delete_work_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<DeleteResponse>, AppError> {
    let controller = WorkOrderController::new(&state);
    controller.delete(id).await?;
    Ok(Json(DeleteResponse::deleted("Work order", id)))
}

async fn set_work_order_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<WorkOrderStatusRequest>,
) -> Result<Json<WorkOrderDetail>, AppError> {
    let controller = WorkOrderController::new(&state);
    Ok(Json(controller.set_status(id, request.status).await?))
}

async fn add_service_line(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<AddServiceLineRequest>,
) -> Result<(StatusCode, Json<WorkOrderDetail>), AppError> {
    let controller = WorkOrderController::new(&state);
    let detail = controller.add_service(id, request).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

async fn remove_service_line(
    State(state): State<AppState>,
    Path((id, line_id)): Path<(i64, i64)>,
) -> Result<Json<WorkOrderDetail>, AppError> {
    let controller = WorkOrderController::new(&state);
    Ok(Json(controller.remove_service(id, line_id).await?))
}

async fn add_part_line(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<AddPartLineRequest>,
) -> Result<(StatusCode, Json<WorkOrderDetail>), AppError> {
    let controller = WorkOrderController::new(&state);
    let detail = controller.add_part(id, request).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

async fn remove_part_line(
    State(state): State<AppState>,
    Path((id, line_id)): Path<(i64, i64)>,
) -> Result<Json<WorkOrderDetail>, AppError> {
    let controller = WorkOrderController::new(&state);
    Ok(Json(controller.remove_part(id, line_id).await?))
}
