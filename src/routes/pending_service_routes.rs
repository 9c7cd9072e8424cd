use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};

use crate::controllers::pending_service_controller::PendingServiceController;
use crate::dto::pending_service_dto::{
    AssignEmployeeRequest, CompleteServiceResponse, CreatePendingServiceRequest,
    ServiceStatusRequest, UpdatePendingServiceRequest,
};
use crate::dto::DeleteResponse;
use crate::models::pending_service::{PendingService, PendingServiceFilters, ServiceStatus};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_pending_service_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_pending_services).post(create_pending_service))
        .route("/status/:status", get(list_by_status))
        .route("/search/:term", get(search_pending_services))
        .route(
            "/:id",
            get(get_pending_service)
                .put(update_pending_service)
                .delete(delete_pending_service),
        )
        .route("/:id/assign", patch(assign_employee))
        .route("/:id/complete", patch(complete_service))
        .route("/:id/status", patch(set_service_status))
}

async fn list_pending_services(
    State(state): State<AppState>,
    Query(filters): Query<PendingServiceFilters>,
) -> Result<Json<Vec<PendingService>>, AppError> {
    let controller = PendingServiceController::new(&state);
    Ok(Json(controller.list(&filters).await?))
}

async fn list_by_status(
    State(state): State<AppState>,
    Path(status): Path<ServiceStatus>,
) -> Result<Json<Vec<PendingService>>, AppError> {
    let controller = PendingServiceController::new(&state);
    let filters = PendingServiceFilters {
        status: Some(status),
        q: None,
    };
    Ok(Json(controller.list(&filters).await?))
}

async fn search_pending_services(
    State(state): State<AppState>,
    Path(term): Path<String>,
) -> Result<Json<Vec<PendingService>>, AppError> {
    let controller = PendingServiceController::new(&state);
    let filters = PendingServiceFilters {
        status: None,
        q: Some(term),
    };
    Ok(Json(controller.list(&filters).await?))
}

async fn create_pending_service(
    State(state): State<AppState>,
    Json(request): Json<CreatePendingServiceRequest>,
) -> Result<(StatusCode, Json<PendingService>), AppError> {
    let controller = PendingServiceController::new(&state);
    let service = controller.create(request).await?;
    Ok((StatusCode::CREATED, Json(service)))
}

async fn get_pending_service(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PendingService>, AppError> {
    let controller = PendingServiceController::new(&state);
    Ok(Json(controller.get(id).await?))
}

async fn update_pending_service(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdatePendingServiceRequest>,
) -> Result<Json<PendingService>, AppError> {
    let controller = PendingServiceController::new(&state);
    Ok(Json(controller.update(id, request).await?))
}

async fn delete_pending_service(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<DeleteResponse>, AppError> {
    let controller = PendingServiceController::new(&state);
    controller.delete(id).await?;
    Ok(Json(DeleteResponse::deleted("Pending service", id)))
}

async fn assign_employee(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<AssignEmployeeRequest>,
) -> Result<Json<PendingService>, AppError> {
    let controller = PendingServiceController::new(&state);
    Ok(Json(controller.assign(id, request.employee_id).await?))
}

async fn complete_service(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<CompleteServiceResponse>, AppError> {
    let controller = PendingServiceController::new(&state);
    Ok(Json(controller.complete(id).await?))
}

async fn set_service_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<ServiceStatusRequest>,
) -> Result<Json<PendingService>, AppError> {
    let controller = PendingServiceController::new(&state);
    Ok(Json(controller.set_status(id, request.status).await?))
}
