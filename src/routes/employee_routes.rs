use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};

use crate::controllers::employee_controller::EmployeeController;
use crate::dto::employee_dto::{CreateEmployeeRequest, EmployeeStatusRequest, UpdateEmployeeRequest};
use crate::dto::DeleteResponse;
use crate::models::employee::{Employee, EmployeeFilters};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_employee_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_employees).post(create_employee))
        .route("/active", get(active_employees))
        .route(
            "/:id",
            get(get_employee).put(update_employee).delete(delete_employee),
        )
        .route("/:id/status", patch(set_employee_status))
}

async fn list_employees(
    State(state): State<AppState>,
    Query(filters): Query<EmployeeFilters>,
) -> Result<Json<Vec<Employee>>, AppError> {
    let controller = EmployeeController::new(&state);
    Ok(Json(controller.list(&filters).await?))
}

async fn active_employees(State(state): State<AppState>) -> Result<Json<Vec<Employee>>, AppError> {
    let controller = EmployeeController::new(&state);
    Ok(Json(controller.active().await?))
}

async fn create_employee(
    State(state): State<AppState>,
    Json(request): Json<CreateEmployeeRequest>,
) -> Result<(StatusCode, Json<Employee>), AppError> {
    let controller = EmployeeController::new(&state);
    let employee = controller.create(request).await?;
    Ok((StatusCode::CREATED, Json(employee)))
}

async fn get_employee(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Employee>, AppError> {
    let controller = EmployeeController::new(&state);
    Ok(Json(controller.get(id).await?))
}

async fn update_employee(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateEmployeeRequest>,
) -> Result<Json<Employee>, AppError> {
    let controller = EmployeeController::new(&state);
    Ok(Json(controller.update(id, request).await?))
}

async fn set_employee_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<EmployeeStatusRequest>,
) -> Result<Json<Employee>, AppError> {
    let controller = EmployeeController::new(&state);
    Ok(Json(controller.set_status(id, request.status).await?))
}

async fn delete_employee(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<DeleteResponse>, AppError> {
    let controller = EmployeeController::new(&state);
    controller.delete(id).await?;
    Ok(Json(DeleteResponse::deleted("Employee", id)))
}
