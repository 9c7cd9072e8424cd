use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};

use crate::controllers::report_controller::ReportController;
use crate::dto::report_dto::ReportQuery;
use crate::models::report::{
    DailyIncome, DashboardStats, ServiceTypeShare, ServiceTypeTime, VehicleVisitDay,
};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_report_router() -> Router<AppState> {
    Router::new()
        .route("/daily-income", get(daily_income))
        .route("/service-types", get(service_types))
        .route("/service-times", get(service_times))
        .route("/vehicle-history/:plate", get(vehicle_history))
}

pub fn create_dashboard_router() -> Router<AppState> {
    Router::new().route("/stats", get(dashboard_stats))
}

async fn daily_income(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<Vec<DailyIncome>>, AppError> {
    let controller = ReportController::new(&state);
    Ok(Json(controller.daily_income(&query).await?))
}

async fn service_types(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<Vec<ServiceTypeShare>>, AppError> {
    let controller = ReportController::new(&state);
    Ok(Json(controller.service_types(&query).await?))
}

async fn service_times(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<Vec<ServiceTypeTime>>, AppError> {
    let controller = ReportController::new(&state);
    Ok(Json(controller.service_times(&query).await?))
}

async fn vehicle_history(
    State(state): State<AppState>,
    Path(plate): Path<String>,
) -> Result<Json<Vec<VehicleVisitDay>>, AppError> {
    let controller = ReportController::new(&state);
    Ok(Json(controller.vehicle_history(&plate).await?))
}

async fn dashboard_stats(State(state): State<AppState>) -> Result<Json<DashboardStats>, AppError> {
    let controller = ReportController::new(&state);
    Ok(Json(controller.dashboard_stats().await?))
}
