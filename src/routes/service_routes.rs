use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::controllers::service_offer_controller::ServiceOfferController;
use crate::dto::service_dto::{CreateCategoryRequest, CreateServiceRequest, UpdateServiceRequest};
use crate::dto::DeleteResponse;
use crate::models::service_offer::{ServiceCategory, ServiceOffer};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_service_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_services).post(create_service))
        .route("/categories", get(list_categories).post(create_category))
        .route("/category/:category_id", get(list_by_category))
        .route(
            "/:id",
            get(get_service).put(update_service).delete(delete_service),
        )
}

async fn list_services(State(state): State<AppState>) -> Result<Json<Vec<ServiceOffer>>, AppError> {
    let controller = ServiceOfferController::new(&state);
    Ok(Json(controller.list().await?))
}

async fn create_service(
    State(state): State<AppState>,
    Json(request): Json<CreateServiceRequest>,
) -> Result<(StatusCode, Json<ServiceOffer>), AppError> {
    let controller = ServiceOfferController::new(&state);
    let offer = controller.create(request).await?;
    Ok((StatusCode::CREATED, Json(offer)))
}

async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<ServiceCategory>>, AppError> {
    let controller = ServiceOfferController::new(&state);
    Ok(Json(controller.list_categories().await?))
}

async fn create_category(
    State(state): State<AppState>,
    Json(request): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<ServiceCategory>), AppError> {
    let controller = ServiceOfferController::new(&state);
    let category = controller.create_category(request).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

async fn list_by_category(
    State(state): State<AppState>,
    Path(category_id): Path<i64>,
) -> Result<Json<Vec<ServiceOffer>>, AppError> {
    let controller = ServiceOfferController::new(&state);
    Ok(Json(controller.list_by_category(category_id).await?))
}

async fn get_service(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ServiceOffer>, AppError> {
    let controller = ServiceOfferController::new(&state);
    Ok(Json(controller.get(id).await?))
}

async fn update_service(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateServiceRequest>,
) -> Result<Json<ServiceOffer>, AppError> {
    let controller = ServiceOfferController::new(&state);
    Ok(Json(controller.update(id, request).await?))
}

async fn delete_service(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<DeleteResponse>, AppError> {
    let controller = ServiceOfferController::new(&state);
    controller.delete(id).await?;
    Ok(Json(DeleteResponse::deleted("Service", id)))
}
