use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use crate::controllers::rating_controller::RatingController;
use crate::dto::rating_dto::SubmitRatingRequest;
use crate::models::rating::{RatingLinkGeneration, RatingLinkValidation, RatingReport, ServiceRating};
use crate::state::AppState;
use crate::utils::errors::AppError;

/// `/service-rating-links`
pub fn create_rating_link_router() -> Router<AppState> {
    Router::new()
        .route("/:id/generate-link", post(generate_link))
        .route("/validate/:token", get(validate_link))
}

/// `/service-ratings`
pub fn create_rating_router() -> Router<AppState> {
    Router::new()
        .route("/report", get(rating_report))
        .route("/:id", post(submit_rating))
        .route("/:id/ratings", get(service_ratings))
}

async fn generate_link(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<RatingLinkGeneration>, AppError> {
    let controller = RatingController::new(&state);
    Ok(Json(controller.generate_link(id).await?))
}

async fn validate_link(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<RatingLinkValidation>, AppError> {
    let controller = RatingController::new(&state);
    Ok(Json(controller.validate_link(&token).await?))
}

async fn submit_rating(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<SubmitRatingRequest>,
) -> Result<(StatusCode, Json<ServiceRating>), AppError> {
    let controller = RatingController::new(&state);
    let rating = controller.submit(id, request).await?;
    Ok((StatusCode::CREATED, Json(rating)))
}

async fn service_ratings(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<ServiceRating>>, AppError> {
    let controller = RatingController::new(&state);
    Ok(Json(controller.ratings(id).await?))
}

async fn rating_report(State(state): State<AppState>) -> Result<Json<RatingReport>, AppError> {
    let controller = RatingController::new(&state);
    Ok(Json(controller.report().await?))
}
