use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::controllers::customer_controller::CustomerController;
use crate::dto::customer_dto::{CreateCustomerRequest, UpdateCustomerRequest};
use crate::dto::{DeleteResponse, SearchQuery};
use crate::models::customer::Customer;
use crate::models::vehicle::Vehicle;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_customer_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_customers).post(create_customer))
        .route(
            "/:id",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
        .route("/:id/vehicles", get(customer_vehicles))
}

async fn list_customers(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Customer>>, AppError> {
    let controller = CustomerController::new(&state);
    Ok(Json(controller.list(query.term()).await?))
}

async fn create_customer(
    State(state): State<AppState>,
    Json(request): Json<CreateCustomerRequest>,
) -> Result<(StatusCode, Json<Customer>), AppError> {
    let controller = CustomerController::new(&state);
    let customer = controller.create(request).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Customer>, AppError> {
    let controller = CustomerController::new(&state);
    Ok(Json(controller.get(id).await?))
}

async fn update_customer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateCustomerRequest>,
) -> Result<Json<Customer>, AppError> {
    let controller = CustomerController::new(&state);
    Ok(Json(controller.update(id, request).await?))
}

async fn delete_customer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<DeleteResponse>, AppError> {
    let controller = CustomerController::new(&state);
    controller.delete(id).await?;
    Ok(Json(DeleteResponse::deleted("Customer", id)))
}

async fn customer_vehicles(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Vehicle>>, AppError> {
    let controller = CustomerController::new(&state);
    Ok(Json(controller.vehicles(id).await?))
}
