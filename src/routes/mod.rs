//! Routers HTTP
//!
//! Un router por recurso; `create_api_router` los anida bajo `/api`.

pub mod customer_routes;
pub mod employee_routes;
pub mod inventory_routes;
pub mod pending_service_routes;
pub mod rating_routes;
pub mod report_routes;
pub mod service_routes;
pub mod vehicle_routes;
pub mod work_order_routes;

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;

use crate::dto::HealthResponse;
use crate::state::AppState;

pub fn create_api_router() -> Router<AppState> {
    let api = Router::new()
        .nest("/customers", customer_routes::create_customer_router())
        .nest("/vehicles", vehicle_routes::create_vehicle_router())
        .nest("/employees", employee_routes::create_employee_router())
        .nest("/services", service_routes::create_service_router())
        .nest(
            "/pending-services",
            pending_service_routes::create_pending_service_router(),
        )
        .nest("/inventory", inventory_routes::create_inventory_router())
        .nest("/work-orders", work_order_routes::create_work_order_router())
        .nest(
            "/service-rating-links",
            rating_routes::create_rating_link_router(),
        )
        .nest("/service-ratings", rating_routes::create_rating_router())
        .nest("/reports", report_routes::create_report_router())
        .nest("/dashboard", report_routes::create_dashboard_router());

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now(),
        store: state.stores.backend.to_string(),
    })
}
