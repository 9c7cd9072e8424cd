//! Pruebas contra PostgreSQL real
//!
//! Sólo corren con `DATABASE_URL` definida; sin ella cada prueba termina
//! sin hacer nada. Los datos usan sufijos aleatorios para poder repetirse
//! sobre la misma base.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::Utc;
use rand::Rng;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::str::FromStr;
use tower::ServiceExt;

use carwash_backend::config::database::DatabaseConfig;
use carwash_backend::config::environment::EnvironmentConfig;
use carwash_backend::create_app;
use carwash_backend::database;
use carwash_backend::models::work_order::{WorkOrderDraft, WorkOrderStatus};
use carwash_backend::repositories::{Stores, WorkOrderStore};
use carwash_backend::state::AppState;

async fn postgres_stores() -> Option<(Stores, EnvironmentConfig)> {
    dotenvy::dotenv().ok();
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL no definida, se omite la prueba");
        return None;
    };
    let config = EnvironmentConfig {
        database_url: Some(url),
        database_max_connections: 2,
        ..EnvironmentConfig::default()
    };
    let db_config = DatabaseConfig::from_environment(&config)?;
    let pool = database::connect(&db_config).await.unwrap();
    Some((Stores::postgres(pool), config))
}

async fn postgres_app() -> Option<Router> {
    let (stores, config) = postgres_stores().await?;
    Some(create_app(AppState::new(stores, config)))
}

fn suffix() -> String {
    format!("{:06}", rand::thread_rng().gen_range(0..1_000_000))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn dec(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).unwrap(),
        other => Decimal::from_str(&other.to_string()).unwrap(),
    }
}

fn id(value: &Value, field: &str) -> i64 {
    value[field].as_i64().unwrap()
}

async fn seed_vehicle(app: &Router) -> (i64, String) {
    let plate = format!("PG{}", suffix());
    let (status, customer) = send(
        app,
        "POST",
        "/api/customers",
        Some(json!({ "name": "Ana Gómez", "phone": "5559876" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, vehicle) = send(
        app,
        "POST",
        "/api/vehicles",
        Some(json!({
            "customer_id": id(&customer, "customer_id"),
            "make": "Nissan",
            "model": "Versa",
            "year": 2019,
            "license_plate": plate
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    (id(&vehicle, "vehicle_id"), plate)
}

async fn seed_offer(app: &Router) -> i64 {
    let (status, offer) = send(
        app,
        "POST",
        "/api/services",
        Some(json!({
            "name": format!("Lavado {}", suffix()),
            "base_price": "120.00",
            "estimated_hours": 1
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    id(&offer, "service_id")
}

async fn seed_item(app: &Router, quantity: &str) -> i64 {
    let (status, item) = send(
        app,
        "POST",
        "/api/inventory",
        Some(json!({
            "name": format!("Cera {}", suffix()),
            "category": "Acabado",
            "quantity": quantity,
            "unit": "piezas",
            "cost_price": "4.00",
            "selling_price": "9.00",
            "reorder_level": "1"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    id(&item, "item_id")
}

#[tokio::test]
async fn test_pg_stock_guard_and_usage() {
    let Some(app) = postgres_app().await else {
        return;
    };
    let item_id = seed_item(&app, "3").await;
    let quantity_uri = format!("/api/inventory/{}/quantity", item_id);

    let (status, _) = send(&app, "PATCH", &quantity_uri, Some(json!({ "adjustment": -5 }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (_, item) = send(&app, "GET", &format!("/api/inventory/{}", item_id), None).await;
    assert_eq!(dec(&item["quantity"]), Decimal::from(3));

    let (status, usage) = send(
        &app,
        "POST",
        "/api/inventory/usage",
        Some(json!({ "item_id": item_id, "quantity": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(usage["item_id"], item_id);

    let (_, item) = send(&app, "GET", &format!("/api/inventory/{}", item_id), None).await;
    assert_eq!(dec(&item["quantity"]), Decimal::from(1));
}

#[tokio::test]
async fn test_pg_visit_completion_and_tokenless_rating() {
    let Some(app) = postgres_app().await else {
        return;
    };
    let (vehicle_id, plate) = seed_vehicle(&app).await;
    let offer_id = seed_offer(&app).await;

    let (status, service) = send(
        &app,
        "POST",
        "/api/pending-services",
        Some(json!({ "vehicle_id": vehicle_id, "service_type_id": offer_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(service["license_plate"], plate.as_str());
    let service_id = id(&service, "service_id");

    let complete = format!("/api/pending-services/{}/complete", service_id);
    let (status, completed) = send(&app, "PATCH", &complete, None).await;
    assert_eq!(status, StatusCode::OK);
    let token = completed["ratingLink"]["token"].as_str().unwrap().to_string();
    let (status, _) = send(&app, "PATCH", &complete, None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/service-ratings/{}", service_id),
        Some(json!({
            "wait_time_rating": 5,
            "staff_friendliness_rating": 5,
            "service_quality_rating": 4
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(
        &app,
        "GET",
        &format!("/api/service-rating-links/validate/{}", token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::GONE);
}

#[tokio::test]
async fn test_pg_work_order_lines_and_stale_status_write() {
    let Some((stores, config)) = postgres_stores().await else {
        return;
    };
    let app = create_app(AppState::new(stores.clone(), config));
    let (vehicle_id, _) = seed_vehicle(&app).await;
    let item_id = seed_item(&app, "5").await;

    let (status, order) = send(
        &app,
        "POST",
        "/api/work-orders",
        Some(json!({ "vehicle_id": vehicle_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let order_id = id(&order, "order_id");

    let (status, order) = send(
        &app,
        "POST",
        &format!("/api/work-orders/{}/parts", order_id),
        Some(json!({ "item_id": item_id, "quantity": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(dec(&order["total_cost"]), Decimal::from(18));
    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/work-orders/{}/parts", order_id),
        Some(json!({ "item_id": item_id, "quantity": 4 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let stale = stores.work_orders.find_work_order(order_id).await.unwrap().unwrap();
    let (status, _) = send(
        &app,
        "PATCH",
        &format!("/api/work-orders/{}/status", order_id),
        Some(json!({ "status": "completed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let cancelled = WorkOrderDraft::from(&stale.order).with_status(WorkOrderStatus::Cancelled, Utc::now());
    let lost = stores
        .work_orders
        .update_work_order(order_id, WorkOrderStatus::Pending, &cancelled)
        .await
        .unwrap();
    assert!(lost.is_none());

    let current = stores.work_orders.find_work_order(order_id).await.unwrap().unwrap();
    assert_eq!(current.order.status, WorkOrderStatus::Completed);
}
