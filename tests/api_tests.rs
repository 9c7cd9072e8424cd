use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::str::FromStr;
use tower::ServiceExt;

use carwash_backend::create_app;
use carwash_backend::state::AppState;

fn create_test_app() -> Router {
    create_app(AppState::in_memory())
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
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
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

/// Cliente + vehículo; devuelve el id del vehículo
async fn seed_vehicle(app: &Router, plate: &str) -> i64 {
    let (status, customer) = send(
        app,
        "POST",
        "/api/customers",
        Some(json!({ "name": "Juan Pérez", "phone": "5551234" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, vehicle) = send(
        app,
        "POST",
        "/api/vehicles",
        Some(json!({
            "customer_id": id(&customer, "customer_id"),
            "make": "Toyota",
            "model": "Corolla",
            "year": 2020,
            "license_plate": plate,
            "color": "Blanco"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    id(&vehicle, "vehicle_id")
}

async fn seed_offer(app: &Router, name: &str, price: &str) -> i64 {
    let (status, offer) = send(
        app,
        "POST",
        "/api/services",
        Some(json!({ "name": name, "base_price": price, "estimated_hours": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    id(&offer, "service_id")
}

async fn seed_employee(app: &Router) -> i64 {
    let (status, employee) = send(
        app,
        "POST",
        "/api/employees",
        Some(json!({ "name": "Carlos Ruiz", "position": "Lavador" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    id(&employee, "employee_id")
}

async fn seed_item(app: &Router, quantity: &str, reorder_level: &str) -> i64 {
    let (status, item) = send(
        app,
        "POST",
        "/api/inventory",
        Some(json!({
            "name": "Shampoo",
            "category": "Limpieza",
            "quantity": quantity,
            "unit": "litros",
            "cost_price": "5.00",
            "selling_price": "8.50",
            "reorder_level": reorder_level
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    id(&item, "item_id")
}

#[tokio::test]
async fn test_health_check() {
    let app = create_test_app();
    let (status, body) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["store"], "memory");
}

#[tokio::test]
async fn test_visit_lifecycle_end_to_end() {
    let app = create_test_app();
    let vehicle_id = seed_vehicle(&app, "abc123").await;
    let offer_id = seed_offer(&app, "Lavado Básico", "25.00").await;
    let employee_id = seed_employee(&app).await;

    let (status, service) = send(
        &app,
        "POST",
        "/api/pending-services",
        Some(json!({ "vehicle_id": vehicle_id, "service_type_id": offer_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(service["status"], "pending");
    assert_eq!(service["license_plate"], "ABC123");
    assert_eq!(service["client_name"], "Juan Pérez");

    let entry: DateTime<Utc> = serde_json::from_value(service["entry_time"].clone()).unwrap();
    let eta: DateTime<Utc> =
        serde_json::from_value(service["estimated_completion_time"].clone()).unwrap();
    assert_eq!(eta - entry, Duration::hours(1));

    let service_id = id(&service, "service_id");
    let (status, assigned) = send(
        &app,
        "PATCH",
        &format!("/api/pending-services/{}/assign", service_id),
        Some(json!({ "employee_id": employee_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(assigned["status"], "in-progress");
    assert_eq!(assigned["employee_name"], "Carlos Ruiz");

    let (status, completed) = send(
        &app,
        "PATCH",
        &format!("/api/pending-services/{}/complete", service_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(completed["service"]["status"], "completed");
    let rating_url = completed["ratingUrl"].as_str().unwrap();
    assert!(!rating_url.is_empty());
    let token = rating_url.rsplit('/').next().unwrap().to_string();
    assert_eq!(completed["ratingLink"]["token"], token.as_str());

    let (status, validation) = send(
        &app,
        "GET",
        &format!("/api/service-rating-links/validate/{}", token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(validation["serviceId"], service_id);
    assert_eq!(validation["licensePlate"], "ABC123");
    assert_eq!(validation["vehicleMake"], "Toyota");

    let (status, rating) = send(
        &app,
        "POST",
        &format!("/api/service-ratings/{}", service_id),
        Some(json!({
            "wait_time_rating": 4,
            "staff_friendliness_rating": 5,
            "service_quality_rating": 4,
            "customer_comment": "Great service",
            "token": token
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(rating["service_id"], service_id);

    let (status, ratings) = send(
        &app,
        "GET",
        &format!("/api/service-ratings/{}/ratings", service_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ratings.as_array().unwrap().len(), 1);
    assert_eq!(ratings[0]["customer_comment"], "Great service");

    // El token ya se consumió
    let (status, _) = send(
        &app,
        "GET",
        &format!("/api/service-rating-links/validate/{}", token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::GONE);

    let (status, vehicle) = send(&app, "GET", &format!("/api/vehicles/{}", vehicle_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        vehicle["last_service_date"],
        json!(Utc::now().date_naive().to_string())
    );
}

#[tokio::test]
async fn test_create_with_employee_starts_in_progress() {
    let app = create_test_app();
    let vehicle_id = seed_vehicle(&app, "XYZ789").await;
    let offer_id = seed_offer(&app, "Encerado", "40.00").await;
    let employee_id = seed_employee(&app).await;

    let (status, service) = send(
        &app,
        "POST",
        "/api/pending-services",
        Some(json!({
            "vehicle_id": vehicle_id,
            "service_type_id": offer_id,
            "employee_id": employee_id
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(service["status"], "in-progress");
}

#[tokio::test]
async fn test_double_completion_is_conflict() {
    let app = create_test_app();
    let vehicle_id = seed_vehicle(&app, "DUP001").await;
    let offer_id = seed_offer(&app, "Lavado Básico", "25.00").await;

    let (_, service) = send(
        &app,
        "POST",
        "/api/pending-services",
        Some(json!({ "vehicle_id": vehicle_id, "service_type_id": offer_id })),
    )
    .await;
    let uri = format!("/api/pending-services/{}/complete", id(&service, "service_id"));

    let (first, _) = send(&app, "PATCH", &uri, None).await;
    assert_eq!(first, StatusCode::OK);
    let (second, body) = send(&app, "PATCH", &uri, None).await;
    assert_eq!(second, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
}

#[tokio::test]
async fn test_status_change_requires_employee() {
    let app = create_test_app();
    let vehicle_id = seed_vehicle(&app, "STA001").await;
    let offer_id = seed_offer(&app, "Lavado Básico", "25.00").await;

    let (_, service) = send(
        &app,
        "POST",
        "/api/pending-services",
        Some(json!({ "vehicle_id": vehicle_id, "service_type_id": offer_id })),
    )
    .await;
    let uri = format!("/api/pending-services/{}/status", id(&service, "service_id"));

    let (status, _) = send(&app, "PATCH", &uri, Some(json!({ "status": "in-progress" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, delayed) = send(&app, "PATCH", &uri, Some(json!({ "status": "delayed" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(delayed["status"], "delayed");

    let (status, _) = send(&app, "PATCH", &uri, Some(json!({ "status": "completed" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_unknown_rating_token_is_not_found() {
    let app = create_test_app();
    let (status, body) = send(
        &app,
        "GET",
        "/api/service-rating-links/validate/does-not-exist",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_generate_link_is_idempotent_and_rating_is_single() {
    let app = create_test_app();
    let vehicle_id = seed_vehicle(&app, "RAT001").await;
    let offer_id = seed_offer(&app, "Lavado Básico", "25.00").await;
    let (_, service) = send(
        &app,
        "POST",
        "/api/pending-services",
        Some(json!({ "vehicle_id": vehicle_id, "service_type_id": offer_id })),
    )
    .await;
    let service_id = id(&service, "service_id");

    let generate = format!("/api/service-rating-links/{}/generate-link", service_id);
    let (status, _) = send(&app, "POST", &generate, None).await;
    assert_eq!(status, StatusCode::CONFLICT, "open visits cannot be rated");

    let (_, completed) = send(
        &app,
        "PATCH",
        &format!("/api/pending-services/{}/complete", service_id),
        None,
    )
    .await;
    let (status, link) = send(&app, "POST", &generate, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(link["token"], completed["ratingLink"]["token"]);
    assert_eq!(link["ratingUrl"], completed["ratingUrl"]);

    let rating = json!({
        "wait_time_rating": 3,
        "staff_friendliness_rating": 4,
        "service_quality_rating": 5
    });
    let submit = format!("/api/service-ratings/{}", service_id);
    let (status, _) = send(&app, "POST", &submit, Some(rating.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = send(&app, "POST", &submit, Some(rating)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Calificar sin token también cierra el enlace emitido al completar
    let token = link["token"].as_str().unwrap();
    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/service-rating-links/validate/{}", token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::GONE);
    assert_eq!(body["code"], "GONE");
    let (status, _) = send(&app, "POST", &generate, None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, invalid) = send(
        &app,
        "POST",
        &submit,
        Some(json!({
            "wait_time_rating": 0,
            "staff_friendliness_rating": 4,
            "service_quality_rating": 5
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(invalid["code"], "VALIDATION_ERROR");

    let (status, report) = send(&app, "GET", "/api/service-ratings/report", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["total_ratings"], 1);
    assert_eq!(report["avg_service_quality"], 5.0);
}

#[tokio::test]
async fn test_inventory_adjust_usage_and_low_stock() {
    let app = create_test_app();
    let item_id = seed_item(&app, "10", "4").await;
    let quantity_uri = format!("/api/inventory/{}/quantity", item_id);

    let (status, item) = send(&app, "PATCH", &quantity_uri, Some(json!({ "adjustment": -5 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dec(&item["quantity"]), Decimal::from(5));

    let (status, item) = send(&app, "PATCH", &quantity_uri, Some(json!({ "adjustment": 5 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dec(&item["quantity"]), Decimal::from(10));

    let (status, _) = send(&app, "PATCH", &quantity_uri, Some(json!({ "adjustment": -11 }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (_, item) = send(&app, "GET", &format!("/api/inventory/{}", item_id), None).await;
    assert_eq!(dec(&item["quantity"]), Decimal::from(10));

    let (status, usage) = send(
        &app,
        "POST",
        "/api/inventory/usage",
        Some(json!({ "item_id": item_id, "quantity": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(usage["item_name"], "Shampoo");

    let (_, item) = send(&app, "GET", &format!("/api/inventory/{}", item_id), None).await;
    assert_eq!(dec(&item["quantity"]), Decimal::from(7));
    let (_, history) = send(&app, "GET", &format!("/api/inventory/{}/usage", item_id), None).await;
    assert_eq!(history.as_array().unwrap().len(), 1);

    let (status, _) = send(
        &app,
        "POST",
        "/api/inventory/usage",
        Some(json!({ "item_id": item_id, "quantity": 50 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let at_threshold = seed_item(&app, "4", "4").await;
    let (status, low) = send(&app, "GET", "/api/inventory/low-stock", None).await;
    assert_eq!(status, StatusCode::OK);
    let low_ids: Vec<i64> = low
        .as_array()
        .unwrap()
        .iter()
        .map(|item| id(item, "item_id"))
        .collect();
    assert_eq!(low_ids, vec![at_threshold]);
}

#[tokio::test]
async fn test_work_order_totals_and_stock() {
    let app = create_test_app();
    let vehicle_id = seed_vehicle(&app, "WO1234").await;
    let offer_id = seed_offer(&app, "Lavado Completo", "150.00").await;
    let item_id = seed_item(&app, "10", "2").await;

    let (status, order) = send(
        &app,
        "POST",
        "/api/work-orders",
        Some(json!({ "vehicle_id": vehicle_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let order_id = id(&order, "order_id");
    assert_eq!(dec(&order["total_cost"]), Decimal::ZERO);

    let (status, order) = send(
        &app,
        "POST",
        &format!("/api/work-orders/{}/services", order_id),
        Some(json!({ "service_id": offer_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(dec(&order["total_cost"]), Decimal::from(150));

    let (status, order) = send(
        &app,
        "POST",
        &format!("/api/work-orders/{}/parts", order_id),
        Some(json!({ "item_id": item_id, "quantity": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(dec(&order["total_cost"]), Decimal::from(167));
    let part_line = id(&order["parts"][0], "order_part_id");

    let (_, item) = send(&app, "GET", &format!("/api/inventory/{}", item_id), None).await;
    assert_eq!(dec(&item["quantity"]), Decimal::from(8));

    let (status, order) = send(
        &app,
        "DELETE",
        &format!("/api/work-orders/{}/parts/{}", order_id, part_line),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dec(&order["total_cost"]), Decimal::from(150));
    let (_, item) = send(&app, "GET", &format!("/api/inventory/{}", item_id), None).await;
    assert_eq!(dec(&item["quantity"]), Decimal::from(10));

    let status_uri = format!("/api/work-orders/{}/status", order_id);
    let (status, order) = send(&app, "PATCH", &status_uri, Some(json!({ "status": "completed" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!order["completion_date"].is_null());

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/work-orders/{}/services", order_id),
        Some(json!({ "service_id": offer_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_duplicate_plate_and_missing_references() {
    let app = create_test_app();
    seed_vehicle(&app, "PLT001").await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/vehicles",
        Some(json!({
            "customer_id": 9999,
            "make": "Ford",
            "model": "Focus",
            "year": 2019,
            "license_plate": "NEW001"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, customers) = send(&app, "GET", "/api/customers?q=juan", None).await;
    let customer_id = id(&customers[0], "customer_id");
    let (status, _) = send(
        &app,
        "POST",
        "/api/vehicles",
        Some(json!({
            "customer_id": customer_id,
            "make": "Ford",
            "model": "Focus",
            "year": 2019,
            "license_plate": "plt001"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(&app, "DELETE", &format!("/api/customers/{}", customer_id), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(&app, "GET", "/api/vehicles/424242", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_reports_and_dashboard() {
    let app = create_test_app();
    let vehicle_id = seed_vehicle(&app, "REP001").await;
    let basic = seed_offer(&app, "Lavado Básico", "25.00").await;
    let wax = seed_offer(&app, "Encerado", "40.00").await;
    seed_employee(&app).await;
    seed_item(&app, "1", "5").await;

    for offer_id in [basic, basic, wax] {
        let (_, service) = send(
            &app,
            "POST",
            "/api/pending-services",
            Some(json!({ "vehicle_id": vehicle_id, "service_type_id": offer_id })),
        )
        .await;
        let uri = format!("/api/pending-services/{}/complete", id(&service, "service_id"));
        let (status, _) = send(&app, "PATCH", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
    }
    send(
        &app,
        "POST",
        "/api/pending-services",
        Some(json!({ "vehicle_id": vehicle_id, "service_type_id": wax })),
    )
    .await;

    let today = Utc::now().date_naive().to_string();
    let (status, income) = send(
        &app,
        "GET",
        &format!("/api/reports/daily-income?from={}&to={}", today, today),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(income.as_array().unwrap().len(), 1);
    assert_eq!(dec(&income[0]["income"]), Decimal::from(90));
    assert_eq!(income[0]["services"], 3);

    let (_, mix) = send(&app, "GET", "/api/reports/service-types", None).await;
    assert_eq!(mix[0]["name"], "Lavado Básico");
    assert_eq!(mix[0]["count"], 2);

    let (status, _) = send(&app, "GET", "/api/reports/daily-income?from=01-01-2024", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, history) = send(&app, "GET", "/api/reports/vehicle-history/rep001", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history[0]["services"], 4);

    let (status, _) = send(&app, "GET", "/api/reports/vehicle-history/NOPE99", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, stats) = send(&app, "GET", "/api/dashboard/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["pendingVehicles"], 1);
    assert_eq!(stats["activeEmployees"], 1);
    assert_eq!(dec(&stats["dailyIncome"]), Decimal::from(90));
    assert_eq!(stats["lowStockItems"].as_array().unwrap().len(), 1);
}
