mod common;

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};
use uuid::Uuid;

use common::{json_body, TestApp};

async fn create_customer(app: &TestApp, email: &str) -> Uuid {
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/customers",
            Some(json!({
                "first_name": "Ines",
                "last_name": "Moreau",
                "email": email,
            })),
        )
        .await;
    let body = json_body(response, StatusCode::CREATED).await;
    body["id"].as_str().and_then(|s| s.parse().ok()).expect("customer id")
}

async fn create_product(app: &TestApp, sku: &str, price: &str, stock: i32) -> Uuid {
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/products",
            Some(json!({
                "sku": sku,
                "name": format!("Product {}", sku),
                "price": price,
                "stock_quantity": stock,
            })),
        )
        .await;
    let body = json_body(response, StatusCode::CREATED).await;
    body["id"].as_str().and_then(|s| s.parse().ok()).expect("product id")
}

async fn place_order(app: &TestApp, customer_id: Uuid, product_id: Uuid, quantity: i32) -> Value {
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "customer_id": customer_id,
                "items": [{ "product_id": product_id, "quantity": quantity }],
            })),
        )
        .await;
    json_body(response, StatusCode::CREATED).await
}

async fn create_workflow(app: &TestApp, payload: Value) -> Value {
    let response = app
        .request_authenticated(Method::POST, "/api/v1/workflows", Some(payload))
        .await;
    json_body(response, StatusCode::CREATED).await
}

async fn execution_count(app: &TestApp, workflow_id: &str) -> i64 {
    let response = app
        .request_authenticated(
            Method::GET,
            &format!("/api/v1/workflows/{}", workflow_id),
            None,
        )
        .await;
    let body = json_body(response, StatusCode::OK).await;
    body["execution_count"].as_i64().expect("execution_count")
}

#[tokio::test]
async fn qualifying_order_fires_points_workflow() {
    let app = TestApp::new().await;
    let workflow = create_workflow(
        &app,
        json!({
            "name": "Big order bonus",
            "trigger_type": "order_placed",
            "trigger_conditions": { "min_order_total": "100" },
            "action": { "type": "award_points", "points": 250 },
        }),
    )
    .await;
    let workflow_id = workflow["id"].as_str().expect("workflow id").to_string();

    let customer_id = create_customer(&app, "bonus@example.com").await;
    let product_id = create_product(&app, "SKU-AUTO-1", "150.00", 10).await;
    place_order(&app, customer_id, product_id, 1).await;

    assert_eq!(execution_count(&app, &workflow_id).await, 1);

    let account = app.state.loyalty.get_account(customer_id).await.expect("account");
    assert_eq!(account.points_balance, 250);
}

#[tokio::test]
async fn order_below_threshold_is_skipped() {
    let app = TestApp::new().await;
    let workflow = create_workflow(
        &app,
        json!({
            "name": "Whale bonus",
            "trigger_type": "order_placed",
            "trigger_conditions": { "min_order_total": "1000" },
            "action": { "type": "award_points", "points": 500 },
        }),
    )
    .await;
    let workflow_id = workflow["id"].as_str().expect("workflow id").to_string();

    let customer_id = create_customer(&app, "small@example.com").await;
    let product_id = create_product(&app, "SKU-AUTO-2", "40.00", 10).await;
    place_order(&app, customer_id, product_id, 1).await;

    assert_eq!(execution_count(&app, &workflow_id).await, 0);

    let account = app.state.loyalty.get_account(customer_id).await.expect("account");
    assert_eq!(account.points_balance, 0);
}

#[tokio::test]
async fn deactivated_workflow_does_not_fire() {
    let app = TestApp::new().await;
    let workflow = create_workflow(
        &app,
        json!({
            "name": "Paused bonus",
            "trigger_type": "order_placed",
            "trigger_conditions": {},
            "action": { "type": "award_points", "points": 100 },
        }),
    )
    .await;
    let workflow_id = workflow["id"].as_str().expect("workflow id").to_string();

    let response = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/workflows/{}/deactivate", workflow_id),
            None,
        )
        .await;
    let body = json_body(response, StatusCode::OK).await;
    assert_eq!(body["is_active"], false);

    let customer_id = create_customer(&app, "paused@example.com").await;
    let product_id = create_product(&app, "SKU-AUTO-3", "60.00", 10).await;
    place_order(&app, customer_id, product_id, 1).await;

    assert_eq!(execution_count(&app, &workflow_id).await, 0);
}

#[tokio::test]
async fn new_customer_workflow_creates_a_task() {
    let app = TestApp::new().await;
    create_workflow(
        &app,
        json!({
            "name": "Welcome call",
            "trigger_type": "customer_created",
            "action": {
                "type": "create_task",
                "title": "Call the new customer",
                "description": "Introduce the account team",
                "due_days": 2,
            },
        }),
    )
    .await;

    let customer_id = create_customer(&app, "welcome@example.com").await;

    let response = app
        .request_authenticated(Method::GET, "/api/v1/tasks", None)
        .await;
    let tasks = json_body(response, StatusCode::OK).await;
    let tasks = tasks.as_array().expect("array");

    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["title"], "Call the new customer");
    assert_eq!(tasks[0]["status"], "pending");
    assert_eq!(tasks[0]["customer_id"], customer_id.to_string());
}

#[tokio::test]
async fn unknown_action_kind_is_rejected() {
    let app = TestApp::new().await;
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/workflows",
            Some(json!({
                "name": "Bad action",
                "trigger_type": "order_placed",
                "action": { "type": "assign_to_user", "user": "sam" },
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn unknown_condition_key_is_rejected() {
    let app = TestApp::new().await;
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/workflows",
            Some(json!({
                "name": "Bad conditions",
                "trigger_type": "order_placed",
                "trigger_conditions": { "total_amount__gte": 100 },
                "action": { "type": "award_points", "points": 10 },
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn workflow_lifecycle_list_get_delete() {
    let app = TestApp::new().await;
    let workflow = create_workflow(
        &app,
        json!({
            "name": "Ticket triage",
            "trigger_type": "ticket_created",
            "action": { "type": "send_sms", "message": "New ticket" },
        }),
    )
    .await;
    let workflow_id = workflow["id"].as_str().expect("workflow id").to_string();

    let response = app
        .request_authenticated(
            Method::GET,
            "/api/v1/workflows?trigger_type=ticket_created",
            None,
        )
        .await;
    let listed = json_body(response, StatusCode::OK).await;
    assert_eq!(listed.as_array().map(Vec::len), Some(1));

    let response = app
        .request_authenticated(
            Method::GET,
            "/api/v1/workflows?trigger_type=order_placed",
            None,
        )
        .await;
    let listed = json_body(response, StatusCode::OK).await;
    assert_eq!(listed.as_array().map(Vec::len), Some(0));

    let response = app
        .request_authenticated(
            Method::DELETE,
            &format!("/api/v1/workflows/{}", workflow_id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .request_authenticated(
            Method::GET,
            &format!("/api/v1/workflows/{}", workflow_id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
