mod common;

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::json;
use uuid::Uuid;

use common::{json_body, TestApp};
use retail_crm_api::entities::order::{self, OrderStatus, PaymentStatus};

async fn create_customer(app: &TestApp, email: &str) -> Uuid {
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/customers",
            Some(json!({
                "first_name": "Grace",
                "last_name": "Hopper",
                "email": email,
            })),
        )
        .await;
    let body = json_body(response, StatusCode::CREATED).await;
    body["id"].as_str().and_then(|s| s.parse().ok()).expect("customer id")
}

async fn insert_order(
    app: &TestApp,
    customer_id: Uuid,
    total: rust_decimal::Decimal,
    days_ago: i64,
) {
    let placed = Utc::now() - Duration::days(days_ago);
    order::ActiveModel {
        id: Set(Uuid::new_v4()),
        order_number: Set(format!(
            "ORD-{}",
            Uuid::new_v4().simple().to_string()[..8].to_uppercase()
        )),
        customer_id: Set(customer_id),
        status: Set(OrderStatus::Delivered),
        payment_status: Set(PaymentStatus::Paid),
        subtotal: Set(total),
        tax: Set(dec!(0)),
        discount: Set(dec!(0)),
        shipping_cost: Set(dec!(0)),
        total_amount: Set(total),
        shipping_address: Set(None),
        tracking_number: Set(None),
        shipped_date: Set(None),
        delivered_date: Set(None),
        notes: Set(None),
        created_at: Set(placed),
        updated_at: Set(placed),
    }
    .insert(&*app.state.db)
    .await
    .expect("insert order");
}

#[tokio::test]
async fn rfm_scores_match_order_history() {
    let app = TestApp::new().await;
    let customer_id = create_customer(&app, "grace@example.com").await;

    // Last order 10 days ago, 3 orders in the year, 1200 total.
    insert_order(&app, customer_id, dec!(500), 10).await;
    insert_order(&app, customer_id, dec!(400), 40).await;
    insert_order(&app, customer_id, dec!(300), 100).await;

    let response = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/customers/{}/rfm", customer_id),
            None,
        )
        .await;
    let rfm = json_body(response, StatusCode::OK).await;

    assert_eq!(rfm["recency_score"], 5);
    assert_eq!(rfm["frequency_score"], 2);
    assert_eq!(rfm["monetary_score"], 3);
    assert_eq!(rfm["segment"], "Potential Loyalists");
}

#[tokio::test]
async fn rfm_for_customer_with_no_orders_is_lost() {
    let app = TestApp::new().await;
    let customer_id = create_customer(&app, "fresh@example.com").await;

    let response = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/customers/{}/rfm", customer_id),
            None,
        )
        .await;
    let rfm = json_body(response, StatusCode::OK).await;

    assert_eq!(rfm["recency_score"], 1);
    assert_eq!(rfm["frequency_score"], 1);
    assert_eq!(rfm["monetary_score"], 1);
    assert_eq!(rfm["segment"], "Lost");
}

#[tokio::test]
async fn rfm_read_is_404_before_first_calculation() {
    let app = TestApp::new().await;
    let customer_id = create_customer(&app, "noscore@example.com").await;

    let response = app
        .request_authenticated(
            Method::GET,
            &format!("/api/v1/customers/{}/rfm", customer_id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn rfm_recalculation_overwrites_the_same_row() {
    let app = TestApp::new().await;
    let customer_id = create_customer(&app, "repeat@example.com").await;

    let first = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/customers/{}/rfm", customer_id),
            None,
        )
        .await;
    let first = json_body(first, StatusCode::OK).await;

    insert_order(&app, customer_id, dec!(6000), 5).await;

    let second = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/customers/{}/rfm", customer_id),
            None,
        )
        .await;
    let second = json_body(second, StatusCode::OK).await;

    assert_eq!(first["id"], second["id"]);
    assert_eq!(second["recency_score"], 5);
    assert_eq!(second["monetary_score"], 5);
}

#[tokio::test]
async fn analytics_reflect_lifetime_and_churn() {
    let app = TestApp::new().await;
    let customer_id = create_customer(&app, "ltv@example.com").await;

    insert_order(&app, customer_id, dec!(200), 20).await;
    insert_order(&app, customer_id, dec!(100), 50).await;

    let response = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/customers/{}/analytics", customer_id),
            None,
        )
        .await;
    let analytics = json_body(response, StatusCode::OK).await;

    assert_eq!(analytics["lifetime_value"], "300");
    assert_eq!(analytics["average_order_value"], "150");
    assert_eq!(analytics["days_since_last_purchase"], 20);
    // 30 days or less since last purchase
    assert_eq!(analytics["churn_probability"], 5);
    assert!(analytics["predicted_next_purchase_date"].is_string());
}

#[tokio::test]
async fn analytics_for_customer_with_no_orders_use_sentinels() {
    let app = TestApp::new().await;
    let customer_id = create_customer(&app, "quiet@example.com").await;

    let response = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/customers/{}/analytics", customer_id),
            None,
        )
        .await;
    let analytics = json_body(response, StatusCode::OK).await;

    assert_eq!(analytics["lifetime_value"], "0");
    assert_eq!(analytics["days_since_last_purchase"], 999);
    assert_eq!(analytics["churn_probability"], 80);
    assert!(analytics["predicted_next_purchase_date"].is_null());
}

#[tokio::test]
async fn scoring_unknown_customer_is_404() {
    let app = TestApp::new().await;
    let response = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/customers/{}/rfm", Uuid::new_v4()),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
