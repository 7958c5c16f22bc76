mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;
use uuid::Uuid;

use common::{json_body, TestApp};

async fn create_customer(app: &TestApp, email: &str) -> Uuid {
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/customers",
            Some(json!({
                "first_name": "Nia",
                "last_name": "Okafor",
                "email": email,
            })),
        )
        .await;
    let body = json_body(response, StatusCode::CREATED).await;
    body["id"].as_str().and_then(|s| s.parse().ok()).expect("customer id")
}

#[tokio::test]
async fn account_is_created_on_first_access() {
    let app = TestApp::new().await;
    let customer_id = create_customer(&app, "nia@example.com").await;

    let response = app
        .request_authenticated(
            Method::GET,
            &format!("/api/v1/customers/{}/loyalty", customer_id),
            None,
        )
        .await;
    let account = json_body(response, StatusCode::OK).await;

    assert_eq!(account["points_balance"], 0);
    assert_eq!(account["lifetime_points"], 0);
    assert_eq!(account["tier"], "bronze");
}

#[tokio::test]
async fn credits_update_balance_lifetime_and_tier() {
    let app = TestApp::new().await;
    let customer_id = create_customer(&app, "tiers@example.com").await;

    app.state
        .loyalty
        .credit(customer_id, 2500, "Promotion".to_string(), None)
        .await
        .expect("credit points");

    let account = app.state.loyalty.get_account(customer_id).await.expect("account");
    assert_eq!(account.points_balance, 2500);
    assert_eq!(account.lifetime_points, 2500);
    assert_eq!(format!("{:?}", account.tier), "Silver");

    app.state
        .loyalty
        .credit(customer_id, 8000, "Promotion".to_string(), None)
        .await
        .expect("credit points");
    let account = app.state.loyalty.get_account(customer_id).await.expect("account");
    assert_eq!(account.lifetime_points, 10_500);
    assert_eq!(format!("{:?}", account.tier), "Platinum");
}

#[tokio::test]
async fn redemption_spends_balance_but_keeps_tier() {
    let app = TestApp::new().await;
    let customer_id = create_customer(&app, "redeem@example.com").await;

    app.state
        .loyalty
        .credit(customer_id, 6000, "Signup bonus".to_string(), None)
        .await
        .expect("credit points");

    let response = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/customers/{}/loyalty/redeem", customer_id),
            Some(json!({ "points": 4000, "description": "Gift card" })),
        )
        .await;
    let account = json_body(response, StatusCode::OK).await;

    assert_eq!(account["points_balance"], 2000);
    assert_eq!(account["lifetime_points"], 6000);
    assert_eq!(account["total_redeemed"], 4000);
    // Tier follows lifetime points, not the spendable balance.
    assert_eq!(account["tier"], "gold");
}

#[tokio::test]
async fn overdrawn_redemption_is_rejected_and_changes_nothing() {
    let app = TestApp::new().await;
    let customer_id = create_customer(&app, "broke@example.com").await;

    app.state
        .loyalty
        .credit(customer_id, 100, "Welcome".to_string(), None)
        .await
        .expect("credit points");

    let response = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/customers/{}/loyalty/redeem", customer_id),
            Some(json!({ "points": 500 })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let account = app.state.loyalty.get_account(customer_id).await.expect("account");
    assert_eq!(account.points_balance, 100);
    assert_eq!(account.total_redeemed, 0);
}

#[tokio::test]
async fn ledger_records_signed_entries_newest_first() {
    let app = TestApp::new().await;
    let customer_id = create_customer(&app, "ledger@example.com").await;

    app.state
        .loyalty
        .credit(customer_id, 300, "Earned".to_string(), None)
        .await
        .expect("credit");
    app.state
        .loyalty
        .redeem(customer_id, 120, "Spent".to_string())
        .await
        .expect("redeem");

    let response = app
        .request_authenticated(
            Method::GET,
            &format!("/api/v1/customers/{}/loyalty/transactions", customer_id),
            None,
        )
        .await;
    let transactions = json_body(response, StatusCode::OK).await;
    let entries = transactions.as_array().expect("array");

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["points"], -120);
    assert_eq!(entries[0]["kind"], "redeemed");
    assert_eq!(entries[1]["points"], 300);
    assert_eq!(entries[1]["kind"], "earned");
}

#[tokio::test]
async fn concurrent_awards_both_land() {
    let app = TestApp::new().await;
    let customer_id = create_customer(&app, "racer@example.com").await;

    let first = app
        .state
        .loyalty
        .credit(customer_id, 100, "First award".to_string(), None);
    let second = app
        .state
        .loyalty
        .credit(customer_id, 100, "Second award".to_string(), None);
    let (first, second) = tokio::join!(first, second);
    first.expect("first credit");
    second.expect("second credit");

    let account = app.state.loyalty.get_account(customer_id).await.expect("account");
    assert_eq!(account.lifetime_points, 200);
    assert_eq!(account.points_balance, 200);

    let response = app
        .request_authenticated(
            Method::GET,
            &format!("/api/v1/customers/{}/loyalty/transactions", customer_id),
            None,
        )
        .await;
    let transactions = json_body(response, StatusCode::OK).await;
    assert_eq!(transactions.as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn nonpositive_redemption_is_a_validation_error() {
    let app = TestApp::new().await;
    let customer_id = create_customer(&app, "zero@example.com").await;

    let response = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/customers/{}/loyalty/redeem", customer_id),
            Some(json!({ "points": 0 })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
