mod common;

use axum::http::{Method, StatusCode};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde_json::json;

use common::{json_body, TestApp};
use retail_crm_api::entities::otp_code::{self, Entity as OtpCode};

async fn register_customer(app: &TestApp, email: &str) {
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/customers",
            Some(json!({
                "first_name": "Mara",
                "last_name": "Lindqvist",
                "email": email,
            })),
        )
        .await;
    json_body(response, StatusCode::CREATED).await;
}

async fn latest_code(app: &TestApp, email: &str) -> String {
    OtpCode::find()
        .filter(otp_code::Column::Email.eq(email))
        .order_by_desc(otp_code::Column::CreatedAt)
        .one(&*app.state.db)
        .await
        .expect("otp query")
        .expect("otp row")
        .code
}

#[tokio::test]
async fn unknown_email_cannot_request_a_code() {
    let app = TestApp::new().await;
    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/otp/request",
            Some(json!({ "email": "nobody@example.com" })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn code_logs_in_once_and_only_once() {
    let app = TestApp::new().await;
    register_customer(&app, "mara@example.com").await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/otp/request",
            Some(json!({ "email": "mara@example.com" })),
            None,
        )
        .await;
    json_body(response, StatusCode::OK).await;

    let code = latest_code(&app, "mara@example.com").await;
    assert_eq!(code.len(), 6);

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/otp/verify",
            Some(json!({ "email": "mara@example.com", "code": code })),
            None,
        )
        .await;
    let body = json_body(response, StatusCode::OK).await;
    assert_eq!(body["token_type"], "Bearer");
    let token = body["token"].as_str().expect("token").to_string();

    // The issued token works against a protected endpoint.
    let response = app
        .request(Method::GET, "/api/v1/customers", None, Some(&token))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Codes are single use.
    let code = latest_code(&app, "mara@example.com").await;
    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/otp/verify",
            Some(json!({ "email": "mara@example.com", "code": code })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn new_request_invalidates_the_previous_code() {
    let app = TestApp::new().await;
    register_customer(&app, "replay@example.com").await;

    for _ in 0..2 {
        let response = app
            .request(
                Method::POST,
                "/api/v1/auth/otp/request",
                Some(json!({ "email": "replay@example.com" })),
                None,
            )
            .await;
        json_body(response, StatusCode::OK).await;
    }

    let first = OtpCode::find()
        .filter(otp_code::Column::Email.eq("replay@example.com"))
        .order_by_asc(otp_code::Column::CreatedAt)
        .one(&*app.state.db)
        .await
        .expect("otp query")
        .expect("otp row");
    assert!(first.is_used);

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/otp/verify",
            Some(json!({ "email": "replay@example.com", "code": first.code })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_code_is_rejected() {
    let app = TestApp::new().await;
    register_customer(&app, "guess@example.com").await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/otp/request",
            Some(json!({ "email": "guess@example.com" })),
            None,
        )
        .await;
    json_body(response, StatusCode::OK).await;

    let real = latest_code(&app, "guess@example.com").await;
    let wrong = if real == "000000" { "000001" } else { "000000" };

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/otp/verify",
            Some(json!({ "email": "guess@example.com", "code": wrong })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let app = TestApp::new().await;

    let response = app
        .request(Method::GET, "/api/v1/customers", None, None)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .request(
            Method::GET,
            "/api/v1/customers",
            None,
            Some("not-a-real-token"),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_check_is_open() {
    let app = TestApp::new().await;
    let response = app.request(Method::GET, "/health", None, None).await;
    let body = json_body(response, StatusCode::OK).await;
    assert_eq!(body["status"], "up");
    assert_eq!(body["database"], "up");
}
