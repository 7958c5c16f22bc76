mod common;

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde_json::{json, Value};
use uuid::Uuid;

use common::{json_body, TestApp};
use retail_crm_api::entities::communication_preference::{
    self, Entity as CommunicationPreference,
};

async fn create_customer(app: &TestApp, email: &str) -> Uuid {
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/customers",
            Some(json!({
                "first_name": "Satu",
                "last_name": "Virtanen",
                "email": email,
            })),
        )
        .await;
    let body = json_body(response, StatusCode::CREATED).await;
    body["id"].as_str().and_then(|s| s.parse().ok()).expect("customer id")
}

fn decimal(value: &Value) -> Decimal {
    value
        .as_str()
        .and_then(|s| s.parse().ok())
        .expect("decimal field")
}

async fn set_ticket_status(app: &TestApp, ticket_id: &str, status: &str) -> Value {
    let response = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/tickets/{}/status", ticket_id),
            Some(json!({ "status": status })),
        )
        .await;
    json_body(response, StatusCode::OK).await
}

#[tokio::test]
async fn ticket_lifecycle_tracks_response_and_resolution() {
    let app = TestApp::new().await;
    let customer_id = create_customer(&app, "ticket@example.com").await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/tickets",
            Some(json!({
                "customer_id": customer_id,
                "subject": "Order arrived damaged",
                "description": "The box was crushed in transit.",
            })),
        )
        .await;
    let ticket = json_body(response, StatusCode::CREATED).await;
    let ticket_id = ticket["id"].as_str().expect("ticket id").to_string();

    assert_eq!(ticket["status"], "new");
    assert!(ticket["first_response_at"].is_null());
    let number = ticket["ticket_number"].as_str().expect("ticket number");
    assert!(number.starts_with("TKT-"));

    // First move out of New stamps the response time.
    let ticket = set_ticket_status(&app, &ticket_id, "in_progress").await;
    assert!(ticket["first_response_at"].is_string());
    assert!(ticket["resolved_at"].is_null());

    let ticket = set_ticket_status(&app, &ticket_id, "resolved").await;
    assert!(ticket["resolved_at"].is_string());

    // Reopening clears the resolution stamp but not the response stamp.
    let ticket = set_ticket_status(&app, &ticket_id, "open").await;
    assert!(ticket["resolved_at"].is_null());
    assert!(ticket["first_response_at"].is_string());
}

#[tokio::test]
async fn closed_tickets_only_reopen_to_open() {
    let app = TestApp::new().await;
    let customer_id = create_customer(&app, "closed@example.com").await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/tickets",
            Some(json!({
                "customer_id": customer_id,
                "subject": "Wrong size",
                "description": "Need an exchange.",
            })),
        )
        .await;
    let ticket = json_body(response, StatusCode::CREATED).await;
    let ticket_id = ticket["id"].as_str().expect("ticket id").to_string();

    set_ticket_status(&app, &ticket_id, "closed").await;

    let response = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/tickets/{}/status", ticket_id),
            Some(json!({ "status": "in_progress" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let ticket = set_ticket_status(&app, &ticket_id, "open").await;
    assert_eq!(ticket["status"], "open");
}

#[tokio::test]
async fn open_ticket_count_excludes_finished_ones() {
    let app = TestApp::new().await;
    let customer_id = create_customer(&app, "counter@example.com").await;

    let mut ids = Vec::new();
    for subject in ["A", "B", "C"] {
        let response = app
            .request_authenticated(
                Method::POST,
                "/api/v1/tickets",
                Some(json!({
                    "customer_id": customer_id,
                    "subject": subject,
                    "description": "details",
                })),
            )
            .await;
        let ticket = json_body(response, StatusCode::CREATED).await;
        ids.push(ticket["id"].as_str().expect("ticket id").to_string());
    }

    set_ticket_status(&app, &ids[0], "resolved").await;
    set_ticket_status(&app, &ids[1], "closed").await;

    let open = app.state.tickets.count_open_tickets().await.expect("count");
    assert_eq!(open, 1);
}

#[tokio::test]
async fn pipeline_value_weights_open_deals_only() {
    let app = TestApp::new().await;
    let customer_id = create_customer(&app, "deals@example.com").await;
    let close_date = (Utc::now() + Duration::days(30)).date_naive();

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/deals",
            Some(json!({
                "customer_id": customer_id,
                "title": "Annual contract",
                "amount": "1000",
                "probability": 50,
                "expected_close_date": close_date,
            })),
        )
        .await;
    let deal = json_body(response, StatusCode::CREATED).await;
    assert_eq!(deal["stage"], "lead");

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/deals",
            Some(json!({
                "customer_id": customer_id,
                "title": "Equipment upgrade",
                "amount": "2000",
                "probability": 25,
                "expected_close_date": close_date,
            })),
        )
        .await;
    let losing = json_body(response, StatusCode::CREATED).await;
    let losing_id = losing["id"].as_str().expect("deal id").to_string();

    // 1000 * 50% + 2000 * 25%
    let response = app
        .request_authenticated(Method::GET, "/api/v1/deals/pipeline", None)
        .await;
    let body = json_body(response, StatusCode::OK).await;
    assert_eq!(decimal(&body["pipeline_value"]), dec!(1000));

    let response = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/deals/{}/stage", losing_id),
            Some(json!({ "stage": "closed_lost" })),
        )
        .await;
    let closed = json_body(response, StatusCode::OK).await;
    assert_eq!(closed["probability"], 0);
    assert!(closed["closed_at"].is_string());

    let response = app
        .request_authenticated(Method::GET, "/api/v1/deals/pipeline", None)
        .await;
    let body = json_body(response, StatusCode::OK).await;
    assert_eq!(decimal(&body["pipeline_value"]), dec!(500));
}

#[tokio::test]
async fn closed_deals_cannot_change_stage() {
    let app = TestApp::new().await;
    let customer_id = create_customer(&app, "won@example.com").await;
    let close_date = (Utc::now() + Duration::days(10)).date_naive();

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/deals",
            Some(json!({
                "customer_id": customer_id,
                "title": "Pilot rollout",
                "amount": "5000",
                "expected_close_date": close_date,
            })),
        )
        .await;
    let deal = json_body(response, StatusCode::CREATED).await;
    let deal_id = deal["id"].as_str().expect("deal id").to_string();

    let response = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/deals/{}/stage", deal_id),
            Some(json!({ "stage": "closed_won" })),
        )
        .await;
    let won = json_body(response, StatusCode::OK).await;
    assert_eq!(won["probability"], 100);

    let response = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/deals/{}/stage", deal_id),
            Some(json!({ "stage": "negotiation" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn quote_total_is_recomputed_on_every_write() {
    let app = TestApp::new().await;
    let customer_id = create_customer(&app, "quoted@example.com").await;
    let valid_until = (Utc::now() + Duration::days(14)).date_naive();

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/quotes",
            Some(json!({
                "customer_id": customer_id,
                "subtotal": "1000",
                "tax": "100",
                "discount": "50",
                "valid_until": valid_until,
            })),
        )
        .await;
    let quote = json_body(response, StatusCode::CREATED).await;
    let quote_id = quote["id"].as_str().expect("quote id").to_string();

    assert_eq!(quote["status"], "draft");
    assert_eq!(decimal(&quote["total_amount"]), dec!(1050));
    let number = quote["quote_number"].as_str().expect("quote number");
    assert!(number.starts_with("QTE-"));

    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/api/v1/quotes/{}", quote_id),
            Some(json!({ "discount": "200" })),
        )
        .await;
    let repriced = json_body(response, StatusCode::OK).await;
    assert_eq!(decimal(&repriced["total_amount"]), dec!(900));
    assert_eq!(decimal(&repriced["subtotal"]), dec!(1000));
}

#[tokio::test]
async fn answered_quotes_are_immutable() {
    let app = TestApp::new().await;
    let customer_id = create_customer(&app, "accepted@example.com").await;
    let valid_until = (Utc::now() + Duration::days(7)).date_naive();

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/quotes",
            Some(json!({
                "customer_id": customer_id,
                "subtotal": "500",
                "valid_until": valid_until,
            })),
        )
        .await;
    let quote = json_body(response, StatusCode::CREATED).await;
    let quote_id = quote["id"].as_str().expect("quote id").to_string();

    for status in ["sent", "accepted"] {
        let response = app
            .request_authenticated(
                Method::POST,
                &format!("/api/v1/quotes/{}/status", quote_id),
                Some(json!({ "status": status })),
            )
            .await;
        json_body(response, StatusCode::OK).await;
    }

    let response = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/quotes/{}/status", quote_id),
            Some(json!({ "status": "rejected" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/api/v1/quotes/{}", quote_id),
            Some(json!({ "subtotal": "1" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn expired_filter_returns_outstanding_quotes_past_validity() {
    let app = TestApp::new().await;
    let customer_id = create_customer(&app, "stale@example.com").await;
    let past = (Utc::now() - Duration::days(3)).date_naive();
    let future = (Utc::now() + Duration::days(3)).date_naive();

    for (subtotal, valid_until) in [("100", past), ("200", future)] {
        let response = app
            .request_authenticated(
                Method::POST,
                "/api/v1/quotes",
                Some(json!({
                    "customer_id": customer_id,
                    "subtotal": subtotal,
                    "valid_until": valid_until,
                })),
            )
            .await;
        json_body(response, StatusCode::CREATED).await;
    }

    let response = app
        .request_authenticated(Method::GET, "/api/v1/quotes?expired=true", None)
        .await;
    let expired = json_body(response, StatusCode::OK).await;
    let expired = expired.as_array().expect("array");
    assert_eq!(expired.len(), 1);
    assert_eq!(decimal(&expired[0]["subtotal"]), dec!(100));

    let response = app
        .request_authenticated(
            Method::GET,
            &format!("/api/v1/customers/{}/quotes", customer_id),
            None,
        )
        .await;
    let all = json_body(response, StatusCode::OK).await;
    assert_eq!(all.as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn quote_must_reference_the_deal_owner() {
    let app = TestApp::new().await;
    let owner = create_customer(&app, "owner@example.com").await;
    let other = create_customer(&app, "other@example.com").await;
    let close_date = (Utc::now() + Duration::days(30)).date_naive();

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/deals",
            Some(json!({
                "customer_id": owner,
                "title": "Fleet order",
                "amount": "3000",
                "expected_close_date": close_date,
            })),
        )
        .await;
    let deal = json_body(response, StatusCode::CREATED).await;
    let deal_id = deal["id"].as_str().expect("deal id").to_string();

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/quotes",
            Some(json!({
                "customer_id": other,
                "deal_id": deal_id,
                "subtotal": "3000",
                "valid_until": close_date,
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/quotes",
            Some(json!({
                "customer_id": owner,
                "deal_id": deal_id,
                "subtotal": "3000",
                "valid_until": close_date,
            })),
        )
        .await;
    json_body(response, StatusCode::CREATED).await;

    let response = app
        .request_authenticated(
            Method::GET,
            &format!("/api/v1/deals/{}/quotes", deal_id),
            None,
        )
        .await;
    let quotes = json_body(response, StatusCode::OK).await;
    assert_eq!(quotes.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn interaction_journal_is_kept_per_customer() {
    let app = TestApp::new().await;
    let customer_id = create_customer(&app, "journal@example.com").await;
    let other_id = create_customer(&app, "quiet@example.com").await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/interactions",
            Some(json!({
                "customer_id": customer_id,
                "kind": "call",
                "subject": "Renewal check-in",
                "description": "Asked about upgrading the support plan.",
                "outcome": "Interested",
                "next_action": "Send pricing sheet",
            })),
        )
        .await;
    let interaction = json_body(response, StatusCode::CREATED).await;
    assert_eq!(interaction["kind"], "call");
    assert_eq!(interaction["next_action"], "Send pricing sheet");

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/interactions",
            Some(json!({
                "customer_id": customer_id,
                "kind": "email",
                "subject": "Pricing sheet sent",
                "description": "Mailed the Q3 pricing sheet.",
            })),
        )
        .await;
    json_body(response, StatusCode::CREATED).await;

    let response = app
        .request_authenticated(
            Method::GET,
            &format!("/api/v1/customers/{}/interactions", customer_id),
            None,
        )
        .await;
    let journal = json_body(response, StatusCode::OK).await;
    let entries = journal.as_array().expect("journal array");
    assert_eq!(entries.len(), 2);
    let subjects: Vec<&str> = entries
        .iter()
        .filter_map(|e| e["subject"].as_str())
        .collect();
    assert!(subjects.contains(&"Renewal check-in"));
    assert!(subjects.contains(&"Pricing sheet sent"));

    // The other customer's journal stays empty.
    let response = app
        .request_authenticated(
            Method::GET,
            &format!("/api/v1/customers/{}/interactions", other_id),
            None,
        )
        .await;
    let journal = json_body(response, StatusCode::OK).await;
    assert_eq!(journal.as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn interaction_requires_an_existing_customer() {
    let app = TestApp::new().await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/interactions",
            Some(json!({
                "customer_id": Uuid::new_v4(),
                "kind": "note",
                "subject": "Ghost",
                "description": "Nobody home.",
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn average_rating_only_counts_rated_feedback() {
    let app = TestApp::new().await;
    let customer_id = create_customer(&app, "rater@example.com").await;

    for rating in [Some(4), Some(5), None] {
        let response = app
            .request_authenticated(
                Method::POST,
                "/api/v1/feedback",
                Some(json!({
                    "customer_id": customer_id,
                    "kind": "csat",
                    "rating": rating,
                    "comment": "noted",
                })),
            )
            .await;
        json_body(response, StatusCode::CREATED).await;
    }

    let response = app
        .request_authenticated(Method::GET, "/api/v1/feedback/average?kind=csat", None)
        .await;
    let body = json_body(response, StatusCode::OK).await;
    assert_eq!(body["kind"], "csat");
    assert_eq!(decimal(&body["average_rating"]), dec!(4.5));

    // Nothing rated for a different kind yet.
    let response = app
        .request_authenticated(Method::GET, "/api/v1/feedback/average?kind=nps", None)
        .await;
    let body = json_body(response, StatusCode::OK).await;
    assert!(body["average_rating"].is_null());
}

#[tokio::test]
async fn email_campaign_requires_a_subject() {
    let app = TestApp::new().await;
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/campaigns",
            Some(json!({
                "name": "Spring sale",
                "kind": "email",
                "content": "Everything 20% off.",
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn campaign_sends_to_opted_in_customers_and_caps_engagement() {
    let app = TestApp::new().await;
    let opted_in = create_customer(&app, "optin@example.com").await;
    create_customer(&app, "optout@example.com").await;

    // Materialize the default preference row, then opt into marketing.
    let response = app
        .request_authenticated(
            Method::GET,
            &format!("/api/v1/customers/{}/preferences", opted_in),
            None,
        )
        .await;
    json_body(response, StatusCode::OK).await;

    let prefs = CommunicationPreference::find()
        .filter(communication_preference::Column::CustomerId.eq(opted_in))
        .one(&*app.state.db)
        .await
        .expect("preference query")
        .expect("preference row");
    let mut active: communication_preference::ActiveModel = prefs.into();
    active.marketing_emails = Set(true);
    active.update(&*app.state.db).await.expect("preference update");

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/campaigns",
            Some(json!({
                "name": "Loyalty launch",
                "kind": "email",
                "subject": "Introducing rewards",
                "content": "Earn points on every order.",
            })),
        )
        .await;
    let campaign = json_body(response, StatusCode::CREATED).await;
    let campaign_id = campaign["id"].as_str().expect("campaign id").to_string();
    assert_eq!(campaign["status"], "draft");

    let response = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/campaigns/{}/send", campaign_id),
            None,
        )
        .await;
    let sent = json_body(response, StatusCode::OK).await;
    assert_eq!(sent["status"], "sent");
    assert_eq!(sent["sent_count"], 1);

    // Engagement is capped at the sent count.
    for _ in 0..2 {
        let response = app
            .request_authenticated(
                Method::POST,
                &format!("/api/v1/campaigns/{}/engagement", campaign_id),
                Some(json!({ "kind": "opened" })),
            )
            .await;
        json_body(response, StatusCode::OK).await;
    }
    let response = app
        .request_authenticated(
            Method::GET,
            &format!("/api/v1/campaigns/{}", campaign_id),
            None,
        )
        .await;
    let body = json_body(response, StatusCode::OK).await;
    assert_eq!(body["opened_count"], 1);

    // A campaign that already went out cannot be cancelled.
    let response = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/campaigns/{}/cancel", campaign_id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn draft_campaign_can_be_cancelled_but_not_resent() {
    let app = TestApp::new().await;
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/campaigns",
            Some(json!({
                "name": "Abandoned idea",
                "kind": "sms",
                "content": "Flash sale today only",
            })),
        )
        .await;
    let campaign = json_body(response, StatusCode::CREATED).await;
    let campaign_id = campaign["id"].as_str().expect("campaign id").to_string();

    let response = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/campaigns/{}/cancel", campaign_id),
            None,
        )
        .await;
    let cancelled = json_body(response, StatusCode::OK).await;
    assert_eq!(cancelled["status"], "cancelled");

    let response = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/campaigns/{}/send", campaign_id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
