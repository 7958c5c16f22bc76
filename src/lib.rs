pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod services;

use std::sync::Arc;

use axum::Router;
use sea_orm::DatabaseConnection;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    auth::AuthService,
    config::AppConfig,
    events::EventSender,
    services::{
        automation::AutomationService, campaigns::CampaignService, customers::CustomerService,
        deals::DealService, feedback::FeedbackService, interactions::InteractionService,
        loyalty::LoyaltyService, notifier::EmailNotifier, orders::OrderService, otp::OtpService,
        products::ProductService,
        quotes::QuoteService, scoring::ScoringService, tasks::TaskService, tickets::TicketService,
    },
};

/// Shared application state: one wired instance of every service.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub auth: AuthService,
    pub customers: CustomerService,
    pub orders: OrderService,
    pub products: ProductService,
    pub tickets: TicketService,
    pub deals: DealService,
    pub quotes: QuoteService,
    pub interactions: InteractionService,
    pub tasks: TaskService,
    pub feedback: FeedbackService,
    pub campaigns: CampaignService,
    pub loyalty: LoyaltyService,
    pub scoring: ScoringService,
    pub automation: AutomationService,
    pub otp: OtpService,
}

impl AppState {
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: &AppConfig,
        event_sender: Arc<EventSender>,
    ) -> Self {
        let auth = AuthService::new(&config.jwt_secret, config.jwt_expiration);
        let notifier = EmailNotifier::new(config.notifier.clone());
        let loyalty = LoyaltyService::new(db.clone(), event_sender.clone());
        let automation = AutomationService::new(
            db.clone(),
            loyalty.clone(),
            notifier.clone(),
            event_sender.clone(),
        );

        Self {
            customers: CustomerService::new(db.clone(), event_sender.clone(), automation.clone()),
            orders: OrderService::new(
                db.clone(),
                event_sender.clone(),
                loyalty.clone(),
                automation.clone(),
                config.points_per_currency_unit,
            ),
            products: ProductService::new(db.clone()),
            tickets: TicketService::new(db.clone(), event_sender.clone(), automation.clone()),
            deals: DealService::new(db.clone(), event_sender.clone()),
            quotes: QuoteService::new(db.clone()),
            interactions: InteractionService::new(db.clone()),
            tasks: TaskService::new(db.clone()),
            feedback: FeedbackService::new(db.clone(), event_sender.clone(), automation.clone()),
            campaigns: CampaignService::new(db.clone(), event_sender, notifier.clone()),
            scoring: ScoringService::new(db.clone()),
            otp: OtpService::new(db.clone(), auth.clone(), notifier, config.otp_ttl_minutes),
            loyalty,
            automation,
            auth,
            db,
        }
    }
}

/// Builds the full application router with tracing and CORS applied.
pub fn app_router(state: AppState) -> Router {
    let api = Router::new()
        .nest("/auth", handlers::auth::auth_routes())
        .nest("/customers", handlers::customers::customer_routes())
        .nest("/orders", handlers::orders::order_routes())
        .nest("/products", handlers::products::product_routes())
        .nest("/tickets", handlers::tickets::ticket_routes())
        .nest("/deals", handlers::deals::deal_routes())
        .nest("/quotes", handlers::quotes::quote_routes())
        .nest("/interactions", handlers::interactions::interaction_routes())
        .nest("/tasks", handlers::tasks::task_routes())
        .nest("/feedback", handlers::feedback::feedback_routes())
        .nest("/campaigns", handlers::campaigns::campaign_routes())
        .nest("/workflows", handlers::workflows::workflow_routes());

    Router::new()
        .nest("/api/v1", api)
        .merge(handlers::health::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
