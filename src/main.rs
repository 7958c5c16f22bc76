use std::sync::Arc;

use anyhow::Context;
use tokio::{net::TcpListener, signal};
use tracing::info;

use retail_crm_api::{
    app_router,
    config::{init_tracing, load_config},
    db::{establish_connection_from_app_config, run_migrations},
    events, AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config().context("failed to load configuration")?;
    init_tracing(config.log_level());
    info!(environment = %config.environment, "starting retail-crm-api");

    let db = establish_connection_from_app_config(&config)
        .await
        .context("failed to connect to database")?;
    if config.auto_migrate {
        run_migrations(&db).await.context("migrations failed")?;
        info!("database migrations applied");
    }
    let db = Arc::new(db);

    let (event_sender, receiver) = events::channel(1024);
    tokio::spawn(events::process_events(receiver));

    let state = AppState::new(db, &config, Arc::new(event_sender));
    let app = app_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
