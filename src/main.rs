use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use academy_bookings::config::AppConfig;
use academy_bookings::db;
use academy_bookings::handlers;
use academy_bookings::models::FacilityType;
use academy_bookings::services::events;
use academy_bookings::services::notify::LogNotifier;
use academy_bookings::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env()?;

    let conn = db::init_db(&config.database_url)
        .with_context(|| format!("failed to open database {}", config.database_url))?;

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
        notifier: Box::new(LogNotifier),
        events_tx: events::channel(),
    });

    tokio::spawn(completion_sweep(
        Arc::clone(&state),
        Duration::from_secs(config.completion_sweep_secs),
    ));

    let app = handlers::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!(
        ground_slots = config.catalog.all_slots(FacilityType::Ground).len(),
        net_slots = config.catalog.all_slots(FacilityType::Net).len(),
        "starting server on {addr}"
    );

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn completion_sweep(state: Arc<AppState>, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    loop {
        ticker.tick().await;
        let now = chrono::Local::now().naive_local();
        if let Err(e) = handlers::admin::run_completion_sweep(&state, &now) {
            tracing::error!(error = %e, "completion sweep failed");
        }
    }
}
