use axum::{routing::get, Router};
use secrecy::ExposeSecret;
use std::net::SocketAddr;
use tokio_cron_scheduler::{Job, JobScheduler};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use earnhub::api::middleware::session::{create_session_layer, AppState};
use earnhub::config::Config;
use earnhub::db;
use earnhub::jobs::queue_worker;

const WORKER_BATCH_SIZE: i64 = 20;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "earnhub=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting earnhub server...");

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded successfully");

    // Create database pool
    let pool = db::create_pool(&config.database_url).await?;
    tracing::info!("Database pool created");

    // Run migrations
    db::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    // Create session layer for the admin surface
    let session_layer = create_session_layer(
        pool.clone(),
        config.session_secret.expose_secret().as_bytes(),
        &config.base_url,
    )
    .await?;
    tracing::info!("Session layer initialized");

    // Build application state
    let state = AppState {
        pool: pool.clone(),
        config: config.clone(),
    };

    // Schedule the processing job worker
    let scheduler = JobScheduler::new().await?;
    let worker_pool = pool.clone();
    scheduler
        .add(Job::new_async("0 * * * * *", move |_uuid, _lock| {
            let pool = worker_pool.clone();
            Box::pin(async move {
                if let Err(e) = queue_worker::run_pending_jobs(&pool, WORKER_BATCH_SIZE).await {
                    tracing::error!(error = %e, "Queue worker pass failed");
                }
            })
        })?)
        .await?;
    scheduler.start().await?;
    tracing::info!("Queue worker scheduled");

    // Client API under /api/v1, back-office under /admin
    let api_v1 = Router::new()
        .merge(earnhub::api::auth::router())
        .merge(earnhub::api::ads::router())
        .merge(earnhub::api::teasers::router())
        .merge(earnhub::api::courses::router())
        .merge(earnhub::api::products::router())
        .merge(earnhub::api::wallet::router())
        .merge(earnhub::api::referrals::router())
        .merge(earnhub::api::images::router());

    let app = Router::new()
        .route("/health", get(|| async { "OK" }))
        .nest("/api/v1", api_v1)
        .nest("/admin", earnhub::api::admin::router())
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::new(config.host.parse()?, config.port);
    tracing::info!("Listening on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install CTRL+C signal handler");
    tracing::info!("Shutdown signal received, cleaning up...");
}
