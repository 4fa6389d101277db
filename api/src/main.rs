use api::auth::guards::SUPERUSER_IDS;
use api::auth::middleware::log_request;
use api::routes::routes;
use api::state::AppState;
use axum::{
    Router,
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    middleware::from_fn,
};
use chrono::Local;
use migration::Migrator;
use sea_orm_migration::MigratorTrait;
use services::check_in::CheckInPolicy;
use services::session_lifecycle::materialize_day;
use services::verification::provider_from_config;
use sea_orm::DatabaseConnection;
use std::net::SocketAddr;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tracing_appender::rolling;
use util::config;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Load configuration and initialize logging
    let _log_guard = init_logging(&config::log_file());

    if config::jwt_secret().trim().is_empty() {
        tracing::error!("JWT_SECRET is not set; refusing to start");
        std::process::exit(1);
    }

    // Initialize superuser IDs
    let _ = once_cell::sync::Lazy::force(&SUPERUSER_IDS);

    let db = match db::connect().await {
        Ok(db) => db,
        Err(e) => {
            tracing::error!(error = %e, "Failed to connect to the database");
            std::process::exit(1);
        }
    };

    if let Err(e) = Migrator::up(&db, None).await {
        tracing::error!(error = %e, "Failed to apply migrations");
        std::process::exit(1);
    }

    // Students can only see sessions that exist, so make sure today's do
    let today = Local::now().date_naive();
    if let Err(e) = materialize_day(&db, today).await {
        tracing::warn!(error = %e, %today, "Could not materialise today's sessions");
    }
    spawn_daily_materializer(db.clone(), today);

    let policy = CheckInPolicy::from_config();
    tracing::info!(
        grace_minutes = policy.grace.num_minutes(),
        threshold = policy.threshold,
        "Check-in policy loaded"
    );
    let app_state = AppState::new(db, provider_from_config(), policy);

    // Configure middleware
    let cors = CorsLayer::very_permissive().expose_headers([CONTENT_DISPOSITION, CONTENT_TYPE]);

    // Build app router
    let app = Router::new()
        .nest("/api", routes(app_state))
        .layer(from_fn(log_request))
        .layer(cors);

    // Start server
    let addr: SocketAddr = match format!("{}:{}", config::host(), config::port()).parse() {
        Ok(addr) => addr,
        Err(e) => {
            tracing::error!(error = %e, "Invalid HOST/PORT");
            std::process::exit(1);
        }
    };

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(error = %e, %addr, "Failed to bind");
            std::process::exit(1);
        }
    };

    println!(
        "Starting {} on http://{}:{}",
        config::project_name(),
        config::host(),
        config::port()
    );
    tracing::info!(%addr, env = %config::env(), "Server listening");

    if let Err(e) = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    {
        tracing::error!(error = %e, "Server crashed");
        std::process::exit(1);
    }
}

/// Materialises each new day's sessions once local midnight has passed.
fn spawn_daily_materializer(db: DatabaseConnection, mut last_day: chrono::NaiveDate) {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(60)).await;
            let today = Local::now().date_naive();
            if today == last_day {
                continue;
            }
            match materialize_day(&db, today).await {
                Ok(created) => {
                    tracing::info!(%today, created, "Materialised the new day's sessions");
                    last_day = today;
                }
                Err(e) => {
                    // last_day stays put, so the next tick tries again
                    tracing::warn!(error = %e, %today, "Daily materialisation failed");
                }
            }
        }
    });
}

fn init_logging(log_file: &str) -> tracing_appender::non_blocking::WorkerGuard {
    use std::fs;
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    fs::create_dir_all("logs").ok();

    let file_appender = rolling::daily("logs", log_file);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true);

    let stdout_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .with_target(true)
        .with_thread_ids(true);

    let env_filter = EnvFilter::try_from_env("LOG_LEVEL")
        .unwrap_or_else(|_| EnvFilter::new("api=info,services=info,db=info"));

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer);

    if config::log_to_stdout() {
        registry.with(stdout_layer).init();
    } else {
        registry.init();
    }

    guard
}
