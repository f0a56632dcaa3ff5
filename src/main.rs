use job_portal::{
    AccountService, AppState,
    config::{AppConfig, Env},
    create_router,
    repository::{PostgresRepository, RepositoryState},
    storage::{S3StorageClient, StorageService, StorageState},
};
use axum::extract::FromRef;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Startup: configuration, logging, database (with migrations), file storage, the bootstrap admin
/// account, then the HTTP server. Any failure before the listener is bound is fatal.
#[tokio::main]
async fn main() {
    // 1. Configuration (fail-fast on missing production secrets)
    // .env is read first so its values reach AppConfig::load().
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging: RUST_LOG wins, otherwise debug for this crate.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "job_portal=debug,tower_http=info".into());

    // Output format follows APP_ENV.
    match config.env {
        Env::Local => {
            // LOCAL: pretty, human-readable output.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            // PROD: one JSON object per line for the log aggregator.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 3. Database
    // Connection pool, then the embedded migrations under ./migrations.
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.db_url)
        .await
        .expect("FATAL: Failed to connect to Postgres. Check DATABASE_URL.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("FATAL: Failed to apply database migrations.");

    // Shared behind the Repository trait object.
    let repo = Arc::new(PostgresRepository::new(pool)) as RepositoryState;

    // 4. Resume storage (S3/MinIO)
    // Credentials and endpoint come from AppConfig.
    let s3_client = S3StorageClient::new(
        &config.s3_endpoint,
        &config.s3_region,
        &config.s3_key,
        &config.s3_secret,
        &config.s3_bucket,
    )
    .await;

    // LOCAL-ONLY: provision the MinIO bucket.
    if config.env == Env::Local {
        s3_client.ensure_bucket_exists().await;
    }

    let storage = Arc::new(s3_client) as StorageState;

    // 5. State
    // Builds the token and password services from the configuration.
    let bind_addr = config.bind_addr.clone();
    let app_state = AppState::new(repo, storage, config)
        .expect("FATAL: Invalid Argon2 parameters. Check ARGON2_MEMORY_KIB/ARGON2_ITERATIONS.");

    // 6. Bootstrap admin (create-if-absent)
    // Refuses to start when the admin email belongs to a non-admin account.
    let admin = AccountService::from_ref(&app_state)
        .ensure_admin()
        .await
        .expect("FATAL: Could not ensure the admin account exists.");
    tracing::info!(email = %admin.email, "admin account ready");

    // 7. Router and server
    let app = create_router(app_state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: Could not bind BIND_ADDR.");

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at: http://{}/swagger-ui", bind_addr);

    // The long-running server process.
    axum::serve(listener, app)
        .await
        .expect("FATAL: HTTP server terminated unexpectedly.");
}
