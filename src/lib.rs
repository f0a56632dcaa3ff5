use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    middleware,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Domain, persistence and request plumbing.
pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod guard;
pub mod handlers;
pub mod models;
pub mod password;
pub mod repository;
pub mod search;
pub mod services;
pub mod storage;
pub mod token;

// Route tables split by who may reach them (public, signed-in, admin).
pub mod routes;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

// What main.rs and the integration tests build the application from.

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use password::PasswordService;
pub use repository::{InMemoryRepository, PostgresRepository, RepositoryState};
pub use services::{AccountService, ApplicationService, JobService};
pub use storage::{MockStorageService, S3StorageClient, StorageState};
pub use token::TokenService;

/// ApiDoc
///
/// OpenAPI document for every handler and schema, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    // Every handler carrying a `#[utoipa::path]` attribute.
    paths(
        handlers::health, handlers::register, handlers::login, handlers::me,
        handlers::list_jobs, handlers::search_jobs, handlers::get_job, handlers::apply,
        handlers::my_applications, handlers::create_job, handlers::my_jobs,
        handlers::update_job, handlers::delete_job, handlers::job_applications,
        handlers::update_application_status, handlers::admin_list_jobs,
        handlers::admin_delete_job
    ),
    components(
        // Request and response bodies.
        schemas(
            models::Role, models::ApplicationStatus, models::Job, models::Application,
            models::ApplicationWithJob, models::RegisterRequest, models::LoginRequest,
            models::CreateJobRequest, models::UpdateJobRequest, models::UpdateStatusRequest,
            models::UserResponse, models::AuthResponse, models::JobsPage,
            models::MessageResponse, models::HealthResponse, handlers::ApplicationForm,
        )
    ),
    tags(
        (name = "job-portal", description = "Job marketplace API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single shared container for collaborators and configuration. Handlers never take it
/// whole; they extract the service they need through `FromRef`.
#[derive(Clone)]
pub struct AppState {
    /// Users, jobs and applications (Postgres or in-memory).
    pub repo: RepositoryState,
    /// Resume uploads (S3/MinIO or the mock).
    pub storage: StorageState,
    /// The loaded environment configuration.
    pub config: AppConfig,
    /// Issues and validates bearer tokens.
    pub tokens: TokenService,
    /// Argon2 hashing with the configured cost.
    pub passwords: PasswordService,
}

impl AppState {
    /// Builds the token and password services from `config`.
    pub fn new(
        repo: RepositoryState,
        storage: StorageState,
        config: AppConfig,
    ) -> Result<Self, password::PasswordError> {
        let tokens = TokenService::new(
            &config.jwt_secret,
            chrono::Duration::hours(config.jwt_ttl_hours),
        );
        let passwords = PasswordService::new(config.argon2_memory_kib, config.argon2_iterations)?;

        Ok(Self {
            repo,
            storage,
            config,
            tokens,
            passwords,
        })
    }
}

// --- Axum FromRef Extractor Implementations ---

// Handlers pull exactly the collaborator they use. The services are assembled per request from
// the shared handles, which are all cheap `Arc` clones.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

impl FromRef<AppState> for TokenService {
    fn from_ref(app_state: &AppState) -> TokenService {
        app_state.tokens.clone()
    }
}

impl FromRef<AppState> for AccountService {
    fn from_ref(app_state: &AppState) -> AccountService {
        AccountService::new(
            app_state.repo.clone(),
            app_state.tokens.clone(),
            app_state.passwords.clone(),
            app_state.config.admin_email.clone(),
            app_state.config.admin_password.clone(),
        )
    }
}

impl FromRef<AppState> for JobService {
    fn from_ref(app_state: &AppState) -> JobService {
        JobService::new(app_state.repo.clone())
    }
}

impl FromRef<AppState> for ApplicationService {
    fn from_ref(app_state: &AppState) -> ApplicationService {
        ApplicationService::new(app_state.repo.clone(), app_state.storage.clone())
    }
}

/// create_router
///
/// Assembles the `/api` routes, the identity middleware, Swagger UI and the observability layers.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name for request correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let api = Router::new()
        // Public Routes: health, sign-up, sign-in and the catalog.
        .merge(public::public_routes())
        // Signed-in Routes: the role is checked per handler by the guard.
        .merge(authenticated::authenticated_routes())
        // Admin Routes: nested under '/admin'.
        .nest("/admin", admin::admin_routes());

    let base_router = Router::new()
        // Documentation: Swagger UI and the generated OpenAPI JSON.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api", api)
        // Resolves the caller for every route. Never rejects; the guard does that per operation.
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::identify,
        ))
        .with_state(state);

    // 3. Observability and Correlation Layers (outermost, so they see every request)
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Request ID Generation: a UUID per incoming request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. Request Tracing: one span per request, tagged with the request ID.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Request ID Propagation: echoes x-request-id back to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS Layer
        .layer(cors)
}

/// trace_span_logger
///
/// Span for `TraceLayer`: method, URI and the `x-request-id` set by `SetRequestIdLayer`, so every
/// log line of one request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
