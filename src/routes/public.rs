use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Read-only catalog access plus the account gateway. None of these handlers consults the guard.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness check for load balancers and monitoring.
        .route("/health", get(handlers::health))
        // POST /auth/register
        // Creates an employer or job seeker account and returns a token.
        .route("/auth/register", post(handlers::register))
        // POST /auth/login
        // Email and password for a token. Honours the bootstrap admin pair.
        .route("/auth/login", post(handlers::login))
        // GET /jobs?page=...&limit=...&search=...
        // Paged catalog, newest first.
        .route("/jobs", get(handlers::list_jobs))
        // GET /jobs/search?keyword=...
        // Same as /jobs with the term under `keyword`. Static segment, so it wins over /jobs/{job_id}.
        .route("/jobs/search", get(handlers::search_jobs))
        // GET /jobs/{job_id}
        .route("/jobs/{job_id}", get(handlers::get_job))
}
