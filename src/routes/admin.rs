use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get},
};

/// Admin Router Module
///
/// Oversight of the whole catalog. Nested under `/admin`; every handler requires the admin role.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin/jobs
        // Every job, newest first, regardless of owner.
        .route("/jobs", get(handlers::admin_list_jobs))
        // DELETE /admin/jobs/{job_id}
        // Force delete with the same cascade as the owner path.
        .route("/jobs/{job_id}", delete(handlers::admin_delete_job))
}
