use crate::{AppState, handlers};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post, put},
};

/// Upper bound for the multipart apply body (resume plus text fields).
pub const MAX_APPLICATION_BYTES: usize = 10 * 1024 * 1024;

/// Authenticated Router Module
///
/// Routes that need a principal. Each handler runs its own `AccessRule`, so an anonymous caller
/// gets 401 and a caller with the wrong role gets 403 from the handler itself.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /auth/me
        // Any role. The caller's own account.
        .route("/auth/me", get(handlers::me))
        // --- Job Seeker ---
        // POST /jobs/{job_id}/apply
        // Multipart form with the resume file. One application per job and applicant.
        .route(
            "/jobs/{job_id}/apply",
            post(handlers::apply).layer(DefaultBodyLimit::max(MAX_APPLICATION_BYTES)),
        )
        // GET /jobseeker/applications
        .route("/jobseeker/applications", get(handlers::my_applications))
        // --- Employer ---
        // POST/GET /employer/jobs
        // Post a job, or list the caller's own jobs.
        .route(
            "/employer/jobs",
            post(handlers::create_job).get(handlers::my_jobs),
        )
        // PUT/DELETE /employer/jobs/{job_id}
        // Owner only. Someone else's job answers 404.
        .route(
            "/employer/jobs/{job_id}",
            put(handlers::update_job).delete(handlers::delete_job),
        )
        // GET /employer/jobs/{job_id}/applications
        .route(
            "/employer/jobs/{job_id}/applications",
            get(handlers::job_applications),
        )
        // PUT /employer/applications/{application_id}/status
        // The job's owner, or an admin.
        .route(
            "/employer/applications/{application_id}/status",
            put(handlers::update_application_status),
        )
}
