use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartError},
    http::StatusCode,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    auth::Identity,
    error::{AppError, AppResult},
    extract::{FormData, JsonBody, PathParam, QueryParams},
    guard::rules,
    models::{
        Application, ApplicationWithJob, ApplyRequest, AuthResponse, CreateJobRequest,
        HealthResponse, Job, JobsPage, LoginRequest, MessageResponse, RegisterRequest,
        ResumeUpload, UpdateJobRequest, UpdateStatusRequest, UserResponse,
    },
    search::{DEFAULT_LIMIT, DEFAULT_PAGE, JobQuery},
    services::{AccountService, ApplicationService, JobService},
};

// --- Query Parameters ---

/// ListJobsParams
///
/// Query string of `GET /api/jobs`.
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListJobsParams {
    /// 1-indexed page number (default 1).
    pub page: Option<i64>,
    /// Page size (default 10).
    pub limit: Option<i64>,
    /// Case-insensitive match on title, company, location or any skill.
    pub search: Option<String>,
}

/// SearchParams
///
/// Query string of `GET /api/jobs/search`. Same paging as the listing, with the term under
/// `keyword`.
#[derive(Debug, Deserialize, IntoParams)]
pub struct SearchParams {
    pub keyword: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Out-of-range values end up below 1 and are rejected by [`JobQuery::new`].
fn job_query(page: Option<i64>, limit: Option<i64>, term: Option<&str>) -> AppResult<JobQuery> {
    let narrow = |value: Option<i64>, default: u32| match value {
        None => default,
        Some(v) => u32::try_from(v).unwrap_or(if v < 0 { 0 } else { u32::MAX }),
    };

    JobQuery::new(
        narrow(page, DEFAULT_PAGE),
        narrow(limit, DEFAULT_LIMIT),
        term,
    )
}

/// ApplicationForm
///
/// OpenAPI description of the multipart body of `POST /api/jobs/{job_id}/apply`. The handler reads
/// the parts directly from the stream.
#[derive(ToSchema)]
pub struct ApplicationForm {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub cover_letter: String,
    #[schema(value_type = String, format = Binary)]
    pub resume: Vec<u8>,
}

fn bad_form(e: MultipartError) -> AppError {
    AppError::invalid(format!("Invalid form data: {e}"))
}

/// Splits the apply form into its text fields and the resume file. Unknown parts are ignored.
async fn read_application_form(mut multipart: Multipart) -> AppResult<(ApplyRequest, ResumeUpload)> {
    let mut form = ApplyRequest::default();
    let mut resume = None;

    while let Some(field) = multipart.next_field().await.map_err(bad_form)? {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "resume" => {
                let file_name = field.file_name().unwrap_or("resume").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await.map_err(bad_form)?;

                resume = Some(ResumeUpload {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            "full_name" => form.full_name = field.text().await.map_err(bad_form)?,
            "email" => form.email = field.text().await.map_err(bad_form)?,
            "phone" => form.phone = field.text().await.map_err(bad_form)?,
            "cover_letter" => form.cover_letter = field.text().await.map_err(bad_form)?,
            _ => {}
        }
    }

    let resume = resume.ok_or_else(|| AppError::invalid("resume is required"))?;
    Ok((form, resume))
}

// --- Public ---

/// health
///
/// [Public Route] Liveness check.
#[utoipa::path(
    get,
    path = "/api/health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
    })
}

/// register
///
/// [Public Route] Creates an employer or job seeker account and returns a token for it.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Registered", body = AuthResponse),
        (status = 400, description = "Missing field or invalid role"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register(
    State(accounts): State<AccountService>,
    JsonBody(payload): JsonBody<RegisterRequest>,
) -> AppResult<Json<AuthResponse>> {
    Ok(Json(accounts.register(payload).await?))
}

/// login
///
/// [Public Route] Exchanges an email and password for a bearer token.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(accounts): State<AccountService>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    Ok(Json(accounts.login(payload).await?))
}

/// list_jobs
///
/// [Public Route] One page of the job catalog, newest first, optionally filtered by `search`.
#[utoipa::path(
    get,
    path = "/api/jobs",
    params(ListJobsParams),
    responses(
        (status = 200, description = "Page of jobs", body = JobsPage),
        (status = 400, description = "page or limit below 1")
    )
)]
pub async fn list_jobs(
    State(jobs): State<JobService>,
    QueryParams(params): QueryParams<ListJobsParams>,
) -> AppResult<Json<JobsPage>> {
    let query = job_query(params.page, params.limit, params.search.as_deref())?;
    Ok(Json(jobs.list(query).await?))
}

/// search_jobs
///
/// [Public Route] Keyword search over the catalog. Same matching and paging as `list_jobs`.
#[utoipa::path(
    get,
    path = "/api/jobs/search",
    params(SearchParams),
    responses((status = 200, description = "Page of matching jobs", body = JobsPage))
)]
pub async fn search_jobs(
    State(jobs): State<JobService>,
    QueryParams(params): QueryParams<SearchParams>,
) -> AppResult<Json<JobsPage>> {
    let query = job_query(params.page, params.limit, params.keyword.as_deref())?;
    Ok(Json(jobs.list(query).await?))
}

/// get_job
///
/// [Public Route] A single job posting.
#[utoipa::path(
    get,
    path = "/api/jobs/{job_id}",
    params(("job_id" = Uuid, Path, description = "Job ID")),
    responses(
        (status = 200, description = "Found", body = Job),
        (status = 404, description = "Job not found")
    )
)]
pub async fn get_job(
    State(jobs): State<JobService>,
    PathParam(job_id): PathParam<Uuid>,
) -> AppResult<Json<Job>> {
    Ok(Json(jobs.get(job_id).await?))
}

// --- Any Authenticated User ---

/// me
///
/// [Authenticated Route] The caller's own account.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn me(
    identity: Identity,
    State(accounts): State<AccountService>,
) -> AppResult<Json<UserResponse>> {
    let principal = rules::CURRENT_USER.authorize(identity.principal())?;
    Ok(Json(accounts.current_user(principal).await?))
}

// --- Job Seeker ---

/// apply
///
/// [Job Seeker Route] Applies to a job with a multipart form carrying the resume file.
#[utoipa::path(
    post,
    path = "/api/jobs/{job_id}/apply",
    params(("job_id" = Uuid, Path, description = "Job ID")),
    request_body(content = ApplicationForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Application submitted", body = Application),
        (status = 403, description = "Not a job seeker"),
        (status = 404, description = "Job not found"),
        (status = 409, description = "Already applied to this job")
    )
)]
pub async fn apply(
    identity: Identity,
    State(applications): State<ApplicationService>,
    PathParam(job_id): PathParam<Uuid>,
    FormData(multipart): FormData,
) -> AppResult<(StatusCode, Json<Application>)> {
    let principal = rules::APPLY.authorize(identity.principal())?;
    let (form, resume) = read_application_form(multipart).await?;

    let application = applications.apply(job_id, principal, form, resume).await?;
    Ok((StatusCode::CREATED, Json(application)))
}

/// my_applications
///
/// [Job Seeker Route] The caller's applications, newest first, with job title and company.
#[utoipa::path(
    get,
    path = "/api/jobseeker/applications",
    responses((status = 200, description = "My applications", body = [ApplicationWithJob]))
)]
pub async fn my_applications(
    identity: Identity,
    State(applications): State<ApplicationService>,
) -> AppResult<Json<Vec<ApplicationWithJob>>> {
    let principal = rules::LIST_MY_APPLICATIONS.authorize(identity.principal())?;
    Ok(Json(applications.list_for_applicant(principal).await?))
}

// --- Employer ---

/// create_job
///
/// [Employer Route] Posts a new job owned by the caller.
#[utoipa::path(
    post,
    path = "/api/employer/jobs",
    request_body = CreateJobRequest,
    responses(
        (status = 201, description = "Job created", body = Job),
        (status = 400, description = "Missing required field")
    )
)]
pub async fn create_job(
    identity: Identity,
    State(jobs): State<JobService>,
    JsonBody(payload): JsonBody<CreateJobRequest>,
) -> AppResult<(StatusCode, Json<Job>)> {
    let principal = rules::CREATE_JOB.authorize(identity.principal())?;
    let job = jobs.create(principal, payload).await?;
    Ok((StatusCode::CREATED, Json(job)))
}

/// my_jobs
///
/// [Employer Route] The caller's own postings, newest first.
#[utoipa::path(
    get,
    path = "/api/employer/jobs",
    responses((status = 200, description = "My jobs", body = [Job]))
)]
pub async fn my_jobs(
    identity: Identity,
    State(jobs): State<JobService>,
) -> AppResult<Json<Vec<Job>>> {
    let principal = rules::LIST_MY_JOBS.authorize(identity.principal())?;
    Ok(Json(jobs.list_mine(principal).await?))
}

/// update_job
///
/// [Employer Route] Merge-patch of one of the caller's jobs.
///
/// *Authorization*: a job owned by someone else answers 404, the same as a missing one.
#[utoipa::path(
    put,
    path = "/api/employer/jobs/{job_id}",
    params(("job_id" = Uuid, Path, description = "Job ID")),
    request_body = UpdateJobRequest,
    responses(
        (status = 200, description = "Updated", body = Job),
        (status = 404, description = "Job not found or not owned by you")
    )
)]
pub async fn update_job(
    identity: Identity,
    State(jobs): State<JobService>,
    PathParam(job_id): PathParam<Uuid>,
    JsonBody(payload): JsonBody<UpdateJobRequest>,
) -> AppResult<Json<Job>> {
    let principal = rules::UPDATE_JOB.authorize(identity.principal())?;
    Ok(Json(jobs.update(job_id, principal, payload).await?))
}

/// delete_job
///
/// [Employer Route] Deletes one of the caller's jobs and every application to it.
#[utoipa::path(
    delete,
    path = "/api/employer/jobs/{job_id}",
    params(("job_id" = Uuid, Path, description = "Job ID")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 404, description = "Job not found or not owned by you")
    )
)]
pub async fn delete_job(
    identity: Identity,
    State(jobs): State<JobService>,
    PathParam(job_id): PathParam<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    let principal = rules::DELETE_JOB.authorize(identity.principal())?;
    jobs.delete(job_id, principal).await?;
    Ok(Json(MessageResponse::new("Job deleted successfully")))
}

/// job_applications
///
/// [Employer Route] Applications to one of the caller's jobs, newest first.
#[utoipa::path(
    get,
    path = "/api/employer/jobs/{job_id}/applications",
    params(("job_id" = Uuid, Path, description = "Job ID")),
    responses(
        (status = 200, description = "Applications", body = [Application]),
        (status = 404, description = "Job not found or not owned by you")
    )
)]
pub async fn job_applications(
    identity: Identity,
    State(applications): State<ApplicationService>,
    PathParam(job_id): PathParam<Uuid>,
) -> AppResult<Json<Vec<Application>>> {
    let principal = rules::LIST_JOB_APPLICATIONS.authorize(identity.principal())?;
    Ok(Json(applications.list_for_job(job_id, principal).await?))
}

/// update_application_status
///
/// [Employer/Admin Route] Moves an application to `applied`, `approved`, `rejected` or
/// `waitlisted`. Allowed for the employer owning the job, and for admins.
#[utoipa::path(
    put,
    path = "/api/employer/applications/{application_id}/status",
    params(("application_id" = Uuid, Path, description = "Application ID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = Application),
        (status = 400, description = "Invalid status"),
        (status = 403, description = "Not authorized to update this application"),
        (status = 404, description = "Application not found")
    )
)]
pub async fn update_application_status(
    identity: Identity,
    State(applications): State<ApplicationService>,
    PathParam(application_id): PathParam<Uuid>,
    JsonBody(payload): JsonBody<UpdateStatusRequest>,
) -> AppResult<Json<Application>> {
    let principal = rules::UPDATE_APPLICATION_STATUS.authorize(identity.principal())?;
    let application = applications
        .update_status(application_id, &payload.status, principal)
        .await?;
    Ok(Json(application))
}

// --- Admin ---

/// admin_list_jobs
///
/// [Admin Route] Every job in the system, newest first.
#[utoipa::path(
    get,
    path = "/api/admin/jobs",
    responses((status = 200, description = "All jobs", body = [Job]))
)]
pub async fn admin_list_jobs(
    identity: Identity,
    State(jobs): State<JobService>,
) -> AppResult<Json<Vec<Job>>> {
    rules::ADMIN_LIST_JOBS.authorize(identity.principal())?;
    Ok(Json(jobs.list_all().await?))
}

/// admin_delete_job
///
/// [Admin Route] Deletes any job, with its applications. No ownership check.
#[utoipa::path(
    delete,
    path = "/api/admin/jobs/{job_id}",
    params(("job_id" = Uuid, Path, description = "Job ID")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 404, description = "Job not found")
    )
)]
pub async fn admin_delete_job(
    identity: Identity,
    State(jobs): State<JobService>,
    PathParam(job_id): PathParam<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    let principal = rules::ADMIN_DELETE_JOB.authorize(identity.principal())?;
    jobs.delete_as_admin(job_id, principal).await?;
    Ok(Json(MessageResponse::new("Job deleted successfully")))
}
