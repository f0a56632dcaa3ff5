use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

// --- Closed Enumerations ---

/// Role
///
/// The RBAC field of every account. Mapped to the Postgres `user_role` enum.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema, sqlx::Type,
)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    Admin,
    Employer,
    Jobseeker,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Employer => "employer",
            Role::Jobseeker => "jobseeker",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "employer" => Ok(Role::Employer),
            "jobseeker" => Ok(Role::Jobseeker),
            _ => Err(AppError::invalid("Invalid role")),
        }
    }
}

/// ApplicationStatus
///
/// Every application starts as `Applied`. Any status may be set from any other status.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    TS,
    ToSchema,
    sqlx::Type,
)]
#[sqlx(type_name = "application_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum ApplicationStatus {
    #[default]
    Applied,
    Approved,
    Rejected,
    Waitlisted,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Applied => "applied",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Waitlisted => "waitlisted",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "applied" => Ok(ApplicationStatus::Applied),
            "approved" => Ok(ApplicationStatus::Approved),
            "rejected" => Ok(ApplicationStatus::Rejected),
            "waitlisted" => Ok(ApplicationStatus::Waitlisted),
            _ => Err(AppError::invalid("Invalid status")),
        }
    }
}

// --- Core Records (Mapped to Database) ---

/// User
///
/// Canonical identity record from the `users` table. Never serialized directly, since it carries
/// the password digest; see [`UserResponse`].
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    // Login key. Stored exactly as registered.
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub full_name: String,
    // Only set for employers.
    pub company: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Job
///
/// A posting from the `jobs` table. `employer_id` is fixed at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Job {
    pub id: Uuid,
    pub employer_id: Uuid,
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: String,
    pub requirements: String,
    pub salary_range: Option<String>,
    pub skills: Vec<String>,
    /// Kept as the client sent it; no date arithmetic is done on it.
    pub application_deadline: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Application
///
/// A job seeker's application from the `applications` table. At most one per (job, applicant).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Application {
    pub id: Uuid,
    pub job_id: Uuid,
    pub applicant_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub cover_letter: String,
    /// Object key returned by the file storage when the resume was uploaded.
    pub resume_key: String,
    pub status: ApplicationStatus,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// ApplicationWithJob
///
/// A job seeker's view of their applications, joined with the job's title and company.
/// Both are `None` if the job could not be resolved.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct ApplicationWithJob {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub application: Application,
    pub job_title: Option<String>,
    pub job_company: Option<String>,
}

// --- Request Payloads (Input Schemas) ---

/// Rejects empty or whitespace-only values for a required field.
pub(crate) fn require_text(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::invalid(format!("{field} is required")));
    }
    Ok(())
}

/// RegisterRequest
///
/// Input for `POST /api/auth/register`. `role` is kept as a raw string so an unknown value is
/// reported as invalid input rather than a body deserialization failure.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(default)]
#[ts(export)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub role: String,
    pub full_name: String,
    pub company: Option<String>,
}

impl RegisterRequest {
    pub fn validate(&self) -> AppResult<()> {
        require_text("email", &self.email)?;
        if !self.email.contains('@') {
            return Err(AppError::invalid("email is not a valid address"));
        }
        require_text("password", &self.password)?;
        require_text("role", &self.role)?;
        require_text("full_name", &self.full_name)
    }
}

/// LoginRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(default)]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// CreateJobRequest
///
/// Input for `POST /api/employer/jobs`. Missing strings deserialize as empty and are caught by
/// [`CreateJobRequest::validate`].
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(default)]
#[ts(export)]
pub struct CreateJobRequest {
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: String,
    pub requirements: String,
    pub salary_range: Option<String>,
    pub skills: Vec<String>,
    pub application_deadline: String,
}

impl CreateJobRequest {
    pub fn validate(&self) -> AppResult<()> {
        require_text("title", &self.title)?;
        require_text("company", &self.company)?;
        require_text("location", &self.location)?;
        require_text("description", &self.description)?;
        require_text("requirements", &self.requirements)?;
        require_text("application_deadline", &self.application_deadline)
    }
}

/// UpdateJobRequest
///
/// Merge-patch payload for `PUT /api/employer/jobs/{job_id}`. Absent fields leave the stored value
/// untouched; `skip_serializing_if` keeps them out of the JSON as well.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateJobRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirements: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_range: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_deadline: Option<String>,
}

impl UpdateJobRequest {
    /// A present required field may not be blanked out.
    pub fn validate(&self) -> AppResult<()> {
        let required = [
            ("title", &self.title),
            ("company", &self.company),
            ("location", &self.location),
            ("description", &self.description),
            ("requirements", &self.requirements),
            ("application_deadline", &self.application_deadline),
        ];
        for (field, value) in required {
            if let Some(value) = value {
                require_text(field, value)?;
            }
        }
        Ok(())
    }

    /// Copies every present field onto `job`. `id`, `employer_id` and `created_at` are never touched.
    pub fn apply_to(&self, job: &mut Job) {
        if let Some(title) = &self.title {
            job.title = title.clone();
        }
        if let Some(company) = &self.company {
            job.company = company.clone();
        }
        if let Some(location) = &self.location {
            job.location = location.clone();
        }
        if let Some(description) = &self.description {
            job.description = description.clone();
        }
        if let Some(requirements) = &self.requirements {
            job.requirements = requirements.clone();
        }
        if let Some(salary_range) = &self.salary_range {
            job.salary_range = Some(salary_range.clone());
        }
        if let Some(skills) = &self.skills {
            job.skills = skills.clone();
        }
        if let Some(deadline) = &self.application_deadline {
            job.application_deadline = deadline.clone();
        }
    }
}

/// UpdateStatusRequest
///
/// Input for `PUT /api/employer/applications/{application_id}/status`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(default)]
#[ts(export)]
pub struct UpdateStatusRequest {
    #[schema(example = "approved")]
    pub status: String,
}

/// ApplyRequest
///
/// Text fields of the multipart apply form.
#[derive(Debug, Clone, Default)]
pub struct ApplyRequest {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub cover_letter: String,
}

impl ApplyRequest {
    pub fn validate(&self) -> AppResult<()> {
        require_text("full_name", &self.full_name)?;
        require_text("email", &self.email)?;
        require_text("phone", &self.phone)?;
        require_text("cover_letter", &self.cover_letter)
    }
}

/// ResumeUpload
///
/// The resume file part of the apply form, held in memory until it is handed to file storage.
#[derive(Debug, Clone, Default)]
pub struct ResumeUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

// --- Response Schemas (Output) ---

/// UserResponse
///
/// Public view of an account, without the password digest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub full_name: String,
    pub company: Option<String>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            role: user.role,
            full_name: user.full_name.clone(),
            company: user.company.clone(),
        }
    }
}

/// AuthResponse
///
/// Returned by register and login: a bearer token plus the identity it was issued for.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

/// JobsPage
///
/// One window of the job catalog. `total_pages` is `ceil(total / limit)`, zero for an empty catalog.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct JobsPage {
    pub jobs: Vec<Job>,
    #[ts(type = "number")]
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    #[ts(type = "number")]
    pub total_pages: u64,
}

/// MessageResponse
///
/// Plain acknowledgement, e.g. `{"message": "Job deleted successfully"}`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// HealthResponse
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "healthy")]
    pub status: String,
}
