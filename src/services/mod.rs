//! Workflow services.
//!
//! Each service is a cheap `Clone` handle over the shared collaborators it needs, extracted in
//! handlers through `FromRef<AppState>`. Services assume the role phase of the guard already ran
//! in the handler and receive the resulting [`Principal`]; the ownership phase runs here, once the
//! resource has been resolved.

use uuid::Uuid;

use crate::{
    auth::Principal,
    error::{AppError, AppResult},
    guard::AccessRule,
    models::Job,
    repository::Repository,
};

pub mod accounts;
pub mod applications;
pub mod jobs;

pub use accounts::AccountService;
pub use applications::ApplicationService;
pub use jobs::JobService;

/// Resolves a job and checks that `principal` owns it under `rule`.
///
/// A job that exists but belongs to someone else is reported exactly like a missing one.
pub(crate) async fn owned_job(
    repo: &dyn Repository,
    job_id: Uuid,
    principal: &Principal,
    rule: &AccessRule,
) -> AppResult<Job> {
    let not_found = || AppError::not_found("Job not found or not owned by you");

    let job = repo.find_job(job_id).await?.ok_or_else(not_found)?;
    rule.check_owner(principal, job.employer_id)
        .map_err(|_| not_found())?;

    Ok(job)
}
