use chrono::Utc;
use uuid::Uuid;

use super::owned_job;
use crate::{
    auth::Principal,
    error::{AppError, AppResult},
    guard::rules,
    models::{CreateJobRequest, Job, JobsPage, UpdateJobRequest},
    repository::RepositoryState,
    search::JobQuery,
};

/// JobService
///
/// The job catalog: creation, public listing and search, and owner or admin mutation.
#[derive(Clone)]
pub struct JobService {
    repo: RepositoryState,
}

impl JobService {
    pub fn new(repo: RepositoryState) -> Self {
        Self { repo }
    }

    pub async fn create(&self, owner: &Principal, req: CreateJobRequest) -> AppResult<Job> {
        req.validate()?;

        let job = Job {
            id: Uuid::new_v4(),
            employer_id: owner.id,
            title: req.title,
            company: req.company,
            location: req.location,
            description: req.description,
            requirements: req.requirements,
            salary_range: req.salary_range,
            skills: req.skills,
            application_deadline: req.application_deadline,
            created_at: Utc::now(),
        };

        let job = self.repo.insert_job(&job).await?;
        tracing::info!(job_id = %job.id, employer_id = %owner.id, "job posted");
        Ok(job)
    }

    /// list
    ///
    /// One page of the public catalog. Backs both the plain listing and keyword search.
    pub async fn list(&self, query: JobQuery) -> AppResult<JobsPage> {
        let (jobs, total) = self.repo.search_jobs(&query).await?;
        Ok(query.into_page(jobs, total))
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Job> {
        self.repo
            .find_job(id)
            .await?
            .ok_or_else(|| AppError::not_found("Job not found"))
    }

    pub async fn list_mine(&self, owner: &Principal) -> AppResult<Vec<Job>> {
        Ok(self.repo.list_jobs_by_employer(owner.id).await?)
    }

    pub async fn list_all(&self) -> AppResult<Vec<Job>> {
        Ok(self.repo.list_all_jobs().await?)
    }

    /// update
    ///
    /// Merge-patch by the owning employer. Someone else's job is reported as not found.
    pub async fn update(
        &self,
        id: Uuid,
        owner: &Principal,
        patch: UpdateJobRequest,
    ) -> AppResult<Job> {
        owned_job(self.repo.as_ref(), id, owner, &rules::UPDATE_JOB).await?;
        patch.validate()?;

        let job = self
            .repo
            .update_job(id, &patch)
            .await?
            .ok_or_else(|| AppError::not_found("Job not found"))?;

        tracing::info!(job_id = %id, employer_id = %owner.id, "job updated");
        Ok(job)
    }

    /// delete
    ///
    /// Owner-only deletion. The job's applications go with it.
    pub async fn delete(&self, id: Uuid, owner: &Principal) -> AppResult<()> {
        owned_job(self.repo.as_ref(), id, owner, &rules::DELETE_JOB).await?;
        self.remove(id, owner).await
    }

    /// delete_as_admin
    ///
    /// Same cascade as [`JobService::delete`], for any job.
    pub async fn delete_as_admin(&self, id: Uuid, admin: &Principal) -> AppResult<()> {
        self.remove(id, admin).await
    }

    async fn remove(&self, id: Uuid, by: &Principal) -> AppResult<()> {
        let removed = self
            .repo
            .delete_job_cascade(id)
            .await?
            .ok_or_else(|| AppError::not_found("Job not found"))?;

        tracing::info!(
            job_id = %id,
            deleted_by = %by.id,
            role = %by.role,
            applications_removed = removed,
            "job deleted"
        );
        Ok(())
    }
}
