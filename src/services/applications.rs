use chrono::Utc;
use uuid::Uuid;

use super::owned_job;
use crate::{
    auth::Principal,
    error::{AppError, AppResult},
    guard::rules,
    models::{
        Application, ApplicationStatus, ApplicationWithJob, ApplyRequest, ResumeUpload,
    },
    repository::{RepositoryError, RepositoryState},
    storage::StorageState,
};

const ALREADY_APPLIED: &str = "Already applied to this job";

/// ApplicationService
///
/// Applications and their status. Holds file storage as well as the repository, since applying
/// uploads the resume.
#[derive(Clone)]
pub struct ApplicationService {
    repo: RepositoryState,
    storage: StorageState,
}

impl ApplicationService {
    pub fn new(repo: RepositoryState, storage: StorageState) -> Self {
        Self { repo, storage }
    }

    /// apply
    ///
    /// Stores the resume, then records the application as `applied`.
    ///
    /// The existence check up front only saves a pointless upload; the insert itself is
    /// insert-if-absent, so of two concurrent identical requests exactly one succeeds and the
    /// other gets `Conflict`. The loser's resume stays in storage (there is no delete path) and its
    /// key is logged.
    pub async fn apply(
        &self,
        job_id: Uuid,
        applicant: &Principal,
        form: ApplyRequest,
        resume: ResumeUpload,
    ) -> AppResult<Application> {
        form.validate()?;
        if resume.bytes.is_empty() {
            return Err(AppError::invalid("resume is required"));
        }

        if self.repo.find_job(job_id).await?.is_none() {
            return Err(AppError::not_found("Job not found"));
        }
        if self.repo.application_exists(job_id, applicant.id).await? {
            return Err(AppError::conflict(ALREADY_APPLIED));
        }

        let resume_key = self
            .storage
            .store(resume.bytes, &resume.file_name, &resume.content_type)
            .await?;

        let application = Application {
            id: Uuid::new_v4(),
            job_id,
            applicant_id: applicant.id,
            full_name: form.full_name,
            email: form.email,
            phone: form.phone,
            cover_letter: form.cover_letter,
            resume_key,
            status: ApplicationStatus::Applied,
            created_at: Utc::now(),
        };

        match self.repo.insert_application(&application).await {
            Ok(application) => {
                tracing::info!(
                    application_id = %application.id,
                    %job_id,
                    applicant_id = %applicant.id,
                    "application submitted"
                );
                Ok(application)
            }
            Err(e) => {
                tracing::warn!(
                    resume_key = %application.resume_key,
                    %job_id,
                    "application not recorded, stored resume left behind: {}",
                    e
                );
                Err(match e {
                    RepositoryError::Duplicate(_) => AppError::conflict(ALREADY_APPLIED),
                    other => other.into(),
                })
            }
        }
    }

    pub async fn list_for_applicant(
        &self,
        applicant: &Principal,
    ) -> AppResult<Vec<ApplicationWithJob>> {
        Ok(self
            .repo
            .list_applications_for_applicant(applicant.id)
            .await?)
    }

    /// list_for_job
    ///
    /// The applications to one of the caller's own jobs, newest first.
    pub async fn list_for_job(
        &self,
        job_id: Uuid,
        owner: &Principal,
    ) -> AppResult<Vec<Application>> {
        owned_job(self.repo.as_ref(), job_id, owner, &rules::LIST_JOB_APPLICATIONS).await?;
        Ok(self.repo.list_applications_for_job(job_id).await?)
    }

    /// update_status
    ///
    /// Authorization is routed through the application's job: its owning employer, or any admin.
    /// Unlike the job paths, a non-owner here gets `Forbidden`.
    pub async fn update_status(
        &self,
        application_id: Uuid,
        status: &str,
        caller: &Principal,
    ) -> AppResult<Application> {
        let application = self
            .repo
            .find_application(application_id)
            .await?
            .ok_or_else(|| AppError::not_found("Application not found"))?;

        let job = self
            .repo
            .find_job(application.job_id)
            .await?
            .ok_or_else(|| AppError::not_found("Job not found"))?;

        rules::UPDATE_APPLICATION_STATUS
            .check_owner(caller, job.employer_id)
            .map_err(|_| AppError::forbidden("Not authorized to update this application"))?;

        let status: ApplicationStatus = status.trim().parse()?;

        let updated = self
            .repo
            .set_application_status(application_id, status)
            .await?
            .ok_or_else(|| AppError::not_found("Application not found"))?;

        tracing::info!(
            %application_id,
            from = %application.status,
            to = %updated.status,
            by = %caller.id,
            "application status changed"
        );
        Ok(updated)
    }
}
