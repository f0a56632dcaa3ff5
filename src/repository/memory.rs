use std::{cmp::Ordering, collections::HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{RepoResult, Repository, RepositoryError};
use crate::{
    models::{Application, ApplicationStatus, ApplicationWithJob, Job, UpdateJobRequest, User},
    search::{self, JobQuery},
};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    jobs: HashMap<Uuid, Job>,
    applications: HashMap<Uuid, Application>,
}

/// InMemoryRepository
///
/// Process-local `Repository` used by the test suite. One `RwLock` guards all three tables, so
/// every write (including the cascade delete) is atomic with respect to every other call.
/// Foreign keys and unique constraints are checked the same way PostgreSQL checks them.
#[derive(Default)]
pub struct InMemoryRepository {
    tables: RwLock<Tables>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_application_first(a: &Application, b: &Application) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| b.id.cmp(&a.id))
}

fn jobs_newest_first<'a>(jobs: impl Iterator<Item = &'a Job>) -> Vec<Job> {
    let mut jobs: Vec<Job> = jobs.cloned().collect();
    jobs.sort_by(search::newest_first);
    jobs
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn insert_user(&self, user: &User) -> RepoResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(RepositoryError::Duplicate("email"));
        }
        tables.users.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn insert_job(&self, job: &Job) -> RepoResult<Job> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&job.employer_id) {
            return Err(RepositoryError::MissingReference("Employer"));
        }
        tables.jobs.insert(job.id, job.clone());
        Ok(job.clone())
    }

    async fn find_job(&self, id: Uuid) -> RepoResult<Option<Job>> {
        Ok(self.tables.read().await.jobs.get(&id).cloned())
    }

    async fn search_jobs(&self, query: &JobQuery) -> RepoResult<(Vec<Job>, u64)> {
        let tables = self.tables.read().await;
        Ok(search::paginate(tables.jobs.values(), query))
    }

    async fn list_jobs_by_employer(&self, employer_id: Uuid) -> RepoResult<Vec<Job>> {
        let tables = self.tables.read().await;
        Ok(jobs_newest_first(
            tables.jobs.values().filter(|j| j.employer_id == employer_id),
        ))
    }

    async fn list_all_jobs(&self) -> RepoResult<Vec<Job>> {
        let tables = self.tables.read().await;
        Ok(jobs_newest_first(tables.jobs.values()))
    }

    async fn update_job(&self, id: Uuid, patch: &UpdateJobRequest) -> RepoResult<Option<Job>> {
        let mut tables = self.tables.write().await;
        Ok(tables.jobs.get_mut(&id).map(|job| {
            patch.apply_to(job);
            job.clone()
        }))
    }

    async fn delete_job_cascade(&self, id: Uuid) -> RepoResult<Option<u64>> {
        let mut tables = self.tables.write().await;
        if tables.jobs.remove(&id).is_none() {
            return Ok(None);
        }

        let before = tables.applications.len();
        tables.applications.retain(|_, a| a.job_id != id);
        Ok(Some((before - tables.applications.len()) as u64))
    }

    async fn insert_application(&self, application: &Application) -> RepoResult<Application> {
        let mut tables = self.tables.write().await;
        if !tables.jobs.contains_key(&application.job_id) {
            return Err(RepositoryError::MissingReference("Job"));
        }
        if !tables.users.contains_key(&application.applicant_id) {
            return Err(RepositoryError::MissingReference("Applicant"));
        }
        let taken = tables.applications.values().any(|a| {
            a.job_id == application.job_id && a.applicant_id == application.applicant_id
        });
        if taken {
            return Err(RepositoryError::Duplicate("application"));
        }

        tables
            .applications
            .insert(application.id, application.clone());
        Ok(application.clone())
    }

    async fn find_application(&self, id: Uuid) -> RepoResult<Option<Application>> {
        Ok(self.tables.read().await.applications.get(&id).cloned())
    }

    async fn application_exists(&self, job_id: Uuid, applicant_id: Uuid) -> RepoResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables
            .applications
            .values()
            .any(|a| a.job_id == job_id && a.applicant_id == applicant_id))
    }

    async fn list_applications_for_applicant(
        &self,
        applicant_id: Uuid,
    ) -> RepoResult<Vec<ApplicationWithJob>> {
        let tables = self.tables.read().await;
        let mut mine: Vec<&Application> = tables
            .applications
            .values()
            .filter(|a| a.applicant_id == applicant_id)
            .collect();
        mine.sort_by(|a, b| newest_application_first(a, b));

        Ok(mine
            .into_iter()
            .map(|application| {
                let job = tables.jobs.get(&application.job_id);
                ApplicationWithJob {
                    application: application.clone(),
                    job_title: job.map(|j| j.title.clone()),
                    job_company: job.map(|j| j.company.clone()),
                }
            })
            .collect())
    }

    async fn list_applications_for_job(&self, job_id: Uuid) -> RepoResult<Vec<Application>> {
        let tables = self.tables.read().await;
        let mut applications: Vec<Application> = tables
            .applications
            .values()
            .filter(|a| a.job_id == job_id)
            .cloned()
            .collect();
        applications.sort_by(newest_application_first);
        Ok(applications)
    }

    async fn set_application_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
    ) -> RepoResult<Option<Application>> {
        let mut tables = self.tables.write().await;
        Ok(tables.applications.get_mut(&id).map(|application| {
            application.status = status;
            application.clone()
        }))
    }
}
