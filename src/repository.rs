use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    models::{Application, ApplicationStatus, ApplicationWithJob, Job, UpdateJobRequest, User},
    search::JobQuery,
};

mod memory;

pub use memory::InMemoryRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    /// A uniqueness rule rejected the write. Carries the kind of record.
    #[error("duplicate {0}")]
    Duplicate(&'static str),
    /// A foreign key pointed at a record that does not exist.
    #[error("{0} does not exist")]
    MissingReference(&'static str),
}

pub type RepoResult<T> = Result<T, RepositoryError>;

/// Repository Trait
///
/// The persistence contract for users, jobs and applications. Handlers and services only ever see
/// `Arc<dyn Repository>`, so the Postgres store and the in-process store are interchangeable.
///
/// Two writes are atomic in every implementation: `insert_application` (insert-if-absent on
/// `(job_id, applicant_id)`) and `delete_job_cascade` (the job and all of its applications).
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    async fn find_user(&self, id: Uuid) -> RepoResult<Option<User>>;
    /// Fails with `Duplicate("email")` when the email is taken.
    async fn insert_user(&self, user: &User) -> RepoResult<User>;

    // --- Jobs ---
    async fn insert_job(&self, job: &Job) -> RepoResult<Job>;
    async fn find_job(&self, id: Uuid) -> RepoResult<Option<Job>>;
    /// One window of the filtered catalog, newest first, plus the filtered total.
    async fn search_jobs(&self, query: &JobQuery) -> RepoResult<(Vec<Job>, u64)>;
    async fn list_jobs_by_employer(&self, employer_id: Uuid) -> RepoResult<Vec<Job>>;
    async fn list_all_jobs(&self) -> RepoResult<Vec<Job>>;
    /// Merge-patch. `None` when the job does not exist.
    async fn update_job(&self, id: Uuid, patch: &UpdateJobRequest) -> RepoResult<Option<Job>>;
    /// Removes the job and its applications in one transaction. Returns the number of applications
    /// removed, or `None` when the job does not exist.
    async fn delete_job_cascade(&self, id: Uuid) -> RepoResult<Option<u64>>;

    // --- Applications ---
    /// Fails with `Duplicate("application")` if the applicant already applied to the job, and with
    /// `MissingReference` if the job is gone.
    async fn insert_application(&self, application: &Application) -> RepoResult<Application>;
    async fn find_application(&self, id: Uuid) -> RepoResult<Option<Application>>;
    async fn application_exists(&self, job_id: Uuid, applicant_id: Uuid) -> RepoResult<bool>;
    async fn list_applications_for_applicant(
        &self,
        applicant_id: Uuid,
    ) -> RepoResult<Vec<ApplicationWithJob>>;
    async fn list_applications_for_job(&self, job_id: Uuid) -> RepoResult<Vec<Application>>;
    async fn set_application_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
    ) -> RepoResult<Option<Application>>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

const USER_COLUMNS: &str = "id, email, password_hash, role, full_name, company, created_at";

const JOB_COLUMNS: &str = "id, employer_id, title, company, location, description, requirements, \
     salary_range, skills, application_deadline, created_at";

const APPLICATION_COLUMNS: &str = "id, job_id, applicant_id, full_name, email, phone, \
     cover_letter, resume_key, status, created_at";

// Matches when $1 is NULL, otherwise ILIKE over title, company, location and every skill.
const JOB_FILTER: &str = "($1::TEXT IS NULL \
     OR title ILIKE $1 OR company ILIKE $1 OR location ILIKE $1 \
     OR EXISTS (SELECT 1 FROM unnest(skills) AS skill WHERE skill ILIKE $1))";

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

fn violation<'e>(err: &'e sqlx::Error, code: &str) -> Option<&'e dyn sqlx::error::DatabaseError> {
    match err {
        sqlx::Error::Database(db) if db.code().as_deref() == Some(code) => Some(db.as_ref()),
        _ => None,
    }
}

/// `%term%`, with the LIKE wildcards in `term` taken literally.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// PostgresRepository
///
/// The `Repository` backed by PostgreSQL. Queries are bound at runtime so the crate builds
/// without a live database.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn insert_user(&self, user: &User) -> RepoResult<User> {
        let sql = format!(
            "INSERT INTO users ({USER_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(user.id)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role)
            .bind(&user.full_name)
            .bind(&user.company)
            .bind(user.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if violation(&e, UNIQUE_VIOLATION).is_some() {
                    RepositoryError::Duplicate("email")
                } else {
                    e.into()
                }
            })
    }

    async fn insert_job(&self, job: &Job) -> RepoResult<Job> {
        let sql = format!(
            "INSERT INTO jobs ({JOB_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {JOB_COLUMNS}"
        );
        sqlx::query_as::<_, Job>(&sql)
            .bind(job.id)
            .bind(job.employer_id)
            .bind(&job.title)
            .bind(&job.company)
            .bind(&job.location)
            .bind(&job.description)
            .bind(&job.requirements)
            .bind(&job.salary_range)
            .bind(&job.skills)
            .bind(&job.application_deadline)
            .bind(job.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if violation(&e, FOREIGN_KEY_VIOLATION).is_some() {
                    RepositoryError::MissingReference("Employer")
                } else {
                    e.into()
                }
            })
    }

    async fn find_job(&self, id: Uuid) -> RepoResult<Option<Job>> {
        let sql = format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1");
        let job = sqlx::query_as::<_, Job>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(job)
    }

    async fn search_jobs(&self, query: &JobQuery) -> RepoResult<(Vec<Job>, u64)> {
        let pattern = query.term.as_deref().map(like_pattern);

        let count_sql = format!("SELECT COUNT(*) FROM jobs WHERE {JOB_FILTER}");
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(&pattern)
            .fetch_one(&self.pool)
            .await?;
        let total = u64::try_from(total).unwrap_or(0);

        // Past the last page, or further than OFFSET can express: nothing to fetch.
        let offset = match i64::try_from(query.offset()) {
            Ok(offset) if query.offset() < total => offset,
            _ => return Ok((Vec::new(), total)),
        };

        let page_sql = format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE {JOB_FILTER} \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3"
        );
        let jobs = sqlx::query_as::<_, Job>(&page_sql)
            .bind(&pattern)
            .bind(i64::from(query.limit))
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok((jobs, total))
    }

    async fn list_jobs_by_employer(&self, employer_id: Uuid) -> RepoResult<Vec<Job>> {
        let sql = format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE employer_id = $1 \
             ORDER BY created_at DESC, id DESC"
        );
        let jobs = sqlx::query_as::<_, Job>(&sql)
            .bind(employer_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(jobs)
    }

    async fn list_all_jobs(&self) -> RepoResult<Vec<Job>> {
        let sql = format!("SELECT {JOB_COLUMNS} FROM jobs ORDER BY created_at DESC, id DESC");
        let jobs = sqlx::query_as::<_, Job>(&sql).fetch_all(&self.pool).await?;
        Ok(jobs)
    }

    /// update_job
    ///
    /// `COALESCE` keeps the stored column wherever the patch field is `None`.
    async fn update_job(&self, id: Uuid, patch: &UpdateJobRequest) -> RepoResult<Option<Job>> {
        let sql = format!(
            "UPDATE jobs \
             SET title = COALESCE($2, title), \
                 company = COALESCE($3, company), \
                 location = COALESCE($4, location), \
                 description = COALESCE($5, description), \
                 requirements = COALESCE($6, requirements), \
                 salary_range = COALESCE($7, salary_range), \
                 skills = COALESCE($8, skills), \
                 application_deadline = COALESCE($9, application_deadline) \
             WHERE id = $1 \
             RETURNING {JOB_COLUMNS}"
        );
        let job = sqlx::query_as::<_, Job>(&sql)
            .bind(id)
            .bind(&patch.title)
            .bind(&patch.company)
            .bind(&patch.location)
            .bind(&patch.description)
            .bind(&patch.requirements)
            .bind(&patch.salary_range)
            .bind(&patch.skills)
            .bind(&patch.application_deadline)
            .fetch_optional(&self.pool)
            .await?;
        Ok(job)
    }

    async fn delete_job_cascade(&self, id: Uuid) -> RepoResult<Option<u64>> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query("DELETE FROM applications WHERE job_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let deleted = sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        tx.commit().await?;
        Ok(Some(removed))
    }

    /// insert_application
    ///
    /// `ON CONFLICT DO NOTHING` against the `(job_id, applicant_id)` constraint: a concurrent
    /// duplicate gets no row back instead of an error.
    async fn insert_application(&self, application: &Application) -> RepoResult<Application> {
        let sql = format!(
            "INSERT INTO applications ({APPLICATION_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             ON CONFLICT ON CONSTRAINT applications_job_applicant_key DO NOTHING \
             RETURNING {APPLICATION_COLUMNS}"
        );
        let inserted = sqlx::query_as::<_, Application>(&sql)
            .bind(application.id)
            .bind(application.job_id)
            .bind(application.applicant_id)
            .bind(&application.full_name)
            .bind(&application.email)
            .bind(&application.phone)
            .bind(&application.cover_letter)
            .bind(&application.resume_key)
            .bind(application.status)
            .bind(application.created_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                let on_applicant = violation(&e, FOREIGN_KEY_VIOLATION)
                    .map(|db| db.constraint().is_some_and(|c| c.contains("applicant")));
                match on_applicant {
                    Some(true) => RepositoryError::MissingReference("Applicant"),
                    Some(false) => RepositoryError::MissingReference("Job"),
                    None => e.into(),
                }
            })?;

        inserted.ok_or(RepositoryError::Duplicate("application"))
    }

    async fn find_application(&self, id: Uuid) -> RepoResult<Option<Application>> {
        let sql = format!("SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = $1");
        let application = sqlx::query_as::<_, Application>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(application)
    }

    async fn application_exists(&self, job_id: Uuid, applicant_id: Uuid) -> RepoResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM applications WHERE job_id = $1 AND applicant_id = $2)",
        )
        .bind(job_id)
        .bind(applicant_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// list_applications_for_applicant
    ///
    /// `LEFT JOIN` so an application still lists if its job cannot be resolved.
    async fn list_applications_for_applicant(
        &self,
        applicant_id: Uuid,
    ) -> RepoResult<Vec<ApplicationWithJob>> {
        let applications = sqlx::query_as::<_, ApplicationWithJob>(
            r#"
            SELECT
                a.id, a.job_id, a.applicant_id, a.full_name, a.email, a.phone,
                a.cover_letter, a.resume_key, a.status, a.created_at,
                j.title AS job_title, j.company AS job_company
            FROM applications a
            LEFT JOIN jobs j ON j.id = a.job_id
            WHERE a.applicant_id = $1
            ORDER BY a.created_at DESC, a.id DESC
            "#,
        )
        .bind(applicant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(applications)
    }

    async fn list_applications_for_job(&self, job_id: Uuid) -> RepoResult<Vec<Application>> {
        let sql = format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications WHERE job_id = $1 \
             ORDER BY created_at DESC, id DESC"
        );
        let applications = sqlx::query_as::<_, Application>(&sql)
            .bind(job_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(applications)
    }

    async fn set_application_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
    ) -> RepoResult<Option<Application>> {
        let sql = format!(
            "UPDATE applications SET status = $2 WHERE id = $1 RETURNING {APPLICATION_COLUMNS}"
        );
        let application = sqlx::query_as::<_, Application>(&sql)
            .bind(id)
            .bind(status)
            .fetch_optional(&self.pool)
            .await?;
        Ok(application)
    }
}
