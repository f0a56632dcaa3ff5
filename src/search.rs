//! Search and pagination over the job catalog.
//!
//! The Postgres store expresses the same rules in SQL; the in-process store and the tests use the
//! functions here directly.

use std::cmp::Ordering;

use crate::{
    error::{AppError, AppResult},
    models::{Job, JobsPage},
};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;

/// JobQuery
///
/// A validated listing request. `term` is trimmed, and `None` when blank (matches everything).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobQuery {
    pub term: Option<String>,
    pub page: u32,
    pub limit: u32,
}

impl JobQuery {
    pub fn new(page: u32, limit: u32, term: Option<&str>) -> AppResult<Self> {
        if page < 1 {
            return Err(AppError::invalid("page must be at least 1"));
        }
        if limit < 1 {
            return Err(AppError::invalid("limit must be at least 1"));
        }

        let term = term
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);

        Ok(Self { term, page, limit })
    }

    /// Index of the first item of the requested page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }

    pub fn into_page(self, jobs: Vec<Job>, total: u64) -> JobsPage {
        JobsPage {
            jobs,
            total,
            page: self.page,
            limit: self.limit,
            total_pages: total_pages(total, self.limit),
        }
    }
}

/// `ceil(total / limit)`.
pub fn total_pages(total: u64, limit: u32) -> u64 {
    let limit = u64::from(limit.max(1));
    total.div_ceil(limit)
}

/// Case-insensitive substring match over title, company, location and skills.
pub fn matches(job: &Job, term: Option<&str>) -> bool {
    let Some(term) = term else {
        return true;
    };
    let needle = term.to_lowercase();
    let hit = |field: &str| field.to_lowercase().contains(&needle);

    hit(&job.title) || hit(&job.company) || hit(&job.location) || job.skills.iter().any(|s| hit(s))
}

/// Newest first; equal timestamps fall back to id, descending, so the order is total.
pub fn newest_first(a: &Job, b: &Job) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| b.id.cmp(&a.id))
}

/// Filters, orders and slices `catalog`. Returns the window and the filtered total.
pub fn paginate<'a, I>(catalog: I, query: &JobQuery) -> (Vec<Job>, u64)
where
    I: IntoIterator<Item = &'a Job>,
{
    let mut hits: Vec<&Job> = catalog
        .into_iter()
        .filter(|job| matches(job, query.term.as_deref()))
        .collect();
    hits.sort_by(|a, b| newest_first(a, b));

    let total = hits.len() as u64;
    let window = hits
        .into_iter()
        .skip(usize::try_from(query.offset()).unwrap_or(usize::MAX))
        .take(query.limit as usize)
        .cloned()
        .collect();

    (window, total)
}
