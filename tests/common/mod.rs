#![allow(dead_code)]

use std::sync::Arc;

use axum::extract::FromRef;
use chrono::{DateTime, Duration, TimeZone, Utc};
use job_portal::{
    AccountService, AppConfig, AppState, ApplicationService, InMemoryRepository, JobService,
    MockStorageService, RepositoryState, StorageState,
    auth::Principal,
    models::{ApplyRequest, AuthResponse, CreateJobRequest, Job, RegisterRequest, ResumeUpload},
};
use uuid::Uuid;

/// State over the in-process store and a recording storage mock. The mock is returned as well so
/// tests can inspect what was uploaded.
pub fn test_state() -> (AppState, MockStorageService) {
    state_with_storage(MockStorageService::new())
}

pub fn state_with_storage(storage: MockStorageService) -> (AppState, MockStorageService) {
    let state = AppState::new(
        Arc::new(InMemoryRepository::new()) as RepositoryState,
        Arc::new(storage.clone()) as StorageState,
        AppConfig::default(),
    )
    .expect("test argon2 parameters are valid");
    (state, storage)
}

pub fn accounts(state: &AppState) -> AccountService {
    AccountService::from_ref(state)
}

pub fn jobs(state: &AppState) -> JobService {
    JobService::from_ref(state)
}

pub fn applications(state: &AppState) -> ApplicationService {
    ApplicationService::from_ref(state)
}

pub fn principal_of(auth: &AuthResponse) -> Principal {
    Principal {
        id: auth.user.id,
        email: auth.user.email.clone(),
        role: auth.user.role,
    }
}

pub fn register_request(email: &str, role: &str) -> RegisterRequest {
    RegisterRequest {
        email: email.to_string(),
        password: "correct horse".to_string(),
        role: role.to_string(),
        full_name: "Test Person".to_string(),
        company: Some("Acme".to_string()),
    }
}

pub async fn register(state: &AppState, email: &str, role: &str) -> Principal {
    let auth = accounts(state)
        .register(register_request(email, role))
        .await
        .expect("registration succeeds");
    principal_of(&auth)
}

pub async fn admin(state: &AppState) -> Principal {
    let admin = accounts(state).ensure_admin().await.expect("admin exists");
    Principal {
        id: admin.id,
        email: admin.email,
        role: admin.role,
    }
}

pub fn job_request(title: &str) -> CreateJobRequest {
    CreateJobRequest {
        title: title.to_string(),
        company: "Acme".to_string(),
        location: "Remote".to_string(),
        description: "Build things".to_string(),
        requirements: "Experience".to_string(),
        salary_range: Some("100k-120k".to_string()),
        skills: vec!["Rust".to_string(), "SQL".to_string()],
        application_deadline: "2030-12-31".to_string(),
    }
}

pub fn apply_form() -> ApplyRequest {
    ApplyRequest {
        full_name: "Jo Seeker".to_string(),
        email: "jo@example.com".to_string(),
        phone: "555-0100".to_string(),
        cover_letter: "I would like this job.".to_string(),
    }
}

pub fn resume() -> ResumeUpload {
    ResumeUpload {
        file_name: "cv.pdf".to_string(),
        content_type: "application/pdf".to_string(),
        bytes: b"%PDF-1.4 resume".to_vec(),
    }
}

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
}

/// A catalog job created `minutes` after [`base_time`].
pub fn catalog_job(title: &str, minutes: i64) -> Job {
    Job {
        id: Uuid::new_v4(),
        employer_id: Uuid::new_v4(),
        title: title.to_string(),
        company: "Acme".to_string(),
        location: "Remote".to_string(),
        description: "d".to_string(),
        requirements: "r".to_string(),
        salary_range: None,
        skills: vec![],
        application_deadline: "2030-01-01".to_string(),
        created_at: base_time() + Duration::minutes(minutes),
    }
}
