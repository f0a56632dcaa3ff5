mod common;

use common::*;
use job_portal::{
    AppError,
    models::{ApplicationStatus, LoginRequest, Role, UpdateJobRequest},
    search::JobQuery,
    storage::MockStorageService,
};
use uuid::Uuid;

// --- Accounts ---

#[tokio::test]
async fn register_then_login_yields_matching_claims() {
    let (state, _) = test_state();
    let accounts = accounts(&state);

    let registered = accounts
        .register(register_request("emp@example.com", "employer"))
        .await
        .unwrap();
    assert_eq!(registered.user.role, Role::Employer);
    assert_eq!(registered.user.company.as_deref(), Some("Acme"));

    let logged_in = accounts
        .login(LoginRequest {
            email: "emp@example.com".to_string(),
            password: "correct horse".to_string(),
        })
        .await
        .unwrap();

    let claims = state.tokens.validate(&logged_in.token).unwrap();
    assert_eq!(claims.sub, registered.user.id);
    assert_eq!(claims.email, "emp@example.com");
    assert_eq!(claims.role, Role::Employer);
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let (state, _) = test_state();
    register(&state, "dup@example.com", "jobseeker").await;

    let err = accounts(&state)
        .register(register_request("dup@example.com", "employer"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Conflict(msg) if msg == "Email already registered"));
}

#[tokio::test]
async fn only_employer_and_jobseeker_can_register() {
    let (state, _) = test_state();
    let accounts = accounts(&state);

    for role in ["admin", "recruiter", "Employer"] {
        let err = accounts
            .register(register_request(&format!("{role}@example.com"), role))
            .await
            .unwrap_err();
        assert!(
            matches!(err, AppError::InvalidInput(ref msg) if msg == "Invalid role"),
            "role {role}: {err:?}"
        );
    }
}

#[tokio::test]
async fn company_is_dropped_for_job_seekers() {
    let (state, _) = test_state();
    let auth = accounts(&state)
        .register(register_request("seeker@example.com", "jobseeker"))
        .await
        .unwrap();
    assert_eq!(auth.user.company, None);
}

#[tokio::test]
async fn wrong_password_and_unknown_email_look_the_same() {
    let (state, _) = test_state();
    register(&state, "user@example.com", "jobseeker").await;
    let accounts = accounts(&state);

    for (email, password) in [
        ("user@example.com", "wrong"),
        ("nobody@example.com", "correct horse"),
    ] {
        let err = accounts
            .login(LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated(ref msg) if msg == "Invalid credentials"));
    }
}

#[tokio::test]
async fn bootstrap_admin_pair_signs_in_as_the_single_admin() {
    let (state, _) = test_state();
    let accounts = accounts(&state);

    let first = accounts
        .login(LoginRequest {
            email: "admin".to_string(),
            password: "admin123".to_string(),
        })
        .await
        .unwrap();
    let second = accounts
        .login(LoginRequest {
            email: "admin@jobplatform.com".to_string(),
            password: "admin123".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(first.user.role, Role::Admin);
    assert_eq!(first.user.id, second.user.id);
    assert_eq!(accounts.ensure_admin().await.unwrap().id, first.user.id);
}

#[tokio::test]
async fn admin_email_held_by_another_role_is_refused() {
    let (state, _) = test_state();
    register(&state, "admin@jobplatform.com", "employer").await;
    let accounts = accounts(&state);

    let err = accounts
        .login(LoginRequest {
            email: "admin".to_string(),
            password: "admin123".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)), "{err:?}");

    let err = accounts.ensure_admin().await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)), "{err:?}");

    // The employer still signs in with their own password.
    let auth = accounts
        .login(LoginRequest {
            email: "admin@jobplatform.com".to_string(),
            password: "correct horse".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(auth.user.role, Role::Employer);
}

#[tokio::test]
async fn bootstrap_password_must_match_exactly() {
    let (state, _) = test_state();
    let accounts = accounts(&state);

    for password in ["admin12", "admin1234", "ADMIN123", ""] {
        let err = accounts
            .login(LoginRequest {
                email: "admin".to_string(),
                password: password.to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated(_)), "{password:?}: {err:?}");
    }
}

#[tokio::test]
async fn registered_email_is_trimmed() {
    let (state, _) = test_state();
    let accounts = accounts(&state);

    let registered = accounts
        .register(register_request("  spaced@example.com ", "jobseeker"))
        .await
        .unwrap();
    assert_eq!(registered.user.email, "spaced@example.com");

    let logged_in = accounts
        .login(LoginRequest {
            email: "spaced@example.com".to_string(),
            password: "correct horse".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(logged_in.user.id, registered.user.id);

    let err = accounts
        .register(register_request("spaced@example.com", "employer"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "{err:?}");
}

#[tokio::test]
async fn current_user_reads_the_stored_account() {
    let (state, _) = test_state();
    let principal = register(&state, "me@example.com", "jobseeker").await;

    let me = accounts(&state).current_user(&principal).await.unwrap();
    assert_eq!(me.id, principal.id);
    assert_eq!(me.email, "me@example.com");
}

// --- Jobs ---

#[tokio::test]
async fn only_the_owner_can_update_or_delete_a_job() {
    let (state, _) = test_state();
    let e1 = register(&state, "e1@example.com", "employer").await;
    let e2 = register(&state, "e2@example.com", "employer").await;
    let jobs = jobs(&state);

    let job = jobs.create(&e1, job_request("Backend")).await.unwrap();
    assert_eq!(job.employer_id, e1.id);

    let patch = UpdateJobRequest {
        title: Some("Hijacked".to_string()),
        ..Default::default()
    };
    let err = jobs.update(job.id, &e2, patch.clone()).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    let err = jobs.delete(job.id, &e2).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let updated = jobs.update(job.id, &e1, patch).await.unwrap();
    assert_eq!(updated.title, "Hijacked");
    jobs.delete(job.id, &e1).await.unwrap();
    assert!(matches!(jobs.get(job.id).await, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn update_is_a_merge_patch() {
    let (state, _) = test_state();
    let owner = register(&state, "owner@example.com", "employer").await;
    let jobs = jobs(&state);
    let job = jobs.create(&owner, job_request("Backend")).await.unwrap();

    let updated = jobs
        .update(
            job.id,
            &owner,
            UpdateJobRequest {
                location: Some("Lisbon".to_string()),
                skills: Some(vec!["Go".to_string()]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.location, "Lisbon");
    assert_eq!(updated.skills, vec!["Go".to_string()]);
    assert_eq!(updated.title, job.title);
    assert_eq!(updated.salary_range, job.salary_range);
    assert_eq!(updated.employer_id, owner.id);
    assert_eq!(updated.created_at, job.created_at);
}

#[tokio::test]
async fn blanking_a_required_field_is_invalid() {
    let (state, _) = test_state();
    let owner = register(&state, "owner@example.com", "employer").await;
    let jobs = jobs(&state);
    let job = jobs.create(&owner, job_request("Backend")).await.unwrap();

    let err = jobs
        .update(
            job.id,
            &owner,
            UpdateJobRequest {
                title: Some("   ".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));
}

#[tokio::test]
async fn create_requires_every_mandatory_field() {
    let (state, _) = test_state();
    let owner = register(&state, "owner@example.com", "employer").await;

    let mut req = job_request("Backend");
    req.description = String::new();

    let err = jobs(&state).create(&owner, req).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(ref msg) if msg == "description is required"));
}

#[tokio::test]
async fn admin_can_delete_any_job() {
    let (state, _) = test_state();
    let owner = register(&state, "owner@example.com", "employer").await;
    let admin = admin(&state).await;
    let jobs = jobs(&state);
    let job = jobs.create(&owner, job_request("Backend")).await.unwrap();

    jobs.delete_as_admin(job.id, &admin).await.unwrap();
    assert!(matches!(
        jobs.delete_as_admin(job.id, &admin).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn listings_are_scoped_and_newest_first() {
    let (state, _) = test_state();
    let e1 = register(&state, "e1@example.com", "employer").await;
    let e2 = register(&state, "e2@example.com", "employer").await;
    let jobs = jobs(&state);

    let first = jobs.create(&e1, job_request("First")).await.unwrap();
    let second = jobs.create(&e1, job_request("Second")).await.unwrap();
    jobs.create(&e2, job_request("Other")).await.unwrap();

    let mine = jobs.list_mine(&e1).await.unwrap();
    assert_eq!(mine.len(), 2);
    assert!(mine.iter().all(|j| j.employer_id == e1.id));
    assert!(mine.contains(&first) && mine.contains(&second));

    let all = jobs.list_all().await.unwrap();
    assert_eq!(all.len(), 3);
    assert!(all.windows(2).all(|w| w[0].created_at >= w[1].created_at));

    let page = jobs
        .list(JobQuery::new(1, 2, Some("other")).unwrap())
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.jobs[0].title, "Other");
}

#[tokio::test]
async fn far_page_lists_nothing_but_keeps_the_totals() {
    let (state, _) = test_state();
    let owner = register(&state, "owner@example.com", "employer").await;
    let jobs = jobs(&state);
    jobs.create(&owner, job_request("Only")).await.unwrap();

    let page = jobs
        .list(JobQuery::new(u32::MAX, u32::MAX, None).unwrap())
        .await
        .unwrap();

    assert!(page.jobs.is_empty());
    assert_eq!(page.total, 1);
    assert_eq!(page.total_pages, 1);
    assert_eq!(page.page, u32::MAX);
}

// --- Applications ---

#[tokio::test]
async fn applying_twice_is_a_conflict() {
    let (state, storage) = test_state();
    let employer = register(&state, "emp@example.com", "employer").await;
    let seeker = register(&state, "seeker@example.com", "jobseeker").await;
    let job = jobs(&state)
        .create(&employer, job_request("Backend"))
        .await
        .unwrap();
    let applications = applications(&state);

    let application = applications
        .apply(job.id, &seeker, apply_form(), resume())
        .await
        .unwrap();
    assert_eq!(application.status, ApplicationStatus::Applied);
    assert_eq!(application.applicant_id, seeker.id);

    let err = applications
        .apply(job.id, &seeker, apply_form(), resume())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(ref msg) if msg == "Already applied to this job"));

    let stored = storage.stored().await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].key, application.resume_key);
    assert_eq!(stored[0].content_type, "application/pdf");
}

#[tokio::test]
async fn concurrent_identical_applications_record_exactly_one() {
    let (state, _) = test_state();
    let employer = register(&state, "emp@example.com", "employer").await;
    let seeker = register(&state, "seeker@example.com", "jobseeker").await;
    let job = jobs(&state)
        .create(&employer, job_request("Backend"))
        .await
        .unwrap();
    let applications = applications(&state);

    let (a, b) = tokio::join!(
        applications.apply(job.id, &seeker, apply_form(), resume()),
        applications.apply(job.id, &seeker, apply_form(), resume()),
    );

    let outcomes = [a, b];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        outcomes
            .iter()
            .any(|r| matches!(r, Err(AppError::Conflict(_))))
    );
    assert_eq!(
        applications.list_for_applicant(&seeker).await.unwrap().len(),
        1
    );
}

#[tokio::test]
async fn applying_to_a_missing_job_is_not_found() {
    let (state, storage) = test_state();
    let seeker = register(&state, "seeker@example.com", "jobseeker").await;

    let err = applications(&state)
        .apply(Uuid::new_v4(), &seeker, apply_form(), resume())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NotFound(_)));
    assert!(storage.stored().await.is_empty());
}

#[tokio::test]
async fn storage_failure_records_nothing() {
    let (state, _) = state_with_storage(MockStorageService::new_failing());
    let employer = register(&state, "emp@example.com", "employer").await;
    let seeker = register(&state, "seeker@example.com", "jobseeker").await;
    let job = jobs(&state)
        .create(&employer, job_request("Backend"))
        .await
        .unwrap();
    let applications = applications(&state);

    let err = applications
        .apply(job.id, &seeker, apply_form(), resume())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Upstream(_)));
    assert!(applications.list_for_applicant(&seeker).await.unwrap().is_empty());
}

#[tokio::test]
async fn empty_resume_is_invalid() {
    let (state, _) = test_state();
    let employer = register(&state, "emp@example.com", "employer").await;
    let seeker = register(&state, "seeker@example.com", "jobseeker").await;
    let job = jobs(&state)
        .create(&employer, job_request("Backend"))
        .await
        .unwrap();

    let mut empty = resume();
    empty.bytes.clear();

    let err = applications(&state)
        .apply(job.id, &seeker, apply_form(), empty)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));
}

#[tokio::test]
async fn deleting_a_job_removes_its_applications_on_every_path() {
    let (state, _) = test_state();
    let employer = register(&state, "emp@example.com", "employer").await;
    let seeker = register(&state, "seeker@example.com", "jobseeker").await;
    let admin = admin(&state).await;
    let jobs = jobs(&state);
    let applications = applications(&state);

    let by_owner = jobs.create(&employer, job_request("Owner path")).await.unwrap();
    let by_admin = jobs.create(&employer, job_request("Admin path")).await.unwrap();
    for job in [&by_owner, &by_admin] {
        applications
            .apply(job.id, &seeker, apply_form(), resume())
            .await
            .unwrap();
    }
    assert_eq!(applications.list_for_applicant(&seeker).await.unwrap().len(), 2);

    jobs.delete(by_owner.id, &employer).await.unwrap();
    let remaining = applications.list_for_applicant(&seeker).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].application.job_id, by_admin.id);

    jobs.delete_as_admin(by_admin.id, &admin).await.unwrap();
    assert!(applications.list_for_applicant(&seeker).await.unwrap().is_empty());
}

#[tokio::test]
async fn applicant_listing_carries_job_title_and_company() {
    let (state, _) = test_state();
    let employer = register(&state, "emp@example.com", "employer").await;
    let seeker = register(&state, "seeker@example.com", "jobseeker").await;
    let job = jobs(&state)
        .create(&employer, job_request("Platform Engineer"))
        .await
        .unwrap();
    let applications = applications(&state);
    applications
        .apply(job.id, &seeker, apply_form(), resume())
        .await
        .unwrap();

    let mine = applications.list_for_applicant(&seeker).await.unwrap();
    assert_eq!(mine[0].job_title.as_deref(), Some("Platform Engineer"));
    assert_eq!(mine[0].job_company.as_deref(), Some("Acme"));
}

#[tokio::test]
async fn only_the_job_owner_lists_its_applications() {
    let (state, _) = test_state();
    let owner = register(&state, "owner@example.com", "employer").await;
    let other = register(&state, "other@example.com", "employer").await;
    let seeker = register(&state, "seeker@example.com", "jobseeker").await;
    let job = jobs(&state)
        .create(&owner, job_request("Backend"))
        .await
        .unwrap();
    let applications = applications(&state);
    applications
        .apply(job.id, &seeker, apply_form(), resume())
        .await
        .unwrap();

    assert_eq!(applications.list_for_job(job.id, &owner).await.unwrap().len(), 1);
    assert!(matches!(
        applications.list_for_job(job.id, &other).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn status_updates_follow_job_ownership() {
    let (state, _) = test_state();
    let owner = register(&state, "owner@example.com", "employer").await;
    let other = register(&state, "other@example.com", "employer").await;
    let seeker = register(&state, "seeker@example.com", "jobseeker").await;
    let admin = admin(&state).await;
    let job = jobs(&state)
        .create(&owner, job_request("Backend"))
        .await
        .unwrap();
    let applications = applications(&state);
    let application = applications
        .apply(job.id, &seeker, apply_form(), resume())
        .await
        .unwrap();

    let approved = applications
        .update_status(application.id, "approved", &owner)
        .await
        .unwrap();
    assert_eq!(approved.status, ApplicationStatus::Approved);

    let err = applications
        .update_status(application.id, "rejected", &other)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    // Any state can be reached from any state, including back to applied.
    let waitlisted = applications
        .update_status(application.id, "waitlisted", &admin)
        .await
        .unwrap();
    assert_eq!(waitlisted.status, ApplicationStatus::Waitlisted);
    let reset = applications
        .update_status(application.id, "applied", &owner)
        .await
        .unwrap();
    assert_eq!(reset.status, ApplicationStatus::Applied);
}

#[tokio::test]
async fn unknown_status_and_unknown_application_are_rejected() {
    let (state, _) = test_state();
    let owner = register(&state, "owner@example.com", "employer").await;
    let seeker = register(&state, "seeker@example.com", "jobseeker").await;
    let job = jobs(&state)
        .create(&owner, job_request("Backend"))
        .await
        .unwrap();
    let applications = applications(&state);
    let application = applications
        .apply(job.id, &seeker, apply_form(), resume())
        .await
        .unwrap();

    let err = applications
        .update_status(application.id, "hired", &owner)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(ref msg) if msg == "Invalid status"));

    let err = applications
        .update_status(Uuid::new_v4(), "approved", &owner)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(ref msg) if msg == "Application not found"));
}
