use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    middleware,
    routing::get,
};
use chrono::{Duration, Utc};
use job_portal::{
    auth::{Identity, Principal, bearer_token, identify},
    models::Role,
    token::TokenService,
};
use tower::ServiceExt;
use uuid::Uuid;

async fn whoami(identity: Identity) -> String {
    match identity.principal() {
        Some(principal) => format!("{}:{}", principal.email, principal.role),
        None => "anonymous".to_string(),
    }
}

fn tokens() -> TokenService {
    TokenService::new("middleware-test-secret", Duration::hours(1))
}

fn app(tokens: TokenService) -> Router {
    Router::new()
        .route("/whoami", get(whoami))
        .layer(middleware::from_fn_with_state(tokens, identify))
}

async fn call(app: Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

fn whoami_with(authorization: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri("/whoami");
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn valid_bearer_token_attaches_a_principal() {
    let tokens = tokens();
    let token = tokens
        .issue(Uuid::new_v4(), "emp@example.com", Role::Employer)
        .unwrap();

    let (status, body) = call(
        app(tokens),
        whoami_with(Some(&format!("Bearer {token}"))),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "emp@example.com:employer");
}

#[tokio::test]
async fn missing_header_stays_anonymous() {
    let (status, body) = call(app(tokens()), whoami_with(None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "anonymous");
}

#[tokio::test]
async fn invalid_credentials_never_reject_the_request() {
    let tokens = tokens();
    let expired = tokens
        .issue_at(
            Uuid::new_v4(),
            "old@example.com",
            Role::Jobseeker,
            Utc::now() - Duration::hours(2),
        )
        .unwrap();

    for header_value in [
        format!("Bearer {expired}"),
        "Bearer not-a-token".to_string(),
        "Basic dXNlcjpwYXNz".to_string(),
        "Bearer ".to_string(),
    ] {
        let (status, body) = call(app(tokens.clone()), whoami_with(Some(&header_value))).await;
        assert_eq!(status, StatusCode::OK, "header {header_value:?}");
        assert_eq!(body, "anonymous", "header {header_value:?}");
    }
}

#[tokio::test]
async fn an_attached_principal_is_never_overwritten() {
    let tokens = tokens();
    let token = tokens
        .issue(Uuid::new_v4(), "other@example.com", Role::Admin)
        .unwrap();

    let mut request = whoami_with(Some(&format!("Bearer {token}")));
    request.extensions_mut().insert(Principal {
        id: Uuid::new_v4(),
        email: "first@example.com".to_string(),
        role: Role::Jobseeker,
    });

    let (_, body) = call(app(tokens), request).await;
    assert_eq!(body, "first@example.com:jobseeker");
}

#[tokio::test]
async fn running_the_middleware_twice_is_harmless() {
    let tokens = tokens();
    let token = tokens
        .issue(Uuid::new_v4(), "twice@example.com", Role::Employer)
        .unwrap();

    let doubled = app(tokens.clone()).layer(middleware::from_fn_with_state(tokens, identify));
    let (status, body) = call(doubled, whoami_with(Some(&format!("Bearer {token}")))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "twice@example.com:employer");
}

#[test]
fn bearer_token_requires_the_bearer_scheme() {
    let mut headers = axum::http::HeaderMap::new();
    assert_eq!(bearer_token(&headers), None);

    headers.insert(header::AUTHORIZATION, "Bearer abc.def".parse().unwrap());
    assert_eq!(bearer_token(&headers), Some("abc.def"));

    headers.insert(header::AUTHORIZATION, "Token abc.def".parse().unwrap());
    assert_eq!(bearer_token(&headers), None);
}
