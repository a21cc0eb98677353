mod common;

use axum::{
    extract::FromRequestParts,
    http::{HeaderValue, Method, Request, Uri, header, request::Parts},
};
use blogicum::{
    AppConfig, AppError, MockStorageService,
    auth::{AuthUser, MaybeAuthUser},
    config::Env,
};
use common::{ANNA_ID, Fixture, fixture_with, token};
use uuid::Uuid;

const TEST_JWT_SECRET: &str = "integration-test-secret-with-enough-entropy";

async fn app_with(env: Env) -> Fixture {
    let config = AppConfig {
        env,
        jwt_secret: TEST_JWT_SECRET.to_string(),
        ..AppConfig::default()
    };
    fixture_with(config, MockStorageService::new()).await
}

fn get_request_parts(method: Method, uri: Uri) -> Parts {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    let (parts, _) = request.into_parts();
    parts
}

fn with_bearer(token: &str) -> Parts {
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
    );
    parts
}

fn with_bypass(user_id: Uuid) -> Parts {
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::HeaderName::from_static("x-user-id"),
        HeaderValue::from_str(&user_id.to_string()).unwrap(),
    );
    parts
}

#[tokio::test]
async fn test_auth_success_with_valid_jwt() {
    let app = app_with(Env::Production).await;
    let mut parts = with_bearer(&token(ANNA_ID, TEST_JWT_SECRET, 3600));

    let user = AuthUser::from_request_parts(&mut parts, &app.state)
        .await
        .unwrap();

    assert_eq!(user.id, ANNA_ID);
    assert_eq!(user.username, "anna");
    assert!(!user.is_admin());
}

#[tokio::test]
async fn test_auth_failure_with_missing_header() {
    let app = app_with(Env::Production).await;
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());

    let result = AuthUser::from_request_parts(&mut parts, &app.state).await;

    assert!(matches!(result, Err(AppError::Unauthorized)));
}

#[tokio::test]
async fn test_auth_failure_with_expired_jwt() {
    let app = app_with(Env::Production).await;
    // Well past the default 60 second leeway.
    let mut parts = with_bearer(&token(ANNA_ID, TEST_JWT_SECRET, -3600));

    let result = AuthUser::from_request_parts(&mut parts, &app.state).await;

    assert!(matches!(result, Err(AppError::Unauthorized)));
}

#[tokio::test]
async fn test_auth_failure_with_wrong_secret() {
    let app = app_with(Env::Production).await;
    let mut parts = with_bearer(&token(ANNA_ID, "some-other-secret", 3600));

    let result = AuthUser::from_request_parts(&mut parts, &app.state).await;

    assert!(matches!(result, Err(AppError::Unauthorized)));
}

#[tokio::test]
async fn test_auth_failure_for_unknown_profile() {
    let app = app_with(Env::Production).await;
    let mut parts = with_bearer(&token(Uuid::new_v4(), TEST_JWT_SECRET, 3600));

    let result = AuthUser::from_request_parts(&mut parts, &app.state).await;

    assert!(matches!(result, Err(AppError::Unauthorized)));
}

#[tokio::test]
async fn test_local_bypass_success() {
    let app = app_with(Env::Local).await;
    let mut parts = with_bypass(app.admin.id);

    let user = AuthUser::from_request_parts(&mut parts, &app.state)
        .await
        .unwrap();

    assert_eq!(user.id, app.admin.id);
    assert!(user.is_admin());
}

#[tokio::test]
async fn test_local_bypass_disabled_in_prod() {
    let app = app_with(Env::Production).await;
    let mut parts = with_bypass(ANNA_ID);

    let result = AuthUser::from_request_parts(&mut parts, &app.state).await;

    assert!(matches!(result, Err(AppError::Unauthorized)));
}

#[tokio::test]
async fn test_maybe_auth_user_degrades_to_anonymous() {
    let app = app_with(Env::Production).await;

    let mut garbage = with_bearer("not-a-jwt");
    let MaybeAuthUser(anonymous) = MaybeAuthUser::from_request_parts(&mut garbage, &app.state)
        .await
        .unwrap();
    assert!(anonymous.is_none());

    let mut valid = with_bearer(&token(ANNA_ID, TEST_JWT_SECRET, 3600));
    let MaybeAuthUser(known) = MaybeAuthUser::from_request_parts(&mut valid, &app.state)
        .await
        .unwrap();
    assert_eq!(known.map(|user| user.id), Some(ANNA_ID));
}
