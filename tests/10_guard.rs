mod common;

use axum::http::StatusCode;
use common::TestApp;
use village_one_api::testing::{MemoryStore, MockIdentityProvider};

fn app() -> TestApp {
    TestApp::new(
        MockIdentityProvider::new().with_token("abc123", "u-9").with_token("tok-42", "42"),
        MemoryStore::new().with_profile("42"),
    )
}

#[tokio::test]
async fn direct_id_is_looked_up_without_credentials() {
    let app = app();

    let (status, body) = app.get("/api/users/42", &[]).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["id"], "42");
    assert_eq!(app.provider.calls(), 0);
    assert_eq!(app.store.profile_lookups(), 1);
}

#[tokio::test]
async fn me_with_valid_token_but_no_profile_is_not_found() {
    let app = app();

    let (status, body) = app
        .get("/api/users/me", &[("authorization", "Bearer abc123")])
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Profile not found");
    assert_eq!(body["code"], "NOT_FOUND");
    assert_eq!(app.provider.calls(), 1);
}

#[tokio::test]
async fn empty_identity_is_bad_request_with_no_calls() {
    let app = app();

    let (status, body) = app.get("/api/profile?userId=", &[]).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    assert_eq!(app.provider.calls(), 0);
    assert_eq!(app.store.profile_lookups(), 0);
}

#[tokio::test]
async fn missing_identity_is_bad_request() {
    let app = app();

    let (status, _) = app.get("/api/profile", &[]).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.store.profile_lookups(), 0);
}

#[tokio::test]
async fn unfilled_route_placeholder_is_bad_request() {
    let app = app();

    let (status, _) = app.get("/api/users/%5Buser_id%5D/posts", &[]).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.store.profile_lookups(), 0);
}

#[tokio::test]
async fn me_without_credential_is_unauthorized() {
    let app = app();

    let (status, body) = app.get("/api/users/me", &[]).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
    assert_eq!(app.store.profile_lookups(), 0);
}

#[tokio::test]
async fn provider_fault_on_me_is_unauthorized() {
    let app = TestApp::new(
        MockIdentityProvider::new().failing(),
        MemoryStore::new().with_profile("u-9"),
    );

    let (status, _) = app.get("/api/users/me", &[("authorization", "Bearer xyz")]).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.provider.calls(), 1);
    assert_eq!(app.store.profile_lookups(), 0);
}

#[tokio::test]
async fn bare_token_and_session_cookie_are_accepted() {
    let app = app();

    let (status, body) = app.get("/api/users/me", &[("authorization", "tok-42")]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], "42");

    let (status, body) = app
        .get("/api/users/me", &[("cookie", "theme=dark; sb-access-token=tok-42")])
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], "42");
}

#[tokio::test]
async fn blank_bearer_header_does_not_hide_session_cookie() {
    let app = app();

    let (status, body) = app
        .get(
            "/api/users/me",
            &[("authorization", "Bearer "), ("cookie", "sb-access-token=tok-42")],
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], "42");
    assert_eq!(app.provider.calls(), 1);
}

#[tokio::test]
async fn repeated_query_parameter_uses_first_value() {
    let app = app();

    let (status, body) = app
        .get("/api/profile?userId=42&userId=me", &[])
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], "42");
    assert_eq!(app.provider.calls(), 0);
}

#[tokio::test]
async fn same_request_twice_gives_same_answer() {
    let app = app();
    let headers = [("authorization", "Bearer tok-42")];

    let first = app.get("/api/users/me", &headers).await;
    let second = app.get("/api/users/me", &headers).await;

    assert_eq!(first, second);
    assert_eq!(app.provider.calls(), 2);
    assert_eq!(app.store.profile_lookups(), 2);
}
