mod common;

use axum::http::StatusCode;
use common::{TestApp, body_string, cookie_pair, location, session_cookie, set_cookies};
use rent_auth::test_utils::MockIdentityProvider;
use rent_auth::{AUTH_ACCESS_COOKIE_NAME, InMemoryAppUserStore, Role};

#[tokio::test]
async fn test_unauthenticated_request_redirects_without_query() {
    let app = TestApp::new(MockIdentityProvider::new(), InMemoryAppUserStore::new());

    let response = app.get("/dashboard/owner?month=2024-05", None).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_public_paths_are_not_guarded() {
    let provider = MockIdentityProvider::new();
    let app = TestApp::new(provider, InMemoryAppUserStore::new());

    let response = app.get("/login?error=auth_failed", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.provider.get_user_calls(), 0);
}

#[tokio::test]
async fn test_valid_session_reaches_handler() {
    let provider = MockIdentityProvider::new();
    let session = provider.issue_session("owner-1", false);
    let app = TestApp::new(
        provider,
        InMemoryAppUserStore::new().with_user("owner-1", Role::Owner),
    );

    let response = app
        .get("/dashboard/owner", Some(&session_cookie(&session)))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookies(&response).is_empty());
    assert_eq!(body_string(response).await, "owner");
    assert_eq!(app.provider.refresh_calls(), 0);
}

#[tokio::test]
async fn test_expired_access_token_is_refreshed() {
    let provider = MockIdentityProvider::new();
    let session = provider.issue_session("tenant-1", true);
    let app = TestApp::new(
        provider,
        InMemoryAppUserStore::new().with_user("tenant-1", Role::Tenant),
    );

    let response = app
        .get("/dashboard/tenant", Some(&session_cookie(&session)))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.provider.refresh_calls(), 1);
    let refreshed = cookie_pair(&response, AUTH_ACCESS_COOKIE_NAME.as_str())
        .expect("refreshed access token cookie");
    assert_ne!(
        refreshed,
        format!("{}={}", *AUTH_ACCESS_COOKIE_NAME, session.access_token)
    );
}

#[tokio::test]
async fn test_rejected_refresh_clears_cookies_and_redirects() {
    let provider = MockIdentityProvider::new();
    let session = provider.issue_session("tenant-1", true);
    let app = TestApp::new(provider, InMemoryAppUserStore::new());
    let cookie = format!(
        "{}={}; {}=revoked",
        *AUTH_ACCESS_COOKIE_NAME,
        session.access_token,
        *rent_auth::AUTH_REFRESH_COOKIE_NAME
    );

    let response = app.get("/dashboard/tenant", Some(&cookie)).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
    assert!(
        set_cookies(&response)
            .iter()
            .any(|c| c.starts_with(&format!("{}=;", *AUTH_ACCESS_COOKIE_NAME)))
    );
}

#[tokio::test]
async fn test_unreachable_provider_fails_closed() {
    let provider = MockIdentityProvider::new();
    let session = provider.issue_session("owner-1", false);
    let app = TestApp::new(
        provider.unreachable(),
        InMemoryAppUserStore::new().with_user("owner-1", Role::Owner),
    );

    let response = app
        .get("/dashboard/owner", Some(&session_cookie(&session)))
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_role_mismatch_is_forbidden() {
    let provider = MockIdentityProvider::new();
    let session = provider.issue_session("tenant-1", false);
    let app = TestApp::new(
        provider,
        InMemoryAppUserStore::new().with_user("tenant-1", Role::Tenant),
    );

    let response = app
        .get("/dashboard/owner", Some(&session_cookie(&session)))
        .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_string(response).await;
    assert!(body.contains("Access denied"));
    assert!(body.contains("signed in as tenant"));
}

#[tokio::test]
async fn test_unprovisioned_user_is_sent_to_select_role() {
    let provider = MockIdentityProvider::new();
    let session = provider.issue_session("new-1", false);
    let app = TestApp::new(provider, InMemoryAppUserStore::new());

    let response = app
        .get("/dashboard/owner", Some(&session_cookie(&session)))
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/select-role");
}

#[tokio::test]
async fn test_select_role_page_sees_authenticating_state() {
    let provider = MockIdentityProvider::new();
    let session = provider.issue_session("new-1", false);
    let app = TestApp::new(provider, InMemoryAppUserStore::new());

    let response = app
        .get("/select-role", Some(&session_cookie(&session)))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_string(response).await,
        rent_auth::AuthState::Authenticating.to_string()
    );
}

#[tokio::test]
async fn test_session_only_route_skips_user_lookup() {
    let provider = MockIdentityProvider::new();
    let session = provider.issue_session("owner-1", false);
    let app = TestApp::new(
        provider,
        InMemoryAppUserStore::new().with_user("owner-1", Role::Owner),
    );

    let response = app
        .get("/dashboard/profile", Some(&session_cookie(&session)))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "owner-1");
    assert_eq!(app.users.lookup_calls(), 0);
}

#[tokio::test]
async fn test_role_route_looks_up_user_once() {
    let provider = MockIdentityProvider::new();
    let session = provider.issue_session("owner-1", false);
    let app = TestApp::new(
        provider,
        InMemoryAppUserStore::new().with_user("owner-1", Role::Owner),
    );

    let response = app
        .get("/dashboard/owner", Some(&session_cookie(&session)))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.users.lookup_calls(), 1);
}
