//! Apart-mode session isolation tests
//!
//! One browser session can hold logins for several admin areas at once.
//! With apart mode on, a request to the base panel purges every other
//! area's login from that session; tenant requests never purge.

mod common;

use aduo::server::{build_router, AppState};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use common::*;
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use tower::ServiceExt;

const MERCHANT_ROUTES: &str = r#"
[[route]]
path = "/reports"
handler = "reports::index"
"#;

async fn gateway(apart: bool) -> (Router, AppState, TempDir) {
    let app_root = app_root_with(&[("Merchant", MERCHANT_ROUTES)]);
    let mut config = test_config(app_root.path(), &["merchant"]);
    config.apart = apart;

    let state = AppState::builder(config)
        .credential_provider("admin", seeded_provider().await)
        .handler(
            "app::merchant::controllers::reports::index",
            get(|| async { "merchant reports" }),
        )
        .build()
        .unwrap();

    (build_router(state.clone()), state, app_root)
}

#[tokio::test]
async fn test_base_request_purges_other_area_logins() {
    let (app, state, _root) = gateway(true).await;

    let cookie = login(&app, "/merchant", None).await;
    let cookie = login(&app, "/admin", Some(&cookie)).await;
    let sid = session_id(&cookie);

    // The purge is lazy: logging in on the base panel leaves the
    // merchant login in place until the next base request.
    assert!(state.sessions.get(&sid, "login_merchant").await.is_some());
    assert!(state.sessions.get(&sid, "login_admin").await.is_some());

    let response = app
        .oneshot(get_with_cookie("/admin/aduo/status", &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(state.sessions.get(&sid, "login_merchant").await, None);
    assert!(state.sessions.get(&sid, "login_admin").await.is_some());
}

#[tokio::test]
async fn test_apart_off_keeps_every_login() {
    let (app, state, _root) = gateway(false).await;

    let cookie = login(&app, "/merchant", None).await;
    let cookie = login(&app, "/admin", Some(&cookie)).await;
    let sid = session_id(&cookie);

    let response = app
        .oneshot(get_with_cookie("/admin/aduo/status", &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    assert!(state.sessions.get(&sid, "login_merchant").await.is_some());
    assert!(state.sessions.get(&sid, "login_admin").await.is_some());
}

#[tokio::test]
async fn test_tenant_requests_never_purge() {
    let (app, state, _root) = gateway(true).await;

    let cookie = login(&app, "/merchant", None).await;
    let cookie = login(&app, "/admin", Some(&cookie)).await;
    let sid = session_id(&cookie);

    let response = app
        .oneshot(get_with_cookie("/merchant/reports", &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    assert!(state.sessions.get(&sid, "login_admin").await.is_some());
    assert!(state.sessions.get(&sid, "login_merchant").await.is_some());
}

#[tokio::test]
async fn test_logout_in_one_area_keeps_the_other() {
    let (app, state, _root) = gateway(true).await;

    let cookie = login(&app, "/merchant", None).await;
    let cookie = login(&app, "/admin", Some(&cookie)).await;
    let sid = session_id(&cookie);

    let response = app
        .oneshot(post_json_with_cookie(
            "/merchant/auth/logout",
            &cookie,
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(state.sessions.get(&sid, "login_merchant").await, None);
    assert!(state.sessions.get(&sid, "login_admin").await.is_some());
}
