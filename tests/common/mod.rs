#![allow(dead_code)]

//! Common test utilities
//!
//! Everything the gateway needs is in-process (sessions, credentials,
//! tenant directories), so the tests drive the router directly with
//! `tower::ServiceExt::oneshot` instead of spawning a server.

use aduo::auth::MemoryCredentialProvider;
use aduo::config::{BaseRouteConfig, Config};
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

pub const TEST_USER: &str = "root";
pub const TEST_PASSWORD: &str = "secret";

/// Base config pointing at the given app root.
pub fn test_config(app_root: &Path, prefixes: &[&str]) -> Config {
    Config {
        http_host: "127.0.0.1".to_string(),
        http_port: 0,
        app_root: app_root.to_path_buf(),
        prefixes: prefixes.iter().map(|s| s.to_string()).collect(),
        base_route: BaseRouteConfig::default(),
        apart: true,
        auth_provider: "admin".to_string(),
        session_cookie: "aduo_session".to_string(),
        tenants: HashMap::new(),
        bootstrap_users: HashMap::new(),
    }
}

/// Temp app root with one directory per `(dir_name, routes_toml)` pair.
pub fn app_root_with(tenants: &[(&str, &str)]) -> TempDir {
    let root = tempfile::tempdir().unwrap();
    for (dir_name, routes_toml) in tenants {
        let dir = root.path().join(dir_name);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("routes.toml"), routes_toml).unwrap();
    }
    root
}

/// Provider with the default test user.
pub async fn seeded_provider() -> Arc<MemoryCredentialProvider> {
    let provider = MemoryCredentialProvider::new();
    provider.add_user(TEST_USER, TEST_PASSWORD).await.unwrap();
    Arc::new(provider)
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn get_with_cookie(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

pub fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn post_json_with_cookie(uri: &str, cookie: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::COOKIE, cookie)
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// The `name=value` pair from the response's Set-Cookie header.
pub fn session_cookie(response: &Response) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .expect("response must set the session cookie")
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string()
}

/// Session id carried by a `name=value` cookie pair.
pub fn session_id(cookie: &str) -> String {
    cookie.split('=').nth(1).unwrap().to_string()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_string(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Log in to an admin area and return the session cookie pair. Pass an
/// existing cookie to log in on top of an existing session; the login
/// rotates the session id, so keep using the returned cookie, not the
/// one passed in.
pub async fn login(app: &Router, area: &str, existing_cookie: Option<&str>) -> String {
    let body = serde_json::json!({ "username": TEST_USER, "password": TEST_PASSWORD });
    let request = match existing_cookie {
        Some(cookie) => post_json_with_cookie(&format!("{area}/auth/login"), cookie, body),
        None => post_json(&format!("{area}/auth/login"), body),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(
        response.status(),
        StatusCode::OK,
        "login failed for {area}"
    );

    session_cookie(&response)
}
