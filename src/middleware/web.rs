//! Session context middleware (the `web` step)
//!
//! Opens the request's session from the session cookie, starting a new
//! one when no cookie arrives, and stores the handle in request
//! extensions. The cookie is set for fresh sessions and re-set whenever
//! a handler rotated the id, which logins do.

use crate::server::AppState;
use crate::session::RenewedSession;
use axum::{
    body::Body,
    extract::State,
    http::{header::SET_COOKIE, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::trace;

pub async fn open_session(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let jar = CookieJar::from_headers(request.headers());
    let existing = jar
        .get(state.sessions.cookie_name())
        .map(|cookie| cookie.value().to_string());

    let session = state.sessions.open(existing);
    let fresh = session.is_fresh();
    let session_id = session.id().to_string();
    trace!(session = %session_id, fresh, "opened session");

    request.extensions_mut().insert(session);
    let mut response = next.run(request).await;

    // A rotated id wins over the fresh one; only one cookie goes out.
    let renewed = response
        .extensions()
        .get::<RenewedSession>()
        .map(|renewed| renewed.0.clone());
    let reissue = match renewed {
        Some(id) => Some(id),
        None if fresh => Some(session_id),
        None => None,
    };
    if let Some(id) = reissue {
        let cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax",
            state.sessions.cookie_name(),
            id
        );
        if let Ok(value) = cookie.parse::<HeaderValue>() {
            response.headers_mut().append(SET_COOKIE, value);
        }
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;
    use axum::{http::StatusCode, routing::get, Extension, Router};
    use tower::ServiceExt;

    fn test_state() -> AppState {
        crate::server::test_support::state_with_prefixes(&[])
    }

    async fn session_id_handler(Extension(session): Extension<Session>) -> String {
        session.id().to_string()
    }

    fn app(state: AppState) -> Router {
        Router::new()
            .route("/whoami", get(session_id_handler))
            .layer(axum::middleware::from_fn_with_state(
                state.clone(),
                open_session,
            ))
            .with_state(state)
    }

    #[tokio::test]
    async fn test_fresh_session_sets_cookie() {
        let app = app(test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/whoami")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let set_cookie = response
            .headers()
            .get(SET_COOKIE)
            .expect("fresh session must set the cookie")
            .to_str()
            .unwrap();
        assert!(set_cookie.starts_with("aduo_session="));
        assert!(set_cookie.contains("HttpOnly"));
    }

    #[tokio::test]
    async fn test_existing_cookie_reuses_session() {
        let state = test_state();
        let app = app(state);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/whoami")
                    .header("Cookie", "aduo_session=abc123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(response.headers().get(SET_COOKIE).is_none());
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"abc123");
    }

    #[tokio::test]
    async fn test_renewed_session_reissues_the_cookie() {
        use axum::response::IntoResponse;

        async fn renew_handler() -> impl IntoResponse {
            (Extension(RenewedSession("rotated".to_string())), "ok")
        }

        let state = test_state();
        let app = Router::new()
            .route("/login", get(renew_handler))
            .layer(axum::middleware::from_fn_with_state(
                state.clone(),
                open_session,
            ))
            .with_state(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/login")
                    .header("Cookie", "aduo_session=abc123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let cookies: Vec<_> = response.headers().get_all(SET_COOKIE).iter().collect();
        assert_eq!(cookies.len(), 1);
        assert!(cookies[0]
            .to_str()
            .unwrap()
            .starts_with("aduo_session=rotated;"));
    }
}
