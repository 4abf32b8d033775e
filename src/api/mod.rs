//! Endpoints served by the gateway itself

use crate::server::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Gateway status: configured prefixes versus actually registered
/// guards. Mounted inside the base panel, so it requires a base login.
#[derive(Serialize, Deserialize)]
pub struct StatusResponse {
    pub base_prefix: String,
    pub prefixes: Vec<String>,
    pub guards: Vec<String>,
    pub apart: bool,
}

pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    Json(StatusResponse {
        base_prefix: state.config.base_route.prefix.clone(),
        prefixes: state.config.prefixes.clone(),
        guards: state
            .guards
            .bindings()
            .iter()
            .map(|binding| binding.name.clone())
            .collect(),
        apart: state.config.apart,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response_structure() {
        let response = HealthResponse {
            status: "healthy".to_string(),
            version: "0.1.0".to_string(),
        };

        assert_eq!(response.status, "healthy");
        assert_eq!(response.version, "0.1.0");
    }

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains(env!("CARGO_PKG_VERSION")));
    }

    #[tokio::test]
    async fn test_status_reports_configured_and_registered() {
        let state =
            crate::server::test_support::state_with_prefixes(&["merchant", "bad-prefix"]);

        let response = status(State(state)).await.into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let parsed: StatusResponse = serde_json::from_slice(&body).unwrap();

        assert_eq!(parsed.base_prefix, "admin");
        assert_eq!(parsed.prefixes, vec!["merchant", "bad-prefix"]);
        assert_eq!(parsed.guards, vec!["admin", "merchant"]);
        assert!(parsed.apart);
    }
}
