//! Route table (§4.8).

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/v1/sources", post(handlers::register_source))
        .route("/v1/query", post(handlers::run_query))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::services::Services;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use clap::Parser;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> Router {
        let config = Config::parse_from(["coreason-daemon"]);
        let state = AppState::new(Arc::new(Services::new(config)));
        create_router(state)
    }

    #[tokio::test]
    async fn health_returns_ok_literal() {
        let response = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body.as_ref(), br#"{"status":"ok"}"#);
    }

    #[tokio::test]
    async fn register_source_with_malformed_urn_is_unprocessable() {
        let manifest = serde_json::json!({
            "urn": "not-a-urn",
            "name": "bad source",
            "description": "a source with an invalid urn",
            "endpoint_url": "sse://example.invalid:1",
            "source_pointer": null,
            "acls": [],
            "geo_location": "US",
            "sensitivity": "PUBLIC",
            "owner_group": "team",
            "access_policy": "package match\nallow { true }",
        });
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/v1/sources")
                    .header("content-type", "application/json")
                    .body(Body::from(manifest.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn query_with_valid_header_overrides_body_user_context() {
        let body = serde_json::json!({
            "intent": "find clinical trial sources",
            "user_context": {"user_id": "body-user", "email": "", "groups": [], "claims": {}},
            "limit": 5,
        });
        let header_context = serde_json::json!({
            "user_id": "header-user",
            "email": "",
            "groups": [],
            "claims": {"is_service_account": true},
        });
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/v1/query")
                    .header("content-type", "application/json")
                    .header("x-user-context", header_context.to_string())
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn query_with_malformed_header_still_succeeds_using_body_value() {
        let body = serde_json::json!({
            "intent": "find clinical trial sources",
            "user_context": {"user_id": "body-user", "email": "", "groups": [], "claims": {}},
            "limit": 5,
        });
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/v1/query")
                    .header("content-type", "application/json")
                    .header("x-user-context", "not json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn query_without_limit_still_succeeds_using_configured_default() {
        let body = serde_json::json!({ "intent": "find clinical trial sources" });
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/v1/query")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
