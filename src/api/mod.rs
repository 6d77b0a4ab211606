// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTTP surface and request pipeline.
//!
//! Requests pass, outermost first: request id, tracing, CORS, session,
//! [`auth_filter`], [`csrf_filter`], [`csrf_validator`], then the route.
//! Health, docs and `/expired-jwt` sit outside the auth and CSRF stages.

use axum::{
    http,
    middleware::from_fn_with_state,
    routing::{any, delete, get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tower_sessions::{MemoryStore, SessionManagerLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{auth_filter, PrincipalView},
    csrf::{csrf_filter, csrf_validator, CsrfChallenge},
    state::AppState,
};

pub mod admin;
pub mod csrf;
#[cfg(feature = "dev")]
pub mod dev;
pub mod echo;
pub mod errors;
pub mod health;
pub mod tokens;
pub mod users;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/users/me", get(users::get_current_user))
        .route("/echo", post(echo::echo))
        .route("/tokens/verify", post(tokens::verify_token))
        .route("/admin/principals", get(admin::list_principals))
        .route(
            "/admin/principals/{username}",
            delete(admin::delete_principal),
        );

    let protected = Router::new()
        .nest("/v1", v1_routes)
        .route("/csrf", get(csrf::get_challenge));

    #[cfg(feature = "dev")]
    let protected = protected
        .route("/dev/token/{username}", post(dev::issue_token))
        .route("/dev/tokens", post(dev::issue_custom_token));

    let csrf_validator_state = state
        .csrf_validator
        .clone()
        .with_invalid_token_handler(errors::forward_invalid_csrf);

    let protected = protected
        .layer(from_fn_with_state(csrf_validator_state, csrf_validator))
        .layer(from_fn_with_state(state.csrf.clone(), csrf_filter))
        .layer(from_fn_with_state(state.auth.clone(), auth_filter));

    let sessions = SessionManagerLayer::new(MemoryStore::default()).with_secure(state.secure_cookies);

    Router::new()
        .merge(protected)
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/expired-jwt", any(errors::expired_jwt))
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", openapi()))
        .layer(sessions)
        .layer(CorsLayer::permissive())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

/// Request span carrying the path only; query strings may hold credentials.
fn request_span<B>(request: &http::Request<B>) -> tracing::Span {
    tracing::debug_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
        version = ?request.version(),
    )
}

/// The OpenAPI document, including development routes when enabled.
pub fn openapi() -> utoipa::openapi::OpenApi {
    #[allow(unused_mut)]
    let mut doc = ApiDoc::openapi();
    #[cfg(feature = "dev")]
    doc.merge(DevApiDoc::openapi());
    doc
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        users::get_current_user,
        echo::echo,
        tokens::verify_token,
        admin::list_principals,
        admin::delete_principal,
        csrf::get_challenge,
        errors::expired_jwt
    ),
    components(
        schemas(
            PrincipalView,
            CsrfChallenge,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse,
            echo::EchoRequest,
            echo::EchoResponse,
            tokens::VerifyRequest,
            tokens::VerifyResponse,
            admin::PrincipalSummary,
            admin::PrincipalListResponse,
            errors::ExpiredTokenResponse
        )
    ),
    tags(
        (name = "Health", description = "Liveness and readiness"),
        (name = "Users", description = "Current principal"),
        (name = "Echo", description = "CSRF-protected example endpoint"),
        (name = "Tokens", description = "Token verification"),
        (name = "Admin", description = "Principal directory management"),
        (name = "CSRF", description = "CSRF challenges")
    )
)]
struct ApiDoc;

#[cfg(feature = "dev")]
#[derive(OpenApi)]
#[openapi(
    paths(dev::issue_token, dev::issue_custom_token),
    components(schemas(dev::TokenResponse, dev::CustomTokenRequest)),
    tags((name = "Dev", description = "Development-only token issuance"))
)]
struct DevApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Principal;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let app = router(AppState::default());
        // Ensure the router can be converted into a service without panicking.
        let _ = app.into_make_service();
    }

    async fn test_state() -> AppState {
        let mut state = AppState::default();
        state.secure_cookies = false;
        state.principals.insert(Principal::new("alice", ["ROLE_USER"])).await;
        state
            .principals
            .insert(Principal::new("root", ["ROLE_USER", "ROLE_ADMIN"]))
            .await;
        state
    }

    fn bearer(state: &AppState, username: &str, authorities: &[&str]) -> String {
        let token = state
            .issuer
            .issue(&Principal::new(username, authorities.iter().copied()))
            .unwrap();
        format!("Bearer {token}")
    }

    async fn body_json(response: Response) -> Value {
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    /// GET /csrf, returning the session cookie and challenge token.
    async fn csrf_handshake(app: &Router) -> (String, String) {
        let response = app
            .clone()
            .oneshot(Request::get("/csrf").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .unwrap()
            .to_string();
        let challenge = body_json(response).await;
        assert_eq!(challenge["header_name"], "X-CSRF-TOKEN");
        (cookie, challenge["token"].as_str().unwrap().to_string())
    }

    #[tokio::test]
    async fn health_is_public() {
        let app = router(test_state().await);
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn me_requires_a_token() {
        let app = router(test_state().await);
        let response = app
            .oneshot(Request::get("/v1/users/me").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error_code"], "unauthenticated");
    }

    #[tokio::test]
    async fn me_returns_principal_for_valid_token() {
        let state = test_state().await;
        let auth = bearer(&state, "alice", &["ROLE_USER"]);
        let app = router(state);

        let response = app
            .oneshot(
                Request::get("/v1/users/me")
                    .header(header::AUTHORIZATION, auth)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["username"], "alice");
        assert_eq!(body["authorities"], json!(["ROLE_USER"]));
    }

    #[tokio::test]
    async fn removed_principal_loses_access() {
        let state = test_state().await;
        let auth = bearer(&state, "alice", &["ROLE_USER"]);
        state.principals.remove("alice").await;
        let app = router(state);

        let response = app
            .oneshot(
                Request::get("/v1/users/me")
                    .header(header::AUTHORIZATION, auth)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn admin_routes_require_admin_authority() {
        let state = test_state().await;
        let user = bearer(&state, "alice", &["ROLE_USER"]);
        let admin = bearer(&state, "root", &["ROLE_ADMIN"]);
        let app = router(state);

        let forbidden = app
            .clone()
            .oneshot(
                Request::get("/v1/admin/principals")
                    .header(header::AUTHORIZATION, user)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

        let allowed = app
            .oneshot(
                Request::get("/v1/admin/principals")
                    .header(header::AUTHORIZATION, admin)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(allowed.status(), StatusCode::OK);
        assert_eq!(body_json(allowed).await["total"], 2);
    }

    #[tokio::test]
    async fn echo_with_csrf_handshake_succeeds() {
        let state = test_state().await;
        let auth = bearer(&state, "alice", &["ROLE_USER"]);
        let app = router(state);
        let (cookie, token) = csrf_handshake(&app).await;

        let response = app
            .oneshot(
                Request::post("/v1/echo")
                    .header(header::COOKIE, cookie)
                    .header("X-CSRF-TOKEN", token)
                    .header(header::AUTHORIZATION, auth)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"message":"hi"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"message": "hi", "username": "alice"})
        );
    }

    #[tokio::test]
    async fn echo_without_csrf_token_is_forbidden() {
        let app = router(test_state().await);
        let (cookie, _) = csrf_handshake(&app).await;

        let response = app
            .oneshot(
                Request::post("/v1/echo")
                    .header(header::COOKIE, cookie)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"message":"hi"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_json(response).await["error_code"], "csrf_token_mismatch");
    }

    #[tokio::test]
    async fn admin_delete_needs_csrf_and_admin() {
        let state = test_state().await;
        let admin = bearer(&state, "root", &["ROLE_ADMIN"]);
        let app = router(state.clone());
        let (cookie, token) = csrf_handshake(&app).await;

        let response = app
            .oneshot(
                Request::delete("/v1/admin/principals/alice")
                    .header(header::COOKIE, cookie)
                    .header("X-CSRF-TOKEN", token)
                    .header(header::AUTHORIZATION, admin)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(state.principals.len().await, 1);
    }

    #[tokio::test]
    async fn exempt_path_skips_csrf() {
        let state = test_state().await;
        let state = AppState {
            csrf: crate::csrf::CsrfProtection::new(
                std::sync::Arc::new(state.csrf.repository().clone()),
                std::sync::Arc::new(crate::csrf::CsrfExemptions::new(["/v1/echo"])),
            ),
            ..state
        };
        let app = router(state);

        let response = app
            .oneshot(
                Request::post("/v1/echo")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"message":"hook"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn verify_reads_the_token_from_the_body() {
        let state = test_state().await;
        let auth = bearer(&state, "alice", &["ROLE_USER"]);
        let token = auth.trim_start_matches("Bearer ").to_string();
        let app = router(state);
        let (cookie, csrf) = csrf_handshake(&app).await;

        let response = app
            .oneshot(
                Request::post("/v1/tokens/verify")
                    .header(header::COOKIE, cookie)
                    .header("X-CSRF-TOKEN", csrf)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(json!({"token": token, "subject": "alice"}).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["subject"], "alice");
        assert_eq!(body["claims"]["roles"], json!(["ROLE_USER"]));
    }

    #[tokio::test]
    async fn verify_rejects_get() {
        let app = router(test_state().await);
        let response = app
            .oneshot(
                Request::get("/v1/tokens/verify?token=abc")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[test]
    fn request_span_omits_the_query_string() {
        let request = http::Request::get("/v1/tokens/verify?token=secret")
            .body(())
            .unwrap();
        // Disabled without a subscriber, but the metadata is still there.
        let span = request_span(&request);
        let fields: Vec<&str> = span
            .metadata()
            .map(|m| m.fields().iter().map(|f| f.name()).collect())
            .unwrap_or_default();
        assert!(fields.contains(&"path"));
        assert!(!fields.contains(&"uri"));
    }

    #[tokio::test]
    async fn openapi_lists_routes() {
        let doc = serde_json::to_value(openapi()).unwrap();
        assert!(doc["paths"]["/v1/users/me"].is_object());
        assert!(doc["paths"]["/csrf"].is_object());
    }
}
