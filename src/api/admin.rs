// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Admin-only endpoints for the principal directory.
//!
//! Removing a principal revokes every token issued to it: the auth filter
//! resolves the principal on each request and a miss leaves the request
//! unauthenticated.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    auth::{AdminOnly, Principal},
    error::ApiError,
    state::AppState,
};

/// Directory entry as shown to admins. Never includes the password hash.
#[derive(Debug, Serialize, ToSchema)]
pub struct PrincipalSummary {
    pub username: String,
    pub authorities: Vec<String>,
    pub enabled: bool,
    /// False when any account flag blocks authentication.
    pub can_authenticate: bool,
}

impl From<Principal> for PrincipalSummary {
    fn from(principal: Principal) -> Self {
        Self {
            can_authenticate: principal.can_authenticate(),
            enabled: principal.enabled,
            authorities: principal.authorities,
            username: principal.username,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PrincipalListResponse {
    pub principals: Vec<PrincipalSummary>,
    pub total: usize,
}

#[utoipa::path(
    get,
    path = "/v1/admin/principals",
    tag = "Admin",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "All principals", body = PrincipalListResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Admin authority required"),
    )
)]
pub async fn list_principals(
    AdminOnly(_admin): AdminOnly,
    State(state): State<AppState>,
) -> Json<PrincipalListResponse> {
    let principals: Vec<PrincipalSummary> = state
        .principals
        .list()
        .await
        .into_iter()
        .map(PrincipalSummary::from)
        .collect();

    Json(PrincipalListResponse {
        total: principals.len(),
        principals,
    })
}

#[utoipa::path(
    delete,
    path = "/v1/admin/principals/{username}",
    params(
        ("username" = String, Path, description = "Principal to remove")
    ),
    tag = "Admin",
    security(("bearer" = [])),
    responses(
        (status = 204, description = "Principal removed"),
        (status = 400, description = "Admins cannot remove themselves"),
        (status = 403, description = "Admin authority or CSRF token missing"),
        (status = 404, description = "Unknown principal"),
    )
)]
pub async fn delete_principal(
    AdminOnly(admin): AdminOnly,
    Path(username): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    if admin.username() == username {
        return Err(ApiError::bad_request("Cannot remove your own principal"));
    }

    match state.principals.remove(&username).await {
        Some(_) => {
            tracing::info!(admin = %admin.username(), %username, "Principal removed");
            Ok(StatusCode::NO_CONTENT)
        }
        None => Err(ApiError::not_found(format!("Principal '{username}' not found"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthenticatedPrincipal;
    use crate::token::{Claims, Validated};

    fn admin() -> AdminOnly {
        AdminOnly(AuthenticatedPrincipal::new(
            Principal::new("root", ["ROLE_ADMIN"]),
            Validated {
                claims: Claims::new().with_subject("root"),
                subject: Some("root".to_string()),
            },
        ))
    }

    async fn state_with_directory() -> AppState {
        let state = AppState::default();
        state.principals.insert(Principal::new("root", ["ROLE_ADMIN"])).await;
        let mut locked = Principal::new("bob", ["ROLE_USER"]);
        locked.account_non_locked = false;
        state.principals.insert(locked).await;
        state
    }

    #[tokio::test]
    async fn list_shows_account_state() {
        let state = state_with_directory().await;
        let Json(response) = list_principals(admin(), State(state)).await;

        assert_eq!(response.total, 2);
        assert_eq!(response.principals[0].username, "bob");
        assert!(response.principals[0].enabled);
        assert!(!response.principals[0].can_authenticate);
        assert_eq!(response.principals[1].username, "root");
    }

    #[tokio::test]
    async fn delete_removes_principal() {
        let state = state_with_directory().await;
        let status = delete_principal(admin(), Path("bob".to_string()), State(state.clone()))
            .await
            .expect("delete succeeds");

        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(state.principals.len().await, 1);
    }

    #[tokio::test]
    async fn delete_unknown_is_not_found() {
        let state = state_with_directory().await;
        let err = delete_principal(admin(), Path("nobody".to_string()), State(state))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn admin_cannot_remove_self() {
        let state = state_with_directory().await;
        let err = delete_principal(admin(), Path("root".to_string()), State(state.clone()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(state.principals.len().await, 2);
    }
}
