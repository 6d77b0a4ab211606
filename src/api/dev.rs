// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Development-only token issuance. Compiled with the `dev` feature only.
//!
//! No password check happens here: anyone who can reach these routes can
//! mint tokens for any principal in the directory.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    auth::PrincipalResolver,
    error::ApiError,
    state::AppState,
    token::Claims,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
    pub token_type: String,
}

impl TokenResponse {
    fn bearer(token: String) -> Self {
        Self {
            token,
            token_type: "Bearer".to_string(),
        }
    }
}

/// Issue a standard token for a known principal.
#[utoipa::path(
    post,
    path = "/dev/token/{username}",
    params(("username" = String, Path, description = "Principal to issue for")),
    tag = "Dev",
    responses(
        (status = 200, body = TokenResponse),
        (status = 404, description = "Unknown principal"),
    )
)]
pub async fn issue_token(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<TokenResponse>, ApiError> {
    let principal = state.principals.load_by_username(&username).await?;
    let token = state.issuer.issue(&principal)?;
    tracing::warn!(%username, "Issued token through development route");
    Ok(Json(TokenResponse::bearer(token)))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CustomTokenRequest {
    /// Claims to sign, in order
    #[schema(value_type = Object)]
    pub claims: Claims,
}

/// Sign an arbitrary claim set. Reserved claims must have their registered
/// types (`exp`, `nbf`, `iat` integers; `iss`, `sub`, `aud`, `jti` strings).
#[utoipa::path(
    post,
    path = "/dev/tokens",
    request_body = CustomTokenRequest,
    tag = "Dev",
    responses(
        (status = 200, body = TokenResponse),
        (status = 422, description = "Reserved claim has the wrong type"),
    )
)]
pub async fn issue_custom_token(
    State(state): State<AppState>,
    Json(request): Json<CustomTokenRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let token = state.issuer.issue_with_claims(&request.claims)?;
    tracing::warn!("Issued custom-claims token through development route");
    Ok(Json(TokenResponse::bearer(token)))
}
