// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token inspection.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{error::ApiError, state::AppState, token::Claims};

/// Tokens travel in the body so they stay out of request URIs and logs.
#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyRequest {
    /// Compact token to verify
    pub token: String,
    /// Require this subject
    pub subject: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VerifyResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[schema(value_type = Object)]
    pub claims: Claims,
}

/// Verify a token's signature and expiry and return its claims.
#[utoipa::path(
    post,
    path = "/v1/tokens/verify",
    request_body = VerifyRequest,
    tag = "Tokens",
    responses(
        (status = 200, body = VerifyResponse),
        (status = 400, description = "Malformed, forged, expired or wrong-subject token"),
    )
)]
pub async fn verify_token(
    State(state): State<AppState>,
    Json(params): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let validated = state
        .validator
        .validate(&params.token, params.subject.as_deref())?;

    Ok(Json(VerifyResponse {
        subject: validated.subject,
        claims: validated.claims,
    }))
}
