// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! CSRF-protected echo endpoint.

use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{auth::OptionalAuth, error::ApiError};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct EchoRequest {
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EchoResponse {
    pub message: String,
    /// Present when the request carried a valid bearer token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

#[utoipa::path(
    post,
    path = "/v1/echo",
    request_body = EchoRequest,
    tag = "Echo",
    params(
        ("X-CSRF-TOKEN" = String, Header, description = "Token from GET /csrf")
    ),
    responses(
        (status = 200, body = EchoResponse),
        (status = 400, description = "CSRF token expired or invalid"),
        (status = 403, description = "CSRF token missing or mismatched"),
        (status = 422, description = "Empty message"),
    )
)]
pub async fn echo(
    OptionalAuth(principal): OptionalAuth,
    Json(request): Json<EchoRequest>,
) -> Result<Json<EchoResponse>, ApiError> {
    if request.message.trim().is_empty() {
        return Err(ApiError::unprocessable("message must not be empty"));
    }

    Ok(Json(EchoResponse {
        message: request.message,
        username: principal.map(|p| p.username().to_string()),
    }))
}
