// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Invalid CSRF token handler.
//!
//! The CSRF validator forwards failed requests to [`forward_invalid_csrf`];
//! `/expired-jwt` renders the same body for clients that navigate there.

use axum::{
    extract::Request,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{csrf::CsrfFailure, token::TokenError};

#[derive(Debug, Serialize, ToSchema)]
pub struct ExpiredTokenResponse {
    pub error: String,
    pub error_code: String,
    /// Where to fetch a fresh challenge
    pub refresh: String,
}

fn render(failure: Option<&CsrfFailure>) -> Response {
    let (error, error_code) = match failure.map(|f| &f.error) {
        Some(TokenError::Expired) | None => (
            "CSRF token has expired, fetch a new one and retry".to_string(),
            "token_expired",
        ),
        Some(other) => (format!("CSRF token is invalid: {other}"), other.error_code()),
    };

    let body = Json(ExpiredTokenResponse {
        error,
        error_code: error_code.to_string(),
        refresh: "/csrf".to_string(),
    });
    (StatusCode::BAD_REQUEST, body).into_response()
}

/// Invalid-token handler installed on the CSRF validator.
pub fn forward_invalid_csrf(request: Request) -> Response {
    render(request.extensions().get::<CsrfFailure>())
}

#[utoipa::path(
    get,
    path = "/expired-jwt",
    tag = "CSRF",
    responses(
        (status = 400, description = "CSRF token expired or invalid", body = ExpiredTokenResponse)
    )
)]
pub async fn expired_jwt(request: Request) -> Response {
    forward_invalid_csrf(request)
}
