// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! CSRF rejections.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::token::TokenError;

#[derive(Serialize)]
struct CsrfErrorBody {
    error: String,
    error_code: String,
}

fn json_error(status: StatusCode, error: String, error_code: &str) -> Response {
    let body = Json(CsrfErrorBody {
        error,
        error_code: error_code.to_string(),
    });
    (status, body).into_response()
}

/// Double-submit check failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CsrfRejection {
    /// No challenge stored for the session
    MissingChallenge,
    /// Submitted value absent or different from the stored challenge
    TokenMismatch,
    /// The session layer is not installed or the store failed
    SessionUnavailable(String),
    /// A challenge could not be generated
    Internal(String),
}

impl CsrfRejection {
    pub fn error_code(&self) -> &'static str {
        match self {
            CsrfRejection::MissingChallenge => "csrf_challenge_missing",
            CsrfRejection::TokenMismatch => "csrf_token_mismatch",
            CsrfRejection::SessionUnavailable(_) => "session_unavailable",
            CsrfRejection::Internal(_) => "internal_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            CsrfRejection::MissingChallenge | CsrfRejection::TokenMismatch => StatusCode::FORBIDDEN,
            CsrfRejection::SessionUnavailable(_) | CsrfRejection::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl std::fmt::Display for CsrfRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CsrfRejection::MissingChallenge => {
                write!(f, "Could not verify the CSRF token because no token was found")
            }
            CsrfRejection::TokenMismatch => write!(f, "Invalid CSRF token"),
            CsrfRejection::SessionUnavailable(msg) => write!(f, "Session unavailable: {msg}"),
            CsrfRejection::Internal(msg) => write!(f, "Internal CSRF error: {msg}"),
        }
    }
}

impl std::error::Error for CsrfRejection {}

impl IntoResponse for CsrfRejection {
    fn into_response(self) -> Response {
        json_error(self.status_code(), self.to_string(), self.error_code())
    }
}

/// Signed challenge failed re-verification.
///
/// Attached to the request extensions before the request is forwarded to
/// the invalid-token handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrfFailure {
    pub error: TokenError,
}

impl IntoResponse for CsrfFailure {
    fn into_response(self) -> Response {
        let message = match self.error {
            TokenError::Expired => "CSRF token has expired, reload the page and retry".to_string(),
            ref other => format!("CSRF token is invalid: {other}"),
        };
        json_error(StatusCode::BAD_REQUEST, message, self.error.error_code())
    }
}
