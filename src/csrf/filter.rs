// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Double-submit CSRF filter.
//!
//! Safe requests get a fresh challenge, saved in the session and placed in
//! the request extensions for handlers to hand out. Mutating requests must
//! echo the session's stored challenge in the configured header or, for
//! `application/x-www-form-urlencoded` bodies, in the configured form field.
//! The matched challenge is placed in the request extensions for
//! [`csrf_validator`](super::csrf_validator).

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;
use tower_sessions::Session;

use super::{
    is_mutating_method, CsrfChallenge, CsrfExemptions, CsrfRejection, CsrfTokenRepository,
};
use crate::error::ApiError;

/// Largest form body buffered while looking for the token field.
pub const MAX_FORM_BYTES: usize = 64 * 1024;

/// Shared state for [`csrf_filter`].
#[derive(Debug, Clone)]
pub struct CsrfProtection {
    repository: Arc<CsrfTokenRepository>,
    exemptions: Arc<CsrfExemptions>,
}

impl CsrfProtection {
    pub fn new(repository: Arc<CsrfTokenRepository>, exemptions: Arc<CsrfExemptions>) -> Self {
        Self {
            repository,
            exemptions,
        }
    }

    pub fn repository(&self) -> &CsrfTokenRepository {
        &self.repository
    }

    pub fn exemptions(&self) -> &CsrfExemptions {
        &self.exemptions
    }

    /// Generate a fresh challenge and store it in `session`.
    pub async fn issue(&self, session: &Session) -> Result<CsrfChallenge, CsrfRejection> {
        let challenge = self
            .repository
            .generate()
            .map_err(|e| CsrfRejection::Internal(e.to_string()))?;
        self.repository
            .save(Some(&challenge), session)
            .await
            .map_err(|e| CsrfRejection::SessionUnavailable(e.to_string()))?;
        tracing::debug!("Issued CSRF challenge");
        Ok(challenge)
    }
}

/// Middleware enforcing the double-submit check.
///
/// Requires the `tower_sessions` session layer to run first.
pub async fn csrf_filter(
    State(csrf): State<CsrfProtection>,
    mut request: Request,
    next: Next,
) -> Response {
    if csrf.exemptions.contains(request.uri().path()) {
        return next.run(request).await;
    }

    let Some(session) = request.extensions().get::<Session>().cloned() else {
        tracing::error!("CSRF filter installed without a session layer");
        return CsrfRejection::SessionUnavailable("session layer not installed".into())
            .into_response();
    };

    if !is_mutating_method(request.method()) {
        return match csrf.issue(&session).await {
            Ok(challenge) => {
                request.extensions_mut().insert(challenge);
                next.run(request).await
            }
            Err(rejection) => {
                tracing::error!(error = %rejection, "Failed to issue CSRF challenge");
                rejection.into_response()
            }
        };
    }

    let stored = match csrf.repository.load(request.method(), &session).await {
        Ok(Some(challenge)) => challenge,
        Ok(None) => {
            tracing::warn!(path = %request.uri().path(), "No CSRF challenge stored for session");
            return CsrfRejection::MissingChallenge.into_response();
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to load CSRF challenge");
            return CsrfRejection::SessionUnavailable(e.to_string()).into_response();
        }
    };

    let (submitted, mut request) = match submitted_token(request, &stored).await {
        Ok(found) => found,
        Err(response) => return response,
    };

    let matches = submitted
        .as_deref()
        .is_some_and(|value| tokens_match(value, &stored.token));
    if !matches {
        tracing::warn!(
            path = %request.uri().path(),
            submitted = submitted.is_some(),
            "CSRF token mismatch"
        );
        return CsrfRejection::TokenMismatch.into_response();
    }

    request.extensions_mut().insert(stored);
    next.run(request).await
}

/// Find the submitted token, rebuilding the request if the body was read.
async fn submitted_token(
    request: Request,
    challenge: &CsrfChallenge,
) -> Result<(Option<String>, Request), Response> {
    if let Some(value) = request
        .headers()
        .get(challenge.header_name.as_str())
        .and_then(|v| v.to_str().ok())
    {
        let value = value.to_string();
        return Ok((Some(value), request));
    }

    if !is_form(request.headers()) {
        return Ok((None, request));
    }

    let (parts, body) = request.into_parts();
    let bytes = to_bytes(body, MAX_FORM_BYTES).await.map_err(|e| {
        tracing::warn!(error = %e, "Form body too large for CSRF check");
        ApiError::new(StatusCode::PAYLOAD_TOO_LARGE, "Form body too large").into_response()
    })?;

    let token = serde_urlencoded::from_bytes::<Vec<(String, String)>>(&bytes)
        .ok()
        .and_then(|fields| {
            fields
                .into_iter()
                .find(|(name, _)| *name == challenge.parameter_name)
                .map(|(_, value)| value)
        });

    Ok((token, Request::from_parts(parts, Body::from(bytes))))
}

fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"))
}

fn tokens_match(submitted: &str, stored: &str) -> bool {
    submitted.len() == stored.len() && bool::from(submitted.as_bytes().ct_eq(stored.as_bytes()))
}
