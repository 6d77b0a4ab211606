// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signed challenge re-verification.
//!
//! Runs after [`csrf_filter`](super::csrf_filter). For mutating, non-exempt
//! requests carrying a challenge in their extensions, the challenge's
//! signature and expiry are verified against the CSRF key. A failure never
//! reaches the downstream handler: the request, with a [`CsrfFailure`] in
//! its extensions, goes to the invalid-token handler and the response status
//! is forced to 400.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};

use super::{is_mutating_method, CsrfChallenge, CsrfExemptions, CsrfFailure};
use crate::token::{SigningKey, TokenError, TokenValidator};

/// Handles requests whose challenge failed verification.
pub type InvalidTokenHandler = Arc<dyn Fn(Request) -> Response + Send + Sync>;

/// Renders the [`CsrfFailure`] attached to the request.
pub fn default_invalid_token_handler(request: Request) -> Response {
    match request.extensions().get::<CsrfFailure>() {
        Some(failure) => failure.clone().into_response(),
        None => StatusCode::BAD_REQUEST.into_response(),
    }
}

#[derive(Clone)]
pub struct CsrfValidator {
    validator: TokenValidator,
    exemptions: Arc<CsrfExemptions>,
    on_invalid: InvalidTokenHandler,
}

impl CsrfValidator {
    pub fn new(key: Arc<SigningKey>, exemptions: Arc<CsrfExemptions>) -> Self {
        Self {
            validator: TokenValidator::new(key),
            exemptions,
            on_invalid: Arc::new(default_invalid_token_handler),
        }
    }

    pub fn with_invalid_token_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(Request) -> Response + Send + Sync + 'static,
    {
        self.on_invalid = Arc::new(handler);
        self
    }

    pub fn exemptions(&self) -> &CsrfExemptions {
        &self.exemptions
    }

    /// Whether a request with this method and path is verified at all.
    pub fn applies_to(&self, method: &Method, path: &str) -> bool {
        is_mutating_method(method) && !self.exemptions.contains(path)
    }

    pub fn check(
        &self,
        method: &Method,
        path: &str,
        challenge: Option<&CsrfChallenge>,
    ) -> Result<(), TokenError> {
        self.check_at(method, path, challenge, Utc::now())
    }

    /// Verify `challenge` as of `now`; skipped requests are `Ok`.
    pub fn check_at(
        &self,
        method: &Method,
        path: &str,
        challenge: Option<&CsrfChallenge>,
        now: DateTime<Utc>,
    ) -> Result<(), TokenError> {
        let Some(challenge) = challenge else {
            return Ok(());
        };
        if !self.applies_to(method, path) {
            return Ok(());
        }
        self.validator
            .validate_at(&challenge.token, None, now)
            .map(|_| ())
    }
}

impl std::fmt::Debug for CsrfValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsrfValidator")
            .field("validator", &self.validator)
            .field("exemptions", &self.exemptions)
            .finish_non_exhaustive()
    }
}

/// Middleware re-verifying the session's CSRF challenge.
pub async fn csrf_validator(
    State(csrf): State<CsrfValidator>,
    mut request: Request,
    next: Next,
) -> Response {
    let result = csrf.check(
        request.method(),
        request.uri().path(),
        request.extensions().get::<CsrfChallenge>(),
    );

    match result {
        Ok(()) => next.run(request).await,
        Err(error) => {
            tracing::warn!(
                path = %request.uri().path(),
                error_code = error.error_code(),
                error = %error,
                "CSRF challenge rejected"
            );
            request.extensions_mut().insert(CsrfFailure { error });
            let mut response = (csrf.on_invalid)(request);
            *response.status_mut() = StatusCode::BAD_REQUEST;
            response
        }
    }
}
