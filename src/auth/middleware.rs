// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer token authentication filter.
//!
//! Runs once per request, before any authorization check:
//!
//! 1. Read `Authorization: Bearer <token>`; absent or other scheme means
//!    the request continues unauthenticated
//! 2. Validate the token without a subject to learn who it names
//! 3. Resolve that principal, unless the request is already authenticated
//! 4. Validate again against the principal's username and attach an
//!    [`AuthenticatedPrincipal`] to the request extensions
//! 5. Always hand the request to the next stage
//!
//! The filter never rejects. Protected routes reject unauthenticated
//! requests through the extractors in `extractor.rs`.
//!
//! ```rust,ignore
//! let app = Router::new()
//!     .route("/v1/users/me", get(me))
//!     .layer(axum::middleware::from_fn_with_state(filter, auth_filter));
//! ```

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, Extensions, HeaderMap},
    middleware::Next,
    response::Response,
};

use super::claims::AuthenticatedPrincipal;
use super::principal::PrincipalResolver;
use crate::token::{TokenError, TokenValidator};

/// Authorization scheme prefix, including the separating space.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Marks a request the filter has already seen.
#[derive(Debug, Clone, Copy)]
struct AuthFilterApplied;

/// Shared, immutable state of the auth filter.
#[derive(Clone)]
pub struct AuthFilter {
    validator: TokenValidator,
    resolver: Arc<dyn PrincipalResolver>,
}

impl AuthFilter {
    pub fn new(validator: TokenValidator, resolver: Arc<dyn PrincipalResolver>) -> Self {
        Self {
            validator,
            resolver,
        }
    }

    /// Decide whether the request is authenticated.
    ///
    /// Returns `None` for every failure kind; each one is logged here.
    pub async fn authenticate(
        &self,
        headers: &HeaderMap,
        extensions: &Extensions,
    ) -> Option<AuthenticatedPrincipal> {
        let token = bearer_token(headers)?;

        let subject = match self.validator.validate(token, None) {
            Ok(validated) => validated.subject,
            Err(e) => {
                log_rejected(&e);
                return None;
            }
        };

        let Some(subject) = subject else {
            tracing::warn!("Bearer token carries no subject claim");
            return None;
        };

        if extensions.get::<AuthenticatedPrincipal>().is_some() {
            tracing::debug!(subject = %subject, "Request already authenticated");
            return None;
        }

        let principal = match self.resolver.load_by_username(&subject).await {
            Ok(principal) => principal,
            Err(e) => {
                log_rejected(&e);
                return None;
            }
        };

        if !principal.can_authenticate() {
            tracing::warn!(username = %principal.username, "Principal is disabled, locked or expired");
            return None;
        }

        match self.validator.validate(token, Some(&principal.username)) {
            Ok(validated) => {
                tracing::debug!(username = %principal.username, "Bearer token authenticated");
                Some(AuthenticatedPrincipal::new(principal, validated))
            }
            Err(e) => {
                log_rejected(&e);
                None
            }
        }
    }
}

/// Authentication middleware function.
pub async fn auth_filter(
    State(filter): State<AuthFilter>,
    mut request: Request,
    next: Next,
) -> Response {
    if request.extensions().get::<AuthFilterApplied>().is_some() {
        return next.run(request).await;
    }
    request.extensions_mut().insert(AuthFilterApplied);

    let authenticated = filter
        .authenticate(request.headers(), request.extensions())
        .await;
    if let Some(authenticated) = authenticated {
        request.extensions_mut().insert(authenticated);
    }

    next.run(request).await
}

/// Extract the token from `Authorization: Bearer <token>`.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let Some(header) = headers.get(AUTHORIZATION) else {
        tracing::debug!("No Authorization header, continuing unauthenticated");
        return None;
    };

    let token = header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    if token.is_none() {
        tracing::warn!("Authorization header does not begin with the Bearer scheme");
    }
    token
}

fn log_rejected(error: &TokenError) {
    match error {
        TokenError::Expired => tracing::warn!("Bearer token has expired"),
        TokenError::PrincipalNotFound(username) => {
            tracing::warn!(username = %username, "Bearer token names an unknown principal")
        }
        other => tracing::warn!(error_code = other.error_code(), error = %other, "Bearer token rejected"),
    }
}
