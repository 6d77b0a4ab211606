// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for authenticated principals.
//!
//! These read what the auth filter left in the request extensions; they
//! never look at the token themselves. Use `Auth` in handlers to require
//! authentication:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(principal): Auth) -> impl IntoResponse {
//!     // principal is AuthenticatedPrincipal
//! }
//! ```

use axum::{extract::FromRequestParts, http::request::Parts};

use super::roles::ROLE_ADMIN;
use super::{AuthError, AuthenticatedPrincipal};

/// Extractor for authenticated principals.
///
/// Rejects with 401 when the auth filter did not authenticate the request.
pub struct Auth(pub AuthenticatedPrincipal);

impl<S> FromRequestParts<S> for Auth
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedPrincipal>()
            .cloned()
            .map(Auth)
            .ok_or(AuthError::Unauthenticated)
    }
}

/// Extractor that requires the admin authority.
pub struct AdminOnly(pub AuthenticatedPrincipal);

impl<S> FromRequestParts<S> for AdminOnly
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Auth(principal) = Auth::from_request_parts(parts, state).await?;

        if !principal.is_admin() {
            return Err(AuthError::InsufficientAuthority(ROLE_ADMIN));
        }

        Ok(AdminOnly(principal))
    }
}

/// Optional authentication extractor.
///
/// Returns `None` for anonymous requests instead of rejecting, for public
/// endpoints that show more to signed-in users.
pub struct OptionalAuth(pub Option<AuthenticatedPrincipal>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalAuth(
            parts.extensions.get::<AuthenticatedPrincipal>().cloned(),
        ))
    }
}
