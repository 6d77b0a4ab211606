// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authenticated principal representation.

use serde::Serialize;
use utoipa::ToSchema;

use super::principal::Principal;
use super::roles::ROLE_ADMIN;
use crate::token::{Claims, Validated};

/// Marker placed in the request extensions once the auth filter has
/// authenticated the request.
///
/// Downstream authorization reads this; it is the only authentication
/// state a request carries.
#[derive(Debug, Clone)]
pub struct AuthenticatedPrincipal {
    pub principal: Principal,
    /// Claims of the token that authenticated the request
    pub claims: Claims,
}

impl AuthenticatedPrincipal {
    pub fn new(principal: Principal, validated: Validated) -> Self {
        Self {
            principal,
            claims: validated.claims,
        }
    }

    pub fn username(&self) -> &str {
        &self.principal.username
    }

    pub fn authorities(&self) -> &[String] {
        &self.principal.authorities
    }

    pub fn has_authority(&self, authority: &str) -> bool {
        self.principal.has_authority(authority)
    }

    pub fn is_admin(&self) -> bool {
        self.has_authority(ROLE_ADMIN)
    }

    /// Token expiry (Unix timestamp)
    pub fn expires_at(&self) -> Option<i64> {
        self.claims.expiration()
    }
}

/// Public view of an authenticated principal.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PrincipalView {
    pub username: String,
    pub authorities: Vec<String>,
    /// Token expiry (Unix timestamp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

impl From<&AuthenticatedPrincipal> for PrincipalView {
    fn from(auth: &AuthenticatedPrincipal) -> Self {
        Self {
            username: auth.username().to_string(),
            authorities: auth.authorities().to_vec(),
            expires_at: auth.expires_at(),
        }
    }
}
