// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Access token issuance.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use super::claims::Claims;
use super::codec;
use super::error::TokenError;
use super::key::SigningKey;
use crate::auth::Principal;

/// Custom claim carrying the principal's authorities.
pub const ROLES_CLAIM: &str = "roles";

/// Default access token lifetime in seconds (5 hours).
pub const DEFAULT_VALIDITY_SECS: i64 = 5 * 60 * 60;

/// Longest accepted token lifetime in seconds (100 years).
pub const MAX_VALIDITY_SECS: i64 = 100 * 365 * 24 * 60 * 60;

/// Signs access tokens for authenticated principals.
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    key: Arc<SigningKey>,
    validity: Duration,
    issuer: Option<String>,
}

impl TokenIssuer {
    pub fn new(key: Arc<SigningKey>) -> Self {
        Self {
            key,
            validity: Duration::seconds(DEFAULT_VALIDITY_SECS),
            issuer: None,
        }
    }

    pub fn with_validity(mut self, validity: Duration) -> Self {
        self.validity = validity;
        self
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn validity(&self) -> Duration {
        self.validity
    }

    /// Issue a token for `principal`, valid from now for the configured lifetime.
    pub fn issue(&self, principal: &Principal) -> Result<String, TokenError> {
        self.issue_at(principal, Utc::now())
    }

    pub fn issue_at(&self, principal: &Principal, now: DateTime<Utc>) -> Result<String, TokenError> {
        let expires_at = now.checked_add_signed(self.validity).ok_or_else(|| {
            TokenError::Configuration(format!("token lifetime {} overflows", self.validity))
        })?;

        let mut claims = Claims::new().with_subject(principal.username.clone());
        if let Some(issuer) = &self.issuer {
            claims.insert(super::claims::ISSUER, issuer.clone());
        }
        let claims = claims
            .with_issued_at(now.timestamp())
            .with_expiration(expires_at.timestamp())
            .with(ROLES_CLAIM, principal.authorities.clone());

        codec::encode(&claims, &self.key)
    }

    /// Sign a caller-supplied claim set as-is.
    ///
    /// Reserved claims are type-checked; a mistyped one fails with
    /// [`TokenError::Configuration`].
    pub fn issue_with_claims(&self, claims: &Claims) -> Result<String, TokenError> {
        codec::encode(claims, &self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::key::{derive_key, Algorithm};
    use crate::token::validator::TokenValidator;

    fn key() -> Arc<SigningKey> {
        Arc::new(derive_key("issuer-test-secret", Algorithm::HS256).unwrap())
    }

    #[test]
    fn issued_token_carries_subject_roles_and_lifetime() {
        let issuer = TokenIssuer::new(key()).with_issuer("tokengate");
        let principal = Principal::new("alice", ["ROLE_USER", "ROLE_ADMIN"]);
        let now = Utc::now();

        let token = issuer.issue_at(&principal, now).unwrap();
        let validated = TokenValidator::new(key())
            .validate_at(&token, Some("alice"), now)
            .unwrap();

        let claims = validated.claims;
        assert_eq!(claims.issuer(), Some("tokengate"));
        assert_eq!(claims.issued_at(), Some(now.timestamp()));
        assert_eq!(
            claims.expiration(),
            Some(now.timestamp() + DEFAULT_VALIDITY_SECS)
        );
        assert_eq!(claims.get(ROLES_CLAIM).unwrap()[1], "ROLE_ADMIN");
    }

    #[test]
    fn custom_validity_is_applied() {
        let issuer = TokenIssuer::new(key()).with_validity(Duration::seconds(30));
        let now = Utc::now();
        let token = issuer.issue_at(&Principal::new("bob", ["ROLE_USER"]), now).unwrap();

        let validator = TokenValidator::new(key());
        assert!(validator.validate_at(&token, None, now + Duration::seconds(29)).is_ok());
        assert_eq!(
            validator.validate_at(&token, None, now + Duration::seconds(31)),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn overflowing_lifetime_is_a_configuration_error() {
        let issuer = TokenIssuer::new(key()).with_validity(Duration::MAX);
        assert!(matches!(
            issuer.issue(&Principal::new("bob", ["ROLE_USER"])),
            Err(TokenError::Configuration(_))
        ));
    }

    #[test]
    fn caller_claims_are_type_checked() {
        let issuer = TokenIssuer::new(key());
        let bad = Claims::new().with_subject("x").with("nbf", true);
        assert!(matches!(
            issuer.issue_with_claims(&bad),
            Err(TokenError::Configuration(_))
        ));
    }
}
