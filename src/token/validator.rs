// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token acceptance policy.
//!
//! [`TokenValidator`] is the single place that decides whether a token is
//! currently acceptable. Filters call it; nothing else re-implements expiry.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use super::claims::{Claims, EXPIRATION, NOT_BEFORE};
use super::codec;
use super::error::TokenError;
use super::key::SigningKey;

/// A token that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct Validated {
    pub claims: Claims,
    /// `sub` claim, if the token carries one
    pub subject: Option<String>,
}

/// Decodes tokens and applies the time, issuer and subject checks.
#[derive(Debug, Clone)]
pub struct TokenValidator {
    key: Arc<SigningKey>,
    require_expiry: bool,
    issuer: Option<String>,
}

impl TokenValidator {
    pub fn new(key: Arc<SigningKey>) -> Self {
        Self {
            key,
            require_expiry: true,
            issuer: None,
        }
    }

    /// Only accept tokens whose `iss` equals `issuer`.
    pub fn require_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Treat tokens without `exp` as never expiring.
    pub fn allow_missing_expiry(mut self) -> Self {
        self.require_expiry = false;
        self
    }

    pub fn key(&self) -> &SigningKey {
        &self.key
    }

    pub fn validate(
        &self,
        token: &str,
        expected_subject: Option<&str>,
    ) -> Result<Validated, TokenError> {
        self.validate_at(token, expected_subject, Utc::now())
    }

    /// Validate against an explicit instant.
    ///
    /// Steps, in order: decode (signature and format errors pass through
    /// unchanged), reject if `exp <= now`, reject if `nbf > now`, reject if
    /// a required issuer differs from `iss`, reject if `expected_subject`
    /// is given and differs from `sub`.
    pub fn validate_at(
        &self,
        token: &str,
        expected_subject: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Validated, TokenError> {
        let claims = codec::decode(token, &self.key)?;

        match claims.get(EXPIRATION) {
            None if self.require_expiry => return Err(TokenError::MissingClaim(EXPIRATION)),
            None => {}
            Some(value) => {
                let exp = value.as_i64().ok_or_else(|| {
                    TokenError::malformed(format!("'exp' is not an integer timestamp: {value}"))
                })?;
                if exp <= now.timestamp() {
                    return Err(TokenError::Expired);
                }
            }
        }

        if let Some(value) = claims.get(NOT_BEFORE) {
            let nbf = value.as_i64().ok_or_else(|| {
                TokenError::malformed(format!("'nbf' is not an integer timestamp: {value}"))
            })?;
            if nbf > now.timestamp() {
                return Err(TokenError::NotYetValid);
            }
        }

        if let Some(required) = &self.issuer {
            if claims.issuer() != Some(required.as_str()) {
                return Err(TokenError::IssuerMismatch);
            }
        }

        let subject = claims.subject().map(str::to_owned);

        if let Some(expected) = expected_subject {
            if subject.as_deref() != Some(expected) {
                return Err(TokenError::SubjectMismatch);
            }
        }

        Ok(Validated { claims, subject })
    }
}
