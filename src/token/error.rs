// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token errors.

use thiserror::Error;

/// Failure kinds for building, parsing and validating signed tokens.
///
/// The auth filter treats every variant as "continue unauthenticated";
/// the CSRF validator treats the token variants as a hard stop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Bad or missing secret, or a reserved claim of the wrong type at build time
    #[error("configuration error: {0}")]
    Configuration(String),
    /// Wrong segment count, undecodable base64url or invalid JSON
    #[error("token is malformed: {0}")]
    MalformedToken(String),
    /// MAC mismatch or algorithm mismatch
    #[error("token signature is invalid")]
    Signature,
    /// Expiry at or before the validation instant
    #[error("token has expired")]
    Expired,
    /// `nbf` is later than the validation instant
    #[error("token is not valid yet")]
    NotYetValid,
    /// A claim required by the validator is absent
    #[error("token is missing required claim '{0}'")]
    MissingClaim(&'static str),
    /// Decoded subject differs from the resolved principal
    #[error("token subject does not match the resolved principal")]
    SubjectMismatch,
    /// `iss` is absent or differs from the required issuer
    #[error("token issuer is not accepted")]
    IssuerMismatch,
    /// Principal resolver has no entry for the subject
    #[error("principal '{0}' not found")]
    PrincipalNotFound(String),
}

impl TokenError {
    /// Stable machine-readable code, used in JSON error bodies.
    pub fn error_code(&self) -> &'static str {
        match self {
            TokenError::Configuration(_) => "configuration_error",
            TokenError::MalformedToken(_) => "malformed_token",
            TokenError::Signature => "invalid_signature",
            TokenError::Expired => "token_expired",
            TokenError::NotYetValid => "token_not_yet_valid",
            TokenError::MissingClaim(_) => "missing_claim",
            TokenError::SubjectMismatch => "subject_mismatch",
            TokenError::IssuerMismatch => "issuer_mismatch",
            TokenError::PrincipalNotFound(_) => "principal_not_found",
        }
    }

    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        TokenError::MalformedToken(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_are_distinct_per_kind() {
        assert_eq!(TokenError::Expired.error_code(), "token_expired");
        assert_eq!(TokenError::Signature.error_code(), "invalid_signature");
        assert_eq!(
            TokenError::malformed("two segments").error_code(),
            "malformed_token"
        );
    }

    #[test]
    fn display_includes_claim_name() {
        let err = TokenError::MissingClaim("exp");
        assert_eq!(err.to_string(), "token is missing required claim 'exp'");
    }
}
