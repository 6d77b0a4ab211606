// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # CSRF Protection
//!
//! Double-submit protection with signed, short-lived challenges.
//!
//! Two pipeline stages, in this order:
//!
//! 1. [`csrf_filter`] - for mutating requests, the value submitted in the
//!    `X-CSRF-TOKEN` header or `_csrf` form field must equal the challenge
//!    stored in the session (403 otherwise)
//! 2. [`csrf_validator`] - re-verifies that stored challenge's signature and
//!    30-second expiry; failures stop the request with 400 and go to the
//!    invalid-token handler
//!
//! Challenges are signed with their own key, never the access token key.

pub mod error;
pub mod exemptions;
pub mod filter;
pub mod repository;
pub mod validator;

use axum::http::Method;

pub use error::{CsrfFailure, CsrfRejection};
pub use exemptions::CsrfExemptions;
pub use filter::{csrf_filter, CsrfProtection};
pub use repository::{CsrfChallenge, CsrfTokenRepository};
pub use validator::{csrf_validator, CsrfValidator};

/// Default request header carrying the submitted token.
pub const DEFAULT_HEADER_NAME: &str = "X-CSRF-TOKEN";

/// Default form field carrying the submitted token.
pub const DEFAULT_PARAMETER_NAME: &str = "_csrf";

/// Challenge lifetime in seconds.
pub const CHALLENGE_TTL_SECS: i64 = 30;

/// Read-only methods, never CSRF-checked.
pub fn is_safe_method(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE
    )
}

/// State-changing methods subject to CSRF checks.
pub fn is_mutating_method(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn methods_are_classified() {
        assert!(is_safe_method(&Method::GET));
        assert!(!is_mutating_method(&Method::GET));
        assert!(is_mutating_method(&Method::POST));
        assert!(is_mutating_method(&Method::DELETE));
        assert!(!is_safe_method(&Method::PATCH));
        assert!(!is_safe_method(&Method::CONNECT) && !is_mutating_method(&Method::CONNECT));
    }
}
