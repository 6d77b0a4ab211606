// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Signed Tokens
//!
//! Compact HMAC-signed tokens (`header.payload.signature`, base64url) shared
//! by the bearer authentication filter and the CSRF challenge repository.
//!
//! - `key` - key derivation from a configured secret
//! - `claims` - ordered claim sets with reserved-claim typing
//! - `codec` - encode/decode with constant-time MAC verification
//! - `validator` - expiry and subject policy
//! - `issuer` - access token issuance for principals

pub mod claims;
pub mod codec;
pub mod error;
pub mod issuer;
pub mod key;
pub mod validator;

pub use claims::Claims;
pub use error::TokenError;
pub use issuer::TokenIssuer;
pub use key::{derive_key, Algorithm, SigningKey};
pub use validator::{TokenValidator, Validated};
